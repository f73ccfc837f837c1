use std::{
    env::{self, VarError},
    fs,
    path::{Path, PathBuf},
};

use dirs::config_dir;
use pgpdecrypt_core::{DecryptionConfig, Passphrase};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::factory::{
    default_gpg_home, with_keyrings_from_files, PUBLIC_KEYRING_FILE, SECRET_KEYRING_FILE,
};

/// Errors produced while loading settings or resolving them into a config.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no config dir available")]
    NoConfigDir,
    #[error("no home dir available to locate a GnuPG home")]
    NoHomeDir,
    #[error("passphrase environment variable {var} is not set")]
    MissingEnv { var: String },
    #[error("passphrase environment variable {var} is not valid unicode")]
    InvalidEnv { var: String },
    #[error("keychain error: {0}")]
    Keychain(String),
}

/// File-backed decryption settings, loaded from `<config dir>/pgpdecrypt/decryption.toml`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct DecryptionSettings {
    /// Reject messages without a valid signature from the public keyring.
    #[serde(default)]
    pub signature_check_required: bool,
    /// Directory holding `pubring.gpg` and `secring.gpg` (defaults to `~/.gnupg`).
    pub gpg_home: Option<PathBuf>,
    /// Explicit public keyring; overrides `gpg_home`.
    pub public_keyring: Option<PathBuf>,
    /// Explicit secret keyring; overrides `gpg_home`.
    pub secret_keyring: Option<PathBuf>,
    pub passphrase: Option<PassphraseSetting>,
}

/// Where the secret key passphrase comes from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassphraseSetting {
    /// Literal value stored in the settings file.
    Value(Passphrase),
    /// Name of an environment variable.
    Env(String),
    /// Entry in the OS keychain.
    Keychain { service: String, account: String },
}

impl PassphraseSetting {
    /// Read the passphrase once; the result is fixed for the config's lifetime.
    pub fn resolve(&self) -> Result<Passphrase, SettingsError> {
        match self {
            PassphraseSetting::Value(value) => Ok(value.clone()),
            PassphraseSetting::Env(var) => match env::var(var) {
                Ok(value) => Ok(Passphrase::from(value)),
                Err(VarError::NotPresent) => Err(SettingsError::MissingEnv { var: var.clone() }),
                Err(VarError::NotUnicode(_)) => {
                    Err(SettingsError::InvalidEnv { var: var.clone() })
                }
            },
            PassphraseSetting::Keychain { service, account } => {
                // Keyring operations are synchronous and may prompt the user.
                let entry = keyring::Entry::new(service, account)
                    .map_err(|e| SettingsError::Keychain(e.to_string()))?;
                read_keychain(&entry)
            }
        }
    }
}

fn read_keychain(entry: &keyring::Entry) -> Result<Passphrase, SettingsError> {
    entry
        .get_password()
        .map(Passphrase::from)
        .map_err(|e| SettingsError::Keychain(e.to_string()))
}

impl DecryptionSettings {
    /// Public and secret keyring paths after applying overrides and defaults.
    pub fn keyring_paths(&self) -> Result<(PathBuf, PathBuf), SettingsError> {
        let home = match &self.gpg_home {
            Some(home) => Some(home.clone()),
            None if self.public_keyring.is_none() || self.secret_keyring.is_none() => {
                Some(default_gpg_home().ok_or(SettingsError::NoHomeDir)?)
            }
            None => None,
        };
        let in_home = |file: &str| home.as_ref().map(|h| h.join(file));

        let public = self
            .public_keyring
            .clone()
            .or_else(|| in_home(PUBLIC_KEYRING_FILE))
            .ok_or(SettingsError::NoHomeDir)?;
        let secret = self
            .secret_keyring
            .clone()
            .or_else(|| in_home(SECRET_KEYRING_FILE))
            .ok_or(SettingsError::NoHomeDir)?;
        Ok((public, secret))
    }

    /// Build a file-backed config. Keyrings are still opened lazily.
    #[instrument(skip_all)]
    pub fn into_config(self) -> Result<DecryptionConfig, SettingsError> {
        let (public, secret) = self.keyring_paths()?;
        let passphrase = self
            .passphrase
            .as_ref()
            .map(PassphraseSetting::resolve)
            .transpose()?;
        debug!(
            public = %public.display(),
            secret = %secret.display(),
            has_passphrase = passphrase.is_some(),
            "resolved decryption settings"
        );
        Ok(with_keyrings_from_files(
            public,
            secret,
            self.signature_check_required,
            passphrase,
        ))
    }
}

/// Load settings from the default path; if missing, return defaults.
pub fn load() -> Result<DecryptionSettings, SettingsError> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load settings from a given path; if missing or empty, return defaults.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_from_path(path: impl AsRef<Path>) -> Result<DecryptionSettings, SettingsError> {
    let path = path.as_ref();
    let exists = path.try_exists().map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if !exists {
        debug!("no settings file, using defaults");
        return Ok(DecryptionSettings::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(DecryptionSettings::default());
    }
    Ok(toml::from_str(&contents)?)
}

/// Resolve the default settings path (platform aware).
pub fn default_path() -> Result<PathBuf, SettingsError> {
    let base = config_dir().ok_or(SettingsError::NoConfigDir)?;
    Ok(base.join("pgpdecrypt").join("decryption.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use keyring::credential::CredentialBuilderApi;

    use super::*;

    #[test]
    fn returns_default_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_from_path(dir.path().join("decryption.toml")).expect("load");
        assert_eq!(settings, DecryptionSettings::default());
    }

    #[test]
    fn returns_default_when_blank() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("decryption.toml");
        fs::write(&path, "  \n").expect("write");
        assert_eq!(load_from_path(&path).expect("load"), DecryptionSettings::default());
    }

    #[test]
    fn parses_custom_settings() {
        let contents = r#"
            signature_check_required = true
            gpg_home = "/home/alice/.gnupg"
            secret_keyring = "/secure/secring.gpg"
            [passphrase]
            keychain = { service = "pgpdecrypt", account = "alice" }
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("decryption.toml");
        fs::write(&path, contents).expect("write temp settings");

        let settings = load_from_path(&path).expect("load");
        assert_eq!(
            settings,
            DecryptionSettings {
                signature_check_required: true,
                gpg_home: Some(PathBuf::from("/home/alice/.gnupg")),
                public_keyring: None,
                secret_keyring: Some(PathBuf::from("/secure/secring.gpg")),
                passphrase: Some(PassphraseSetting::Keychain {
                    service: "pgpdecrypt".into(),
                    account: "alice".into(),
                }),
            }
        );

        let (public, secret) = settings.keyring_paths().expect("paths");
        assert_eq!(public, PathBuf::from("/home/alice/.gnupg/pubring.gpg"));
        assert_eq!(secret, PathBuf::from("/secure/secring.gpg"));
    }

    #[test]
    fn rejects_malformed_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("decryption.toml");
        fs::write(&path, "signature_check_required = \"maybe\"").expect("write");

        let err = load_from_path(&path).expect_err("should reject");
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn into_config_keeps_literal_passphrase_and_stays_lazy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = DecryptionSettings {
            signature_check_required: true,
            gpg_home: Some(dir.path().to_path_buf()),
            public_keyring: None,
            secret_keyring: None,
            passphrase: Some(PassphraseSetting::Value("hunter2".into())),
        };

        let config = settings.into_config().expect("config");
        assert!(config.is_signature_check_required());
        assert_eq!(
            config.decryption_secret_key_passphrase().map(Passphrase::expose),
            Some("hunter2")
        );
        assert!(config.public_key_ring().err().is_some_and(|e| e.is_not_found()));

        fs::write(dir.path().join(PUBLIC_KEYRING_FILE), b"late").expect("write");
        let mut buf = Vec::new();
        config
            .public_key_ring()
            .expect("created after construction")
            .read_to_end(&mut buf)
            .expect("read");
        assert_eq!(buf, b"late");
    }

    #[test]
    fn env_passphrase_is_resolved_once() {
        let var = "PGPDECRYPT_TEST_PASSPHRASE_ENV_RESOLVE";
        env::set_var(var, "from-env");
        let setting = PassphraseSetting::Env(var.to_string());
        let resolved = setting.resolve().expect("resolve");
        env::remove_var(var);

        assert_eq!(resolved.expose(), "from-env");
    }

    #[test]
    fn missing_env_passphrase_is_an_error() {
        let setting = PassphraseSetting::Env("PGPDECRYPT_TEST_PASSPHRASE_UNSET".to_string());
        let err = setting.resolve().expect_err("should fail");
        assert!(matches!(err, SettingsError::MissingEnv { .. }));
    }

    #[test]
    fn debug_output_redacts_literal_passphrase() {
        let settings = DecryptionSettings {
            passphrase: Some(PassphraseSetting::Value("hunter2".into())),
            ..DecryptionSettings::default()
        };
        assert!(!format!("{settings:?}").contains("hunter2"));
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_env_passphrase_is_reported_as_invalid() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let var = "PGPDECRYPT_TEST_PASSPHRASE_NOT_UNICODE";
        env::set_var(var, OsStr::from_bytes(b"pass\xffword"));
        let err = PassphraseSetting::Env(var.to_string())
            .resolve()
            .expect_err("should fail");
        env::remove_var(var);

        assert!(matches!(err, SettingsError::InvalidEnv { .. }));
        assert!(err.to_string().contains("not valid unicode"));
    }

    #[test]
    fn keychain_entry_is_read_as_passphrase() {
        let credential = keyring::mock::default_credential_builder()
            .build(None, "pgpdecrypt", "alice")
            .expect("mock credential");
        let entry = keyring::Entry::new_with_credential(credential);
        entry.set_password("from-keychain").expect("store");

        let passphrase = read_keychain(&entry).expect("read");
        assert_eq!(passphrase.expose(), "from-keychain");
    }

    #[test]
    fn missing_keychain_entry_is_a_keychain_error() {
        let credential = keyring::mock::default_credential_builder()
            .build(None, "pgpdecrypt", "nobody")
            .expect("mock credential");
        let entry = keyring::Entry::new_with_credential(credential);

        let err = read_keychain(&entry).expect_err("should fail");
        assert!(matches!(err, SettingsError::Keychain(_)));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_settings_location_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let not_a_dir = dir.path().join("plain-file");
        fs::write(&not_a_dir, b"x").expect("write");

        let err = load_from_path(not_a_dir.join("decryption.toml")).expect_err("should fail");
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}
