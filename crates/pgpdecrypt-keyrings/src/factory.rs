use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dirs::home_dir;
use pgpdecrypt_core::{DecryptionConfig, Passphrase};
use tracing::debug;

use crate::{
    file_source::FileKeyringSource,
    resource_source::{ResourceKeyringSource, ResourceLoader},
};

pub const PUBLIC_KEYRING_FILE: &str = "pubring.gpg";
pub const SECRET_KEYRING_FILE: &str = "secring.gpg";

/// Create a config that reads keyrings from files, e.g.
/// `sender.gpg.d/pubring.gpg` and `sender.gpg.d/secring.gpg`.
///
/// Nothing is opened here; a missing file is reported when its stream is requested.
pub fn with_keyrings_from_files(
    public_keyring: impl Into<PathBuf>,
    secret_keyring: impl Into<PathBuf>,
    signature_check_required: bool,
    passphrase: Option<Passphrase>,
) -> DecryptionConfig {
    let public = FileKeyringSource::new(public_keyring);
    let secret = FileKeyringSource::new(secret_keyring);
    debug!(
        public = %public.path().display(),
        secret = %secret.path().display(),
        signature_check_required,
        "binding file keyrings"
    );
    DecryptionConfig::new(public, secret, signature_check_required, passphrase)
}

/// Create a config that resolves keyrings by name through `loader`, e.g.
/// `recipient.gpg.d/pubring.gpg` inside a bundled resource tree.
pub fn with_keyrings_from_resources(
    loader: Arc<dyn ResourceLoader>,
    public_keyring: impl Into<String>,
    secret_keyring: impl Into<String>,
    signature_check_required: bool,
    passphrase: Option<Passphrase>,
) -> DecryptionConfig {
    let public = ResourceKeyringSource::new(loader.clone(), public_keyring);
    let secret = ResourceKeyringSource::new(loader, secret_keyring);
    debug!(
        public = public.name(),
        secret = secret.name(),
        signature_check_required,
        "binding resource keyrings"
    );
    DecryptionConfig::new(public, secret, signature_check_required, passphrase)
}

/// Create a config over `pubring.gpg` and `secring.gpg` inside a GnuPG home directory.
pub fn with_keyrings_from_gpg_home(
    gpg_home: impl AsRef<Path>,
    signature_check_required: bool,
    passphrase: Option<Passphrase>,
) -> DecryptionConfig {
    let home = gpg_home.as_ref();
    with_keyrings_from_files(
        home.join(PUBLIC_KEYRING_FILE),
        home.join(SECRET_KEYRING_FILE),
        signature_check_required,
        passphrase,
    )
}

/// Resolve `~/.gnupg`, if a home directory is known.
pub fn default_gpg_home() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".gnupg"))
}
