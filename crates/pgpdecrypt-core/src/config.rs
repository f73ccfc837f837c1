use std::{fmt, sync::Arc};

use tracing::{debug, instrument, warn};

use crate::{
    passphrase::Passphrase,
    source::{KeyringKind, KeyringSource, KeyringSourceError, KeyringStream},
};

/// Everything a decryption engine needs to decrypt one message.
///
/// Immutable after construction and cheap to clone; clones share the same
/// keyring sources. Keyrings are opened only when a stream is requested.
#[derive(Clone)]
pub struct DecryptionConfig {
    signature_check_required: bool,
    passphrase: Option<Passphrase>,
    public_keyring: Arc<dyn KeyringSource>,
    secret_keyring: Arc<dyn KeyringSource>,
}

impl DecryptionConfig {
    /// Bind a configuration to arbitrary keyring sources.
    pub fn new(
        public_keyring: impl KeyringSource + 'static,
        secret_keyring: impl KeyringSource + 'static,
        signature_check_required: bool,
        passphrase: Option<Passphrase>,
    ) -> Self {
        Self::from_shared(
            Arc::new(public_keyring),
            Arc::new(secret_keyring),
            signature_check_required,
            passphrase,
        )
    }

    /// Same as [`DecryptionConfig::new`] for sources that are already shared.
    pub fn from_shared(
        public_keyring: Arc<dyn KeyringSource>,
        secret_keyring: Arc<dyn KeyringSource>,
        signature_check_required: bool,
        passphrase: Option<Passphrase>,
    ) -> Self {
        Self {
            signature_check_required,
            passphrase,
            public_keyring,
            secret_keyring,
        }
    }

    /// Whether output must carry a valid signature from a key in the public keyring.
    pub fn is_signature_check_required(&self) -> bool {
        self.signature_check_required
    }

    /// Passphrase for the secret key, exactly as supplied (`None` when unprotected).
    pub fn decryption_secret_key_passphrase(&self) -> Option<&Passphrase> {
        self.passphrase.as_ref()
    }

    /// Open a new stream over the public keyring.
    pub fn public_key_ring(&self) -> Result<KeyringStream, KeyringSourceError> {
        open_keyring(KeyringKind::Public, self.public_keyring.as_ref())
    }

    /// Open a new stream over the secret keyring.
    pub fn secret_key_ring(&self) -> Result<KeyringStream, KeyringSourceError> {
        open_keyring(KeyringKind::Secret, self.secret_keyring.as_ref())
    }

    /// Diagnostic rendering; reports only whether a passphrase is present.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

#[instrument(skip_all, fields(kind = %kind, location = %source.location()))]
fn open_keyring(
    kind: KeyringKind,
    source: &dyn KeyringSource,
) -> Result<KeyringStream, KeyringSourceError> {
    match source.open() {
        Ok(stream) => {
            debug!("opened keyring stream");
            Ok(stream)
        }
        Err(err) => {
            warn!(error = %err, "keyring unavailable");
            Err(err)
        }
    }
}

impl fmt::Display for DecryptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DecryptionConfig{{signatureCheckRequired={}, decryptionSecretKeyPassphrase?={}}}",
            self.signature_check_required,
            self.passphrase.is_some()
        )
    }
}

impl fmt::Debug for DecryptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionConfig")
            .field("signature_check_required", &self.signature_check_required)
            .field("has_passphrase", &self.passphrase.is_some())
            .field("public_keyring", &self.public_keyring.location())
            .field("secret_keyring", &self.secret_keyring.location())
            .finish()
    }
}
