use std::{fmt, io::Read};

use thiserror::Error;

/// Readable stream over keyring bytes. Owned by the caller once returned.
pub type KeyringStream = Box<dyn Read + Send>;

/// Errors produced while acquiring a keyring stream.
#[derive(Debug, Error)]
pub enum KeyringSourceError {
    /// The file or resource name does not resolve to anything.
    #[error("keyring not found: {location}")]
    NotFound { location: String },
    /// The keyring exists but could not be opened.
    #[error("failed to open keyring {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

impl KeyringSourceError {
    pub fn not_found(location: impl Into<String>) -> Self {
        Self::NotFound {
            location: location.into(),
        }
    }

    /// Map an I/O failure, keeping `NotFound` distinct from other open errors.
    pub fn from_io(location: impl Into<String>, source: std::io::Error) -> Self {
        let location = location.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { location }
        } else {
            Self::Io { location, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn location(&self) -> &str {
        match self {
            Self::NotFound { location } | Self::Io { location, .. } => location,
        }
    }
}

/// Which of the two keyrings a stream was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyringKind {
    Public,
    Secret,
}

impl fmt::Display for KeyringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyringKind::Public => f.write_str("public"),
            KeyringKind::Secret => f.write_str("secret"),
        }
    }
}

/// Opens keyring material on demand (filesystem, bundled resources, or anything else).
///
/// Every call to [`KeyringSource::open`] must return a new stream positioned at
/// the start of the data. Implementations hold only what they need to locate
/// the keyring and must not cache opened handles.
pub trait KeyringSource: Send + Sync {
    /// Open a fresh stream over the keyring bytes.
    fn open(&self) -> Result<KeyringStream, KeyringSourceError>;

    /// Human-readable locator used in diagnostics. Must not contain secrets.
    fn location(&self) -> String {
        "<custom>".to_string()
    }
}

/// Adapts a closure into a [`KeyringSource`].
pub struct FnSource<F> {
    open: F,
    location: String,
}

impl<F> FnSource<F>
where
    F: Fn() -> Result<KeyringStream, KeyringSourceError> + Send + Sync,
{
    pub fn new(location: impl Into<String>, open: F) -> Self {
        Self {
            open,
            location: location.into(),
        }
    }
}

impl<F> KeyringSource for FnSource<F>
where
    F: Fn() -> Result<KeyringStream, KeyringSourceError> + Send + Sync,
{
    fn open(&self) -> Result<KeyringStream, KeyringSourceError> {
        (self.open)()
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}

impl<F> fmt::Debug for FnSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSource")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}
