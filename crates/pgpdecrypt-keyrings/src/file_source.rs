use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use pgpdecrypt_core::source::{KeyringSource, KeyringSourceError, KeyringStream};
use tracing::{debug, instrument};

/// Keyring stored in a file. The file is opened read-only on every request,
/// so a keyring created or replaced after construction is picked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileKeyringSource {
    path: PathBuf,
}

impl FileKeyringSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyringSource for FileKeyringSource {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn open(&self) -> Result<KeyringStream, KeyringSourceError> {
        let file = File::open(&self.path)
            .map_err(|err| KeyringSourceError::from_io(self.location(), err))?;

        // Opening a directory succeeds on some platforms; it is still not a keyring.
        let metadata = file
            .metadata()
            .map_err(|err| KeyringSourceError::from_io(self.location(), err))?;
        if !metadata.is_file() {
            return Err(KeyringSourceError::not_found(self.location()));
        }

        debug!(len = metadata.len(), "opened keyring file");
        Ok(Box::new(BufReader::new(file)))
    }

    fn location(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
