use std::{
    collections::HashMap,
    fmt,
    fs::File,
    io::{BufReader, Cursor},
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use pgpdecrypt_core::source::{KeyringSource, KeyringSourceError, KeyringStream};
use tracing::{debug, instrument};

/// Resolves logical resource names (e.g. `recipient.gpg.d/secring.gpg`) to streams.
pub trait ResourceLoader: Send + Sync {
    /// Open a fresh stream for `name`, or fail with `NotFound` if it does not resolve.
    fn open_resource(&self, name: &str) -> Result<KeyringStream, KeyringSourceError>;
}

/// Keyring looked up by name through a [`ResourceLoader`] at every request.
#[derive(Clone)]
pub struct ResourceKeyringSource {
    loader: Arc<dyn ResourceLoader>,
    name: String,
}

impl ResourceKeyringSource {
    pub fn new(loader: Arc<dyn ResourceLoader>, name: impl Into<String>) -> Self {
        Self {
            loader,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl KeyringSource for ResourceKeyringSource {
    #[instrument(skip_all, fields(name = %self.name))]
    fn open(&self) -> Result<KeyringStream, KeyringSourceError> {
        self.loader.open_resource(&self.name)
    }

    fn location(&self) -> String {
        resource_location(&self.name)
    }
}

impl fmt::Debug for ResourceKeyringSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceKeyringSource")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn resource_location(name: &str) -> String {
    format!("resource:{name}")
}

/// Resolves names as `/`-separated paths below a resource root directory.
///
/// Names that are absolute, step outside the root, or lead outside it through
/// a symlink do not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let contained = !name.is_empty()
            && !name.contains('\\')
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        contained.then(|| self.root.join(relative))
    }
}

impl ResourceLoader for DirectoryLoader {
    fn open_resource(&self, name: &str) -> Result<KeyringStream, KeyringSourceError> {
        let location = resource_location(name);
        let path = self
            .resolve(name)
            .ok_or_else(|| KeyringSourceError::not_found(&location))?;

        // Symlinks inside the root must not lead outside it.
        let root = self
            .root
            .canonicalize()
            .map_err(|err| KeyringSourceError::from_io(&location, err))?;
        let path = path
            .canonicalize()
            .map_err(|err| KeyringSourceError::from_io(&location, err))?;
        if !path.starts_with(&root) {
            return Err(KeyringSourceError::not_found(location));
        }

        let file = File::open(&path).map_err(|err| KeyringSourceError::from_io(&location, err))?;
        let metadata = file
            .metadata()
            .map_err(|err| KeyringSourceError::from_io(&location, err))?;
        if !metadata.is_file() {
            return Err(KeyringSourceError::not_found(location));
        }

        debug!(path = %path.display(), "resolved resource");
        Ok(Box::new(BufReader::new(file)))
    }
}

/// In-memory bundle of named keyrings, typically filled from `include_bytes!`.
#[derive(Debug, Default, Clone)]
pub struct EmbeddedLoader {
    resources: HashMap<String, Arc<[u8]>>,
}

impl EmbeddedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a named resource.
    pub fn with_resource(mut self, name: impl Into<String>, bytes: impl AsRef<[u8]>) -> Self {
        self.resources.insert(name.into(), Arc::from(bytes.as_ref()));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }
}

impl ResourceLoader for EmbeddedLoader {
    fn open_resource(&self, name: &str) -> Result<KeyringStream, KeyringSourceError> {
        let bytes = self
            .resources
            .get(name)
            .cloned()
            .ok_or_else(|| KeyringSourceError::not_found(resource_location(name)))?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}
