//! Built-in keyring sources (files, bundled resources) and the factories that
//! bind them to a `DecryptionConfig`.

pub mod factory;
pub mod file_source;
pub mod resource_source;
pub mod settings;

pub use factory::{
    default_gpg_home, with_keyrings_from_files, with_keyrings_from_gpg_home,
    with_keyrings_from_resources,
};
pub use file_source::FileKeyringSource;
pub use resource_source::{DirectoryLoader, EmbeddedLoader, ResourceKeyringSource, ResourceLoader};
pub use settings::{DecryptionSettings, PassphraseSetting, SettingsError};
