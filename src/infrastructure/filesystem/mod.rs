pub mod config_store;

pub use config_store::{ConfigStore, ConfigStoreError, GitGroupConfig, RepositoryEntry, Settings};
