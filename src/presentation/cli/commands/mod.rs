pub mod add;
pub mod goto;
pub mod groups;
pub mod run;
pub mod status;

pub use add::AddCommand;
pub use goto::GotoCommand;
pub use groups::GroupsCommand;
pub use run::RunCommand;
pub use status::StatusCommand;

use std::path::PathBuf;

use crate::common::error::GitGroupError;
use crate::common::result::GitGroupResult;
use crate::infrastructure::filesystem::{ConfigStore, ConfigStoreError, GitGroupConfig};
use crate::presentation::ui::display::DisplayHelper;

/// State shared by every command handler of one invocation
pub struct CommandContext {
    pub config_path: PathBuf,
    pub json: bool,
    pub display: DisplayHelper,
    store: ConfigStore,
}

impl CommandContext {
    pub fn new(config_path: PathBuf, json: bool, display: DisplayHelper) -> Self {
        Self {
            config_path,
            json,
            display,
            store: ConfigStore::new(),
        }
    }

    /// Load the configuration; a missing file is an error
    pub fn load_config(&self) -> GitGroupResult<GitGroupConfig> {
        match self.store.read_config(&self.config_path) {
            Err(ConfigStoreError::ConfigFileNotFound(path)) => Err(GitGroupError::config_error(
                format!(
                    "no configuration at {} (register a repository with `gitgroup add`)",
                    path
                ),
                Some(self.config_path.clone()),
            )),
            other => Ok(other?),
        }
    }

    /// Load the configuration, or an empty one if the file does not exist yet
    pub fn load_or_default(&self) -> GitGroupResult<GitGroupConfig> {
        Ok(self.store.read_or_default(&self.config_path)?)
    }

    pub fn save_config(&self, config: &GitGroupConfig) -> GitGroupResult<()> {
        Ok(self.store.write_config(&self.config_path, config)?)
    }
}
