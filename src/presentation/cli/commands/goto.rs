use anyhow::Result;

use super::CommandContext;
use crate::common::error::GitGroupError;
use crate::common::result::OptionExt;
use crate::domain::entities::registry::RepositoryCatalog;

/// Handler for the goto command
///
/// Prints the absolute path only, so the output can be fed to `cd`.
pub struct GotoCommand {
    pub repository: String,
}

impl GotoCommand {
    pub fn new(repository: String) -> Self {
        Self { repository }
    }

    pub fn execute(&self, context: &CommandContext) -> Result<i32> {
        let registry = context.load_config()?.to_registry();
        let path = registry
            .repository_path(&self.repository)
            .ok_or_gitgroup(GitGroupError::config_error(
                format!("Repository not found: {}", self.repository),
                Some(context.config_path.clone()),
            ))?;

        if context.json {
            println!(
                "{}",
                serde_json::json!({ "repository": self.repository, "path": path })
            );
        } else {
            println!("{}", path.display());
        }
        Ok(0)
    }
}
