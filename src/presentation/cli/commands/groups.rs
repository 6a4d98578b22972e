use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use crate::common::result::ResultExt;

/// Handler for the groups command
pub struct GroupsCommand;

impl GroupsCommand {
    pub fn execute(&self, context: &CommandContext) -> Result<i32> {
        let registry = context.load_or_default()?.to_registry();
        let groups: Vec<_> = registry.groups().collect();

        if context.json {
            let json = serde_json::to_string_pretty(&groups)
                .with_internal_error("failed to encode groups")?;
            println!("{}", json);
            return Ok(0);
        }

        if groups.is_empty() {
            println!("No groups defined in {}", context.config_path.display());
            return Ok(0);
        }

        for group in groups {
            let label = if context.display.use_color {
                group.name.bold().to_string()
            } else {
                group.name.clone()
            };
            if group.is_empty() {
                println!("{}: (empty)", label);
            } else {
                println!("{}: {}", label, group.members.join(", "));
            }
        }
        Ok(0)
    }
}
