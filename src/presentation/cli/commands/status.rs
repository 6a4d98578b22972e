use anyhow::Result;

use super::run::{exit_code, run_batch};
use super::CommandContext;
use crate::common::result::ResultExt;
use crate::domain::value_objects::command_spec::Operation;
use crate::presentation::cli::RunOptions;

/// Handler for the status command
pub struct StatusCommand {
    pub groups: Vec<String>,
    pub options: RunOptions,
}

impl StatusCommand {
    pub fn new(groups: Vec<String>, options: RunOptions) -> Self {
        Self { groups, options }
    }

    pub async fn execute(&self, context: &CommandContext) -> Result<i32> {
        let report = run_batch(context, &self.groups, &Operation::Status, &self.options).await?;

        if context.json {
            let json = serde_json::to_string_pretty(&report)
                .with_internal_error("failed to encode the report")?;
            println!("{}", json);
        } else {
            context.display.print_status_report(&report);
        }

        Ok(exit_code(&report, self.options.allow_failure))
    }
}
