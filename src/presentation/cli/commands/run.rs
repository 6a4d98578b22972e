use anyhow::Result;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::CommandContext;
use crate::application::use_cases::resolve_groups::GroupResolver;
use crate::application::use_cases::run_command::{RunCommandConfig, RunCommandUseCase};
use crate::common::result::ResultExt;
use crate::domain::entities::execution::{ExecutionResult, RunReport};
use crate::domain::value_objects::command_spec::{CommandSpec, Operation};
use crate::domain::value_objects::concurrency_policy::ConcurrencyPolicy;
use crate::infrastructure::process::CommandExecutor;
use crate::presentation::cli::RunOptions;

/// Handler for `run` and the `@group <command>` shorthand
pub struct RunCommand {
    pub groups: Vec<String>,
    pub command: CommandSpec,
    pub options: RunOptions,
}

impl RunCommand {
    pub fn new(groups: Vec<String>, command: CommandSpec, options: RunOptions) -> Self {
        Self {
            groups,
            command,
            options,
        }
    }

    pub async fn execute(&self, context: &CommandContext) -> Result<i32> {
        let operation = Operation::Execute(self.command.clone());
        let report = run_batch(context, &self.groups, &operation, &self.options).await?;

        if context.json {
            let json = serde_json::to_string_pretty(&report.summary)
                .with_internal_error("failed to encode the summary")?;
            println!("{}", json);
        } else {
            context.display.print_run_report(&report);
        }

        Ok(exit_code(&report, self.options.allow_failure))
    }
}

/// Non-zero when something failed or was cancelled and failures are not allowed
pub fn exit_code(report: &RunReport, allow_failure: bool) -> i32 {
    if report.summary.should_fail(allow_failure) {
        1
    } else {
        0
    }
}

/// Resolve groups, then run `operation` in every target with a progress bar.
///
/// Ctrl-C cancels the run; tasks already finished keep their results.
pub(crate) async fn run_batch(
    context: &CommandContext,
    groups: &[String],
    operation: &Operation,
    options: &RunOptions,
) -> Result<RunReport> {
    let config = context.load_config()?;
    let registry = config.to_registry();
    let targets = GroupResolver::new(&registry).resolve(groups)?;

    let concurrency = options
        .jobs
        .map(ConcurrencyPolicy::from_limit)
        .unwrap_or_else(|| config.concurrency_policy());
    let timeout = options
        .timeout
        .map(Duration::from_secs)
        .or_else(|| config.timeout());

    let progress_bar = if context.json {
        ProgressBar::hidden()
    } else {
        context
            .display
            .create_progress_bar(targets.len() as u64, &operation.command_text())
    };
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let progress_task = tokio::spawn(track_progress(progress_bar.clone(), progress_rx));

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling remaining repositories");
                cancel.cancel();
            }
        })
    };

    let use_case = RunCommandUseCase::new(
        Arc::new(CommandExecutor::new()),
        RunCommandConfig::new()
            .with_timeout(timeout)
            .with_concurrency(concurrency)
            .with_progress(progress_tx),
    );
    let report = use_case.execute(targets, operation, &cancel).await;
    drop(use_case);

    interrupt.abort();
    let _ = progress_task.await;
    progress_bar.finish_and_clear();

    Ok(report)
}

async fn track_progress(bar: ProgressBar, mut rx: mpsc::UnboundedReceiver<ExecutionResult>) {
    while let Some(result) = rx.recv().await {
        bar.set_message(result.repository);
        bar.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::execution::Summary;
    use chrono::Utc;

    fn report_with(result: ExecutionResult) -> RunReport {
        let failed = usize::from(result.is_failure());
        let cancelled = usize::from(result.is_cancelled());
        RunReport {
            summary: Summary {
                successful_count: 1 - failed - cancelled,
                failed_count: failed,
                cancelled_count: cancelled,
                total_count: 1,
                results: vec![result],
                total_duration: Duration::ZERO,
                started_at: Utc::now(),
            },
            repositories: Vec::new(),
        }
    }

    #[test]
    fn test_exit_code() {
        let ok = report_with(ExecutionResult::success("a", "x", String::new(), Duration::ZERO));
        assert_eq!(exit_code(&ok, false), 0);

        let failed = report_with(ExecutionResult::failure("a", "x", 1, "boom", Duration::ZERO));
        assert_eq!(exit_code(&failed, false), 1);
        assert_eq!(exit_code(&failed, true), 0);

        let cancelled = report_with(ExecutionResult::cancelled("a", "x", Duration::ZERO));
        assert_eq!(exit_code(&cancelled, false), 1);
    }
}
