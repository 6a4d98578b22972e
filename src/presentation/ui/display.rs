use colored::{Color, Colorize};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

use crate::domain::entities::execution::{ExecutionResult, ExecutionState, RunReport, Summary};
use crate::domain::entities::repository::{Repository, RepositoryStatus};

/// Display utilities for the CLI interface
#[derive(Debug, Clone, Copy)]
pub struct DisplayHelper {
    pub use_color: bool,
}

impl DisplayHelper {
    /// Create a new DisplayHelper
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "✗".red().bold(), message);
        } else {
            eprintln!("[ERROR] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "⚠".yellow().bold(), message);
        } else {
            eprintln!("[WARNING] {}", message);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.use_color {
            println!("{} {}", "✓".green().bold(), message);
        } else {
            println!("[SUCCESS] {}", message);
        }
    }

    /// Progress bar on stderr, fed one tick per finished repository.
    ///
    /// Hidden when stderr is not a terminal.
    pub fn create_progress_bar(&self, len: u64, message: &str) -> ProgressBar {
        if !std::io::stderr().is_terminal() {
            return ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::hidden());
        }

        let pb = ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.use_color {
            text.color(color).bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// `[success]`, `[failed]`, ... in the state's color
    pub fn format_state(&self, state: ExecutionState) -> String {
        let (label, color) = match state {
            ExecutionState::Success => ("success", Color::Green),
            ExecutionState::Failed => ("failed", Color::Red),
            ExecutionState::Cancelled => ("cancelled", Color::Yellow),
            ExecutionState::Timeout => ("timeout", Color::Magenta),
        };
        format!("[{}]", self.paint(label, color))
    }

    pub fn format_repository_status(&self, status: RepositoryStatus) -> String {
        match status {
            RepositoryStatus::Clean => self.paint("clean", Color::Green),
            RepositoryStatus::Modified => self.paint("modified", Color::Yellow),
            RepositoryStatus::Error => self.paint("error", Color::Red),
        }
    }

    /// Header line plus indented output for one command result
    pub fn format_result(&self, result: &ExecutionResult) -> String {
        let name = if self.use_color {
            result.repository.cyan().bold().to_string()
        } else {
            result.repository.clone()
        };
        let mut text = format!(
            "{} {} ({:.2}s)",
            self.format_state(result.state),
            name,
            result.duration.as_secs_f64()
        );

        if !result.is_success() {
            if let Some(message) = &result.error_message {
                text.push_str(&format!(": {}", message));
            }
        }
        for line in result.output.lines() {
            text.push_str("\n    ");
            text.push_str(line);
        }
        text
    }

    /// One line per repository: name, branch, state, change counts
    pub fn format_status_line(&self, repository: &Repository, result: &ExecutionResult) -> String {
        let branch = if repository.branch.is_empty() {
            "-".to_string()
        } else if self.use_color {
            repository.branch.green().to_string()
        } else {
            repository.branch.clone()
        };
        let mut line = format!(
            "{:<20} {:<24} {}",
            repository.name,
            branch,
            self.format_repository_status(repository.status)
        );

        match repository.status {
            RepositoryStatus::Modified => line.push_str(&format!(
                " +{} ~{} -{}",
                repository.created_files, repository.modified_files, repository.deleted_files
            )),
            RepositoryStatus::Error => {
                if let Some(message) = &result.error_message {
                    line.push_str(&format!(" ({})", message));
                }
            }
            RepositoryStatus::Clean => {}
        }
        line
    }

    /// Aggregate line printed after all results
    pub fn format_summary(&self, summary: &Summary) -> String {
        let timed_out = summary.timed_out_count();
        let mut text = format!(
            "{} repositories: {} succeeded, {} failed",
            summary.total_count,
            self.paint(&summary.successful_count.to_string(), Color::Green),
            self.paint(&summary.failed_count.to_string(), Color::Red),
        );
        if timed_out > 0 {
            text.push_str(&format!(" ({} timed out)", timed_out));
        }
        if summary.cancelled_count > 0 {
            text.push_str(&format!(
                ", {} cancelled",
                self.paint(&summary.cancelled_count.to_string(), Color::Yellow)
            ));
        }
        text.push_str(&format!(" in {:.2}s", summary.total_duration.as_secs_f64()));
        text
    }

    pub fn print_run_report(&self, report: &RunReport) {
        for result in &report.summary.results {
            println!("{}", self.format_result(result));
        }
        println!();
        println!("{}", self.format_summary(&report.summary));
    }

    pub fn print_status_report(&self, report: &RunReport) {
        for (repository, result) in report.entries() {
            println!("{}", self.format_status_line(repository, result));
        }
        println!();
        println!("{}", self.format_summary(&report.summary));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn plain() -> DisplayHelper {
        DisplayHelper::new(false)
    }

    #[test]
    fn test_format_result_indents_output() {
        let result = ExecutionResult::success(
            "web",
            "git pull",
            "Already up to date.\n".to_string(),
            Duration::from_millis(1250),
        );
        assert_eq!(
            plain().format_result(&result),
            "[success] web (1.25s)\n    Already up to date."
        );
    }

    #[test]
    fn test_format_result_shows_error_message() {
        let result =
            ExecutionResult::failure("api", "make", 2, "exited with status 2", Duration::ZERO);
        assert_eq!(
            plain().format_result(&result),
            "[failed] api (0.00s): exited with status 2"
        );
    }

    #[test]
    fn test_format_status_line() {
        let mut repository = Repository::new("web", "/nowhere");
        repository.is_valid = true;
        let repository = repository
            .with_file_changes(2, 1, 0)
            .with_branch("main");
        let result = ExecutionResult::success("web", "git status --porcelain", String::new(), Duration::ZERO);

        let line = plain().format_status_line(&repository, &result);
        assert!(line.starts_with("web"));
        assert!(line.contains("main"));
        assert!(line.ends_with("modified +2 ~1 -0"));
    }

    #[test]
    fn test_format_summary() {
        let summary = Summary {
            results: vec![
                ExecutionResult::success("a", "x", String::new(), Duration::ZERO),
                ExecutionResult::timeout("b", "x", Duration::ZERO),
                ExecutionResult::cancelled("c", "x", Duration::ZERO),
            ],
            total_count: 3,
            successful_count: 1,
            failed_count: 1,
            cancelled_count: 1,
            total_duration: Duration::from_millis(500),
            started_at: Utc::now(),
        };
        assert_eq!(
            plain().format_summary(&summary),
            "3 repositories: 1 succeeded, 1 failed (1 timed out), 1 cancelled in 0.50s"
        );
    }
}
