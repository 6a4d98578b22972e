//! # gitgroup - run one command across groups of git repositories
//!
//! `gitgroup` applies a single command (a git subcommand or any shell command)
//! to every repository in one or more named groups, runs those commands
//! concurrently, and reports one result per repository plus a summary.
//!
//! ## Quick Start
//!
//! 1. Register repositories and group them:
//!
//! ```bash
//! gitgroup add web ~/src/web -g frontend
//! gitgroup add api ~/src/api -g backend
//! ```
//!
//! 2. Run a command in some groups:
//!
//! ```bash
//! gitgroup run -g frontend -g backend -- git pull --rebase
//! gitgroup @frontend @backend git pull --rebase
//! ```
//!
//! 3. Check working tree state:
//!
//! ```bash
//! gitgroup status -g frontend
//! ```
//!
//! ## Architecture
//!
//! - [`domain`]: repositories, groups, execution results and command values
//! - [`application`]: group resolution, the status classifier and the run coordinator
//! - [`infrastructure`]: the JSON config store and the cancellable process runner
//! - [`presentation`]: CLI grammar and text rendering
//! - [`common`]: shared error handling
//!
//! ## Using the Library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gitgroup::application::use_cases::{GroupResolver, RunCommandConfig, RunCommandUseCase};
//! use gitgroup::domain::entities::registry::RepositoryRegistry;
//! use gitgroup::domain::value_objects::command_spec::{CommandSpec, Operation};
//! use gitgroup::infrastructure::process::CommandExecutor;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> gitgroup::Result<()> {
//! let registry = RepositoryRegistry::new()
//!     .with_repository("web", "/src/web")
//!     .with_group("frontend", vec!["web".to_string()]);
//! let targets = GroupResolver::new(&registry).resolve(&["frontend"])?;
//!
//! let use_case = RunCommandUseCase::new(Arc::new(CommandExecutor::new()), RunCommandConfig::new());
//! let operation = Operation::Execute(CommandSpec::git(&["fetch"]));
//! let report = use_case.execute(targets, &operation, &CancellationToken::new()).await;
//!
//! println!("{} of {} succeeded", report.summary.successful_count, report.summary.total_count);
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// Re-export commonly used types for convenience
pub use crate::common::error::GitGroupError;
pub use crate::common::result::GitGroupResult as Result;
