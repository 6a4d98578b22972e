pub mod resolve_groups;
pub mod run_command;
pub mod status_check;

pub use resolve_groups::GroupResolver;
pub use run_command::{RunCommandConfig, RunCommandUseCase};
pub use status_check::{parse_porcelain, FileChangeCounts, StatusClassifier};
