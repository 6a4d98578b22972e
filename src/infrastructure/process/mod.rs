pub mod command_executor;

pub use command_executor::{
    CommandExecutor,
    CommandExecutorError,
    ExecutionConfig,
    ExecutionContext,
    ProcessOutput,
    ProcessRunner,
    RunOutcome,
};
