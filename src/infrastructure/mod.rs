/// Infrastructure layer modules
///
/// Concrete implementations for external system interactions:
/// - File system operations (the JSON config file)
/// - Process execution (cancellable command runner)
pub mod filesystem;
pub mod process;

pub use filesystem::ConfigStore;
pub use process::CommandExecutor;
