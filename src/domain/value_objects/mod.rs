pub mod command_spec;
pub mod concurrency_policy;
