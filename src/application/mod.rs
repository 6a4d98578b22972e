/// Application layer: the use cases that drive one invocation
pub mod services;
pub mod use_cases;
