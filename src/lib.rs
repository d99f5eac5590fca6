pub mod config;
pub mod core;
pub mod script;

// Re-export commonly used items for convenience
pub use config::SchedulerConfig;
pub use core::*;
