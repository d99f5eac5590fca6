//! Error types for scheduler operations

/// Error types for scheduler and service operations
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Speech service is closed")]
    ServiceClosed,
    #[error("Speech service dropped the reply")]
    ReplyDropped,
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Speech service task failed: {0}")]
    TaskFailed(String),
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
