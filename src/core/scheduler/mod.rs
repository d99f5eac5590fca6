//! # Scheduler
//!
//! The utterance state machine. [`Scheduler`] decides what is spoken next,
//! applies the cancellation policy for each queue mode, holds speech displaced
//! by interjections, and turns engine events into callbacks and observer
//! notifications.
//!
//! The scheduler is synchronous and single-owner. The runtime service in
//! [`crate::core::service`] gives it a tokio run loop; tests drive it directly.

pub mod errors;
pub mod manager;
pub mod state;


pub use errors::{SchedulerError, SchedulerResult};
pub use manager::{DEFAULT_MAX_CHUNK_CHARS, Scheduler, SchedulerOptions};
pub use state::{SchedulerSnapshot, SchedulerState, SpeakHandle};
