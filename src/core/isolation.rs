//! Callback Isolation and Panic Safety
//!
//! Utterance callbacks and speech observers are caller code running inside the
//! scheduler's event handling. A panic in one of them is caught here, logged,
//! and turned into a [`CallbackError`] so the scheduler's queues stay
//! consistent and the remaining observers still get notified.
//!
//! `catch_unwind` only catches unwinding panics. A binary built with
//! `panic = "abort"` still aborts.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Failure of a single isolated callback invocation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    /// The callback panicked
    #[error("{context} callback panicked: {message}")]
    Panic { context: String, message: String },
}

/// Run a callback, converting a panic into a [`CallbackError`]
///
/// `context` names the callback in the log line and the error
/// (e.g. `"utterance end"`, `"observer on_start"`).
///
/// The closure is wrapped in `AssertUnwindSafe`: callbacks only touch state
/// they own or state behind their own synchronization, and the scheduler does
/// not read any of its own fields mid-callback.
///
/// # Example
///
/// ```
/// use speech_queue::core::isolation::call_callback_safely;
///
/// let result = call_callback_safely("demo", || 21 * 2);
/// assert_eq!(result.unwrap(), 42);
/// ```
pub fn call_callback_safely<F, T>(context: &str, callback: F) -> Result<T, CallbackError>
where
    F: FnOnce() -> T,
{
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(value) => Ok(value),
        Err(panic_info) => {
            let message = extract_panic_message(&panic_info);
            tracing::error!(context = context, message = %message, "Callback panicked");
            Err(CallbackError::Panic {
                context: context.to_string(),
                message,
            })
        }
    }
}

/// Extract a human-readable message from panic info
///
/// Handles the common payload types (`&str` and `String`) and falls back to a
/// generic message.
fn extract_panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic (non-string payload)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_callback_safely_success() {
        let result = call_callback_safely("test", || 42);
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn test_call_callback_safely_panic_str() {
        let result: Result<(), CallbackError> = call_callback_safely("observer on_end", || {
            panic!("test panic message");
        });
        match result {
            Err(CallbackError::Panic { context, message }) => {
                assert_eq!(context, "observer on_end");
                assert!(message.contains("test panic message"));
            }
            _ => panic!("Expected Panic error"),
        }
    }

    #[test]
    fn test_call_callback_safely_panic_string() {
        let result: Result<(), CallbackError> = call_callback_safely("test", || {
            panic!("{}", "dynamic panic message".to_string());
        });
        match result {
            Err(CallbackError::Panic { message, .. }) => {
                assert!(message.contains("dynamic panic message"))
            }
            _ => panic!("Expected Panic error"),
        }
    }

    #[test]
    fn test_mutable_capture_survives_panic() {
        let mut counter = 0;
        let _ = call_callback_safely("first", || {
            counter += 1;
        });
        let _ = call_callback_safely("second", || {
            panic!("boom");
        });
        let _ = call_callback_safely("third", || {
            counter += 1;
        });
        assert_eq!(counter, 2);
    }
}
