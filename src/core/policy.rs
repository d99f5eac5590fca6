//! Cancellation policy
//!
//! Decides whether an incoming utterance supersedes an existing one. The
//! scheduler applies it to the utterance being spoken and to every pending
//! entry when a pruning mode is submitted.

use super::utterance::{QueueMode, Utterance};

/// Whether `existing` must be canceled to make room for `incoming`
///
/// - nothing to cancel, or `existing` is marked do-not-interrupt: never
/// - `Queue`: never
/// - `Interject`: only other interjections
/// - `Flush`: always
/// - `CategoryFlush`: only when both categories are equal
///
/// A category flush without a category is rewritten to `Flush` before the
/// utterance is built, so two uncategorized utterances never reach the last
/// arm through the scheduler.
pub fn should_cancel(existing: Option<&Utterance>, incoming: &Utterance) -> bool {
    let Some(existing) = existing else {
        return false;
    };
    if !existing.is_interruptible() {
        return false;
    }

    match incoming.queue_mode() {
        QueueMode::Queue => false,
        QueueMode::Interject => existing.queue_mode() == QueueMode::Interject,
        QueueMode::Flush => true,
        QueueMode::CategoryFlush => existing.category() == incoming.category(),
    }
}
