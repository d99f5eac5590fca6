//! Observable scheduler state

use std::fmt;

use serde::Serialize;

use crate::core::engine::EngineEventKind;
use crate::core::utterance::UtteranceId;

/// Where the dispatch state machine currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// Nothing dispatched and nothing blocking dispatch
    #[default]
    Idle,
    /// An utterance is with the engine
    Speaking,
    /// Pending speech is waiting for a voice
    AwaitingVoice,
    /// A delayed utterance is waiting for its timer
    AwaitingDelay,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Speaking => "speaking",
            SchedulerState::AwaitingVoice => "awaiting_voice",
            SchedulerState::AwaitingDelay => "awaiting_delay",
        };
        f.write_str(name)
    }
}

/// Point-in-time view of the scheduler's collections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerSnapshot {
    pub state: SchedulerState,
    pub current: Option<UtteranceId>,
    pub pending: Vec<UtteranceId>,
    pub displaced: Vec<UtteranceId>,
    pub voice: Option<String>,
    pub last_event: Option<EngineEventKind>,
}

impl SchedulerSnapshot {
    /// Every id held anywhere, current first
    pub fn all_ids(&self) -> Vec<UtteranceId> {
        self.current
            .iter()
            .chain(self.pending.iter())
            .chain(self.displaced.iter())
            .copied()
            .collect()
    }

    /// No speech is playing, queued or waiting to be restored
    pub fn is_drained(&self) -> bool {
        self.current.is_none() && self.pending.is_empty() && self.displaced.is_empty()
    }
}

/// Ids assigned to the utterances created by one `speak` call
///
/// Empty when the request resolved without entering the queue (blank text or
/// muted output). Oversized text yields one id per piece.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpeakHandle {
    ids: Vec<UtteranceId>,
}

impl SpeakHandle {
    pub(crate) fn new(ids: Vec<UtteranceId>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[UtteranceId] {
        &self.ids
    }

    pub fn is_queued(&self) -> bool {
        !self.ids.is_empty()
    }
}
