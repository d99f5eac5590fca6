//! # Collaborator contracts
//!
//! The scheduler never talks to a concrete synthesizer, voice service or
//! clock. It drives three traits and receives their answers back through its
//! intake methods:
//!
//! | Collaborator      | Request                      | Answer re-enters as                  |
//! |-------------------|------------------------------|--------------------------------------|
//! | [`SpeechEngine`]  | `speak`, `stop`              | `Scheduler::on_engine_event`         |
//! | [`VoiceSelector`] | `request_voice`              | `Scheduler::on_voice_resolved`       |
//! | [`DelayTimer`]    | `schedule`, `cancel`         | `Scheduler::on_delay_elapsed`        |
//!
//! None of the requests block. Implementations post their answers to whatever
//! loop owns the scheduler (see [`crate::core::service`]).

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::utterance::UtteranceId;

/// Engine-specific error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("Engine not ready: {0}")]
    NotReady(String),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// The parameters the engine is allowed to see
///
/// Scheduler metadata (category, callbacks, flags) never crosses this
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOptions {
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// One dispatch to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Correlation the engine must echo on every event for this request
    pub utterance_id: UtteranceId,
    pub text: String,
    pub options: SynthesisOptions,
}

/// Lifecycle signal kinds emitted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineEventKind {
    Start,
    End,
    Interrupted,
    Error,
}

impl fmt::Display for EngineEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineEventKind::Start => "start",
            EngineEventKind::End => "end",
            EngineEventKind::Interrupted => "interrupted",
            EngineEventKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// A lifecycle signal for one dispatched utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub utterance_id: UtteranceId,
    pub kind: EngineEventKind,
    /// Present on `Error` events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl EngineEvent {
    pub fn start(utterance_id: UtteranceId) -> Self {
        Self {
            utterance_id,
            kind: EngineEventKind::Start,
            message: None,
        }
    }

    pub fn end(utterance_id: UtteranceId) -> Self {
        Self {
            utterance_id,
            kind: EngineEventKind::End,
            message: None,
        }
    }

    pub fn interrupted(utterance_id: UtteranceId) -> Self {
        Self {
            utterance_id,
            kind: EngineEventKind::Interrupted,
            message: None,
        }
    }

    pub fn error(utterance_id: UtteranceId, message: impl Into<String>) -> Self {
        Self {
            utterance_id,
            kind: EngineEventKind::Error,
            message: Some(message.into()),
        }
    }
}

/// Speech synthesizer driven by the scheduler
///
/// A new `speak` supersedes anything the engine is still saying. For each
/// accepted request the engine emits at most one `Start` followed by exactly
/// one terminal event (`End`, `Interrupted` or `Error`), all tagged with the
/// request's `utterance_id`. `stop` silences the engine; the in-flight request,
/// if any, later surfaces an `Interrupted` event.
pub trait SpeechEngine: Send {
    /// Start speaking a request
    ///
    /// An `Err` means the request was never accepted and no events will
    /// follow for it.
    fn speak(&mut self, request: SynthesisRequest) -> EngineResult<()>;

    /// Silence the engine
    fn stop(&mut self);
}

/// Voice resolution requested by the scheduler
pub trait VoiceSelector: Send {
    /// Resolve a voice, preferring `preferred` when the engine offers it
    fn request_voice(&mut self, preferred: Option<&str>);
}

/// Identifies one scheduled delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// One-shot timer used for delayed (hint) utterances
pub trait DelayTimer: Send {
    /// Arrange for `token` to be delivered after `after`
    fn schedule(&mut self, token: TimerToken, after: Duration);

    /// Make sure `token` is never delivered
    fn cancel(&mut self, token: TimerToken);
}

/// The scheduler's outward-facing dependencies
pub struct Collaborators {
    pub engine: Box<dyn SpeechEngine>,
    pub voices: Box<dyn VoiceSelector>,
    pub timer: Box<dyn DelayTimer>,
}

impl Collaborators {
    pub fn new(
        engine: Box<dyn SpeechEngine>,
        voices: Box<dyn VoiceSelector>,
        timer: Box<dyn DelayTimer>,
    ) -> Self {
        Self {
            engine,
            voices,
            timer,
        }
    }
}
