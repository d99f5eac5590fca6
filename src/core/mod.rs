pub mod engine;
pub mod isolation;
pub mod observer;
pub mod policy;
pub mod preferences;
pub mod queue;
pub mod scheduler;
pub mod service;
pub mod simulated;
pub mod splitter;
pub mod utterance;
pub mod voice;

// Re-export commonly used types for convenience
pub use engine::{
    Collaborators, DelayTimer, EngineError, EngineEvent, EngineEventKind, EngineResult,
    SpeechEngine, SynthesisOptions, SynthesisRequest, TimerToken, VoiceSelector,
};

pub use isolation::CallbackError;

pub use observer::{EventDispatcher, LoggingObserver, SpeechEvent, SpeechObserver};

pub use preferences::Preferences;

pub use scheduler::{
    Scheduler, SchedulerError, SchedulerOptions, SchedulerResult, SchedulerSnapshot,
    SchedulerState, SpeakHandle,
};

pub use service::{EngineEventSink, SpeechHandle, SpeechService};

pub use simulated::{SimulatedEngine, Transcript, TranscriptEntry};

pub use utterance::{
    EndCallback, QueueMode, SpeechProperties, StartCallback, Utterance, UtteranceId,
};

pub use voice::{SYSTEM_VOICE, StaticVoiceResolver, VoiceResolver};
