//! Simulated speech engine
//!
//! Stands in for a real synthesizer: each request "plays" for a duration
//! proportional to its length and the requested rate. Lifecycle events are
//! posted to the service like a real engine would, and every dispatch is
//! recorded in a shared transcript.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use super::engine::{
    EngineError, EngineEvent, EngineEventKind, EngineResult, SpeechEngine, SynthesisRequest,
};
use super::service::EngineEventSink;
use super::utterance::UtteranceId;

pub const DEFAULT_CHARS_PER_SECOND: f32 = 15.0;

/// One dispatched request and how it ended
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub utterance_id: UtteranceId,
    pub text: String,
    pub voice_name: Option<String>,
    /// `None` while still playing
    pub outcome: Option<EngineEventKind>,
}

/// Shared, append-only record of what the engine was asked to say
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Arc<Mutex<Vec<TranscriptEntry>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries.lock().clone()
    }

    /// Texts that played to the end
    pub fn completed(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.outcome == Some(EngineEventKind::End))
            .map(|entry| entry.text.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn push(&self, request: &SynthesisRequest) {
        self.entries.lock().push(TranscriptEntry {
            utterance_id: request.utterance_id,
            text: request.text.clone(),
            voice_name: request.options.voice_name.clone(),
            outcome: None,
        });
    }

    fn finish(&self, utterance_id: UtteranceId, outcome: EngineEventKind) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries
            .iter_mut()
            .rev()
            .find(|entry| entry.utterance_id == utterance_id && entry.outcome.is_none())
        {
            entry.outcome = Some(outcome);
        }
    }
}

struct InFlight {
    utterance_id: UtteranceId,
    task: JoinHandle<()>,
}

/// Engine that plays requests on tokio timers
pub struct SimulatedEngine {
    events: EngineEventSink,
    chars_per_second: f32,
    transcript: Transcript,
    in_flight: Option<InFlight>,
}

impl SimulatedEngine {
    pub fn new(events: EngineEventSink, chars_per_second: f32, transcript: Transcript) -> Self {
        Self {
            events,
            chars_per_second,
            transcript,
            in_flight: None,
        }
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }

    /// How long a request plays: its length over `chars_per_second * rate`
    pub fn duration_for(&self, request: &SynthesisRequest) -> Duration {
        let rate = if request.options.rate > 0.0 {
            request.options.rate
        } else {
            1.0
        };
        let speed = (self.chars_per_second * rate).max(f32::EPSILON);
        let chars = request.text.chars().count().max(1) as f32;
        Duration::from_secs_f32(chars / speed)
    }

    /// Cut off whatever is still playing
    fn interrupt_in_flight(&mut self) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        if in_flight.task.is_finished() {
            return;
        }
        in_flight.task.abort();
        debug!(utterance_id = %in_flight.utterance_id, "Simulated playback interrupted");
        self.transcript
            .finish(in_flight.utterance_id, EngineEventKind::Interrupted);
        self.events
            .send(EngineEvent::interrupted(in_flight.utterance_id));
    }
}

impl SpeechEngine for SimulatedEngine {
    fn speak(&mut self, request: SynthesisRequest) -> EngineResult<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| EngineError::NotReady(format!("no tokio runtime: {e}")))?;

        self.interrupt_in_flight();

        let duration = self.duration_for(&request);
        let utterance_id = request.utterance_id;
        self.transcript.push(&request);
        debug!(
            utterance_id = %utterance_id,
            duration_ms = duration.as_millis() as u64,
            "Simulated playback"
        );

        let events = self.events.clone();
        let transcript = self.transcript.clone();
        let task = runtime.spawn(async move {
            events.send(EngineEvent::start(utterance_id));
            tokio::time::sleep(duration).await;
            transcript.finish(utterance_id, EngineEventKind::End);
            events.send(EngineEvent::end(utterance_id));
        });

        self.in_flight = Some(InFlight { utterance_id, task });
        Ok(())
    }

    fn stop(&mut self) {
        self.interrupt_in_flight();
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
    }
}
