//! Recording collaborators
//!
//! Engine, voice selector and timer doubles that record every call into one
//! shared [`Calls`] value.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use speech_queue::{
    Collaborators, DelayTimer, EngineResult, Scheduler, SchedulerOptions, SpeechEngine,
    SynthesisRequest, TimerToken, UtteranceId, VoiceSelector, SYSTEM_VOICE,
};

#[derive(Default)]
pub struct Calls {
    pub spoken: Vec<SynthesisRequest>,
    pub stops: usize,
    pub voice_requests: Vec<Option<String>>,
    pub scheduled: Vec<(TimerToken, Duration)>,
    pub canceled: Vec<TimerToken>,
}

pub type SharedCalls = Arc<Mutex<Calls>>;

pub struct RecordingEngine(pub SharedCalls);

impl SpeechEngine for RecordingEngine {
    fn speak(&mut self, request: SynthesisRequest) -> EngineResult<()> {
        self.0.lock().spoken.push(request);
        Ok(())
    }

    fn stop(&mut self) {
        self.0.lock().stops += 1;
    }
}

pub struct RecordingVoices(pub SharedCalls);

impl VoiceSelector for RecordingVoices {
    fn request_voice(&mut self, preferred: Option<&str>) {
        self.0.lock().voice_requests.push(preferred.map(str::to_owned));
    }
}

pub struct RecordingTimer(pub SharedCalls);

impl DelayTimer for RecordingTimer {
    fn schedule(&mut self, token: TimerToken, after: Duration) {
        self.0.lock().scheduled.push((token, after));
    }

    fn cancel(&mut self, token: TimerToken) {
        self.0.lock().canceled.push(token);
    }
}

/// Scheduler over recording collaborators, voice not yet resolved
pub fn recording_scheduler(options: SchedulerOptions) -> (Scheduler, SharedCalls) {
    let calls = SharedCalls::default();
    let collaborators = Collaborators::new(
        Box::new(RecordingEngine(calls.clone())),
        Box::new(RecordingVoices(calls.clone())),
        Box::new(RecordingTimer(calls.clone())),
    );
    (Scheduler::new(options, collaborators), calls)
}

/// Scheduler over recording collaborators with the system voice resolved
pub fn ready_scheduler() -> (Scheduler, SharedCalls) {
    let (mut scheduler, calls) = recording_scheduler(SchedulerOptions::default());
    scheduler.on_voice_resolved(SYSTEM_VOICE);
    (scheduler, calls)
}

pub fn spoken_texts(calls: &SharedCalls) -> Vec<String> {
    calls.lock().spoken.iter().map(|r| r.text.clone()).collect()
}

pub fn spoken_ids(calls: &SharedCalls) -> Vec<UtteranceId> {
    calls.lock().spoken.iter().map(|r| r.utterance_id).collect()
}
