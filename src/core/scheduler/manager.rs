//! Scheduler implementation

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::engine::{
    Collaborators, EngineEvent, EngineEventKind, SynthesisOptions, SynthesisRequest, TimerToken,
};
use crate::core::isolation::call_callback_safely;
use crate::core::observer::{EventDispatcher, SpeechEvent, SpeechObserver};
use crate::core::policy::should_cancel;
use crate::core::preferences::Preferences;
use crate::core::queue::QueueStore;
use crate::core::splitter::split_text;
use crate::core::utterance::{QueueMode, SpeechProperties, Utterance, UtteranceId};
use crate::core::voice::VoiceGate;

use super::state::{SchedulerSnapshot, SchedulerState, SpeakHandle};

/// Longest text handed to the engine in one request, in chars
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1500;

/// Construction parameters for [`Scheduler`]
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub max_chunk_chars: usize,
    pub preferences: Preferences,
    pub preferred_voice: Option<String>,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            preferences: Preferences::default(),
            preferred_voice: None,
        }
    }
}

/// Work posted during one tick and run after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredTask {
    /// Put speech displaced by an interjection back behind it
    RestoreInterjection,
    /// Second half of turning speech off
    MuteAndStop,
}

#[derive(Debug, Clone, Copy)]
struct PendingDelay {
    token: TimerToken,
    /// Head of the queue when the timer was started
    utterance_id: UtteranceId,
}

/// Utterance scheduler
///
/// Owns the queues and the currently speaking utterance. Every method runs
/// to completion without blocking; answers from the collaborators come back
/// through [`on_engine_event`](Self::on_engine_event),
/// [`on_voice_resolved`](Self::on_voice_resolved) and
/// [`on_delay_elapsed`](Self::on_delay_elapsed). Work posted with zero delay
/// is held until the owner calls [`run_deferred`](Self::run_deferred).
///
/// Callbacks run inside these methods and cannot reach the scheduler
/// directly. Submissions made from a callback go through the owning loop.
pub struct Scheduler {
    collaborators: Collaborators,
    queue: QueueStore,
    current: Option<Utterance>,
    voice: VoiceGate,
    preferences: Preferences,
    observers: EventDispatcher,
    delay: Option<PendingDelay>,
    next_timer_token: u64,
    deferred: VecDeque<DeferredTask>,
    max_chunk_chars: usize,
    last_event_kind: Option<EngineEventKind>,
    /// Set by an engine interruption; dispatch waits for the next submission
    silenced: bool,
}

impl Scheduler {
    /// Create a scheduler and ask for the initial voice
    ///
    /// Nothing is dispatched until [`on_voice_resolved`](Self::on_voice_resolved)
    /// has been called at least once.
    pub fn new(options: SchedulerOptions, mut collaborators: Collaborators) -> Self {
        let voice = VoiceGate::new(options.preferred_voice);
        collaborators.voices.request_voice(voice.lookup_hint());

        Self {
            collaborators,
            queue: QueueStore::new(),
            current: None,
            voice,
            preferences: options.preferences,
            observers: EventDispatcher::new(),
            delay: None,
            next_timer_token: 0,
            deferred: VecDeque::new(),
            max_chunk_chars: options.max_chunk_chars.max(1),
            last_event_kind: None,
            silenced: false,
        }
    }

    /// Submit text for speaking
    ///
    /// Pitch, rate and volume left unset are filled from the current
    /// preferences. Blank text and muted output resolve the callbacks
    /// immediately and queue nothing. Text longer than the chunk limit is
    /// split; the first piece keeps `mode` and the rest queue behind it.
    pub fn speak(
        &mut self,
        text: &str,
        mode: QueueMode,
        mut properties: SpeechProperties,
    ) -> SpeakHandle {
        if self.preferences.is_muted() {
            debug!(mode = ?mode, "Output muted, resolving request without speaking");
            resolve_immediately(properties);
            return SpeakHandle::default();
        }

        let hint = properties.phonetic_hint.take();
        let mut ids = Vec::new();

        if text.chars().count() > self.max_chunk_chars {
            let pieces: Vec<&str> = split_text(text, self.max_chunk_chars).collect();
            debug!(pieces = pieces.len(), "Splitting oversized text");
            let mut piece_mode = mode;
            for piece in pieces {
                ids.extend(self.speak_piece(piece, piece_mode, properties.clone()));
                piece_mode = QueueMode::Queue;
            }
        } else {
            ids.extend(self.speak_piece(text, mode, properties.clone()));
        }

        if let Some(hint) = hint
            && !ids.is_empty()
        {
            let hint_properties = properties.detached().delayed();
            ids.extend(self.speak_piece(&hint, QueueMode::Queue, hint_properties));
        }

        SpeakHandle::new(ids)
    }

    fn speak_piece(
        &mut self,
        text: &str,
        mode: QueueMode,
        mut properties: SpeechProperties,
    ) -> Option<UtteranceId> {
        if is_blank(text) {
            resolve_immediately(properties);
            if mode == QueueMode::Flush {
                self.stop();
            }
            return None;
        }

        properties.pitch.get_or_insert(self.preferences.pitch);
        properties.rate.get_or_insert(self.preferences.rate);
        properties.volume.get_or_insert(self.preferences.volume);

        let mode = if mode == QueueMode::CategoryFlush && properties.category.is_none() {
            QueueMode::Flush
        } else {
            mode
        };

        let utterance = Utterance::new(text, mode, properties);
        let id = utterance.id();
        debug!(utterance_id = %id, mode = ?mode, "Utterance submitted");
        self.speak_using_queue(utterance);
        Some(id)
    }

    fn speak_using_queue(&mut self, utterance: Utterance) {
        let mode = utterance.queue_mode();
        self.silenced = false;

        if mode.prunes() {
            if should_cancel(self.current.as_ref(), &utterance)
                && let Some(mut canceled) = self.current.take()
            {
                debug!(utterance_id = %canceled.id(), "Canceling current utterance");
                canceled.fire_end(true);
                self.collaborators.engine.stop();
            }

            let canceled = self
                .queue
                .remove_pending_where(|existing| should_cancel(Some(existing), &utterance));
            for mut canceled in canceled {
                debug!(utterance_id = %canceled.id(), "Canceling pending utterance");
                canceled.fire_end(true);
            }
        }

        if mode == QueueMode::Interject {
            let interrupted = self.current.take();
            if interrupted.is_some() {
                self.collaborators.engine.stop();
            }
            self.queue.displace_for_interjection(interrupted, utterance);
            self.deferred.push_back(DeferredTask::RestoreInterjection);
        } else {
            self.queue.push(utterance);
        }

        self.reconcile_delay();
        self.try_dispatch();
    }

    /// Dispatch the head of the queue if nothing is speaking
    fn try_dispatch(&mut self) {
        loop {
            if self.current.is_some() || self.delay.is_some() || self.silenced {
                return;
            }
            let Some(head) = self.queue.front_mut() else {
                return;
            };
            if !self.voice.is_ready() {
                debug!("Dispatch waiting for a voice");
                return;
            }

            if head.properties.delay {
                head.properties.delay = false;
                let utterance_id = head.id();
                self.start_delay(utterance_id);
                return;
            }

            let Some(utterance) = self.queue.pop_front() else {
                return;
            };
            let request = self.synthesis_request(&utterance);
            let utterance_id = utterance.id();
            self.current = Some(utterance);

            match self.collaborators.engine.speak(request) {
                Ok(()) => {
                    debug!(utterance_id = %utterance_id, "Utterance dispatched");
                    return;
                }
                Err(e) => {
                    // Nothing will come back for this request; move on to the next one.
                    warn!(utterance_id = %utterance_id, error = %e, "Engine rejected utterance");
                    self.recover_from_error();
                }
            }
        }
    }

    fn synthesis_request(&self, utterance: &Utterance) -> SynthesisRequest {
        let properties = utterance.properties();
        let voice_name = properties
            .voice_name
            .clone()
            .or_else(|| self.voice.transmitted_name().map(str::to_owned));

        SynthesisRequest {
            utterance_id: utterance.id(),
            text: utterance.text().to_string(),
            options: SynthesisOptions {
                pitch: properties.pitch.unwrap_or(self.preferences.pitch),
                rate: properties.rate.unwrap_or(self.preferences.rate),
                volume: properties.volume.unwrap_or(self.preferences.volume),
                voice_name,
                language: properties.language.clone(),
            },
        }
    }

    fn start_delay(&mut self, utterance_id: UtteranceId) {
        self.next_timer_token += 1;
        let token = TimerToken(self.next_timer_token);
        let after = self.preferences.hint_delay();
        debug!(
            utterance_id = %utterance_id,
            delay_ms = after.as_millis() as u64,
            "Delaying utterance"
        );
        self.collaborators.timer.schedule(token, after);
        self.delay = Some(PendingDelay {
            token,
            utterance_id,
        });
    }

    fn clear_delay(&mut self) {
        if let Some(delay) = self.delay.take() {
            self.collaborators.timer.cancel(delay.token);
        }
    }

    /// Drop the delay once the utterance it was started for is no longer next
    fn reconcile_delay(&mut self) {
        if let Some(delay) = self.delay
            && self.queue.front().map(Utterance::id) != Some(delay.utterance_id)
        {
            debug!(
                utterance_id = %delay.utterance_id,
                "Delayed utterance left the head of the queue"
            );
            self.clear_delay();
        }
    }

    /// Ask the voice selector for the preferred (or current) voice again
    fn request_voice(&mut self) {
        self.collaborators
            .voices
            .request_voice(self.voice.lookup_hint());
    }

    /// The current utterance failed: re-resolve the voice and let it go
    fn recover_from_error(&mut self) {
        self.request_voice();
        if let Some(mut failed) = self.current.take() {
            failed.fire_end(true);
        }
    }

    /// Feed a lifecycle event from the engine
    ///
    /// Events for anything but the current utterance are recorded and
    /// otherwise ignored.
    pub fn on_engine_event(&mut self, event: EngineEvent) {
        self.last_event_kind = Some(event.kind);

        let is_current = self
            .current
            .as_ref()
            .is_some_and(|current| current.id() == event.utterance_id);
        if !is_current {
            debug!(
                utterance_id = %event.utterance_id,
                kind = %event.kind,
                "Ignoring stale engine event"
            );
            return;
        }

        match event.kind {
            EngineEventKind::Start => {
                self.observers.notify(SpeechEvent::Start);
                if let Some(current) = self.current.as_mut() {
                    current.fire_start();
                }
            }
            EngineEventKind::End => {
                let finished = self.current.take();
                self.observers.notify(SpeechEvent::End);
                if let Some(mut finished) = finished {
                    finished.fire_end(false);
                }
                self.try_dispatch();
            }
            EngineEventKind::Interrupted => {
                if let Some(mut interrupted) = self.current.take() {
                    interrupted.fire_end(true);
                }
                for mut canceled in self.queue.drain_pending() {
                    canceled.fire_end(true);
                }
                self.clear_delay();
                self.silenced = true;
                self.observers.notify(SpeechEvent::Interrupted);
            }
            EngineEventKind::Error => {
                warn!(
                    utterance_id = %event.utterance_id,
                    message = event.message.as_deref().unwrap_or("unknown"),
                    "Speech engine error"
                );
                self.recover_from_error();
                self.try_dispatch();
            }
        }
    }

    /// Record the voice the selector settled on and dispatch if possible
    pub fn on_voice_resolved(&mut self, voice_name: impl Into<String>) {
        let voice_name = voice_name.into();
        info!(voice = %voice_name, "Voice resolved");
        self.voice.resolve(voice_name);
        self.try_dispatch();
    }

    /// Timer expiry for a delayed utterance. Stale tokens are ignored.
    pub fn on_delay_elapsed(&mut self, token: TimerToken) {
        match self.delay {
            Some(delay) if delay.token == token => {
                self.delay = None;
                self.try_dispatch();
            }
            _ => debug!(token = token.0, "Ignoring stale delay"),
        }
    }

    /// Cancel everything and silence the engine
    pub fn stop(&mut self) {
        if let Some(mut current) = self.current.take() {
            current.fire_end(true);
        }
        for mut canceled in self.queue.drain_pending() {
            canceled.fire_end(true);
        }
        for mut canceled in self.queue.drain_displaced() {
            canceled.fire_end(true);
        }
        self.clear_delay();
        self.collaborators.engine.stop();
        self.observers.notify(SpeechEvent::Interrupted);
    }

    /// Run work posted during the current tick. Returns how many tasks ran.
    pub fn run_deferred(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.deferred.pop_front() {
            ran += 1;
            match task {
                DeferredTask::RestoreInterjection => {
                    let restored = self.queue.restore_displaced();
                    debug!(restored, "Restored speech displaced by interjection");
                    self.reconcile_delay();
                    self.try_dispatch();
                }
                DeferredTask::MuteAndStop => {
                    self.preferences.volume = 0.0;
                    self.stop();
                }
            }
        }
        ran
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Turn speech on or off. Returns whether speech is now on.
    ///
    /// Turning on takes effect immediately. Turning off waits until the
    /// deferred work runs, so speech submitted in the same tick still starts.
    pub fn toggle_speech(&mut self) -> bool {
        if self.preferences.is_muted() {
            self.preferences.volume = 1.0;
            info!("Speech turned on");
            true
        } else {
            self.deferred.push_back(DeferredTask::MuteAndStop);
            info!("Speech turning off");
            false
        }
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.preferences.rate = rate;
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.preferences.pitch = pitch;
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.preferences.volume = volume;
    }

    /// Change the preferred voice and resolve again
    pub fn set_preferred_voice(&mut self, voice_name: Option<String>) {
        self.voice.set_preferred(voice_name);
        self.request_voice();
    }

    pub fn add_observer(&mut self, observer: Arc<dyn SpeechObserver>) -> bool {
        self.observers.add(observer)
    }

    pub fn remove_observer(&mut self, observer: &Arc<dyn SpeechObserver>) -> bool {
        self.observers.remove(observer)
    }

    pub fn is_speaking(&self) -> bool {
        self.current.is_some()
    }

    pub fn state(&self) -> SchedulerState {
        if self.current.is_some() {
            SchedulerState::Speaking
        } else if self.delay.is_some() {
            SchedulerState::AwaitingDelay
        } else if !self.queue.is_empty() && !self.voice.is_ready() {
            SchedulerState::AwaitingVoice
        } else {
            SchedulerState::Idle
        }
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            state: self.state(),
            current: self.current.as_ref().map(Utterance::id),
            pending: self.queue.pending_ids(),
            displaced: self.queue.displaced_ids(),
            voice: self.voice.current().map(str::to_owned),
            last_event: self.last_event_kind,
        }
    }

    pub fn current(&self) -> Option<&Utterance> {
        self.current.as_ref()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Utterance> {
        self.queue.pending()
    }

    pub fn displaced(&self) -> impl Iterator<Item = &Utterance> {
        self.queue.displaced()
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    pub fn current_voice(&self) -> Option<&str> {
        self.voice.current()
    }

    pub fn last_event_kind(&self) -> Option<EngineEventKind> {
        self.last_event_kind
    }

    pub fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// Fire the callbacks of a request that never enters the queue
fn resolve_immediately(mut properties: SpeechProperties) {
    if let Some(on_start) = properties.on_start.take() {
        let _ = call_callback_safely("utterance start", || on_start());
    }
    if let Some(on_end) = properties.on_end.take() {
        let _ = call_callback_safely("utterance end", || on_end(false));
    }
}
