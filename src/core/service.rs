//! # Speech service
//!
//! Runs a [`Scheduler`] on a tokio task. Every input (submissions, engine
//! events, voice resolutions, timer expiries) is a [`Command`] on a single
//! channel, so the scheduler is only ever touched by its own task.
//!
//! The loop handles one command, then everything already queued behind it
//! (the current tick), then the scheduler's deferred work. Work deferred by a
//! submission therefore runs after the rest of its tick but before any later
//! input.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::validation;

use super::engine::{
    Collaborators, DelayTimer, EngineEvent, SpeechEngine, TimerToken, VoiceSelector,
};
use super::observer::SpeechObserver;
use super::scheduler::{
    Scheduler, SchedulerError, SchedulerOptions, SchedulerResult, SchedulerSnapshot,
    SchedulerState, SpeakHandle,
};
use super::utterance::{QueueMode, SpeechProperties};
use super::voice::VoiceResolver;

/// Most commands handled in one tick before deferred work runs
const MAX_COMMANDS_PER_TICK: usize = 256;

/// Input to the service loop
pub enum Command {
    Speak {
        text: String,
        mode: QueueMode,
        properties: SpeechProperties,
        reply: Option<oneshot::Sender<SpeakHandle>>,
    },
    Stop,
    Engine(EngineEvent),
    VoiceResolved(String),
    DelayElapsed(TimerToken),
    AddObserver {
        observer: Arc<dyn SpeechObserver>,
        reply: oneshot::Sender<bool>,
    },
    RemoveObserver {
        observer: Arc<dyn SpeechObserver>,
        reply: oneshot::Sender<bool>,
    },
    SetRate(f32),
    SetPitch(f32),
    SetVolume(f32),
    SetPreferredVoice(Option<String>),
    ToggleSpeech {
        reply: oneshot::Sender<bool>,
    },
    Sync {
        reply: oneshot::Sender<SchedulerSnapshot>,
    },
    Shutdown,
}

/// Where engines post their lifecycle events
#[derive(Clone)]
pub struct EngineEventSink {
    commands: mpsc::UnboundedSender<Command>,
}

impl EngineEventSink {
    /// Post an event. Events sent after the service stopped are dropped.
    pub fn send(&self, event: EngineEvent) {
        if self.commands.send(Command::Engine(event)).is_err() {
            debug!("Speech service closed, dropping engine event");
        }
    }
}

/// Delay timer backed by tokio tasks
pub struct TokioDelayTimer {
    commands: mpsc::UnboundedSender<Command>,
    tasks: HashMap<TimerToken, JoinHandle<()>>,
}

impl TokioDelayTimer {
    pub fn new(commands: mpsc::UnboundedSender<Command>) -> Self {
        Self {
            commands,
            tasks: HashMap::new(),
        }
    }
}

impl DelayTimer for TokioDelayTimer {
    fn schedule(&mut self, token: TimerToken, after: Duration) {
        self.tasks.retain(|_, task| !task.is_finished());
        let commands = self.commands.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = commands.send(Command::DelayElapsed(token));
        });
        self.tasks.insert(token, task);
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(task) = self.tasks.remove(&token) {
            task.abort();
        }
    }
}

impl Drop for TokioDelayTimer {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

/// Voice selector that asks a [`VoiceResolver`] on a spawned task
///
/// A new request supersedes one still in flight.
pub struct ResolverVoiceSelector {
    resolver: Arc<dyn VoiceResolver>,
    commands: mpsc::UnboundedSender<Command>,
    in_flight: Option<JoinHandle<()>>,
}

impl ResolverVoiceSelector {
    pub fn new(resolver: Arc<dyn VoiceResolver>, commands: mpsc::UnboundedSender<Command>) -> Self {
        Self {
            resolver,
            commands,
            in_flight: None,
        }
    }
}

impl VoiceSelector for ResolverVoiceSelector {
    fn request_voice(&mut self, preferred: Option<&str>) {
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }
        let resolver = self.resolver.clone();
        let commands = self.commands.clone();
        let preferred = preferred.map(str::to_owned);
        self.in_flight = Some(tokio::spawn(async move {
            let voice = resolver.resolve(preferred.as_deref()).await;
            let _ = commands.send(Command::VoiceResolved(voice));
        }));
    }
}

impl Drop for ResolverVoiceSelector {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

/// A running scheduler loop
pub struct SpeechService {
    handle: SpeechHandle,
    task: JoinHandle<()>,
}

impl SpeechService {
    /// Spawn the loop on the current tokio runtime
    ///
    /// `make_engine` receives the sink the engine must post its events to.
    pub fn start<F, E>(
        options: SchedulerOptions,
        resolver: Arc<dyn VoiceResolver>,
        make_engine: F,
    ) -> Self
    where
        F: FnOnce(EngineEventSink) -> E,
        E: SpeechEngine + 'static,
    {
        let (commands, receiver) = mpsc::unbounded_channel();
        let engine = make_engine(EngineEventSink {
            commands: commands.clone(),
        });
        let collaborators = Collaborators::new(
            Box::new(engine),
            Box::new(ResolverVoiceSelector::new(resolver, commands.clone())),
            Box::new(TokioDelayTimer::new(commands.clone())),
        );

        let (status_tx, status_rx) = watch::channel(SchedulerSnapshot::default());
        let run_loop = RunLoop {
            scheduler: Scheduler::new(options, collaborators),
            receiver,
            status: status_tx,
        };
        let task = tokio::spawn(run_loop.run());
        info!("Speech service started");

        Self {
            handle: SpeechHandle {
                commands,
                status: status_rx,
            },
            task,
        }
    }

    pub fn handle(&self) -> SpeechHandle {
        self.handle.clone()
    }

    /// Stop all speech and wait for the loop to exit
    pub async fn shutdown(self) -> SchedulerResult<()> {
        let _ = self.handle.commands.send(Command::Shutdown);
        self.task
            .await
            .map_err(|e| SchedulerError::TaskFailed(e.to_string()))
    }
}

struct RunLoop {
    scheduler: Scheduler,
    receiver: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<SchedulerSnapshot>,
}

impl RunLoop {
    async fn run(mut self) {
        'ticks: while let Some(command) = self.receiver.recv().await {
            if !self.handle(command) {
                break;
            }
            for _ in 0..MAX_COMMANDS_PER_TICK {
                let Ok(command) = self.receiver.try_recv() else {
                    break;
                };
                if !self.handle(command) {
                    break 'ticks;
                }
            }
            if self.scheduler.run_deferred() > 0 {
                self.publish();
            }
        }

        self.scheduler.stop();
        self.publish();
        info!("Speech service stopped");
    }

    fn publish(&self) {
        self.status.send_replace(self.scheduler.snapshot());
    }

    /// Apply one command. Returns `false` on shutdown.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Speak {
                text,
                mode,
                properties,
                reply,
            } => {
                let handle = self.scheduler.speak(&text, mode, properties);
                self.publish();
                if let Some(reply) = reply {
                    let _ = reply.send(handle);
                }
                return true;
            }
            Command::Stop => self.scheduler.stop(),
            Command::Engine(event) => self.scheduler.on_engine_event(event),
            Command::VoiceResolved(voice) => self.scheduler.on_voice_resolved(voice),
            Command::DelayElapsed(token) => self.scheduler.on_delay_elapsed(token),
            Command::AddObserver { observer, reply } => {
                let _ = reply.send(self.scheduler.add_observer(observer));
            }
            Command::RemoveObserver { observer, reply } => {
                let _ = reply.send(self.scheduler.remove_observer(&observer));
            }
            Command::SetRate(rate) => self.scheduler.set_rate(rate),
            Command::SetPitch(pitch) => self.scheduler.set_pitch(pitch),
            Command::SetVolume(volume) => self.scheduler.set_volume(volume),
            Command::SetPreferredVoice(voice) => self.scheduler.set_preferred_voice(voice),
            Command::ToggleSpeech { reply } => {
                let _ = reply.send(self.scheduler.toggle_speech());
            }
            Command::Sync { reply } => {
                let snapshot = self.scheduler.snapshot();
                self.status.send_replace(snapshot.clone());
                let _ = reply.send(snapshot);
                return true;
            }
            Command::Shutdown => return false,
        }
        self.publish();
        true
    }
}

/// Cloneable front end to a running [`SpeechService`]
///
/// Submissions are applied in the order they are sent. `submit` and the
/// setters never wait, so they are safe to call from utterance callbacks and
/// observers.
#[derive(Clone)]
pub struct SpeechHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SchedulerSnapshot>,
}

impl SpeechHandle {
    fn send(&self, command: Command) -> SchedulerResult<()> {
        self.commands
            .send(command)
            .map_err(|_| SchedulerError::ServiceClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> SchedulerResult<T> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply))?;
        response.await.map_err(|_| SchedulerError::ReplyDropped)
    }

    /// Submit text and wait for the ids it was assigned
    pub async fn speak(
        &self,
        text: impl Into<String>,
        mode: QueueMode,
        properties: SpeechProperties,
    ) -> SchedulerResult<SpeakHandle> {
        let text = text.into();
        self.request(|reply| Command::Speak {
            text,
            mode,
            properties,
            reply: Some(reply),
        })
        .await
    }

    /// Submit text without waiting
    pub fn submit(
        &self,
        text: impl Into<String>,
        mode: QueueMode,
        properties: SpeechProperties,
    ) -> SchedulerResult<()> {
        self.send(Command::Speak {
            text: text.into(),
            mode,
            properties,
            reply: None,
        })
    }

    pub fn stop(&self) -> SchedulerResult<()> {
        self.send(Command::Stop)
    }

    /// Whether an utterance was with the engine as of the last applied command
    pub fn is_speaking(&self) -> bool {
        self.status.borrow().current.is_some()
    }

    pub fn state(&self) -> SchedulerState {
        self.status.borrow().state
    }

    /// Fresh snapshot, taken after every command sent before this call
    pub async fn snapshot(&self) -> SchedulerResult<SchedulerSnapshot> {
        self.request(|reply| Command::Sync { reply }).await
    }

    pub async fn add_observer(&self, observer: Arc<dyn SpeechObserver>) -> SchedulerResult<bool> {
        self.request(|reply| Command::AddObserver { observer, reply })
            .await
    }

    pub async fn remove_observer(
        &self,
        observer: &Arc<dyn SpeechObserver>,
    ) -> SchedulerResult<bool> {
        let observer = observer.clone();
        self.request(|reply| Command::RemoveObserver { observer, reply })
            .await
    }

    pub fn set_rate(&self, rate: f32) -> SchedulerResult<()> {
        validation::validate_rate(rate).map_err(SchedulerError::InvalidConfiguration)?;
        self.send(Command::SetRate(rate))
    }

    pub fn set_pitch(&self, pitch: f32) -> SchedulerResult<()> {
        validation::validate_pitch(pitch).map_err(SchedulerError::InvalidConfiguration)?;
        self.send(Command::SetPitch(pitch))
    }

    pub fn set_volume(&self, volume: f32) -> SchedulerResult<()> {
        validation::validate_volume(volume).map_err(SchedulerError::InvalidConfiguration)?;
        self.send(Command::SetVolume(volume))
    }

    pub fn set_preferred_voice(&self, voice: Option<String>) -> SchedulerResult<()> {
        self.send(Command::SetPreferredVoice(voice))
    }

    /// Turn speech on or off. Returns whether speech is now on.
    pub async fn toggle_speech(&self) -> SchedulerResult<bool> {
        self.request(|reply| Command::ToggleSpeech { reply }).await
    }

    /// Wait until nothing is speaking, queued, delayed or displaced
    ///
    /// Waits forever if queued speech never gets a voice.
    pub async fn wait_until_idle(&self) -> SchedulerResult<()> {
        // Make sure everything sent so far has been applied.
        self.snapshot().await?;
        let mut status = self.status.clone();
        status
            .wait_for(|snapshot| snapshot.state == SchedulerState::Idle && snapshot.is_drained())
            .await
            .map(|_| ())
            .map_err(|_| SchedulerError::ServiceClosed)
    }
}
