//! # Utterance
//!
//! The request record the scheduler moves between its queues. Text, mode and
//! parameters are fixed at submission; the lifecycle callbacks are taken out
//! of the record the first time they fire so they can never fire twice.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::isolation::call_callback_safely;

/// Process-wide source of utterance ids. Ids are never reused.
static NEXT_UTTERANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier correlating an utterance with the events the engine emits for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtteranceId(u64);

impl UtteranceId {
    /// Allocate the next id
    pub fn next() -> Self {
        Self(NEXT_UTTERANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a new utterance interacts with speech that is already queued or playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueMode {
    /// Append behind everything else
    Queue,
    /// Cancel everything (except non-interruptible speech) and speak now
    Flush,
    /// Cancel only speech sharing the new utterance's category
    CategoryFlush,
    /// Speak now, then resume the displaced speech
    Interject,
}

impl QueueMode {
    /// Whether this mode prunes existing speech before enqueueing
    pub fn prunes(self) -> bool {
        !matches!(self, QueueMode::Queue)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueueMode::Queue => "queue",
            QueueMode::Flush => "flush",
            QueueMode::CategoryFlush => "category_flush",
            QueueMode::Interject => "interject",
        }
    }
}

impl fmt::Display for QueueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueueMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queue" => Ok(QueueMode::Queue),
            "flush" => Ok(QueueMode::Flush),
            "category_flush" | "category-flush" => Ok(QueueMode::CategoryFlush),
            "interject" => Ok(QueueMode::Interject),
            other => Err(format!(
                "Unknown queue mode: {other}. Expected one of: queue, flush, category_flush, interject"
            )),
        }
    }
}

/// Called when the engine starts speaking an utterance
pub type StartCallback = Arc<dyn Fn() + Send + Sync>;

/// Called once when an utterance leaves the scheduler.
/// The argument is `true` when the utterance was canceled or interrupted
/// rather than spoken to completion.
pub type EndCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Per-request speech parameters
///
/// Only `pitch`, `rate`, `volume`, `voice_name` and `language` are ever
/// transmitted to the synthesis engine. Everything else is scheduler metadata.
#[derive(Clone, Default)]
pub struct SpeechProperties {
    /// Pitch override; the current preference is used when absent
    pub pitch: Option<f32>,
    /// Rate override; the current preference is used when absent
    pub rate: Option<f32>,
    /// Volume override; the current preference is used when absent
    pub volume: Option<f32>,
    pub voice_name: Option<String>,
    pub language: Option<String>,
    /// Scope for `QueueMode::CategoryFlush`
    pub category: Option<String>,
    /// Survive every flush and interjection
    pub do_not_interrupt: bool,
    /// Wait for the hint delay before this utterance is dispatched
    pub delay: bool,
    /// Text queued with `delay` right after this utterance
    pub phonetic_hint: Option<String>,
    pub on_start: Option<StartCallback>,
    pub on_end: Option<EndCallback>,
}

impl SpeechProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_voice(mut self, voice_name: impl Into<String>) -> Self {
        self.voice_name = Some(voice_name.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn do_not_interrupt(mut self) -> Self {
        self.do_not_interrupt = true;
        self
    }

    pub fn delayed(mut self) -> Self {
        self.delay = true;
        self
    }

    pub fn with_phonetic_hint(mut self, hint: impl Into<String>) -> Self {
        self.phonetic_hint = Some(hint.into());
        self
    }

    pub fn on_start<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_start = Some(Arc::new(callback));
        self
    }

    pub fn on_end<F>(mut self, callback: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.on_end = Some(Arc::new(callback));
        self
    }

    /// Copy of these properties without callbacks or a hint
    pub(crate) fn detached(&self) -> Self {
        Self {
            on_start: None,
            on_end: None,
            phonetic_hint: None,
            ..self.clone()
        }
    }
}

impl fmt::Debug for SpeechProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechProperties")
            .field("pitch", &self.pitch)
            .field("rate", &self.rate)
            .field("volume", &self.volume)
            .field("voice_name", &self.voice_name)
            .field("language", &self.language)
            .field("category", &self.category)
            .field("do_not_interrupt", &self.do_not_interrupt)
            .field("delay", &self.delay)
            .field("phonetic_hint", &self.phonetic_hint)
            .field("on_start", &self.on_start.is_some())
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}

/// A queued speech request
pub struct Utterance {
    id: UtteranceId,
    text: String,
    pub(crate) queue_mode: QueueMode,
    pub(crate) properties: SpeechProperties,
}

impl Utterance {
    pub fn new(
        text: impl Into<String>,
        queue_mode: QueueMode,
        properties: SpeechProperties,
    ) -> Self {
        Self {
            id: UtteranceId::next(),
            text: text.into(),
            queue_mode,
            properties,
        }
    }

    pub fn id(&self) -> UtteranceId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn queue_mode(&self) -> QueueMode {
        self.queue_mode
    }

    pub fn properties(&self) -> &SpeechProperties {
        &self.properties
    }

    pub fn category(&self) -> Option<&str> {
        self.properties.category.as_deref()
    }

    pub fn is_interruptible(&self) -> bool {
        !self.properties.do_not_interrupt
    }

    /// Fire the start callback. Later calls are no-ops.
    pub(crate) fn fire_start(&mut self) {
        if let Some(callback) = self.properties.on_start.take() {
            let _ = call_callback_safely("utterance start", || callback());
        }
    }

    /// Fire the terminal callback. Later calls are no-ops.
    pub(crate) fn fire_end(&mut self, interrupted: bool) {
        // A start that never happened must not fire after the end.
        self.properties.on_start = None;
        if let Some(callback) = self.properties.on_end.take() {
            let _ = call_callback_safely("utterance end", || callback(interrupted));
        }
    }
}

impl fmt::Debug for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utterance")
            .field("id", &self.id)
            .field("text", &self.text)
            .field("queue_mode", &self.queue_mode)
            .field("properties", &self.properties)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_ids_are_monotonic() {
        let a = Utterance::new("a", QueueMode::Queue, SpeechProperties::new());
        let b = Utterance::new("b", QueueMode::Queue, SpeechProperties::new());
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_queue_mode_from_str() {
        assert_eq!("flush".parse::<QueueMode>().unwrap(), QueueMode::Flush);
        assert_eq!(
            "Category-Flush".parse::<QueueMode>().unwrap(),
            QueueMode::CategoryFlush
        );
        assert!("shout".parse::<QueueMode>().is_err());
    }

    #[test]
    fn test_end_callback_fires_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let mut utterance = Utterance::new(
            "hello",
            QueueMode::Queue,
            SpeechProperties::new().on_end(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        utterance.fire_end(true);
        utterance.fire_end(false);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_start_suppressed_after_end() {
        let started = Arc::new(AtomicUsize::new(0));
        let counter = started.clone();
        let mut utterance = Utterance::new(
            "hello",
            QueueMode::Queue,
            SpeechProperties::new().on_start(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        utterance.fire_end(true);
        utterance.fire_start();
        assert_eq!(started.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_detached_drops_callbacks_and_hint() {
        let props = SpeechProperties::new()
            .with_category("nav")
            .with_phonetic_hint("alpha")
            .on_end(|_| {});
        let detached = props.detached();
        assert!(detached.on_end.is_none());
        assert!(detached.phonetic_hint.is_none());
        assert_eq!(detached.category.as_deref(), Some("nav"));
    }
}
