//! Speech observers
//!
//! Observers hear about speech activity as a whole (something started,
//! finished, or was cut off) rather than about individual utterances. They
//! are notified in registration order, and each notification is isolated so
//! a panicking observer neither stops the fan-out nor disturbs the scheduler.

use std::sync::Arc;

use super::isolation::call_callback_safely;

/// Kind of speech activity broadcast to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEvent {
    Start,
    End,
    Interrupted,
}

/// Receives speech activity notifications
///
/// All methods default to no-ops.
pub trait SpeechObserver: Send + Sync {
    fn on_start(&self) {}

    fn on_end(&self) {}

    fn on_interrupted(&self) {}
}

/// Ordered set of observers, deduplicated by identity
#[derive(Default)]
pub struct EventDispatcher {
    observers: Vec<Arc<dyn SpeechObserver>>,
}

fn same_observer(a: &Arc<dyn SpeechObserver>, b: &Arc<dyn SpeechObserver>) -> bool {
    // Compare data pointers only; vtable pointers are not unique.
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Returns `false` if it was already registered.
    pub fn add(&mut self, observer: Arc<dyn SpeechObserver>) -> bool {
        if self.observers.iter().any(|o| same_observer(o, &observer)) {
            return false;
        }
        self.observers.push(observer);
        true
    }

    /// Unregister an observer. Returns `false` if it was not registered.
    pub fn remove(&mut self, observer: &Arc<dyn SpeechObserver>) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| !same_observer(o, observer));
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify(&self, event: SpeechEvent) {
        for observer in &self.observers {
            let _ = match event {
                SpeechEvent::Start => {
                    call_callback_safely("observer on_start", || observer.on_start())
                }
                SpeechEvent::End => call_callback_safely("observer on_end", || observer.on_end()),
                SpeechEvent::Interrupted => call_callback_safely("observer on_interrupted", || {
                    observer.on_interrupted()
                }),
            };
        }
    }
}

/// Observer that logs every notification
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl SpeechObserver for LoggingObserver {
    fn on_start(&self) {
        tracing::info!("Speech started");
    }

    fn on_end(&self) {
        tracing::info!("Speech ended");
    }

    fn on_interrupted(&self) {
        tracing::info!("Speech interrupted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl SpeechObserver for Recorder {
        fn on_start(&self) {
            self.log.lock().push(format!("{}:start", self.name));
        }

        fn on_end(&self) {
            self.log.lock().push(format!("{}:end", self.name));
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            log: log.clone(),
        })
    }

    struct Panicker;

    impl SpeechObserver for Panicker {
        fn on_start(&self) {
            panic!("observer failure");
        }
    }

    #[test]
    fn test_notify_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add(recorder("a", &log));
        dispatcher.add(recorder("b", &log));

        dispatcher.notify(SpeechEvent::Start);
        dispatcher.notify(SpeechEvent::End);
        dispatcher.notify(SpeechEvent::Interrupted);

        assert_eq!(*log.lock(), vec!["a:start", "b:start", "a:end", "b:end"]);
    }

    #[test]
    fn test_duplicate_registration_is_ignored() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let observer: Arc<dyn SpeechObserver> = recorder("a", &log);
        let mut dispatcher = EventDispatcher::new();

        assert!(dispatcher.add(observer.clone()));
        assert!(!dispatcher.add(observer.clone()));
        dispatcher.notify(SpeechEvent::Start);
        assert_eq!(log.lock().len(), 1);

        assert!(dispatcher.remove(&observer));
        assert!(!dispatcher.remove(&observer));
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_panicking_observer_does_not_stop_fan_out() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add(Arc::new(Panicker));
        dispatcher.add(recorder("b", &log));

        dispatcher.notify(SpeechEvent::Start);
        assert_eq!(*log.lock(), vec!["b:start"]);
    }
}
