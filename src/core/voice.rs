//! Voice availability
//!
//! Dispatch is held back until a voice has been resolved. Resolution itself
//! is asynchronous: the scheduler asks its [`VoiceSelector`](super::engine::VoiceSelector)
//! and the answer comes back later as a voice name.

use async_trait::async_trait;

/// Name used when no preferred voice is available. No voice name is sent to
/// the engine while this voice is current.
pub const SYSTEM_VOICE: &str = "system";

/// Pick `preferred` when `available` offers it, otherwise the system voice
pub fn select_voice(available: &[String], preferred: Option<&str>) -> String {
    match preferred {
        Some(name) if name != SYSTEM_VOICE && available.iter().any(|v| v == name) => {
            name.to_string()
        }
        _ => SYSTEM_VOICE.to_string(),
    }
}

/// Source of the voices an engine can speak with
#[async_trait]
pub trait VoiceResolver: Send + Sync {
    async fn voices(&self) -> Vec<String>;

    async fn resolve(&self, preferred: Option<&str>) -> String {
        let available = self.voices().await;
        select_voice(&available, preferred)
    }
}

/// Resolver over a fixed list of voice names
#[derive(Debug, Clone, Default)]
pub struct StaticVoiceResolver {
    voices: Vec<String>,
}

impl StaticVoiceResolver {
    pub fn new<I, S>(voices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            voices: voices.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl VoiceResolver for StaticVoiceResolver {
    async fn voices(&self) -> Vec<String> {
        self.voices.clone()
    }
}

/// Tracks the resolved voice and the user's preference
#[derive(Debug, Clone, Default)]
pub struct VoiceGate {
    current: Option<String>,
    preferred: Option<String>,
}

impl VoiceGate {
    pub fn new(preferred: Option<String>) -> Self {
        Self {
            current: None,
            preferred,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn preferred(&self) -> Option<&str> {
        self.preferred.as_deref()
    }

    pub fn set_preferred(&mut self, preferred: Option<String>) {
        self.preferred = preferred;
    }

    /// Voice to ask for when re-resolving: the explicit preference, else
    /// whatever is current
    pub fn lookup_hint(&self) -> Option<&str> {
        self.preferred().or_else(|| self.current())
    }

    pub fn resolve(&mut self, name: impl Into<String>) {
        self.current = Some(name.into());
    }

    /// Voice name to transmit when a request does not name one
    pub fn transmitted_name(&self) -> Option<&str> {
        self.current().filter(|name| *name != SYSTEM_VOICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_voice_prefers_available_voice() {
        let available = voices(&["alice", "bob"]);
        assert_eq!(select_voice(&available, Some("bob")), "bob");
    }

    #[test]
    fn test_select_voice_falls_back_to_system() {
        let available = voices(&["alice"]);
        assert_eq!(select_voice(&available, Some("carol")), SYSTEM_VOICE);
        assert_eq!(select_voice(&available, None), SYSTEM_VOICE);
        assert_eq!(select_voice(&[], Some("alice")), SYSTEM_VOICE);
    }

    #[test]
    fn test_gate_blocks_until_resolved() {
        let mut gate = VoiceGate::new(Some("alice".to_string()));
        assert!(!gate.is_ready());
        assert_eq!(gate.lookup_hint(), Some("alice"));

        gate.resolve("alice");
        assert!(gate.is_ready());
        assert_eq!(gate.transmitted_name(), Some("alice"));
    }

    #[test]
    fn test_system_voice_is_not_transmitted() {
        let mut gate = VoiceGate::default();
        gate.resolve(SYSTEM_VOICE);
        assert!(gate.is_ready());
        assert_eq!(gate.transmitted_name(), None);
        assert_eq!(gate.lookup_hint(), Some(SYSTEM_VOICE));
    }

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticVoiceResolver::new(["alice", "bob"]);
        assert_eq!(resolver.resolve(Some("bob")).await, "bob");
        assert_eq!(resolver.resolve(Some("zed")).await, SYSTEM_VOICE);
    }

    #[test]
    fn test_empty_resolver_falls_back_to_system_voice() {
        let resolver = StaticVoiceResolver::default();
        assert!(tokio_test::block_on(resolver.voices()).is_empty());
        assert_eq!(tokio_test::block_on(resolver.resolve(None)), SYSTEM_VOICE);
        assert_eq!(
            tokio_test::block_on(resolver.resolve(Some(SYSTEM_VOICE))),
            SYSTEM_VOICE
        );
    }
}
