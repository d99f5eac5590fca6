//! Line format read by `speech-queue run`
//!
//! ```text
//! hello               queue "hello"
//! queue: hello        same
//! flush: hello        flush, then speak
//! interject: hello    interject
//! category:nav: next  category flush scoped to "nav"
//! !stop               stop all speech
//! ```

use crate::core::utterance::{QueueMode, SpeechProperties};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLine {
    Speak {
        text: String,
        mode: QueueMode,
        category: Option<String>,
    },
    Stop,
    /// Nothing to do
    Empty,
}

impl ScriptLine {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ScriptLine::Empty;
        }
        if line == "!stop" {
            return ScriptLine::Stop;
        }

        if let Some(rest) = line.strip_prefix("category:")
            && let Some((category, text)) = rest.split_once(':')
        {
            let category = category.trim();
            return ScriptLine::Speak {
                text: text.trim().to_string(),
                mode: QueueMode::CategoryFlush,
                category: (!category.is_empty()).then(|| category.to_string()),
            };
        }

        for (prefix, mode) in [
            ("queue:", QueueMode::Queue),
            ("flush:", QueueMode::Flush),
            ("interject:", QueueMode::Interject),
        ] {
            if let Some(text) = line.strip_prefix(prefix) {
                return ScriptLine::Speak {
                    text: text.trim().to_string(),
                    mode,
                    category: None,
                };
            }
        }

        ScriptLine::Speak {
            text: line.to_string(),
            mode: QueueMode::Queue,
            category: None,
        }
    }

    /// Properties for a `Speak` line
    pub fn properties(&self) -> SpeechProperties {
        match self {
            ScriptLine::Speak {
                category: Some(category),
                ..
            } => SpeechProperties::new().with_category(category.clone()),
            _ => SpeechProperties::new(),
        }
    }
}
