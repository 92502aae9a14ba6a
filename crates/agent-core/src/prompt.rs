//! System Prompt Injection
//!
//! Prepends the instructional system message, stamped with the current date,
//! to every conversation before dispatch. Time comes from an injected
//! [`Clock`] so output is reproducible.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::message::Message;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Render the system prompt text for `now`
pub fn render(template: &str, now: DateTime<Utc>) -> String {
    format!("{template}\n\nToday's date is {}.", now.format("%A, %B %d, %Y"))
}

/// Return a new message list with exactly one system message prepended.
/// The input is left untouched.
pub fn inject(messages: &[Message], template: &str, now: DateTime<Utc>) -> Vec<Message> {
    let mut augmented = Vec::with_capacity(messages.len() + 1);
    augmented.push(Message::system(render(template, now)));
    augmented.extend_from_slice(messages);
    augmented
}

/// Prompt template bound to a clock
#[derive(Clone)]
pub struct SystemPrompt {
    template: String,
    clock: Arc<dyn Clock>,
}

impl SystemPrompt {
    pub fn new(template: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            template: template.into(),
            clock,
        }
    }

    /// Template with the wall clock
    pub fn with_system_clock(template: impl Into<String>) -> Self {
        Self::new(template, Arc::new(SystemClock))
    }

    pub fn apply(&self, messages: &[Message]) -> Vec<Message> {
        inject(messages, &self.template, self.clock.now())
    }
}

impl std::fmt::Debug for SystemPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemPrompt")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}
