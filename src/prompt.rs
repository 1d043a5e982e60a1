//! One-shot deferred prompts
//!
//! The dashboard surfaces its coach a fixed delay after start-up. The prompt
//! is owned by the view that scheduled it and is polled from that view's
//! event loop; cancelling it (or dropping it with the view) guarantees it
//! never fires.

use std::time::{Duration, Instant};

/// Delay before the coach prompt is surfaced
pub const DEFAULT_COACH_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptState {
    Pending,
    Fired,
    Cancelled,
}

/// A cancellable one-shot timer driven by its owner's clock
#[derive(Debug)]
pub struct DeferredPrompt {
    deadline: Instant,
    state: PromptState,
}

impl DeferredPrompt {
    /// Schedule a prompt `delay` after `start`
    pub fn schedule(start: Instant, delay: Duration) -> Self {
        Self {
            deadline: start + delay,
            state: PromptState::Pending,
        }
    }

    /// Returns true exactly once, on the first poll at or after the deadline
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.state == PromptState::Pending && now >= self.deadline {
            self.state = PromptState::Fired;
            return true;
        }
        false
    }

    pub fn cancel(&mut self) {
        if self.state == PromptState::Pending {
            tracing::debug!("deferred prompt cancelled before firing");
            self.state = PromptState::Cancelled;
        }
    }
}
