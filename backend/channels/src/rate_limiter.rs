//! Per-user message throttling.
//!
//! A fixed-window counter per Telegram user; messages over the cap are
//! dropped with a notice instead of queueing PMS calls behind a paste-storm.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct ThrottlePolicy {
    pub max_messages: u32,
    pub window: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self { max_messages: 20, window: Duration::from_secs(60) }
    }
}

struct Window {
    count: u32,
    started: Instant,
}

pub struct MessageThrottle {
    policy: ThrottlePolicy,
    windows: Mutex<HashMap<i64, Window>>,
}

impl MessageThrottle {
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self { policy, windows: Mutex::new(HashMap::new()) }
    }

    /// Record one message from `user_id`; returns false when the user is
    /// over the cap for the current window.
    pub async fn allow(&self, user_id: i64) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let window = windows
            .entry(user_id)
            .or_insert_with(|| Window { count: 0, started: now });

        if now.duration_since(window.started) >= self.policy.window {
            window.count = 0;
            window.started = now;
        }

        if window.count < self.policy.max_messages {
            window.count += 1;
            true
        } else {
            debug!(user_id, "Message dropped by throttle");
            false
        }
    }

    /// Drop expired windows to bound memory.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        self.windows
            .lock()
            .await
            .retain(|_, w| now.duration_since(w.started) < self.policy.window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn caps_messages_per_window() {
        let throttle = MessageThrottle::new(ThrottlePolicy {
            max_messages: 2,
            window: Duration::from_secs(60),
        });
        assert!(throttle.allow(1).await);
        assert!(throttle.allow(1).await);
        assert!(!throttle.allow(1).await);
    }

    #[tokio::test]
    async fn users_are_independent() {
        let throttle = MessageThrottle::new(ThrottlePolicy {
            max_messages: 1,
            window: Duration::from_secs(60),
        });
        assert!(throttle.allow(1).await);
        assert!(throttle.allow(2).await);
        assert!(!throttle.allow(1).await);
    }
}
