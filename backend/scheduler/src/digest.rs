//! Daily digest trigger.
//!
//! Evaluates the configured cron expression and pokes the operator channel
//! when it fires; the channel assembles and sends the actual summary. Kept
//! separate so digest timing survives Telegram reconnects.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{info, warn};

/// Sent to the channel when the digest should go out.
#[derive(Debug, Clone)]
pub struct DigestRequest {
    pub fired_at: DateTime<Utc>,
}

pub struct DigestScheduler {
    schedule: Schedule,
    tx: mpsc::Sender<DigestRequest>,
}

impl DigestScheduler {
    /// Build from a seconds-resolution cron expression. Fails fast on an
    /// invalid expression so a bad config is caught at startup.
    pub fn new(expression: &str, tx: mpsc::Sender<DigestRequest>) -> Result<Self> {
        let schedule = Schedule::from_str(expression)
            .with_context(|| format!("invalid digest cron expression '{expression}'"))?;
        Ok(Self { schedule, tx })
    }

    /// Next fire time after now, if the schedule has one.
    pub fn next_fire(&self) -> Option<DateTime<Utc>> {
        self.schedule.upcoming(Utc).next()
    }

    /// Run until the receiving side goes away.
    pub async fn run(self) {
        info!(next = ?self.next_fire(), "Digest scheduler started");

        loop {
            let Some(next) = self.next_fire() else {
                warn!("Digest schedule has no upcoming fire times, stopping");
                return;
            };
            let until = (next - Utc::now())
                .to_std()
                .unwrap_or(Duration::from_secs(1));
            tokio::time::sleep(until).await;

            let fired_at = Utc::now();
            info!(%fired_at, "Digest trigger fired");
            if self.tx.send(DigestRequest { fired_at }).await.is_err() {
                info!("Digest receiver dropped, scheduler shutting down");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_expression() {
        let (tx, _rx) = mpsc::channel(1);
        assert!(DigestScheduler::new("not a cron", tx).is_err());
    }

    #[test]
    fn computes_next_fire() {
        let (tx, _rx) = mpsc::channel(1);
        let scheduler = DigestScheduler::new("0 0 8 * * *", tx).unwrap();
        let next = scheduler.next_fire().unwrap();
        assert!(next > Utc::now());
        assert_eq!(next.format("%H:%M:%S").to_string(), "08:00:00");
    }

    #[tokio::test]
    async fn fires_on_every_second_schedule() {
        let (tx, mut rx) = mpsc::channel(1);
        let scheduler = DigestScheduler::new("* * * * * *", tx).unwrap();
        let handle = tokio::spawn(scheduler.run());

        let request = tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("digest should fire within 3s")
            .expect("sender alive");
        assert!(request.fired_at <= Utc::now());

        drop(rx);
        let _ = tokio::time::timeout(Duration::from_secs(3), handle).await;
    }
}
