//! Reminder configuration and recurring delivery.
//!
//! The scheduler owns one background task tied to the owning screen's
//! lifecycle: started on entry, guaranteed stopped on exit. It never
//! touches timer or session state; the only thing it may do is invoke
//! the injected delivery side effect.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::ValidationError;

/// Where and when reminders go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// "HH:MM", 24-hour.
    pub time_of_day: String,
    /// Device registration token the push service delivers to.
    pub target_token: String,
}

/// Validate and parse an "HH:MM" time of day.
///
/// Rejected input causes no delivery attempt and no state mutation.
pub fn parse_time_of_day(raw: &str) -> Result<(u8, u8), ValidationError> {
    let invalid = || ValidationError::InvalidTimeOfDay(raw.to_string());
    let (h, m) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let hour: u8 = h.trim().parse().map_err(|_| invalid())?;
    let minute: u8 = m.trim().parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    /// One scheduler per screen lifecycle; stop the previous run first.
    #[error("reminder scheduler already running")]
    AlreadyRunning,
}

/// Recurring reminder delivery on a fixed interval.
///
/// `deliver` fires unconditionally every interval -- no dedup, no
/// business-hours check. The first firing happens immediately on start.
pub struct ReminderScheduler {
    task: Option<(JoinHandle<()>, oneshot::Sender<()>)>,
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self { task: None }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Launch the recurring delivery task.
    ///
    /// # Errors
    /// Returns `AlreadyRunning` if a previous run was not stopped; a
    /// second concurrent timer is never created.
    pub fn start<F, Fut>(&mut self, interval: Duration, mut deliver: F) -> Result<(), SchedulerError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        if self.task.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }
        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut cancel_rx => break,
                    _ = ticker.tick() => {
                        // An in-flight delivery runs to completion; the
                        // cancel signal is observed on the next loop.
                        deliver().await;
                    }
                }
            }
        });
        self.task = Some((handle, cancel_tx));
        Ok(())
    }

    /// Cancel future firings. After this returns no further deliveries
    /// happen. The background task is joined with a bounded wait; a task
    /// that fails to wind down in time is aborted (best effort, not
    /// fatal).
    pub async fn stop(&mut self) {
        let Some((mut handle, cancel_tx)) = self.task.take() else {
            return;
        };
        let _ = cancel_tx.send(());
        if tokio::time::timeout(Duration::from_secs(1), &mut handle)
            .await
            .is_err()
        {
            tracing::warn!("reminder task did not stop in time, aborting");
            handle.abort();
        }
    }
}

impl Default for ReminderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        if let Some((handle, _)) = self.task.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn parse_accepts_valid_times() {
        assert_eq!(parse_time_of_day("08:30").unwrap(), (8, 30));
        assert_eq!(parse_time_of_day("0:00").unwrap(), (0, 0));
        assert_eq!(parse_time_of_day("23:59").unwrap(), (23, 59));
        assert_eq!(parse_time_of_day(" 7:05 ").unwrap(), (7, 5));
    }

    #[test]
    fn parse_rejects_out_of_range_and_garbage() {
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("12:60").is_err());
        assert!(parse_time_of_day("noon").is_err());
        assert!(parse_time_of_day("12").is_err());
        assert!(parse_time_of_day("-1:30").is_err());
        assert!(parse_time_of_day("").is_err());
    }

    #[tokio::test]
    async fn fires_repeatedly_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = ReminderScheduler::new();
        let counter = count.clone();
        scheduler
            .start(Duration::from_millis(20), move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(90)).await;
        scheduler.stop().await;
        let at_stop = count.load(Ordering::SeqCst);
        assert!(at_stop >= 2, "expected several firings, got {at_stop}");

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), at_stop, "fired after stop");
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let mut scheduler = ReminderScheduler::new();
        scheduler
            .start(Duration::from_secs(3600), || async {})
            .unwrap();
        let second = scheduler.start(Duration::from_secs(3600), || async {});
        assert!(matches!(second, Err(SchedulerError::AlreadyRunning)));
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn stop_without_start_is_noop() {
        let mut scheduler = ReminderScheduler::new();
        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn restart_after_stop_is_allowed() {
        let mut scheduler = ReminderScheduler::new();
        scheduler
            .start(Duration::from_secs(3600), || async {})
            .unwrap();
        scheduler.stop().await;
        assert!(scheduler.start(Duration::from_secs(3600), || async {}).is_ok());
        scheduler.stop().await;
    }
}
