//! Background save reminder.
//!
//! The reminder polls the document's unsaved marker on a fixed interval and
//! raises [`ReminderEvent::Unsaved`] once per unsaved period when the marker
//! is older than the threshold. It only reads the marker; deciding whether to
//! prompt or save belongs to whoever consumes the events.

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::ReminderConfig;

/// Raised by [`SaveReminder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderEvent {
    /// Edits have been unsaved since `since`, for `elapsed`.
    Unsaved { since: Instant, elapsed: Duration },
}

/// Handle to a running reminder task. Dropping it stops the task.
#[derive(Debug)]
pub struct SaveReminder {
    handle: JoinHandle<()>,
}

impl SaveReminder {
    /// Spawn the reminder on the current tokio runtime.
    ///
    /// `marker` holds the instant of the first unsaved edit, or `None` when
    /// everything is saved. The task ends when the marker's sender or the
    /// event receiver is dropped.
    pub fn spawn(
        marker: watch::Receiver<Option<Instant>>,
        interval: Duration,
        threshold: Duration,
    ) -> (Self, mpsc::Receiver<ReminderEvent>) {
        let (events, receiver) = mpsc::channel(8);
        let handle = tokio::spawn(run(marker, interval, threshold, events));
        (Self { handle }, receiver)
    }

    /// Spawn with `[reminder]` settings, or `None` when reminders are disabled.
    pub fn from_config(
        marker: watch::Receiver<Option<Instant>>,
        config: &ReminderConfig,
    ) -> Option<(Self, mpsc::Receiver<ReminderEvent>)> {
        config.enabled.then(|| {
            Self::spawn(
                marker,
                Duration::from_secs(config.interval_secs),
                Duration::from_secs(config.threshold_secs),
            )
        })
    }

    /// Stop the reminder. Pending events already sent stay in the channel.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SaveReminder {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    marker: watch::Receiver<Option<Instant>>,
    interval: Duration,
    threshold: Duration,
    events: mpsc::Sender<ReminderEvent>,
) {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut reminded_for: Option<Instant> = None;

    loop {
        ticker.tick().await;
        if marker.has_changed().is_err() {
            log::debug!("unsaved marker dropped, stopping save reminder");
            break;
        }

        let since = *marker.borrow();
        let Some(since) = since else {
            reminded_for = None;
            continue;
        };
        let elapsed = Instant::now().saturating_duration_since(since);
        if elapsed < threshold || reminded_for == Some(since) {
            continue;
        }

        reminded_for = Some(since);
        log::info!("changes unsaved for {}s", elapsed.as_secs());
        if events.send(ReminderEvent::Unsaved { since, elapsed }).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const INTERVAL: Duration = Duration::from_secs(1);
    const THRESHOLD: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_no_event_while_saved() {
        let (_marker, rx) = watch::channel(None);
        let (_reminder, mut events) = SaveReminder::spawn(rx, INTERVAL, THRESHOLD);
        assert!(timeout(Duration::from_secs(60), events.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_after_threshold() {
        let start = Instant::now();
        let (_marker, rx) = watch::channel(Some(start));
        let (_reminder, mut events) = SaveReminder::spawn(rx, INTERVAL, THRESHOLD);

        let event = timeout(Duration::from_secs(30), events.recv()).await.unwrap().unwrap();
        let ReminderEvent::Unsaved { since, elapsed } = event;
        assert_eq!(since, start);
        assert!(elapsed >= THRESHOLD);
        assert!(start.elapsed() < THRESHOLD + INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_per_unsaved_period() {
        let (marker, rx) = watch::channel(Some(Instant::now()));
        let (_reminder, mut events) = SaveReminder::spawn(rx, INTERVAL, THRESHOLD);

        assert!(timeout(Duration::from_secs(30), events.recv()).await.unwrap().is_some());
        assert!(timeout(Duration::from_secs(60), events.recv()).await.is_err());

        // Saving then editing again starts a new period
        marker.send_replace(None);
        tokio::time::sleep(INTERVAL * 2).await;
        let restarted = Instant::now();
        marker.send_replace(Some(restarted));
        let ReminderEvent::Unsaved { since, .. } = timeout(Duration::from_secs(30), events.recv()).await.unwrap().unwrap();
        assert_eq!(since, restarted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_task() {
        let (_marker, rx) = watch::channel(Some(Instant::now()));
        let (reminder, mut events) = SaveReminder::spawn(rx, INTERVAL, THRESHOLD);
        reminder.cancel();
        assert_eq!(timeout(Duration::from_secs(30), events.recv()).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_config() {
        let (_marker, rx) = watch::channel(Some(Instant::now()));
        let disabled = ReminderConfig { enabled: false, ..Default::default() };
        assert!(SaveReminder::from_config(rx.clone(), &disabled).is_none());

        let config = ReminderConfig { enabled: true, interval_secs: 1, threshold_secs: 3 };
        let (_reminder, mut events) = SaveReminder::from_config(rx, &config).unwrap();
        let ReminderEvent::Unsaved { elapsed, .. } = timeout(Duration::from_secs(10), events.recv()).await.unwrap().unwrap();
        assert!(elapsed >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_marker_dropped_stops_task() {
        let (marker, rx) = watch::channel(None);
        let (reminder, mut events) = SaveReminder::spawn(rx, INTERVAL, THRESHOLD);
        drop(marker);
        assert_eq!(timeout(Duration::from_secs(30), events.recv()).await.unwrap(), None);
        assert!(reminder.is_finished());
    }
}
