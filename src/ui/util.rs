//! Small page utilities: date formatting and debouncing.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use tokio::task::JoinHandle;

/// `HH:MM`, 24-hour.
pub fn format_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%H:%M").to_string()
}

/// `YYYY. M. D.`
pub fn format_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y. %-m. %-d.").to_string()
}

/// Runs only the last of a burst of calls, `wait` after it was made.
pub struct Debouncer {
    wait: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `f`, cancelling any call still waiting. Must run inside a
    /// tokio runtime.
    pub fn call(&self, f: impl FnOnce() + Send + 'static) {
        let wait = self.wait;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            f();
        });
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(|p| p.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;

    use super::*;

    #[test]
    fn formats_time_and_date() {
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(format_time(&at), "09:05");
        assert_eq!(format_date(&at), "2026. 3. 7.");
    }

    #[tokio::test(start_paused = true)]
    async fn debouncer_runs_last_call_only() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let last = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        for i in 1..=3 {
            let last = Arc::clone(&last);
            let runs = Arc::clone(&runs);
            debouncer.call(move || {
                last.store(i, Ordering::SeqCst);
                runs.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 3);
    }
}
