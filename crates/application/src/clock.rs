use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

/// Time source used for debouncing and date-derived fields.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspends the caller for `duration`.
    async fn sleep(&self, duration: Duration);

    /// Returns the current calendar date.
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the tokio timer and the system date.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Cancellable quiescence timer.
///
/// Each `wait` supersedes every earlier pending wait; only a wait that is not
/// superseded or cancelled before the window elapses reports that it fired.
pub struct DebounceTimer {
    clock: Arc<dyn Clock>,
    window: Duration,
    generation: AtomicU64,
}

impl DebounceTimer {
    /// Creates a timer with a fixed quiescence window.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            clock,
            window,
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the quiescence window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Waits for the window and returns whether this wait is still the latest.
    pub async fn wait(&self) -> bool {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.clock.sleep(self.window).await;
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Cancels the pending wait, if any.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{DebounceTimer, TokioClock};

    #[tokio::test(start_paused = true)]
    async fn only_the_last_wait_fires() {
        let timer = DebounceTimer::new(Arc::new(TokioClock), Duration::from_millis(500));

        let (first, second) = tokio::join!(timer.wait(), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            timer.wait().await
        });

        assert!(!first);
        assert!(second);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_suppresses_pending_wait() {
        let timer = DebounceTimer::new(Arc::new(TokioClock), Duration::from_millis(500));

        let (fired, ()) = tokio::join!(timer.wait(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            timer.cancel();
        });

        assert!(!fired);
    }
}
