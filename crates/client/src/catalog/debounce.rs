//! Keystroke debouncing for catalog search.
//!
//! Raw keystrokes go in; the term comes out only after a quiet period
//! (default 500 ms) with no further input. A new keystroke REPLACES the
//! pending timer - terms never stack, so at most one emission follows a
//! burst of typing.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// How long input must be quiet before a term is emitted.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Debounces search input on a background Tokio task.
///
/// Feed keystrokes with [`SearchDebouncer::input`]; settled terms are
/// published on a `watch` channel ([`SearchDebouncer::subscribe`]).
/// Dropping the debouncer aborts the task.
#[derive(Debug)]
pub struct SearchDebouncer {
    keystrokes: mpsc::UnboundedSender<String>,
    settled: watch::Receiver<String>,
    task: JoinHandle<()>,
}

impl SearchDebouncer {
    /// Start a debouncer with the given quiet period.
    #[must_use]
    pub fn spawn(quiet_period: Duration) -> Self {
        let (keystrokes, input) = mpsc::unbounded_channel();
        let (settled_tx, settled) = watch::channel(String::new());

        let task = tokio::spawn(run(input, settled_tx, quiet_period));

        Self {
            keystrokes,
            settled,
            task,
        }
    }

    /// Feed the current contents of the search box. Restarts the quiet
    /// period; any previously pending term is replaced.
    pub fn input(&self, term: impl Into<String>) {
        let _ = self.keystrokes.send(term.into());
    }

    /// Subscribe to settled terms. The initial value is the empty
    /// string.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.settled.clone()
    }

    /// The most recently settled term.
    #[must_use]
    pub fn latest(&self) -> String {
        self.settled.borrow().clone()
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut input: mpsc::UnboundedReceiver<String>,
    settled: watch::Sender<String>,
    quiet_period: Duration,
) {
    let mut pending: Option<String> = None;
    loop {
        match pending.take() {
            // Nothing pending: just wait for the next keystroke.
            None => match input.recv().await {
                Some(term) => pending = Some(term),
                None => break,
            },
            // A term is pending: race its timer against new input.
            Some(term) => {
                tokio::select! {
                    next = input.recv() => match next {
                        Some(next_term) => pending = Some(next_term),
                        None => break,
                    },
                    () = tokio::time::sleep(quiet_period) => {
                        debug!(term = %term, "search term settled");
                        let _ = settled.send(term);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_emits_after_quiet_period() {
        let debouncer = SearchDebouncer::spawn(DEFAULT_QUIET_PERIOD);
        let mut settled = debouncer.subscribe();

        debouncer.input("shirt");
        tokio::time::sleep(Duration::from_millis(501)).await;

        assert!(settled.has_changed().unwrap());
        assert_eq!(*settled.borrow_and_update(), "shirt");
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_keystroke_replaces_pending_timer() {
        let debouncer = SearchDebouncer::spawn(DEFAULT_QUIET_PERIOD);
        let mut settled = debouncer.subscribe();

        debouncer.input("re");
        tokio::time::sleep(Duration::from_millis(300)).await;
        debouncer.input("red");
        tokio::time::sleep(Duration::from_millis(300)).await;

        // 600 ms after the first keystroke, but only 300 ms after the
        // second: nothing has settled yet.
        assert!(!settled.has_changed().unwrap());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(settled.has_changed().unwrap());
        assert_eq!(*settled.borrow_and_update(), "red");
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_only_final_term() {
        let debouncer = SearchDebouncer::spawn(DEFAULT_QUIET_PERIOD);
        let mut settled = debouncer.subscribe();

        for term in ["s", "sh", "shi", "shir", "shirt"] {
            debouncer.input(term);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(*settled.borrow_and_update(), "shirt");
        // One emission total: nothing further is pending.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!settled.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_reflects_settled_term() {
        let debouncer = SearchDebouncer::spawn(Duration::from_millis(100));
        assert_eq!(debouncer.latest(), "");

        debouncer.input("hat");
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(debouncer.latest(), "hat");
    }
}
