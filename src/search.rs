//! Debounced catalog search.
//!
//! Keystroke-level input is coalesced: a raw value only becomes the
//! committed query after a quiet window with no further changes. Each new
//! input aborts the pending commit task, and `LiveSearch` aborts a
//! superseded in-flight catalog query instead of discarding its result on
//! arrival.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::db::OrmConn;
use crate::routes::params::ProductQuery;
use crate::services::catalog_service::{self, SearchPage};

pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

pub struct Debouncer {
    window: Duration,
    committed: watch::Sender<Option<String>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        let (committed, _) = watch::channel(None);
        Self {
            window,
            committed,
            pending: Mutex::new(None),
        }
    }

    /// Replace the raw value. The commit fires once `window` elapses with
    /// no further input; any pending commit is aborted first.
    pub fn input(&self, raw: impl Into<String>) {
        let raw = raw.into();
        let committed = self.committed.clone();
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let _ = committed.send(Some(raw));
        });

        let mut pending = self.pending.lock().expect("debouncer lock poisoned");
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.committed.subscribe()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.lock().expect("debouncer lock poisoned").take() {
            pending.abort();
        }
    }
}

/// A debouncer wired to the catalog: committed queries run against the
/// database with the session's filter set, results land on a watch channel
/// wholesale. Dropping the handle aborts the driver and any in-flight query.
pub struct LiveSearch {
    debouncer: Arc<Debouncer>,
    results: watch::Receiver<Option<SearchPage>>,
    inflight: Arc<Mutex<Option<JoinHandle<()>>>>,
    driver: JoinHandle<()>,
}

impl LiveSearch {
    pub fn spawn(orm: OrmConn, filters: ProductQuery) -> Self {
        let debouncer = Arc::new(Debouncer::new(DEBOUNCE_WINDOW));
        let (results_tx, results_rx) = watch::channel(None);
        let inflight: Arc<Mutex<Option<JoinHandle<()>>>> = Arc::new(Mutex::new(None));

        let mut committed = debouncer.subscribe();
        let inflight_slot = inflight.clone();
        let driver = tokio::spawn(async move {
            while committed.changed().await.is_ok() {
                let query = committed.borrow_and_update().clone();
                let orm = orm.clone();
                let mut filters = filters.clone();
                filters.q = query.filter(|q| !q.is_empty());
                let results_tx = results_tx.clone();

                let task = tokio::spawn(async move {
                    match catalog_service::search_products(&orm, &filters).await {
                        Ok(page) => {
                            let _ = results_tx.send(Some(page));
                        }
                        Err(err) => tracing::warn!(error = %err, "live search query failed"),
                    }
                });

                let mut slot = inflight_slot.lock().expect("live search lock poisoned");
                if let Some(previous) = slot.replace(task) {
                    previous.abort();
                }
            }
        });

        Self {
            debouncer,
            results: results_rx,
            inflight,
            driver,
        }
    }

    pub fn input(&self, raw: impl Into<String>) {
        self.debouncer.input(raw);
    }

    pub fn results(&self) -> watch::Receiver<Option<SearchPage>> {
        self.results.clone()
    }
}

impl Drop for LiveSearch {
    fn drop(&mut self) {
        self.driver.abort();
        if let Some(task) = self
            .inflight
            .lock()
            .expect("live search lock poisoned")
            .take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rapid_inputs_coalesce_into_one_commit() {
        let debouncer = Debouncer::new(DEBOUNCE_WINDOW);
        let mut committed = debouncer.subscribe();

        debouncer.input("a");
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.input("ab");
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.input("abc");
        let last_input = tokio::time::Instant::now();

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(!committed.has_changed().unwrap(), "commit fired early");

        committed.changed().await.unwrap();
        assert_eq!(committed.borrow_and_update().as_deref(), Some("abc"));
        let elapsed = last_input.elapsed();
        assert!(
            elapsed >= Duration::from_millis(300) && elapsed < Duration::from_millis(310),
            "commit at {elapsed:?}"
        );

        // The intermediate values never committed.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!committed.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_inputs_each_commit() {
        let debouncer = Debouncer::new(DEBOUNCE_WINDOW);
        let mut committed = debouncer.subscribe();

        debouncer.input("first");
        committed.changed().await.unwrap();
        assert_eq!(committed.borrow_and_update().as_deref(), Some("first"));

        debouncer.input("second");
        committed.changed().await.unwrap();
        assert_eq!(committed.borrow_and_update().as_deref(), Some("second"));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_the_pending_commit() {
        let debouncer = Debouncer::new(DEBOUNCE_WINDOW);
        let mut committed = debouncer.subscribe();

        debouncer.input("doomed");
        drop(debouncer);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(committed.has_changed().is_err() || !committed.has_changed().unwrap());
    }
}
