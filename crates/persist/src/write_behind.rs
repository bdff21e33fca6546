//! Write-behind wrapper: coalesces writes per key and flushes them off the
//! caller's thread.
//!
//! At most one pending value exists per key; a newer write supersedes the
//! older one (last-write-wins). Reads observe pending values first.

#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use metrics::{counter, histogram};
use rustc_hash::FxHashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::KvStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    Set(Vec<u8>),
    Remove,
}

/// Coalescing queue keyed by storage key with FIFO order.
///
/// Every push stamps a generation so a flush can tell whether the value it
/// wrote is still the latest one.
#[derive(Default)]
pub struct Coalescer {
    map: FxHashMap<String, (u64, Pending)>,
    order: VecDeque<String>,
    next_gen: u64,
    superseded: u64,
}

impl Coalescer {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.map.len() }
    pub fn is_empty(&self) -> bool { self.map.is_empty() }
    pub fn superseded(&self) -> u64 { self.superseded }

    pub fn push(&mut self, key: &str, op: Pending) {
        self.next_gen += 1;
        if self.map.contains_key(key) {
            self.superseded += 1;
        } else {
            self.order.push_back(key.to_string());
        }
        self.map.insert(key.to_string(), (self.next_gen, op));
    }

    pub fn get(&self, key: &str) -> Option<&Pending> {
        self.map.get(key).map(|(_, op)| op)
    }

    /// Copy of all pending writes in first-queued order.
    pub fn snapshot(&self) -> Vec<(String, u64, Pending)> {
        self.order
            .iter()
            .filter_map(|k| self.map.get(k).map(|(g, op)| (k.clone(), *g, op.clone())))
            .collect()
    }

    /// Drop the pending entry for `key` if it is still generation `gen`.
    pub fn settle(&mut self, key: &str, gen: u64) -> bool {
        match self.map.get(key) {
            Some((g, _)) if *g == gen => {
                self.map.remove(key);
                self.order.retain(|k| k != key);
                true
            }
            _ => false,
        }
    }
}

struct Shared {
    inner: Arc<dyn KvStore>,
    pending: Mutex<Coalescer>,
    // Serializes flushes so an older snapshot never lands after a newer one.
    flush_lock: Mutex<()>,
}

impl Shared {
    fn pending(&self) -> MutexGuard<'_, Coalescer> {
        self.pending.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn flush(&self) -> usize {
        let _guard = self.flush_lock.lock().unwrap_or_else(|p| p.into_inner());
        let batch = self.pending().snapshot();
        if batch.is_empty() {
            return 0;
        }
        let started = std::time::Instant::now();
        let mut written = 0usize;
        for (key, gen, op) in batch {
            let res = match &op {
                Pending::Set(bytes) => self.inner.set(&key, bytes),
                Pending::Remove => self.inner.remove(&key),
            };
            match res {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!(key = %key, error = ?e, "write-behind flush failed; dropping write");
                    counter!("persist_flush_errors_total", 1u64);
                }
            }
            // Failed writes are dropped too; a later write to the key retries.
            self.pending().settle(&key, gen);
        }
        histogram!("persist_flush_ms", started.elapsed().as_secs_f64() * 1000.0);
        debug!(written, "write-behind flushed");
        written
    }
}

/// [`KvStore`] that defers writes to `inner`.
///
/// Built with [`WriteBehind::new`] it only flushes on [`WriteBehind::flush`]
/// or drop. [`WriteBehind::spawn`] also starts a tokio task that flushes on
/// an interval.
pub struct WriteBehind {
    shared: Arc<Shared>,
    stop_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl WriteBehind {
    pub fn new(inner: Arc<dyn KvStore>) -> Self {
        let shared = Arc::new(Shared { inner, pending: Mutex::new(Coalescer::new()), flush_lock: Mutex::new(()) });
        Self { shared, stop_tx: None, task: None }
    }

    /// Start a background flusher. Must be called from within a tokio runtime.
    pub fn spawn(inner: Arc<dyn KvStore>, interval: Duration) -> Self {
        let mut me = Self::new(inner);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let shared = Arc::clone(&me.shared);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if shared.pending().is_empty() {
                            continue;
                        }
                        let s = Arc::clone(&shared);
                        if let Err(e) = tokio::task::spawn_blocking(move || s.flush()).await {
                            warn!(error = %e, "write-behind flush task failed");
                        }
                    }
                    _ = stop_rx.changed() => {
                        debug!("stop requested; draining write-behind queue");
                        break;
                    }
                }
            }
            let s = Arc::clone(&shared);
            if let Err(e) = tokio::task::spawn_blocking(move || s.flush()).await {
                warn!(error = %e, "final write-behind flush failed");
            }
            info!("write-behind flusher stopped");
        });
        me.stop_tx = Some(stop_tx);
        me.task = Some(task);
        me
    }

    /// Flush interval from `GHBOARD_FLUSH_MS` (default 250ms).
    pub fn interval_from_env() -> Duration {
        let ms = std::env::var("GHBOARD_FLUSH_MS").ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or(250);
        Duration::from_millis(ms.max(1))
    }

    pub fn pending(&self) -> usize { self.shared.pending().len() }

    pub fn superseded(&self) -> u64 { self.shared.pending().superseded() }

    /// Write every pending value now, blocking the caller. Returns the number
    /// of successful backend writes.
    pub fn flush(&self) -> usize { self.shared.flush() }

    /// Stop the background flusher after a final flush.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "write-behind flusher panicked");
            }
        }
    }
}

impl KvStore for WriteBehind {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.shared.pending().get(key) {
            Some(Pending::Set(bytes)) => return Ok(Some(bytes.clone())),
            Some(Pending::Remove) => return Ok(None),
            None => {}
        }
        self.shared.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.shared.pending().push(key, Pending::Set(value.to_vec()));
        counter!("persist_write_behind_queued_total", 1u64);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.shared.pending().push(key, Pending::Remove);
        Ok(())
    }
}

impl Drop for WriteBehind {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(true);
        }
        if !self.shared.pending().is_empty() {
            self.shared.flush();
        }
    }
}
