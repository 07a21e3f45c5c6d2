//! Per-key asynchronous reader/writer locks.
//!
//! Each key has at most one writer or any number of readers. A reader is
//! admitted immediately only while no writer holds the key and none is
//! queued. On the last release a queued writer is granted first (oldest
//! first); otherwise every queued reader is admitted as one batch. A key's
//! entry is dropped from the table once nothing holds or waits on it.
//!
//! Locks are released by dropping the [`LockGuard`]. There are no timeouts:
//! a guard that is never dropped blocks every later caller on that key.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::debug;

/// Access mode held by a [`LockGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

#[derive(Default)]
struct KeyState {
    readers: usize,
    writer: bool,
    waiting_readers: Vec<oneshot::Sender<()>>,
    waiting_writers: VecDeque<oneshot::Sender<()>>,
}

impl KeyState {
    fn is_idle(&self) -> bool {
        self.readers == 0
            && !self.writer
            && self.waiting_readers.is_empty()
            && self.waiting_writers.is_empty()
    }

    /// Hand the key to the next waiters if nobody holds it.
    ///
    /// Waiters that went away before being granted are skipped.
    fn grant_next(&mut self) {
        if self.writer || self.readers > 0 {
            return;
        }

        while let Some(writer) = self.waiting_writers.pop_front() {
            self.writer = true;
            if writer.send(()).is_ok() {
                return;
            }
            self.writer = false;
        }

        for reader in self.waiting_readers.drain(..) {
            self.readers += 1;
            if reader.send(()).is_err() {
                self.readers -= 1;
            }
        }
    }
}

type LockTable = Arc<Mutex<HashMap<String, KeyState>>>;

fn lock_table(table: &LockTable) -> MutexGuard<'_, HashMap<String, KeyState>> {
    // State transitions never panic midway, so a poisoned table is still consistent.
    table.lock().unwrap_or_else(|e| e.into_inner())
}

fn release(table: &LockTable, key: &str, mode: LockMode) {
    let mut table = lock_table(table);
    let Some(state) = table.get_mut(key) else {
        return;
    };
    match mode {
        LockMode::Read => state.readers = state.readers.saturating_sub(1),
        LockMode::Write => state.writer = false,
    }
    state.grant_next();
    if state.is_idle() {
        table.remove(key);
    }
}

/// In-process table of per-key reader/writer locks.
///
/// Cloning shares the table.
#[derive(Clone, Default)]
pub struct LockManager {
    table: LockTable,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire shared access to `key`.
    pub async fn read(&self, key: &str) -> LockGuard {
        self.acquire(key, LockMode::Read).await
    }

    /// Acquire exclusive access to `key`.
    pub async fn write(&self, key: &str) -> LockGuard {
        self.acquire(key, LockMode::Write).await
    }

    /// Number of keys currently held or waited on.
    pub fn tracked_keys(&self) -> usize {
        lock_table(&self.table).len()
    }

    async fn acquire(&self, key: &str, mode: LockMode) -> LockGuard {
        let receiver = {
            let mut table = lock_table(&self.table);
            let state = table.entry(key.to_string()).or_default();
            let (sender, receiver) = oneshot::channel();
            match mode {
                LockMode::Read => {
                    if !state.writer && state.waiting_writers.is_empty() {
                        state.readers += 1;
                        return self.guard(key, mode);
                    }
                    state.waiting_readers.push(sender);
                }
                LockMode::Write => {
                    if !state.writer && state.readers == 0 {
                        state.writer = true;
                        return self.guard(key, mode);
                    }
                    state.waiting_writers.push_back(sender);
                }
            }
            receiver
        };

        debug!(key, ?mode, "lock contended, queued");
        Waiter {
            table: self.table.clone(),
            key: key.to_string(),
            mode,
            receiver: Some(receiver),
        }
        .wait()
        .await
    }

    fn guard(&self, key: &str, mode: LockMode) -> LockGuard {
        LockGuard {
            table: self.table.clone(),
            key: key.to_string(),
            mode,
        }
    }
}

impl fmt::Debug for LockManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockManager")
            .field("tracked_keys", &self.tracked_keys())
            .finish()
    }
}

/// A queued acquisition. Dropping it after the grant was sent gives the
/// grant back, so a cancelled caller never leaks a hold.
struct Waiter {
    table: LockTable,
    key: String,
    mode: LockMode,
    receiver: Option<oneshot::Receiver<()>>,
}

impl Waiter {
    async fn wait(mut self) -> LockGuard {
        if let Some(receiver) = self.receiver.as_mut() {
            // Senders are only dropped unsent once this receiver is closed.
            let _ = receiver.await;
        }
        self.receiver = None;
        LockGuard {
            table: self.table.clone(),
            key: std::mem::take(&mut self.key),
            mode: self.mode,
        }
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
            if receiver.try_recv().is_ok() {
                release(&self.table, &self.key, self.mode);
            }
        }
    }
}

/// Ownership of one key in one mode; released on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    table: LockTable,
    key: String,
    mode: LockMode,
}

impl LockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Release now; equivalent to dropping the guard.
    pub fn release(self) {}
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        release(&self.table, &self.key, self.mode);
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("key", &self.key)
            .field("mode", &self.mode)
            .finish()
    }
}
