//! Write-behind persistence.
//!
//! Transitions capture the document record under the store lock and hand it
//! to a [`WriteBehind`] queue. A dedicated thread serializes the record and
//! merges it into the [`PersistenceAdapter`]. Only the newest pending record
//! is kept, so a burst of edits against slow storage costs one write per
//! storage round trip rather than one per edit.
//!
//! The writer is a plain thread: stores are built from synchronous code and
//! no async runtime is guaranteed to exist.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use serde_json::{Map, Value};

use crate::error::DeckResult;
use crate::schema::DocumentRecord;
use crate::storage::PersistenceAdapter;

/// A record captured by the transition numbered `seq`.
pub(crate) struct PendingWrite {
    pub(crate) seq: u64,
    pub(crate) record: DocumentRecord,
}

impl PendingWrite {
    fn into_map(self) -> Option<Map<String, Value>> {
        match serde_json::to_value(self.record) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Failed to serialize document: {e}");
                None
            }
        }
    }
}

/// Storage plus the sequence number of the newest record it holds.
struct Persister {
    storage: Arc<dyn PersistenceAdapter>,
    key: String,
    written_seq: Mutex<u64>,
}

impl Persister {
    /// Merge `write` unless a newer record already landed.
    fn write(&self, write: PendingWrite) -> DeckResult<()> {
        let mut written = self
            .written_seq
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if write.seq < *written {
            return Ok(());
        }
        let seq = write.seq;
        let Some(record) = write.into_map() else {
            return Ok(());
        };
        self.storage.merge(&self.key, record)?;
        *written = seq;
        Ok(())
    }

    fn write_logged(&self, write: PendingWrite) {
        if let Err(e) = self.write(write) {
            tracing::warn!("Failed to persist document {}: {e}", self.key);
        }
    }
}

#[derive(Default)]
struct Slot {
    pending: Option<PendingWrite>,
    in_flight: bool,
    closed: bool,
}

#[derive(Default)]
struct Shared {
    slot: Mutex<Slot>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, slot: MutexGuard<'a, Slot>) -> MutexGuard<'a, Slot> {
        self.changed
            .wait(slot)
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background writer owning one storage key.
///
/// Dropping it drains the queue and joins the thread, so everything
/// submitted has reached storage once the last store clone is gone.
pub(crate) struct WriteBehind {
    shared: Arc<Shared>,
    persister: Arc<Persister>,
    thread: Option<JoinHandle<()>>,
}

impl WriteBehind {
    /// Start the writer thread. If the thread cannot be spawned, writes
    /// happen inline on the caller.
    pub(crate) fn spawn(storage: Arc<dyn PersistenceAdapter>, key: String) -> Self {
        let shared = Arc::new(Shared::default());
        let persister = Arc::new(Persister {
            storage,
            key,
            written_seq: Mutex::new(0),
        });
        let thread = {
            let shared = shared.clone();
            let persister = persister.clone();
            std::thread::Builder::new()
                .name("deck-writer".to_string())
                .spawn(move || run(&shared, &persister))
        };
        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("Could not start storage writer: {e}; writing inline");
                None
            }
        };
        Self {
            shared,
            persister,
            thread,
        }
    }

    /// Queue `write`, replacing any older pending record.
    pub(crate) fn submit(&self, write: PendingWrite) {
        if self.thread.is_none() {
            self.persister.write_logged(write);
            return;
        }
        let mut slot = self.shared.lock();
        if slot.pending.as_ref().is_some_and(|p| p.seq > write.seq) {
            return;
        }
        slot.pending = Some(write);
        drop(slot);
        self.shared.changed.notify_all();
    }

    /// Write `write` on the calling thread, reporting storage errors.
    pub(crate) fn write_now(&self, write: PendingWrite) -> DeckResult<()> {
        self.persister.write(write)
    }

    /// Block until nothing is queued or being written.
    pub(crate) fn flush(&self) {
        let mut slot = self.shared.lock();
        while slot.pending.is_some() || slot.in_flight {
            slot = self.shared.wait(slot);
        }
    }
}

impl Drop for WriteBehind {
    fn drop(&mut self) {
        self.shared.lock().closed = true;
        self.shared.changed.notify_all();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::warn!("Storage writer panicked");
            }
        }
    }
}

fn run(shared: &Shared, persister: &Persister) {
    loop {
        let write = {
            let mut slot = shared.lock();
            loop {
                if let Some(write) = slot.pending.take() {
                    slot.in_flight = true;
                    break write;
                }
                if slot.closed {
                    return;
                }
                slot = shared.wait(slot);
            }
        };
        persister.write_logged(write);
        shared.lock().in_flight = false;
        shared.changed.notify_all();
    }
}
