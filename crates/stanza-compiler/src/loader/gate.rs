//! Per-key load coordination.
//!
//! Many threads may race to load the same type at once. The gate gives each
//! load key singleflight semantics: one thread imports, every other thread
//! either waits for the result or, when it is the owner re-entering from a
//! nested reference, backs off immediately instead of deadlocking on itself.
//!
//! All state lives behind one mutex: the in-flight ticket map and the set of
//! keys already loaded this session. Keeping both under the same lock makes
//! the "already loaded?" check and the ownership claim a single atomic step.
//! Wakeup is a broadcast on a shared condvar; woken threads loop back to the
//! loaded-set check rather than recursing.

use parking_lot::{Condvar, Mutex};
use rustc_hash::{FxHashMap, FxHashSet};
use std::thread::{self, ThreadId};
use tracing::trace;

/// Ownership record of one in-flight load.
struct Ticket {
    owner: ThreadId,
}

#[derive(Default)]
struct GateState {
    /// In-flight loads keyed by load key. At most one ticket per key.
    tickets: FxHashMap<String, Ticket>,
    /// Keys whose import completed successfully this session.
    loaded: FxHashSet<String>,
}

/// Outcome of [`LoadGate::enter`].
pub enum Entry<'gate> {
    /// The key was already loaded this session; nothing to do.
    Loaded,
    /// The calling thread now owns the load. The guard releases ownership
    /// when dropped; call [`TicketGuard::commit`] first on success.
    Granted(TicketGuard<'gate>),
    /// The calling thread already owns an in-flight load of this key
    /// higher up its call stack. Importing again would deadlock or
    /// duplicate work; the outer frame will finish the job.
    Reentrant,
}

/// Serializes concurrent loads of the same key.
pub struct LoadGate {
    state: Mutex<GateState>,
    released: Condvar,
}

impl LoadGate {
    /// Create a gate with no in-flight loads and an empty loaded set.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            released: Condvar::new(),
        }
    }

    /// Enter the gate for `key`.
    ///
    /// Blocks while a different thread owns the key, waking on release and
    /// re-checking from the top: the owner may have completed the load
    /// (return [`Entry::Loaded`]) or abandoned it (claim the ticket and
    /// return [`Entry::Granted`]).
    pub fn enter(&self, key: &str) -> Entry<'_> {
        let me = thread::current().id();
        let mut state = self.state.lock();

        loop {
            if state.loaded.contains(key) {
                return Entry::Loaded;
            }

            match state.tickets.get(key).map(|ticket| ticket.owner) {
                None => {
                    state
                        .tickets
                        .insert(key.to_string(), Ticket { owner: me });
                    return Entry::Granted(TicketGuard {
                        gate: self,
                        key: key.to_string(),
                        owner: me,
                        loaded: false,
                    });
                }
                Some(owner) if owner == me => {
                    return Entry::Reentrant;
                }
                Some(_) => {
                    trace!(key, "waiting for in-flight load");
                    self.released.wait(&mut state);
                }
            }
        }
    }

    /// Whether `key` completed a successful import this session.
    pub fn is_loaded(&self, key: &str) -> bool {
        self.state.lock().loaded.contains(key)
    }

    /// Whether a load of `key` is currently in flight.
    pub fn in_flight(&self, key: &str) -> bool {
        self.state.lock().tickets.contains_key(key)
    }

    /// Release the ticket for `key` and wake every waiter.
    ///
    /// Only called from [`TicketGuard::drop`], so it runs exactly once per
    /// granted entry, on success, failure, and unwind alike. The assertions
    /// guard gate invariants; tripping one is a defect in the gate itself.
    fn release(&self, key: &str, owner: ThreadId, mark_loaded: bool) {
        let mut state = self.state.lock();

        match state.tickets.remove(key) {
            Some(ticket) => assert_eq!(
                ticket.owner, owner,
                "load ticket for '{key}' released by a non-owning thread"
            ),
            None => panic!("load ticket for '{key}' released without a matching claim"),
        }

        if mark_loaded {
            state.loaded.insert(key.to_string());
        }

        drop(state);
        self.released.notify_all();
    }
}

impl Default for LoadGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Ownership of one in-flight load, released on drop.
pub struct TicketGuard<'gate> {
    gate: &'gate LoadGate,
    key: String,
    owner: ThreadId,
    loaded: bool,
}

impl TicketGuard<'_> {
    /// The key this guard owns.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Mark the import successful: the key joins the loaded set when the
    /// guard releases. Without this, the release leaves the key absent so
    /// a later attempt may retry.
    pub fn commit(mut self) {
        self.loaded = true;
    }
}

impl Drop for TicketGuard<'_> {
    fn drop(&mut self) {
        self.gate.release(&self.key, self.owner, self.loaded);
    }
}
