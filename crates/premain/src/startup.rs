//!
//! Startup phase tracking.
//!
//! Global constructors run before `main` and before the standard runtime has
//! finished its own setup. While an entry is executing the current thread is
//! in [`Phase::Startup`], with a reduced capability set: no I/O and no
//! panicking. Helpers that would need either can call [`require`] and back
//! off instead of touching half-initialized runtime state.
//!

use crate::registry::{EntryInfo, EntryRecord};
use derive_more::Display;
use std::cell::Cell;
use thiserror::Error as ThisError;

thread_local! {
    // entries currently executing on this thread (nested invocations count)
    static ACTIVE: Cell<usize> = const { Cell::new(0) };
    static CURRENT: Cell<Option<&'static EntryRecord>> = const { Cell::new(None) };
}

///
/// Phase
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Phase {
    /// A global constructor is running on this thread.
    Startup,
    /// Ordinary execution.
    Steady,
}

impl Phase {
    #[must_use]
    pub fn current() -> Self {
        if ACTIVE.with(Cell::get) > 0 {
            Self::Startup
        } else {
            Self::Steady
        }
    }
}

///
/// Capability
///
/// Things steady-state code takes for granted that a startup entry may not.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Capability {
    /// Buffered or unbuffered I/O through std.
    #[display("io")]
    Io,
    /// Signalling an unrecoverable error.
    #[display("panic")]
    Panic,
}

///
/// PhaseError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum PhaseError {
    #[error("{capability} is not available while global constructor `{entry}` runs")]
    Forbidden {
        capability: Capability,
        entry: &'static str,
    },

    #[error("startup values can only be set while a global constructor runs")]
    NotInStartup,

    #[error("startup value was already set")]
    AlreadySet,
}

/// Refuse `capability` while a global constructor is running.
pub fn require(capability: Capability) -> Result<(), PhaseError> {
    match CURRENT.with(Cell::get) {
        Some(record) if Phase::current() == Phase::Startup => Err(PhaseError::Forbidden {
            capability,
            entry: record.name(),
        }),
        _ => Ok(()),
    }
}

/// The entry currently running on this thread, if any.
#[must_use]
pub fn current_entry() -> Option<EntryInfo> {
    CURRENT.with(Cell::get).map(EntryRecord::info)
}

//
// EntryGuard
// Marks the thread as in the startup phase; restores the previous state on
// drop, including while unwinding.
//

struct EntryGuard {
    previous: Option<&'static EntryRecord>,
}

impl EntryGuard {
    fn enter(record: &'static EntryRecord) -> Self {
        ACTIVE.with(|a| a.set(a.get() + 1));
        let previous = CURRENT.with(|c| c.replace(Some(record)));

        Self { previous }
    }
}

impl Drop for EntryGuard {
    fn drop(&mut self) {
        CURRENT.with(|c| c.set(self.previous));
        ACTIVE.with(|a| a.set(a.get().saturating_sub(1)));
    }
}

/// Invoke one registry entry and record it in the invoked set.
///
/// Called by the thunks `#[global_ctor]` generates; not meant for user code.
///
/// # Safety
///
/// `entry` is an `unsafe fn` whose author accepted the startup-phase
/// obligations; the caller forwards that obligation unchanged.
#[doc(hidden)]
pub unsafe fn run_entry(record: &'static EntryRecord, entry: unsafe fn()) {
    let guard = EntryGuard::enter(record);
    // SAFETY: forwarded from the caller
    unsafe { entry() };
    drop(guard);

    record.mark_invoked();
}

///
/// TESTS
///
