use crate::startup::{Phase, PhaseError};
use std::{
    cell::UnsafeCell,
    fmt,
    mem::MaybeUninit,
    sync::atomic::{AtomicU8, Ordering},
};

const UNSET: u8 = 0;
const WRITING: u8 = 1;
const SET: u8 = 2;

///
/// StartupCell
///
/// A global with a constant default that a global constructor may override,
/// at most once, while the startup phase is active.
///
/// Readers never observe a partially constructed value: they see the
/// constant default until the override is fully written, then the override.
/// Whether any constructor ran is irrelevant to soundness; the default is
/// always valid.
///
/// ```ignore
/// static LIMIT: StartupCell<u32> = StartupCell::new(64);
///
/// #[global_ctor]
/// unsafe fn raise_limit() {
///     let _ = LIMIT.set(256);
/// }
/// ```
///

pub struct StartupCell<T> {
    default: T,
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

// SAFETY: the override is written once before `state` is released as SET and
// never mutated afterwards; readers only touch it after an acquire of SET.
unsafe impl<T: Send + Sync> Sync for StartupCell<T> {}

impl<T> StartupCell<T> {
    #[must_use]
    pub const fn new(default: T) -> Self {
        Self {
            default,
            state: AtomicU8::new(UNSET),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// The override if one was set, the constant default otherwise.
    pub fn get(&self) -> &T {
        if self.state.load(Ordering::Acquire) == SET {
            // SAFETY: SET is only published after the write completed
            unsafe { (*self.value.get()).assume_init_ref() }
        } else {
            &self.default
        }
    }

    #[must_use]
    pub const fn default_value(&self) -> &T {
        &self.default
    }

    pub fn is_overridden(&self) -> bool {
        self.state.load(Ordering::Acquire) == SET
    }

    /// Override the default. Only allowed from inside a global constructor,
    /// and only once.
    pub fn set(&self, value: T) -> Result<(), PhaseError> {
        if Phase::current() != Phase::Startup {
            return Err(PhaseError::NotInStartup);
        }

        if self
            .state
            .compare_exchange(UNSET, WRITING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(PhaseError::AlreadySet);
        }

        // SAFETY: the WRITING state gives this call exclusive access
        unsafe { (*self.value.get()).write(value) };
        self.state.store(SET, Ordering::Release);

        Ok(())
    }
}

impl<T: Copy> StartupCell<T> {
    #[must_use]
    pub fn value(&self) -> T {
        *self.get()
    }
}

impl<T> Drop for StartupCell<T> {
    fn drop(&mut self) {
        if *self.state.get_mut() == SET {
            // SAFETY: SET means the value was initialized and never dropped
            unsafe { self.value.get_mut().assume_init_drop() };
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StartupCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartupCell")
            .field("value", self.get())
            .field("overridden", &self.is_overridden())
            .finish()
    }
}

///
/// TESTS
///
