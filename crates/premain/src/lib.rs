//! Run functions before `main`.
//!
//! Mark an `unsafe fn()` with [`global_ctor`] and it is placed in the
//! platform's pre-entry section, so the loader invokes it before `main`
//! starts. Every constructor linked into the final binary runs exactly once,
//! in an unspecified order:
//!
//! ```ignore
//! use premain::global_ctor;
//!
//! #[global_ctor]
//! unsafe fn register_codecs() {
//!     // no I/O, no panics, no assumptions about other constructors
//! }
//! ```
//!
//! Signature, safety and `#[target_feature]` rules are checked at compile
//! time. Wrap an enclosing inline module or function in [`ctor_scope`] to
//! also check restrictions inherited from it, or run the `premain` CLI over
//! the whole tree.
//!
//! - [`registry`] reports which constructors have run, as a set,
//! - [`startup`] exposes the phase a thread is in and its capabilities,
//! - [`cell`] holds globals a constructor may override once.

pub mod cell;
pub mod registry;
pub mod startup;

// the expansion refers to `::premain`, including inside this crate's tests
extern crate self as premain;

pub use cell::StartupCell;
pub use premain_macros::{ctor_scope, global_ctor};
pub use startup::{Capability, Phase, PhaseError};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        StartupCell, ctor_scope, global_ctor,
        startup::{Capability, Phase, require},
    };
}

///
/// TESTS
///
