//! Host-side recognizer for global constructors.
//!
//! Shared by the `premain-macros` attribute macros and the `premain` CLI:
//! - `validate` holds the candidate rules (signature, safety, target conflict),
//! - `scope` tracks enclosing modules/functions and their restrictions,
//! - `cfg` evaluates conditional compilation for offline scans,
//! - `scan` walks whole source trees into a registry and diagnostics,
//! - `config` loads `premain.toml`.

pub mod cfg;
pub mod config;
pub mod error;
pub mod model;
pub mod scan;
pub mod scope;
pub mod validate;

pub use error::{Violation, ViolationKind, Violations};
pub use model::{Diagnostic, Registry, RegistryEntry, ScanReport};
pub use scan::{ScanError, Scanner, check_scope};

/// Attribute name recognized as the global-constructor marking.
pub const MARKER: &str = "global_ctor";
