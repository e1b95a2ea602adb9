//!
//! Runtime view of the registry.
//!
//! The registry itself lives in the platform's pre-entry section and is
//! walked by the loader. This module only keeps track of which entries have
//! actually run, as an intrusive lock-free list threaded through the
//! `EntryRecord` statics the macro emits. Nothing is allocated while
//! recording, so it is safe to use before the standard runtime is set up.
//!

use derive_more::Display;
use std::{
    collections::BTreeSet,
    ptr,
    sync::atomic::{AtomicBool, AtomicPtr, AtomicUsize, Ordering},
};

// head of the invoked list; every node is a `&'static EntryRecord`
static INVOKED_HEAD: AtomicPtr<EntryRecord> = AtomicPtr::new(ptr::null_mut());
static INVOKED_COUNT: AtomicUsize = AtomicUsize::new(0);

///
/// EntryRecord
///
/// Static metadata for one `#[global_ctor]` function. Emitted by the macro
/// next to the registry slot; user code only reads it.
///

#[derive(Debug)]
pub struct EntryRecord {
    name: &'static str,
    module_path: &'static str,
    file: &'static str,
    line: u32,
    invoked: AtomicBool,
    next: AtomicPtr<Self>,
}

impl EntryRecord {
    #[doc(hidden)]
    #[must_use]
    pub const fn new(
        name: &'static str,
        module_path: &'static str,
        file: &'static str,
        line: u32,
    ) -> Self {
        Self {
            name,
            module_path,
            file,
            line,
            invoked: AtomicBool::new(false),
            next: AtomicPtr::new(ptr::null_mut()),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn module_path(&self) -> &'static str {
        self.module_path
    }

    #[must_use]
    pub fn was_invoked(&self) -> bool {
        self.invoked.load(Ordering::Acquire)
    }

    #[must_use]
    pub const fn info(&self) -> EntryInfo {
        EntryInfo {
            module_path: self.module_path,
            name: self.name,
            file: self.file,
            line: self.line,
        }
    }

    /// Add this record to the invoked set. Returns false if it was already there.
    pub(crate) fn mark_invoked(&'static self) -> bool {
        if self.invoked.swap(true, Ordering::AcqRel) {
            return false;
        }

        let node = ptr::from_ref(self).cast_mut();
        let mut head = INVOKED_HEAD.load(Ordering::Acquire);
        loop {
            self.next.store(head, Ordering::Relaxed);
            match INVOKED_HEAD.compare_exchange_weak(
                head,
                node,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(current) => head = current,
            }
        }
        INVOKED_COUNT.fetch_add(1, Ordering::Relaxed);

        true
    }
}

///
/// EntryInfo
///
/// Identity of a registry entry. Ordered by identity only.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{module_path}::{name} ({file}:{line})")]
pub struct EntryInfo {
    pub module_path: &'static str,
    pub name: &'static str,
    pub file: &'static str,
    pub line: u32,
}

/// Every entry that has run so far, as a set.
///
/// There is no ordered view: invocation order is unspecified
/// and may differ between runs and platforms.
#[must_use]
pub fn invoked() -> BTreeSet<EntryInfo> {
    let mut out = BTreeSet::new();
    let mut cur = INVOKED_HEAD.load(Ordering::Acquire);

    // SAFETY: only `&'static EntryRecord` pointers are ever published to the list
    while let Some(record) = unsafe { cur.as_ref() } {
        out.insert(record.info());
        cur = record.next.load(Ordering::Acquire);
    }

    out
}

/// Number of entries that have run.
#[must_use]
pub fn invocation_count() -> usize {
    INVOKED_COUNT.load(Ordering::Relaxed)
}

/// True if an entry with this module path and name has run.
#[must_use]
pub fn contains(module_path: &str, name: &str) -> bool {
    invoked()
        .iter()
        .any(|info| info.module_path == module_path && info.name == name)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marking_is_idempotent() {
        static RECORD: EntryRecord = EntryRecord::new("once", module_path!(), file!(), line!());

        assert!(!RECORD.was_invoked());
        assert!(RECORD.mark_invoked());
        assert!(!RECORD.mark_invoked());
        assert!(RECORD.was_invoked());

        let hits = invoked()
            .into_iter()
            .filter(|info| info.name == "once")
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn invoked_is_a_set_snapshot() {
        static A: EntryRecord = EntryRecord::new("snap_a", module_path!(), file!(), line!());
        static B: EntryRecord = EntryRecord::new("snap_b", module_path!(), file!(), line!());

        let before = invocation_count();
        B.mark_invoked();
        A.mark_invoked();

        assert!(invocation_count() >= before + 2);
        assert!(contains(module_path!(), "snap_a"));
        assert!(contains(module_path!(), "snap_b"));
        assert!(invoked().contains(&A.info()));
    }

    #[test]
    fn info_display() {
        let info = EntryInfo {
            module_path: "app::boot",
            name: "init",
            file: "src/boot.rs",
            line: 12,
        };

        assert_eq!(info.to_string(), "app::boot::init (src/boot.rs:12)");
    }
}
