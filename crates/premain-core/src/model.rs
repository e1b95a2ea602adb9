use crate::error::{Violation, ViolationKind};
use serde::Serialize;
use std::collections::BTreeSet;

///
/// Location
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

///
/// RegistryEntry
///
/// A validated global constructor as the scanner sees it. Entries compare by
/// identity only; nothing about declaration or invocation order is kept.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct RegistryEntry {
    pub file: String,
    pub module_path: Vec<String>,
    pub name: String,
    pub line: usize,
}

impl RegistryEntry {
    /// `outer::inner::name`, relative to the scanned file.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        let mut parts = self.module_path.clone();
        parts.push(self.name.clone());
        parts.join("::")
    }
}

///
/// Registry
///
/// Set of every entry that passed validation and survived conditional
/// compilation, across all scanned files.
///

#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Registry {
    entries: BTreeSet<RegistryEntry>,
}

impl Registry {
    /// Returns false if an identical entry was already present.
    pub fn insert(&mut self, entry: RegistryEntry) -> bool {
        self.entries.insert(entry)
    }

    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any entry has this function name.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn names(&self) -> BTreeSet<String> {
        self.entries.iter().map(RegistryEntry::qualified_name).collect()
    }
}

///
/// Diagnostic
///
/// A violation flattened for reporting outside a compiler.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: ViolationKind,
    pub function: String,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    #[must_use]
    pub fn from_violation(file: &str, violation: &Violation) -> Self {
        let (line, column) = violation.line_column();

        Self {
            kind: violation.kind,
            function: violation.function.clone(),
            message: violation.message.clone(),
            location: Location {
                file: file.to_string(),
                line,
                column,
            },
        }
    }
}

///
/// ScanReport
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct ScanReport {
    pub files: usize,
    pub registry: Registry,
    pub diagnostics: Vec<Diagnostic>,

    /// Marked items dropped by a false `cfg`. Not diagnostics; kept for
    /// verbose output only.
    #[serde(skip)]
    pub excluded: usize,
}

impl ScanReport {
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn merge(&mut self, other: Self) {
        self.files += other.files;
        self.registry.merge(other.registry);
        self.diagnostics.extend(other.diagnostics);
        self.excluded += other.excluded;
    }

    /// Diagnostics of one kind.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

///
/// TESTS
///
