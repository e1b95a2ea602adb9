use proc_macro2::Span;
use serde::Serialize;
use std::fmt::{self, Display};
use syn::Ident;
use thiserror::Error as ThisError;

///
/// ViolationKind
///
/// The three ways a global constructor can be rejected. All of them are
/// compile-time failures; nothing here has a runtime counterpart.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ViolationKind {
    /// Wrong parameter list, return type or function shape.
    #[serde(rename = "SignatureError")]
    Signature,
    /// Missing `unsafe` marking.
    #[serde(rename = "SafetyError")]
    Safety,
    /// A `target_feature` restriction on the function or an enclosing scope.
    #[serde(rename = "TargetConflictError")]
    TargetConflict,
}

impl ViolationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Signature => "SignatureError",
            Self::Safety => "SafetyError",
            Self::TargetConflict => "TargetConflictError",
        }
    }
}

impl Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// Violation
///
/// One rejected rule for one candidate, anchored at the token that caused it.
///

#[derive(Clone, Debug, ThisError)]
#[error("{kind}: global constructor `{function}` {message}")]
pub struct Violation {
    pub kind: ViolationKind,
    pub function: String,
    pub message: String,
    pub span: Span,
}

impl Violation {
    pub fn new(kind: ViolationKind, function: &Ident, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            function: function.to_string(),
            message: message.into(),
            span,
        }
    }

    pub fn signature(function: &Ident, span: Span, message: impl Into<String>) -> Self {
        Self::new(ViolationKind::Signature, function, span, message)
    }

    pub fn safety(function: &Ident, span: Span) -> Self {
        Self::new(ViolationKind::Safety, function, span, "must be marked unsafe")
    }

    pub fn target_conflict(function: &Ident, span: Span, message: impl Into<String>) -> Self {
        Self::new(ViolationKind::TargetConflict, function, span, message)
    }

    /// 1-based line and column of the offending token.
    ///
    /// Only meaningful for spans produced by parsing source text on the host;
    /// inside a proc-macro invocation this reports `(0, 1)`.
    #[must_use]
    pub fn line_column(&self) -> (usize, usize) {
        let start = self.span.start();

        (start.line, start.column + 1)
    }

    #[must_use]
    pub fn to_syn_error(&self) -> syn::Error {
        syn::Error::new(self.span, self.to_string())
    }
}

///
/// Violations
///
/// Every violation found for a candidate (or a scope). Reported together so
/// one compile surfaces all of them.
///

#[derive(Clone, Debug, Default, ThisError)]
#[error("{} global constructor violation(s)", .0.len())]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<ViolationKind> {
        self.0.iter().map(|v| v.kind).collect()
    }

    /// Fold every violation into a single combined `syn::Error`.
    #[must_use]
    pub fn to_syn_error(&self) -> Option<syn::Error> {
        let mut iter = self.0.iter();
        let mut combined = iter.next()?.to_syn_error();
        for violation in iter {
            combined.combine(violation.to_syn_error());
        }

        Some(combined)
    }

    /// `Ok(())` when nothing was found.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

///
/// TESTS
///
