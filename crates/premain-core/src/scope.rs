use proc_macro2::Span;
use quote::ToTokens;
use syn::{Attribute, Meta, Token, punctuated::Punctuated, spanned::Spanned};

///
/// TargetRestriction
///
/// A `#[target_feature(..)]` found on an item, either directly or inside a
/// `#[cfg_attr(..)]`. Conditional restrictions are treated as present: the
/// recognizer does not know which way the predicate will go on every target.
///

#[derive(Clone, Debug)]
pub struct TargetRestriction {
    pub features: String,
    pub conditional: bool,
    pub span: Span,
}

impl TargetRestriction {
    #[must_use]
    pub fn describe(&self) -> String {
        if self.conditional {
            format!("`#[cfg_attr(.., target_feature({}))]`", self.features)
        } else {
            format!("`#[target_feature({})]`", self.features)
        }
    }
}

/// Collect every target-capability restriction carried by `attrs`.
#[must_use]
pub fn target_restrictions(attrs: &[Attribute]) -> Vec<TargetRestriction> {
    let mut out = Vec::new();

    for attr in attrs {
        if attr.path().is_ident("target_feature") {
            out.push(TargetRestriction {
                features: meta_args(&attr.meta),
                conditional: false,
                span: attr.span(),
            });
            continue;
        }

        if attr.path().is_ident("cfg_attr") {
            let Ok(nested) = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
            else {
                continue;
            };

            // first element is the predicate, the rest are conditional attributes
            for meta in nested.iter().skip(1) {
                if meta.path().is_ident("target_feature") {
                    out.push(TargetRestriction {
                        features: meta_args(meta),
                        conditional: true,
                        span: attr.span(),
                    });
                }
            }
        }
    }

    out
}

/// The `#[cfg(..)]` attributes of an item, in declaration order.
#[must_use]
pub fn cfg_attrs(attrs: &[Attribute]) -> Vec<Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("cfg"))
        .cloned()
        .collect()
}

/// True when any attribute path ends in one of `markers`.
///
/// Accepts both `#[global_ctor]` and `#[premain::global_ctor]`.
#[must_use]
pub fn has_marker(attrs: &[Attribute], markers: &[String]) -> bool {
    attrs.iter().any(|attr| {
        attr.path()
            .segments
            .last()
            .is_some_and(|seg| markers.iter().any(|m| seg.ident == m))
    })
}

fn meta_args(meta: &Meta) -> String {
    match meta {
        Meta::List(list) => list.tokens.to_string(),
        other => other.to_token_stream().to_string(),
    }
}

///
/// ScopeKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScopeKind {
    Module,
    Function,
}

impl ScopeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Function => "function",
        }
    }
}

///
/// ScopeFrame
///
/// One enclosing `mod` or `fn` around a candidate.
///

#[derive(Clone, Debug)]
pub struct ScopeFrame {
    pub kind: ScopeKind,
    pub name: String,
    pub restrictions: Vec<TargetRestriction>,
}

impl ScopeFrame {
    #[must_use]
    pub fn new(kind: ScopeKind, name: impl Into<String>, attrs: &[Attribute]) -> Self {
        Self {
            kind,
            name: name.into(),
            restrictions: target_restrictions(attrs),
        }
    }
}

///
/// ScopeChain
///
/// Stack of enclosing scopes, outermost first. Restrictions on any frame
/// propagate to every candidate nested below it.
///

#[derive(Clone, Debug, Default)]
pub struct ScopeChain {
    frames: Vec<ScopeFrame>,
}

impl ScopeChain {
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: ScopeFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<ScopeFrame> {
        self.frames.pop()
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Names of the enclosing scopes, outermost first.
    #[must_use]
    pub fn path(&self) -> Vec<String> {
        self.frames.iter().map(|f| f.name.clone()).collect()
    }

    /// Names of the enclosing modules only, outermost first. Matches what
    /// `module_path!()` reports for an item declared here.
    #[must_use]
    pub fn module_path(&self) -> Vec<String> {
        self.frames
            .iter()
            .filter(|f| f.kind == ScopeKind::Module && !f.name.is_empty())
            .map(|f| f.name.clone())
            .collect()
    }

    /// Every restriction inherited from an enclosing scope.
    pub fn restrictions(&self) -> impl Iterator<Item = (&ScopeFrame, &TargetRestriction)> {
        self.frames
            .iter()
            .flat_map(|frame| frame.restrictions.iter().map(move |r| (frame, r)))
    }
}

///
/// TESTS
///
