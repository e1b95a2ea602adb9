//!
//! Conditional-compilation evaluation for the offline scanner.
//!
//! The macro path never evaluates `cfg`: rustc does. The scanner has no
//! compiler behind it, so it evaluates predicates against an explicit
//! [`CfgSet`] and drops excluded items exactly the way rustc would.
//!

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use syn::{Attribute, Expr, Lit, LitBool, Meta, Token, punctuated::Punctuated};
use thiserror::Error as ThisError;

///
/// CfgError
///

#[derive(Debug, ThisError)]
pub enum CfgError {
    #[error("malformed cfg predicate: {0}")]
    Malformed(String),

    #[error("cfg predicate `{0}` expects exactly one argument")]
    Arity(&'static str),

    #[error("unknown cfg operator `{0}`")]
    UnknownOperator(String),
}

///
/// CfgPredicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CfgPredicate {
    Literal(bool),
    Flag(String),
    KeyValue(String, String),
    All(Vec<Self>),
    Any(Vec<Self>),
    Not(Box<Self>),
}

impl CfgPredicate {
    /// Parse the predicate inside a `#[cfg(..)]` attribute.
    pub fn from_attr(attr: &Attribute) -> Result<Self, CfgError> {
        if let Ok(meta) = attr.parse_args::<Meta>() {
            return Self::from_meta(&meta);
        }

        // cfg(true) / cfg(false)
        attr.parse_args::<LitBool>()
            .map(|lit| Self::Literal(lit.value))
            .map_err(|e| CfgError::Malformed(e.to_string()))
    }

    pub fn from_meta(meta: &Meta) -> Result<Self, CfgError> {
        match meta {
            // syn accepts keywords in meta paths, so `true` / `false` arrive here
            Meta::Path(path) => match path.get_ident().map(ToString::to_string) {
                Some(flag) if flag == "true" => Ok(Self::Literal(true)),
                Some(flag) if flag == "false" => Ok(Self::Literal(false)),
                Some(flag) => Ok(Self::Flag(flag)),
                None => Err(CfgError::Malformed(
                    "cfg flags must be single identifiers".into(),
                )),
            },

            Meta::NameValue(nv) => {
                let key = nv.path.get_ident().ok_or_else(|| {
                    CfgError::Malformed("cfg keys must be single identifiers".into())
                })?;
                let Expr::Lit(expr) = &nv.value else {
                    return Err(CfgError::Malformed(format!(
                        "value of `{key}` must be a string literal"
                    )));
                };
                let Lit::Str(value) = &expr.lit else {
                    return Err(CfgError::Malformed(format!(
                        "value of `{key}` must be a string literal"
                    )));
                };

                Ok(Self::KeyValue(key.to_string(), value.value()))
            }

            Meta::List(list) => {
                let op = list
                    .path
                    .get_ident()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let nested = list
                    .parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
                    .map_err(|e| CfgError::Malformed(e.to_string()))?;
                let mut preds = nested
                    .iter()
                    .map(Self::from_meta)
                    .collect::<Result<Vec<_>, _>>()?;

                match op.as_str() {
                    "all" => Ok(Self::All(preds)),
                    "any" => Ok(Self::Any(preds)),
                    "not" => {
                        if preds.len() != 1 {
                            return Err(CfgError::Arity("not"));
                        }
                        Ok(Self::Not(Box::new(preds.remove(0))))
                    }
                    _ => Err(CfgError::UnknownOperator(op)),
                }
            }
        }
    }

    #[must_use]
    pub fn eval(&self, set: &CfgSet) -> bool {
        match self {
            Self::Literal(value) => *value,
            Self::Flag(flag) => set.is_enabled(flag),
            Self::KeyValue(key, value) => set.has_value(key, value),
            Self::All(preds) => preds.iter().all(|p| p.eval(set)),
            Self::Any(preds) => preds.iter().any(|p| p.eval(set)),
            Self::Not(pred) => !pred.eval(set),
        }
    }
}

///
/// CfgSet
///
/// The active configuration: bare flags (`unix`, `test`) plus key/value
/// pairs (`target_os = "linux"`, `feature = "std"`). A key may carry several
/// values, as `feature` usually does.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CfgSet {
    #[serde(default)]
    pub flags: BTreeSet<String>,

    #[serde(default)]
    pub values: BTreeMap<String, BTreeSet<String>>,
}

impl CfgSet {
    /// Flags and values describing the machine the scanner runs on.
    ///
    /// Covers the keys rustc always sets, so a candidate guarded by one of
    /// them is seen the way a native build on this host sees it.
    /// `debug_assertions` follows the scanner's own build profile.
    #[must_use]
    pub fn host() -> Self {
        let endian = if cfg!(target_endian = "little") {
            "little"
        } else {
            "big"
        };
        let panic = if cfg!(panic = "abort") { "abort" } else { "unwind" };

        let mut set = Self::default()
            .with_value("target_os", std::env::consts::OS)
            .with_value("target_arch", std::env::consts::ARCH)
            .with_value("target_pointer_width", &usize::BITS.to_string())
            .with_value("target_endian", endian)
            .with_value("target_env", host_env())
            .with_value("target_vendor", host_vendor())
            .with_value("panic", panic);

        let family = std::env::consts::FAMILY;
        if !family.is_empty() {
            set = set.with_value("target_family", family).with_flag(family);
        }
        if cfg!(debug_assertions) {
            set = set.with_flag("debug_assertions");
        }

        set
    }

    #[must_use]
    pub fn with_flag(mut self, flag: &str) -> Self {
        self.flags.insert(flag.to_string());
        self
    }

    #[must_use]
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values
            .entry(key.to_string())
            .or_default()
            .insert(value.to_string());
        self
    }

    #[must_use]
    pub fn is_enabled(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    #[must_use]
    pub fn has_value(&self, key: &str, value: &str) -> bool {
        self.values.get(key).is_some_and(|v| v.contains(value))
    }

    /// Apply a command-line style setting: `flag`, `key=value` or `key="value"`.
    pub fn apply_arg(&mut self, arg: &str) -> Result<(), CfgError> {
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(CfgError::Malformed("empty --cfg argument".into()));
        }

        match arg.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                let value = value.trim().trim_matches('"');
                if key.is_empty() {
                    return Err(CfgError::Malformed(format!("missing key in `{arg}`")));
                }
                self.values
                    .entry(key.to_string())
                    .or_default()
                    .insert(value.to_string());
            }
            None => {
                self.flags.insert(arg.to_string());
            }
        }

        Ok(())
    }

    /// Overlay another set on top of this one.
    pub fn merge(&mut self, other: &Self) {
        self.flags.extend(other.flags.iter().cloned());
        for (key, values) in &other.values {
            self.values
                .entry(key.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }

    /// Evaluate every `#[cfg(..)]` on an item. No `cfg` means included.
    pub fn includes(&self, attrs: &[Attribute]) -> Result<bool, CfgError> {
        for attr in attrs.iter().filter(|a| a.path().is_ident("cfg")) {
            if !CfgPredicate::from_attr(attr)?.eval(self) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

const fn host_env() -> &'static str {
    if cfg!(target_env = "gnu") {
        "gnu"
    } else if cfg!(target_env = "musl") {
        "musl"
    } else if cfg!(target_env = "msvc") {
        "msvc"
    } else if cfg!(target_env = "sgx") {
        "sgx"
    } else if cfg!(target_env = "uclibc") {
        "uclibc"
    } else {
        ""
    }
}

const fn host_vendor() -> &'static str {
    if cfg!(target_vendor = "apple") {
        "apple"
    } else if cfg!(target_vendor = "pc") {
        "pc"
    } else if cfg!(target_vendor = "fortanix") {
        "fortanix"
    } else {
        "unknown"
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use syn::ItemFn;

    fn linux() -> CfgSet {
        CfgSet::default()
            .with_flag("unix")
            .with_value("target_os", "linux")
            .with_value("feature", "std")
    }

    fn includes(func: &ItemFn, set: &CfgSet) -> bool {
        set.includes(&func.attrs).expect("valid cfg")
    }

    #[test]
    fn host_carries_builtin_keys() {
        let host = CfgSet::host();

        assert!(host.has_value("target_pointer_width", &usize::BITS.to_string()));
        assert!(host.has_value("target_os", std::env::consts::OS));
        assert_eq!(host.is_enabled("debug_assertions"), cfg!(debug_assertions));
        for key in ["target_endian", "target_env", "target_vendor", "panic"] {
            assert!(host.values.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn flags_and_values() {
        let set = linux();
        let unix: ItemFn = syn::parse_quote!(#[cfg(unix)] fn f() {});
        let windows: ItemFn = syn::parse_quote!(#[cfg(windows)] fn f() {});
        let os: ItemFn = syn::parse_quote!(#[cfg(target_os = "linux")] fn f() {});
        let feat: ItemFn = syn::parse_quote!(#[cfg(feature = "alloc")] fn f() {});

        assert!(includes(&unix, &set));
        assert!(!includes(&windows, &set));
        assert!(includes(&os, &set));
        assert!(!includes(&feat, &set));
    }

    #[test]
    fn combinators() {
        let set = linux();
        let all: ItemFn = syn::parse_quote!(#[cfg(all(unix, feature = "std"))] fn f() {});
        let any: ItemFn = syn::parse_quote!(#[cfg(any(windows, target_os = "linux"))] fn f() {});
        let not: ItemFn = syn::parse_quote!(#[cfg(not(unix))] fn f() {});
        let empty_any: ItemFn = syn::parse_quote!(#[cfg(any())] fn f() {});
        let empty_all: ItemFn = syn::parse_quote!(#[cfg(all())] fn f() {});

        assert!(includes(&all, &set));
        assert!(includes(&any, &set));
        assert!(!includes(&not, &set));
        assert!(!includes(&empty_any, &set));
        assert!(includes(&empty_all, &set));
    }

    #[test]
    fn every_cfg_attribute_must_hold() {
        let func: ItemFn = syn::parse_quote! {
            #[cfg(unix)]
            #[cfg(feature = "nightly")]
            fn f() {}
        };

        assert!(!includes(&func, &linux()));
    }

    #[test]
    fn boolean_literals() {
        let yes: ItemFn = syn::parse_quote!(#[cfg(true)] fn f() {});
        let no: ItemFn = syn::parse_quote!(#[cfg(false)] fn f() {});

        assert!(includes(&yes, &CfgSet::default()));
        assert!(!includes(&no, &CfgSet::default()));
    }

    #[test]
    fn not_requires_one_argument() {
        let func: ItemFn = syn::parse_quote!(#[cfg(not(unix, windows))] fn f() {});
        let err = CfgSet::default().includes(&func.attrs).unwrap_err();

        assert!(matches!(err, CfgError::Arity("not")));
    }

    #[test]
    fn apply_arg_parses_flags_and_pairs() {
        let mut set = CfgSet::default();
        set.apply_arg("test").unwrap();
        set.apply_arg("feature=\"serde\"").unwrap();
        set.apply_arg("target_os = linux").unwrap();

        assert!(set.is_enabled("test"));
        assert!(set.has_value("feature", "serde"));
        assert!(set.has_value("target_os", "linux"));
        assert!(set.apply_arg("=x").is_err());
    }

    #[test]
    fn merge_unions_values() {
        let mut base = CfgSet::default().with_value("feature", "std");
        base.merge(&CfgSet::default().with_value("feature", "alloc").with_flag("test"));

        assert!(base.has_value("feature", "std"));
        assert!(base.has_value("feature", "alloc"));
        assert!(base.is_enabled("test"));
    }
}
