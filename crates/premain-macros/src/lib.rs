//! Attribute macros for `premain`.
//!
//! Use them through the `premain` crate; the expansion refers to
//! `::premain::registry` and `::premain::startup`.

mod ctor;
mod scope;

use proc_macro::TokenStream;

/// Register a function to run before `main`.
///
/// The function must be `unsafe`, take no arguments, return nothing, and must
/// not carry (or sit inside something that carries) `#[target_feature]`.
/// Violations are reported at compile time.
///
/// On its own the attribute only sees the function it is placed on. A
/// `#[target_feature]` on an enclosing function is not detected here: put
/// [`macro@ctor_scope`] on the enclosing item, or run `premain check` over
/// the tree, to have inherited restrictions rejected as well.
#[proc_macro_attribute]
pub fn global_ctor(attr: TokenStream, item: TokenStream) -> TokenStream {
    ctor::expand_entry(attr.into(), item.into()).into()
}

/// Check an inline module or function for global constructors that would
/// inherit a `#[target_feature]` restriction from it.
///
/// The item is emitted unchanged.
#[proc_macro_attribute]
pub fn ctor_scope(attr: TokenStream, item: TokenStream) -> TokenStream {
    scope::expand_scope(attr.into(), item.into()).into()
}
