use premain_core::{scope::ScopeChain, validate::ValidatedCtor};
use syn::ItemFn;

///
/// validate
///
/// Runs the shared rules with an empty scope chain: an attribute macro
/// cannot see what encloses the function. Inherited restrictions are checked
/// by `#[ctor_scope]` and by the offline scanner.
///

pub fn validate(func: &ItemFn) -> syn::Result<ValidatedCtor> {
    premain_core::validate::validate_fn(func, &ScopeChain::new()).map_err(|violations| {
        violations
            .to_syn_error()
            .unwrap_or_else(|| syn::Error::new_spanned(&func.sig.ident, "invalid global constructor"))
    })
}
