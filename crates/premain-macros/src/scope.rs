//! `#[ctor_scope]`
//!
//! An attribute macro only sees its own item, so `#[global_ctor]` cannot tell
//! whether an enclosing function carries `#[target_feature]`. Placing
//! `#[ctor_scope]` on the enclosing item runs the same scope walk the
//! offline scanner does over everything inside it.

use premain_core::MARKER;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Item, spanned::Spanned};

pub fn expand_scope(attr: TokenStream2, item: TokenStream2) -> TokenStream2 {
    if !attr.is_empty() {
        return syn::Error::new(attr.span(), "ctor_scope takes no arguments").to_compile_error();
    }

    let parsed = match syn::parse2::<Item>(item.clone()) {
        Ok(item @ (Item::Mod(_) | Item::Fn(_))) => item,
        Ok(other) => {
            return syn::Error::new(
                other.span(),
                "ctor_scope can only be applied to a module or a function",
            )
            .to_compile_error();
        }
        Err(e) => return e.to_compile_error(),
    };

    let markers = [MARKER.to_string()];
    let errors = premain_core::check_scope(&parsed, &markers)
        .to_syn_error()
        .map(|e| e.to_compile_error());

    quote!(#item #errors)
}
