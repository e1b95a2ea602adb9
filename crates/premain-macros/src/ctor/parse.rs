use proc_macro2::TokenStream as TokenStream2;
use syn::{Item, ItemFn, spanned::Spanned};

//
// ============================================================================
// parse - attribute arguments and item shape only
// ============================================================================
//

pub fn parse_args(attr: TokenStream2) -> syn::Result<()> {
    if attr.is_empty() {
        Ok(())
    } else {
        Err(syn::Error::new(attr.span(), "global_ctor takes no arguments"))
    }
}

pub fn parse_item(item: TokenStream2) -> syn::Result<ItemFn> {
    match syn::parse2::<Item>(item)? {
        Item::Fn(func) => Ok(func),
        Item::Static(item) => Err(syn::Error::new_spanned(
            &item.ident,
            "global constructor must be a function declaration; statics are not registered",
        )),
        Item::Const(item) => Err(syn::Error::new_spanned(
            &item.ident,
            "global constructor must be a function declaration; constants are not registered",
        )),
        Item::ForeignMod(item) => Err(syn::Error::new_spanned(
            &item.abi,
            "global constructor must have a body; foreign functions are not registered",
        )),
        other => Err(syn::Error::new(
            other.span(),
            "global_ctor can only be applied to a function",
        )),
    }
}
