//! `#[global_ctor]`
//!
//! The pipeline is staged the same way for every input:
//!
//!   parse → validate → expand
//!
//! Parsing only accepts a function item. Validation runs the shared rules
//! from `premain-core`, so the macro and the offline scanner can never
//! disagree about what is a valid constructor. Expansion emits the original
//! function plus a registry slot in the platform's pre-entry section.

mod expand;
mod parse;
mod validate;

use proc_macro2::TokenStream as TokenStream2;

pub fn expand_entry(attr: TokenStream2, item: TokenStream2) -> TokenStream2 {
    // ---------------------------------------------------------------------
    // Parse phase
    // ---------------------------------------------------------------------

    if let Err(e) = parse::parse_args(attr) {
        return e.to_compile_error();
    }

    let func = match parse::parse_item(item) {
        Ok(func) => func,
        Err(e) => return e.to_compile_error(),
    };

    // ---------------------------------------------------------------------
    // Validate phase
    // ---------------------------------------------------------------------

    let validated = match validate::validate(&func) {
        Ok(v) => v,
        Err(e) => {
            // keep the function so follow-up errors point at real code
            let err = e.to_compile_error();
            return quote::quote!(#func #err);
        }
    };

    // ---------------------------------------------------------------------
    // Expansion phase
    // ---------------------------------------------------------------------

    expand::expand(&validated, &func)
}

///
/// TESTS
///
