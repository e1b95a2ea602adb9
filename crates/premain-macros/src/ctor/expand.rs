use premain_core::validate::ValidatedCtor;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{ItemFn, LitStr};

//
// ============================================================================
// expand - code generation only
// ============================================================================
//
// For every accepted function the expansion emits, next to the untouched
// function:
//
// - an `EntryRecord` with the function's identity,
// - a C-ABI thunk that runs the function through `startup::run_entry`,
// - a `#[used]` slot holding the thunk in the pre-entry section the
//   platform loader walks before `main`.
//
// Everything lives in an anonymous `const _` block so several constructors
// in one module never collide. The function's `cfg` attributes are repeated
// on the block: a configured-out function leaves no slot behind.
//

pub fn expand(validated: &ValidatedCtor, func: &ItemFn) -> TokenStream2 {
    let name = &validated.name;
    let cfgs = &validated.cfgs;
    let name_lit = LitStr::new(&name.to_string(), name.span());
    let slot = slot_static();

    quote! {
        #func

        #(#cfgs)*
        const _: () = {
            static __PREMAIN_ENTRY: ::premain::registry::EntryRecord =
                ::premain::registry::EntryRecord::new(
                    #name_lit,
                    ::core::module_path!(),
                    ::core::file!(),
                    ::core::line!(),
                );

            extern "C" fn __premain_thunk() {
                // SAFETY: the function was validated as an `unsafe fn()` whose
                // author accepted the startup-phase obligations
                unsafe { ::premain::startup::run_entry(&__PREMAIN_ENTRY, #name) };
            }

            #slot
        };
    }
}

// Linker-section placement per platform family. Targets outside these
// families fail to build instead of silently never running the entry.
fn slot_static() -> TokenStream2 {
    quote! {
        #[used]
        #[cfg_attr(
            any(
                target_os = "linux",
                target_os = "android",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
                target_os = "dragonfly",
                target_os = "illumos",
                target_os = "solaris",
                target_os = "haiku",
            ),
            unsafe(link_section = ".init_array")
        )]
        #[cfg_attr(target_vendor = "apple", unsafe(link_section = "__DATA,__mod_init_func"))]
        #[cfg_attr(windows, unsafe(link_section = ".CRT$XCU"))]
        static __PREMAIN_SLOT: extern "C" fn() = __premain_thunk;

        #[cfg(not(any(
            target_os = "linux",
            target_os = "android",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "openbsd",
            target_os = "dragonfly",
            target_os = "illumos",
            target_os = "solaris",
            target_os = "haiku",
            target_vendor = "apple",
            windows,
        )))]
        ::core::compile_error!("global constructors are not supported on this target");
    }
}
