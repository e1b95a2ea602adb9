use crate::{
    error::{Violation, Violations},
    scope::{ScopeChain, cfg_attrs, target_restrictions},
};
use syn::{Attribute, FnArg, Ident, ItemFn, ReturnType, Signature, Type, spanned::Spanned};

///
/// ValidatedCtor
///
/// A candidate that passed every rule. Carries what the emitter needs: the
/// function name and the `cfg` attributes to forward onto the registry slot.
///

#[derive(Clone, Debug)]
pub struct ValidatedCtor {
    pub name: Ident,
    pub cfgs: Vec<Attribute>,
}

/// Validate a marked function against every rule, including restrictions
/// inherited from `scope`.
pub fn validate_fn(func: &ItemFn, scope: &ScopeChain) -> Result<ValidatedCtor, Violations> {
    validate_parts(&func.sig, &func.attrs, scope)
}

/// Validate a marked function from its signature and attributes.
pub fn validate_parts(
    sig: &Signature,
    attrs: &[Attribute],
    scope: &ScopeChain,
) -> Result<ValidatedCtor, Violations> {
    let mut violations = validate_signature(sig);
    violations.extend(validate_own_target(&sig.ident, attrs));
    violations.extend(validate_enclosing(&sig.ident, scope));

    violations.into_result().map(|()| ValidatedCtor {
        name: sig.ident.clone(),
        cfgs: cfg_attrs(attrs),
    })
}

/// Shape and safety rules.
#[must_use]
pub fn validate_signature(sig: &Signature) -> Violations {
    let name = &sig.ident;
    let mut violations = Violations::default();

    if let Some(first) = sig.inputs.first() {
        let span = match first {
            FnArg::Receiver(recv) => recv.span(),
            FnArg::Typed(pat) => pat.span(),
        };
        violations.push(Violation::signature(name, span, "must take zero arguments"));
    } else if let Some(variadic) = &sig.variadic {
        violations.push(Violation::signature(
            name,
            variadic.span(),
            "must take zero arguments",
        ));
    }

    if !returns_unit(&sig.output) {
        violations.push(Violation::signature(
            name,
            sig.output.span(),
            "must return nothing",
        ));
    }

    if sig.unsafety.is_none() {
        violations.push(Violation::safety(name, sig.fn_token.span));
    }

    if let Some(asyncness) = &sig.asyncness {
        violations.push(Violation::signature(name, asyncness.span, "must not be async"));
    }

    if !sig.generics.params.is_empty() {
        violations.push(Violation::signature(
            name,
            sig.generics.span(),
            "must not be generic",
        ));
    }

    if let Some(abi) = &sig.abi
        && abi.name.as_ref().is_none_or(|lit| lit.value() != "Rust")
    {
        violations.push(Violation::signature(
            name,
            abi.span(),
            "must use the Rust ABI",
        ));
    }

    violations
}

/// A restriction written on the candidate itself.
#[must_use]
pub fn validate_own_target(name: &Ident, attrs: &[Attribute]) -> Violations {
    let mut violations = Violations::default();

    for restriction in target_restrictions(attrs) {
        violations.push(Violation::target_conflict(
            name,
            restriction.span,
            format!(
                "must not carry {}: it is invoked unconditionally on every target the binary starts on",
                restriction.describe()
            ),
        ));
    }

    violations
}

/// Restrictions inherited from enclosing modules and functions.
#[must_use]
pub fn validate_enclosing(name: &Ident, scope: &ScopeChain) -> Violations {
    let mut violations = Violations::default();

    for (frame, restriction) in scope.restrictions() {
        violations.push(Violation::target_conflict(
            name,
            name.span(),
            format!(
                "is nested in {} `{}` which carries {}: it is invoked unconditionally on every target the binary starts on",
                frame.kind.as_str(),
                frame.name,
                restriction.describe()
            ),
        ));
    }

    violations
}

fn returns_unit(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => true,
        ReturnType::Type(_, ty) => is_unit(ty),
    }
}

fn is_unit(ty: &Type) -> bool {
    match ty {
        Type::Tuple(tuple) => tuple.elems.is_empty(),
        Type::Paren(inner) => is_unit(&inner.elem),
        Type::Group(inner) => is_unit(&inner.elem),
        _ => false,
    }
}

///
/// TESTS
///
