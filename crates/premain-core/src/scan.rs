//!
//! Source scanner.
//!
//! Walks parsed Rust sources the way the compiler would see them: nested
//! `mod` blocks, out-of-line `mod foo;` files, function bodies and impl
//! blocks, carrying a [`ScopeChain`] so restrictions on an enclosing scope
//! reach every candidate below it.
//!
//! Two modes share the walker:
//! - host scanning (`Scanner`): evaluates `cfg`, follows module files, runs
//!   every rule and builds a [`Registry`];
//! - scope checking (`check_scope`): used by `#[ctor_scope]`, leaves `cfg` to
//!   rustc and reports only inherited restrictions, since the inner
//!   `#[global_ctor]` expansion checks the rest itself.
//!

use crate::{
    cfg::{CfgError, CfgSet},
    config::ConfigModel,
    error::{Violation, Violations},
    model::{Diagnostic, Registry, RegistryEntry, ScanReport},
    scope::{ScopeChain, ScopeFrame, ScopeKind, has_marker, target_restrictions},
    validate::{validate_enclosing, validate_parts},
};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use syn::{
    Attribute, Expr, Ident, ImplItemFn, Item, ItemConst, ItemFn, ItemForeignMod, ItemImpl,
    ItemMod, ItemStatic, ItemTrait, Lit, Meta, Signature, TraitItemFn, spanned::Spanned,
    visit::{self, Visit},
};
use thiserror::Error as ThisError;

///
/// ScanError
///

#[derive(Debug, ThisError)]
pub enum ScanError {
    #[error("cannot read '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("cannot parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("module `{module}` declared in '{from}' has no source file")]
    MissingModule { module: String, from: PathBuf },

    #[error("module file '{path}' includes itself")]
    CircularModule { path: PathBuf },

    #[error("invalid cfg in '{path}': {source}")]
    Cfg { path: PathBuf, source: CfgError },
}

///
/// Scanner
///

pub struct Scanner<'a> {
    config: &'a ConfigModel,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub const fn new(config: &'a ConfigModel) -> Self {
        Self { config }
    }

    /// Scan a single in-memory source. Out-of-line modules are not followed.
    pub fn scan_source(&self, label: &str, source: &str) -> Result<ScanReport, ScanError> {
        let file = syn::parse_file(source).map_err(|e| ScanError::Parse {
            path: PathBuf::from(label),
            message: e.to_string(),
        })?;

        let mut walker = Walker::host(self.config, label, None);
        walker.walk_file(&file);
        walker.finish()
    }

    /// Scan a crate root file and every module file it declares.
    pub fn scan_root(&self, path: &Path, base: &Path) -> Result<ScanReport, ScanError> {
        let source = read(path)?;
        let file = syn::parse_file(&source).map_err(|e| ScanError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let loader = ModuleLoader {
            base: base.to_path_buf(),
            file: path.to_path_buf(),
            mod_dir: dir,
            inline: 0,
            chain: vec![canonical(path)],
        };

        let mut walker = Walker::host(self.config, &loader.label(path), Some(loader));
        walker.walk_file(&file);
        walker.finish()
    }

    /// Scan a file (as a crate root) or a directory.
    ///
    /// Directories are searched for Cargo packages; each package contributes
    /// its conventional roots (`src/lib.rs`, `src/main.rs`, `src/bin/*`,
    /// `tests/*`, `benches/*`, `examples/*`, `build.rs`). A directory with no
    /// package falls back to treating every `.rs` file as its own root.
    pub fn scan_path(&self, path: &Path) -> Result<ScanReport, ScanError> {
        if path.is_file() {
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            return self.scan_root(path, &base);
        }

        let mut roots = self.package_roots(path)?;
        if roots.is_empty() {
            roots = self.rs_files(path)?;
        }
        roots.sort();
        roots.dedup();

        let mut report = ScanReport::default();
        for root in roots {
            report.merge(self.scan_root(&root, path)?);
        }

        Ok(report)
    }

    fn package_roots(&self, dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let mut roots = Vec::new();

        for package in self.dirs(dir)?.into_iter().filter(|d| d.join("Cargo.toml").is_file()) {
            for fixed in ["src/lib.rs", "src/main.rs", "build.rs"] {
                let candidate = package.join(fixed);
                if candidate.is_file() {
                    roots.push(candidate);
                }
            }

            for sub in ["src/bin", "tests", "benches", "examples"] {
                let sub_dir = package.join(sub);
                if !sub_dir.is_dir() || self.is_excluded(dir, &sub_dir) {
                    continue;
                }
                for entry in read_dir(&sub_dir)? {
                    if entry.is_file() && is_rs(&entry) {
                        roots.push(entry);
                    } else if entry.join("main.rs").is_file() {
                        roots.push(entry.join("main.rs"));
                    }
                }
            }
        }

        Ok(roots)
    }

    fn rs_files(&self, dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let mut files = Vec::new();
        for d in self.dirs(dir)? {
            for entry in read_dir(&d)? {
                if entry.is_file() && is_rs(&entry) && !self.is_excluded(dir, &entry) {
                    files.push(entry);
                }
            }
        }

        Ok(files)
    }

    /// `dir` and every non-hidden, non-excluded directory below it.
    fn dirs(&self, dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let mut out = vec![dir.to_path_buf()];
        let mut i = 0;

        while i < out.len() {
            let current = out[i].clone();
            i += 1;

            for entry in read_dir(&current)? {
                let hidden = entry
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
                if entry.is_dir() && !hidden && !self.is_excluded(dir, &entry) {
                    out.push(entry);
                }
            }
        }

        Ok(out)
    }

    fn is_excluded(&self, base: &Path, path: &Path) -> bool {
        let rel = path.strip_prefix(base).unwrap_or(path);

        self.config.exclude.iter().any(|fragment| {
            rel.starts_with(fragment) || rel.components().any(|c| c.as_os_str() == fragment.as_str())
        })
    }
}

/// Check the contents of an inline `mod` or a `fn` for marked functions that
/// inherit a target restriction from `item` or anything nested in between.
#[must_use]
pub fn check_scope(item: &Item, markers: &[String]) -> Violations {
    let mut walker = Walker::scope_only(markers);

    match item {
        Item::Mod(module) => walker.visit_item_mod(module),
        Item::Fn(func) => walker.visit_item_fn(func),
        _ => {}
    }

    let mut violations = Violations::default();
    for (_, violation) in walker.violations {
        violations.push(violation);
    }

    violations
}

//
// ModuleLoader
//

struct ModuleLoader {
    base: PathBuf,
    file: PathBuf,
    // directory in which `mod foo;` resolves
    mod_dir: PathBuf,
    // depth of inline `mod { .. }` blocks inside `file`
    inline: usize,
    // files currently being loaded, root first
    chain: Vec<PathBuf>,
}

impl ModuleLoader {
    fn label(&self, path: &Path) -> String {
        path.strip_prefix(&self.base)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn resolve(&self, module: &ItemMod) -> Option<PathBuf> {
        if let Some(explicit) = path_attr(&module.attrs) {
            // inside an inline module `#[path]` is relative to that module's directory
            let dir = if self.inline > 0 {
                self.mod_dir.as_path()
            } else {
                self.file.parent().unwrap_or_else(|| Path::new(""))
            };
            return Some(dir.join(explicit));
        }

        let name = module.ident.to_string();
        [
            self.mod_dir.join(format!("{name}.rs")),
            self.mod_dir.join(&name).join("mod.rs"),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn child_mod_dir(file: &Path) -> PathBuf {
    let parent = file.parent().map(Path::to_path_buf).unwrap_or_default();
    match file.file_stem().and_then(|s| s.to_str()) {
        Some("mod") | None => parent,
        Some(stem) => parent.join(stem),
    }
}

fn path_attr(attrs: &[Attribute]) -> Option<String> {
    attrs.iter().find_map(|attr| match &attr.meta {
        Meta::NameValue(nv) if nv.path.is_ident("path") => match &nv.value {
            Expr::Lit(expr) => match &expr.lit {
                Lit::Str(s) => Some(s.value()),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    })
}

//
// Walker
//

#[derive(Clone, Copy, Eq, PartialEq)]
enum Rules {
    Full,
    EnclosingOnly,
}

struct Walker<'s> {
    markers: &'s [String],
    cfg: Option<&'s CfgSet>,
    rules: Rules,
    label: String,
    loader: Option<ModuleLoader>,
    scope: ScopeChain,
    registry: Registry,
    violations: Vec<(String, Violation)>,
    files: usize,
    excluded: usize,
    error: Option<ScanError>,
}

impl<'s> Walker<'s> {
    fn host(config: &'s ConfigModel, label: &str, loader: Option<ModuleLoader>) -> Self {
        Self {
            markers: &config.markers,
            cfg: Some(&config.cfg),
            rules: Rules::Full,
            label: label.to_string(),
            loader,
            scope: ScopeChain::new(),
            registry: Registry::default(),
            violations: Vec::new(),
            files: 0,
            excluded: 0,
            error: None,
        }
    }

    fn scope_only(markers: &'s [String]) -> Self {
        Self {
            markers,
            cfg: None,
            rules: Rules::EnclosingOnly,
            label: String::new(),
            loader: None,
            scope: ScopeChain::new(),
            registry: Registry::default(),
            violations: Vec::new(),
            files: 0,
            excluded: 0,
            error: None,
        }
    }

    fn finish(self) -> Result<ScanReport, ScanError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let diagnostics = self
            .violations
            .iter()
            .map(|(file, v)| Diagnostic::from_violation(file, v))
            .collect();

        Ok(ScanReport {
            files: self.files,
            registry: self.registry,
            diagnostics,
            excluded: self.excluded,
        })
    }

    fn walk_file(&mut self, file: &syn::File) {
        self.files += 1;
        if !self.included(&file.attrs) {
            return;
        }

        // inner `#![target_feature]` style attributes belong to the enclosing module
        let inner = target_restrictions(&file.attrs);
        if !inner.is_empty() {
            self.scope.push(ScopeFrame {
                kind: ScopeKind::Module,
                name: String::new(),
                restrictions: inner,
            });
            visit::visit_file(self, file);
            self.scope.pop();
        } else {
            visit::visit_file(self, file);
        }
    }

    fn stopped(&self) -> bool {
        self.error.is_some()
    }

    fn included(&mut self, attrs: &[Attribute]) -> bool {
        let Some(cfg) = self.cfg else {
            return true;
        };

        match cfg.includes(attrs) {
            Ok(included) => included,
            Err(source) => {
                self.error.get_or_insert(ScanError::Cfg {
                    path: PathBuf::from(&self.label),
                    source,
                });
                false
            }
        }
    }

    fn marked(&self, attrs: &[Attribute]) -> bool {
        has_marker(attrs, self.markers)
    }

    fn record(&mut self, violations: Violations) {
        for v in violations {
            self.violations.push((self.label.clone(), v));
        }
    }

    fn reject(&mut self, name: &Ident, span: proc_macro2::Span, message: &str) {
        let v = Violation::signature(name, span, message);
        self.violations.push((self.label.clone(), v));
    }

    fn check_candidate(&mut self, sig: &Signature, attrs: &[Attribute]) {
        match self.rules {
            Rules::EnclosingOnly => {
                let found = validate_enclosing(&sig.ident, &self.scope);
                self.record(found);
            }
            Rules::Full => match validate_parts(sig, attrs, &self.scope) {
                Ok(ok) => {
                    let line = ok.name.span().start().line;
                    self.registry.insert(RegistryEntry {
                        file: self.label.clone(),
                        module_path: self.scope.module_path(),
                        name: ok.name.to_string(),
                        line,
                    });
                }
                Err(found) => self.record(found),
            },
        }
    }

    fn load_module(&mut self, module: &ItemMod) {
        let Some(loader) = self.loader.as_ref() else {
            return;
        };

        let Some(path) = loader.resolve(module) else {
            self.error.get_or_insert(ScanError::MissingModule {
                module: module.ident.to_string(),
                from: loader.file.clone(),
            });
            return;
        };

        let key = canonical(&path);
        if loader.chain.contains(&key) {
            self.error.get_or_insert(ScanError::CircularModule { path });
            return;
        }

        let source = match read(&path) {
            Ok(source) => source,
            Err(err) => {
                self.error.get_or_insert(err);
                return;
            }
        };
        let file = match syn::parse_file(&source) {
            Ok(file) => file,
            Err(e) => {
                self.error.get_or_insert(ScanError::Parse {
                    path,
                    message: e.to_string(),
                });
                return;
            }
        };

        let label = loader.label(&path);
        let mut chain = loader.chain.clone();
        chain.push(key);
        let child = ModuleLoader {
            base: loader.base.clone(),
            inline: 0,
            chain,
            mod_dir: if path_attr(&module.attrs).is_some() {
                path.parent().map(Path::to_path_buf).unwrap_or_default()
            } else {
                child_mod_dir(&path)
            },
            file: path,
        };

        let saved_loader = self.loader.replace(child);
        let saved_label = std::mem::replace(&mut self.label, label);
        self.walk_file(&file);
        self.label = saved_label;
        self.loader = saved_loader;
    }
}

impl<'ast> Visit<'ast> for Walker<'_> {
    fn visit_item_mod(&mut self, module: &'ast ItemMod) {
        if self.stopped() || !self.included(&module.attrs) {
            return;
        }

        self.scope.push(ScopeFrame::new(
            ScopeKind::Module,
            module.ident.to_string(),
            &module.attrs,
        ));

        if let Some((_, items)) = &module.content {
            let saved = self.loader.as_mut().map(|l| {
                let prev = l.mod_dir.clone();
                l.mod_dir = prev.join(module.ident.to_string());
                l.inline += 1;
                prev
            });

            for item in items {
                self.visit_item(item);
            }

            if let (Some(loader), Some(prev)) = (self.loader.as_mut(), saved) {
                loader.mod_dir = prev;
                loader.inline -= 1;
            }
        } else {
            self.load_module(module);
        }

        self.scope.pop();
    }

    fn visit_item_fn(&mut self, func: &'ast ItemFn) {
        if self.stopped() {
            return;
        }
        if !self.included(&func.attrs) {
            if self.marked(&func.attrs) {
                self.excluded += 1;
            }
            return;
        }

        if self.marked(&func.attrs) {
            self.check_candidate(&func.sig, &func.attrs);
        }

        self.scope.push(ScopeFrame::new(
            ScopeKind::Function,
            func.sig.ident.to_string(),
            &func.attrs,
        ));
        self.visit_block(&func.block);
        self.scope.pop();
    }

    fn visit_item_impl(&mut self, item: &'ast ItemImpl) {
        if self.stopped() || !self.included(&item.attrs) {
            return;
        }
        visit::visit_item_impl(self, item);
    }

    fn visit_impl_item_fn(&mut self, func: &'ast ImplItemFn) {
        if self.stopped() || !self.included(&func.attrs) {
            return;
        }

        if self.marked(&func.attrs) {
            self.reject(
                &func.sig.ident,
                func.sig.ident.span(),
                "must be a free function; associated functions are not registered",
            );
        }

        self.scope.push(ScopeFrame::new(
            ScopeKind::Function,
            func.sig.ident.to_string(),
            &func.attrs,
        ));
        self.visit_block(&func.block);
        self.scope.pop();
    }

    fn visit_item_trait(&mut self, item: &'ast ItemTrait) {
        if self.stopped() || !self.included(&item.attrs) {
            return;
        }
        visit::visit_item_trait(self, item);
    }

    fn visit_trait_item_fn(&mut self, func: &'ast TraitItemFn) {
        if self.stopped() || !self.included(&func.attrs) {
            return;
        }

        if self.marked(&func.attrs) {
            self.reject(
                &func.sig.ident,
                func.sig.ident.span(),
                "must be a free function; associated functions are not registered",
            );
        }

        if let Some(block) = &func.default {
            self.scope.push(ScopeFrame::new(
                ScopeKind::Function,
                func.sig.ident.to_string(),
                &func.attrs,
            ));
            self.visit_block(block);
            self.scope.pop();
        }
    }

    fn visit_item_static(&mut self, item: &'ast ItemStatic) {
        if self.stopped() || !self.included(&item.attrs) {
            return;
        }

        if self.marked(&item.attrs) {
            self.reject(
                &item.ident,
                item.span(),
                "must be a function declaration; statics are not registered",
            );
        }
        visit::visit_item_static(self, item);
    }

    fn visit_item_const(&mut self, item: &'ast ItemConst) {
        if self.stopped() || !self.included(&item.attrs) {
            return;
        }

        if self.marked(&item.attrs) {
            self.reject(
                &item.ident,
                item.span(),
                "must be a function declaration; constants are not registered",
            );
        }
        visit::visit_item_const(self, item);
    }

    fn visit_item_foreign_mod(&mut self, item: &'ast ItemForeignMod) {
        if self.stopped() || !self.included(&item.attrs) {
            return;
        }

        for foreign in &item.items {
            if let syn::ForeignItem::Fn(func) = foreign
                && self.marked(&func.attrs)
            {
                let included = self.included(&func.attrs);
                if included {
                    self.reject(
                        &func.sig.ident,
                        func.sig.ident.span(),
                        "must have a body; foreign declarations are not registered",
                    );
                }
            }
        }
    }
}

//
// fs helpers
//

fn read(path: &Path) -> Result<String, ScanError> {
    fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let entries = fs::read_dir(dir).map_err(|source| ScanError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ScanError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        out.push(entry.path());
    }
    out.sort();

    Ok(out)
}

fn is_rs(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rs")
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViolationKind;

    fn config(cfg: CfgSet) -> ConfigModel {
        ConfigModel {
            cfg,
            ..ConfigModel::default()
        }
    }

    fn scan(source: &str) -> ScanReport {
        scan_with(source, CfgSet::default().with_flag("unix"))
    }

    fn scan_with(source: &str, cfg: CfgSet) -> ScanReport {
        let config = config(cfg);
        Scanner::new(&config)
            .scan_source("lib.rs", source)
            .expect("scan should succeed")
    }

    #[test]
    fn registers_valid_candidates_at_any_depth() {
        let report = scan(
            r"
            #[global_ctor]
            unsafe fn top() {}

            mod outer {
                mod inner {
                    #[premain::global_ctor]
                    unsafe fn nested() {}
                }

                fn host() {
                    #[global_ctor]
                    unsafe fn local() {}
                }
            }
            ",
        );

        assert!(report.is_clean(), "{:?}", report.diagnostics);
        let names = report.registry.names();
        assert!(names.contains("top"));
        assert!(names.contains("outer::inner::nested"));
        // function bodies are not part of the module path
        assert!(names.contains("outer::local"));
        assert_eq!(report.registry.len(), 3);
    }

    #[test]
    fn unmarked_functions_are_ignored() {
        let report = scan("fn helper(x: u8) -> u8 { x }");

        assert!(report.is_clean());
        assert!(report.registry.is_empty());
    }

    #[test]
    fn reports_each_kind() {
        let report = scan(
            r#"
            #[global_ctor]
            fn safe_one() {}

            #[global_ctor]
            unsafe fn takes(x: u8) {}

            #[global_ctor]
            #[target_feature(enable = "avx2")]
            unsafe fn fast() {}
            "#,
        );

        assert_eq!(report.of_kind(ViolationKind::Safety).count(), 1);
        assert_eq!(report.of_kind(ViolationKind::Signature).count(), 1);
        assert_eq!(report.of_kind(ViolationKind::TargetConflict).count(), 1);
        assert!(report.registry.is_empty());
    }

    #[test]
    fn diagnostics_carry_line_numbers() {
        let report = scan("\n\n#[global_ctor]\nfn late() {}\n");
        let diag = &report.diagnostics[0];

        assert_eq!(diag.location.file, "lib.rs");
        assert_eq!(diag.location.line, 4);
        assert_eq!(diag.function, "late");
    }

    #[test]
    fn restriction_on_enclosing_module_propagates() {
        let report = scan(
            r#"
            #[target_feature(enable = "neon")]
            mod simd {
                mod deeper {
                    #[global_ctor]
                    unsafe fn init() {}
                }
            }
            "#,
        );

        let conflicts: Vec<_> = report.of_kind(ViolationKind::TargetConflict).collect();
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].message.contains("module `simd`"));
        assert!(report.registry.is_empty());
    }

    #[test]
    fn restriction_on_enclosing_function_propagates() {
        let report = scan(
            r#"
            #[target_feature(enable = "avx2")]
            unsafe fn kernel() {
                #[global_ctor]
                unsafe fn init() {}
            }
            "#,
        );

        assert_eq!(report.of_kind(ViolationKind::TargetConflict).count(), 1);
    }

    #[test]
    fn cfg_excluded_candidates_are_invisible() {
        let report = scan(
            r#"
            #[cfg(windows)]
            #[global_ctor]
            fn broken(x: u8) -> u8 { x }

            #[cfg(windows)]
            mod win {
                #[global_ctor]
                unsafe fn init() {}
            }

            #[cfg(unix)]
            #[global_ctor]
            unsafe fn kept() {}
            "#,
        );

        assert!(report.is_clean(), "{:?}", report.diagnostics);
        assert_eq!(report.registry.names().into_iter().collect::<Vec<_>>(), vec!["kept"]);
        assert_eq!(report.excluded, 1);
    }

    #[test]
    fn same_source_different_cfg() {
        let source = r#"
            #[cfg(feature = "boot")]
            #[global_ctor]
            unsafe fn boot() {}
        "#;

        assert!(scan_with(source, CfgSet::default()).registry.is_empty());
        let with_feature = scan_with(source, CfgSet::default().with_value("feature", "boot"));
        assert!(with_feature.registry.contains_name("boot"));
    }

    #[test]
    fn rejects_associated_functions_and_statics() {
        let report = scan(
            r"
            struct S;
            impl S {
                #[global_ctor]
                unsafe fn init() {}
            }

            #[global_ctor]
            static HOOK: unsafe fn() = noop;

            unsafe fn noop() {}
            ",
        );

        assert_eq!(report.diagnostics.len(), 2);
        assert!(
            report
                .diagnostics
                .iter()
                .all(|d| d.kind == ViolationKind::Signature)
        );
    }

    #[test]
    fn bad_cfg_is_an_error() {
        let config = config(CfgSet::default());
        let err = Scanner::new(&config)
            .scan_source("lib.rs", "#[cfg(bogus(unix))] fn f() {}")
            .unwrap_err();

        assert!(matches!(err, ScanError::Cfg { .. }));
    }

    #[test]
    fn parse_failure_is_an_error() {
        let config = config(CfgSet::default());
        let err = Scanner::new(&config)
            .scan_source("lib.rs", "fn (")
            .unwrap_err();

        assert!(matches!(err, ScanError::Parse { .. }));
    }

    struct TempTree(PathBuf);

    impl TempTree {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("premain-scan-{name}-{}", std::process::id()));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn write(&self, rel: &str, contents: &str) {
            let path = self.0.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
    }

    impl Drop for TempTree {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn follows_module_files_and_carries_scope() {
        let tree = TempTree::new("modules");
        tree.write("Cargo.toml", "[package]\nname = \"demo\"\n");
        tree.write(
            "src/lib.rs",
            "mod boot;\n#[cfg(windows)]\nmod win;\n#[target_feature(enable = \"avx2\")]\nmod simd;\n",
        );
        tree.write("src/boot.rs", "mod early;\n#[global_ctor]\nunsafe fn boot() {}\n");
        tree.write("src/boot/early.rs", "#[global_ctor]\nunsafe fn early() {}\n");
        tree.write("src/simd/mod.rs", "#[global_ctor]\nunsafe fn vector() {}\n");
        // never read: excluded by cfg before resolution
        tree.write("src/win.rs", "this is not rust");

        let config = config(CfgSet::default().with_flag("unix"));
        let report = Scanner::new(&config).scan_path(&tree.0).expect("scan tree");

        let names = report.registry.names();
        assert!(names.contains("boot::boot"), "{names:?}");
        assert!(names.contains("boot::early::early"), "{names:?}");
        assert_eq!(report.registry.len(), 2);

        let conflicts: Vec<_> = report.of_kind(ViolationKind::TargetConflict).collect();
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].location.file.ends_with("mod.rs"));
        assert_eq!(report.files, 4);
    }

    #[test]
    fn missing_module_file_is_an_error() {
        let tree = TempTree::new("missing");
        tree.write("lib.rs", "mod gone;\n");

        let config = config(CfgSet::default());
        let err = Scanner::new(&config)
            .scan_path(&tree.0.join("lib.rs"))
            .unwrap_err();

        assert!(matches!(err, ScanError::MissingModule { .. }));
    }

    #[test]
    fn circular_module_is_an_error() {
        let tree = TempTree::new("circular");
        tree.write("lib.rs", "#[path = \"lib.rs\"]\nmod again;\n");

        let config = config(CfgSet::default());
        let err = Scanner::new(&config)
            .scan_path(&tree.0.join("lib.rs"))
            .unwrap_err();

        assert!(matches!(err, ScanError::CircularModule { .. }), "{err}");
    }

    #[test]
    fn indirect_cycle_is_an_error() {
        let tree = TempTree::new("cycle");
        tree.write("lib.rs", "mod a;\n");
        tree.write("a.rs", "#[path = \"b.rs\"]\nmod b;\n");
        tree.write("b.rs", "#[path = \"a.rs\"]\nmod back;\n");

        let config = config(CfgSet::default());
        let err = Scanner::new(&config)
            .scan_path(&tree.0.join("lib.rs"))
            .unwrap_err();

        assert!(matches!(err, ScanError::CircularModule { .. }), "{err}");
    }

    #[test]
    fn same_file_twice_is_not_a_cycle() {
        let tree = TempTree::new("shared");
        tree.write(
            "lib.rs",
            "#[path = \"shared.rs\"]\nmod one;\n#[path = \"shared.rs\"]\nmod two;\n",
        );
        tree.write("shared.rs", "#[global_ctor]\nunsafe fn init() {}\n");

        let config = config(CfgSet::default());
        let report = Scanner::new(&config)
            .scan_path(&tree.0.join("lib.rs"))
            .expect("siblings are fine");

        assert!(report.registry.names().contains("one::init"));
        assert!(report.registry.names().contains("two::init"));
    }

    #[test]
    fn path_inside_inline_module_is_relative_to_it() {
        let tree = TempTree::new("inline-path");
        tree.write("src/lib.rs", "mod outer {\n    #[path = \"custom.rs\"]\n    mod inner;\n}\n");
        tree.write("src/outer/custom.rs", "#[global_ctor]\nunsafe fn nested() {}\n");
        // decoy next to lib.rs; must not be picked
        tree.write("src/custom.rs", "#[global_ctor]\nunsafe fn wrong() {}\n");

        let config = config(CfgSet::default());
        let report = Scanner::new(&config)
            .scan_path(&tree.0.join("src/lib.rs"))
            .expect("scan");

        let names = report.registry.names();
        assert!(names.contains("outer::inner::nested"), "{names:?}");
        assert!(!report.registry.contains_name("wrong"));
    }

    #[test]
    fn host_cfg_covers_builtin_keys() {
        let report = scan_with(
            &format!(
                r#"
                #[cfg(target_pointer_width = "{}")]
                #[global_ctor]
                unsafe fn width() {{}}

                #[cfg(target_endian = "{}")]
                #[global_ctor]
                unsafe fn endian() {{}}

                #[cfg(any(debug_assertions, not(debug_assertions)))]
                #[global_ctor]
                unsafe fn either_profile() {{}}
                "#,
                usize::BITS,
                if cfg!(target_endian = "little") { "little" } else { "big" },
            ),
            CfgSet::host(),
        );

        let names = report.registry.names();
        assert!(names.contains("width"), "{names:?}");
        assert!(names.contains("endian"), "{names:?}");
        assert!(names.contains("either_profile"), "{names:?}");
        assert_eq!(report.excluded, 0);
    }

    #[test]
    fn host_cfg_reports_debug_only_candidates() {
        let report = scan_with(
            r"
            #[cfg(debug_assertions)]
            #[global_ctor]
            fn broken(x: u8) -> u8 { x }
            ",
            CfgSet::host(),
        );

        if cfg!(debug_assertions) {
            assert_eq!(report.diagnostics.len(), 3, "{:?}", report.diagnostics);
        } else {
            assert!(report.is_clean());
            assert_eq!(report.excluded, 1);
        }
    }

    #[test]
    fn excluded_directories_are_skipped() {
        let tree = TempTree::new("exclude");
        tree.write("a.rs", "#[global_ctor]\nunsafe fn a() {}\n");
        tree.write("target/gen.rs", "#[global_ctor]\nfn generated() {}\n");

        let config = ConfigModel::default();
        let report = Scanner::new(&config).scan_path(&tree.0).unwrap();

        assert!(report.is_clean());
        assert!(report.registry.contains_name("a"));
        assert_eq!(report.files, 1);
    }

    #[test]
    fn scope_check_reports_only_inherited_restrictions() {
        let item: Item = syn::parse_quote! {
            #[target_feature(enable = "avx2")]
            mod fast {
                #[global_ctor]
                fn not_unsafe_either() {}
            }
        };

        let found = check_scope(&item, &["global_ctor".to_string()]);
        assert_eq!(found.kinds(), vec![ViolationKind::TargetConflict]);
    }

    #[test]
    fn scope_check_on_clean_function_is_empty() {
        let item: Item = syn::parse_quote! {
            fn host() {
                #[global_ctor]
                unsafe fn init() {}
            }
        };

        assert!(check_scope(&item, &["global_ctor".to_string()]).is_empty());
    }
}
