use premain_core::{Diagnostic, Registry, RegistryEntry, ScanReport};
use serde::Serialize;

///
/// CheckOutput
///

#[derive(Serialize)]
struct CheckOutput<'a> {
    clean: bool,
    #[serde(flatten)]
    report: &'a ScanReport,
}

#[must_use]
pub fn diagnostic_line(d: &Diagnostic) -> String {
    format!(
        "{}:{}:{}: {}: global constructor `{}` {}",
        d.location.file, d.location.line, d.location.column, d.kind, d.function, d.message
    )
}

#[must_use]
pub fn entry_line(e: &RegistryEntry) -> String {
    format!("{}:{}: {}", e.file, e.line, e.qualified_name())
}

#[must_use]
pub fn check_text(report: &ScanReport) -> String {
    let mut out = String::new();
    for d in &report.diagnostics {
        out.push_str(&diagnostic_line(d));
        out.push('\n');
    }

    out
}

pub fn check_json(report: &ScanReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&CheckOutput {
        clean: report.is_clean(),
        report,
    })
}

#[must_use]
pub fn list_text(registry: &Registry) -> String {
    let mut out = String::new();
    for e in registry.iter() {
        out.push_str(&entry_line(e));
        out.push('\n');
    }

    out
}

pub fn list_json(registry: &Registry) -> serde_json::Result<String> {
    serde_json::to_string_pretty(registry)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use premain_core::{Scanner, config::ConfigModel};

    fn report(src: &str) -> ScanReport {
        Scanner::new(&ConfigModel::default())
            .scan_source("src/lib.rs", src)
            .expect("scan")
    }

    #[test]
    fn diagnostics_render_with_location() {
        let report = report("#[global_ctor]\nfn boot() {}\n");
        let text = check_text(&report);

        assert!(text.starts_with("src/lib.rs:2:"));
        assert!(text.contains("SafetyError: global constructor `boot` must be marked unsafe"));
    }

    #[test]
    fn json_carries_clean_flag() {
        let report = report("mod a {\n    #[global_ctor]\n    unsafe fn boot() {}\n}\n");
        let json: serde_json::Value =
            serde_json::from_str(&check_json(&report).expect("json")).expect("parse");

        assert_eq!(json["clean"], true);
        assert_eq!(json["registry"][0]["name"], "boot");
        assert_eq!(json["registry"][0]["module_path"][0], "a");
    }

    #[test]
    fn list_uses_qualified_names() {
        let report = report("mod a {\n    #[global_ctor]\n    unsafe fn boot() {}\n}\n");

        assert_eq!(list_text(&report.registry), "src/lib.rs:3: a::boot\n");
    }
}
