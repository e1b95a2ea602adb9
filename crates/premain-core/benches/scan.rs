use criterion::{Criterion, criterion_group, criterion_main};
use premain_core::{Scanner, cfg::CfgSet, config::ConfigModel};
use std::{fmt::Write, hint::black_box};

fn synthetic_source(modules: usize) -> String {
    let mut src = String::new();
    for m in 0..modules {
        let _ = writeln!(src, "#[cfg(any(unix, feature = \"m{m}\"))]");
        let _ = writeln!(src, "mod m{m} {{");
        let _ = writeln!(src, "    fn helper(x: u32) -> u32 {{ x + {m} }}");
        let _ = writeln!(src, "    #[global_ctor]");
        let _ = writeln!(src, "    unsafe fn init_{m}() {{ let _ = helper(1); }}");
        let _ = writeln!(src, "}}");
    }
    src
}

fn bench_scan(c: &mut Criterion) {
    let source = synthetic_source(200);
    let config = ConfigModel {
        cfg: CfgSet::default().with_flag("unix"),
        ..ConfigModel::default()
    };
    let scanner = Scanner::new(&config);

    c.bench_function("scan 200 modules", |b| {
        b.iter(|| {
            let report = scanner.scan_source("bench.rs", black_box(&source)).unwrap();
            black_box(report.registry.len())
        });
    });
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
