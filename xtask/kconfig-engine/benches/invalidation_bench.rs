use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kconfig_engine::kconfig::{KconfigBuilder, Location, NodeItem, SymbolId, SymbolType};
use kconfig_engine::{Kconfig, Settings};

const CHAIN_LEN: usize = 500;

/// ROOT followed by a chain of bools, each depending on the previous one,
/// plus an int per link with a default conditioned on the link.
fn build_chain() -> (Kconfig, SymbolId) {
    let mut b = KconfigBuilder::with_settings("Kconfig", Settings::default());
    let top = b.top_node();
    let y = b.y_expr();

    let root = b.lookup_sym("ROOT");
    let node = b.add_node(top, NodeItem::Symbol(root), Location::new("Kconfig", 1));
    b.set_type(root, SymbolType::Bool);
    b.set_prompt(node, "root", y);

    let mut prev = "ROOT".to_string();
    for i in 0..CHAIN_LEN {
        let name = format!("LINK_{}", i);
        let sym = b.lookup_sym(&name);
        let node = b.add_node(top, NodeItem::Symbol(sym), Location::new("Kconfig", i + 2));
        b.set_type(sym, SymbolType::Bool);
        b.set_prompt(node, &name, y);
        let dep = b.named_expr(&prev);
        b.add_dependency(node, dep);
        let on = b.y_expr();
        b.add_default(node, on, y);

        let num = b.lookup_sym(&format!("SIZE_{}", i));
        let num_node = b.add_node(top, NodeItem::Symbol(num), Location::new("Kconfig", i + 2));
        b.set_type(num, SymbolType::Int);
        let value = b.const_expr(&i.to_string());
        let cond = b.named_expr(&name);
        b.add_default(num_node, value, cond);

        prev = name;
    }

    let kconf = match b.finalize() {
        Ok(kconf) => kconf,
        Err(e) => panic!("benchmark model failed to build: {}", e),
    };
    (kconf, root)
}

fn bench_toggle_root(c: &mut Criterion) {
    let (mut kconf, root) = build_chain();
    let all: Vec<SymbolId> = kconf.unique_defined_syms().to_vec();
    let mut on = false;

    c.bench_function("toggle_root_and_read_chain", |b| {
        b.iter(|| {
            on = !on;
            kconf.set_value(root, if on { "y" } else { "n" });
            for &sym in &all {
                black_box(kconf.str_value(sym));
            }
        })
    });
}

fn bench_invalidate_all(c: &mut Criterion) {
    let (mut kconf, _) = build_chain();
    let all: Vec<SymbolId> = kconf.unique_defined_syms().to_vec();

    c.bench_function("invalidate_all_and_read", |b| {
        b.iter(|| {
            kconf.invalidate_all();
            for &sym in &all {
                black_box(kconf.str_value(sym));
            }
        })
    });
}

criterion_group!(benches, bench_toggle_root, bench_invalidate_all);
criterion_main!(benches);
