#![allow(dead_code)]

use kconfig_engine::kconfig::{ExprId, KconfigBuilder, Location, NodeId, NodeItem, SymbolId, SymbolType};
use kconfig_engine::{Kconfig, Settings};

/// Builder with default settings, independent of the environment.
pub fn builder() -> KconfigBuilder {
    KconfigBuilder::with_settings("Kconfig", Settings::default())
}

pub fn loc(line: usize) -> Location {
    Location::new("Kconfig", line)
}

/// Defines `name` with type `ty` under `parent`, with an optional
/// unconditional prompt.
pub fn define(
    b: &mut KconfigBuilder,
    parent: NodeId,
    name: &str,
    ty: SymbolType,
    prompt: Option<&str>,
) -> (SymbolId, NodeId) {
    let sym = b.lookup_sym(name);
    let line = b.model().defined_syms().len() + 1;
    let node = b.add_node(parent, NodeItem::Symbol(sym), loc(line));
    b.set_type(sym, ty);
    if let Some(text) = prompt {
        let y = b.y_expr();
        b.set_prompt(node, text, y);
    }
    (sym, node)
}

pub fn bool_sym(b: &mut KconfigBuilder, name: &str, prompt: Option<&str>) -> (SymbolId, NodeId) {
    let top = b.top_node();
    define(b, top, name, SymbolType::Bool, prompt)
}

/// `default <value>` with no condition.
pub fn default_to(b: &mut KconfigBuilder, node: NodeId, value: &str) {
    let value = b.const_expr(value);
    let y = b.y_expr();
    b.add_default(node, value, y);
}

pub fn default_if(b: &mut KconfigBuilder, node: NodeId, value: &str, cond: ExprId) {
    let value = b.const_expr(value);
    b.add_default(node, value, cond);
}

pub fn depends_on(b: &mut KconfigBuilder, node: NodeId, name: &str) {
    let dep = b.named_expr(name);
    b.add_dependency(node, dep);
}

pub fn sym(kconf: &Kconfig, name: &str) -> SymbolId {
    kconf
        .sym_id(name)
        .unwrap_or_else(|| panic!("symbol {} not found", name))
}

pub fn value(kconf: &Kconfig, name: &str) -> String {
    kconf.str_value(sym(kconf, name))
}

/// Whether any diagnostic message contains `needle`.
pub fn has_diag(kconf: &Kconfig, needle: &str) -> bool {
    kconf
        .diagnostics()
        .iter()
        .any(|d| d.message.contains(needle))
}
