mod common;

use common::*;
use kconfig_engine::kconfig::{BoolValue, SymbolType};
use pretty_assertions::assert_eq;

#[test]
fn test_default_follows_promptless_symbol() {
    let mut b = builder();
    let (_, foo) = bool_sym(&mut b, "FOO", None);
    let bar_expr = b.named_expr("BAR");
    default_if(&mut b, foo, "y", bar_expr);
    let (_, bar) = bool_sym(&mut b, "BAR", None);
    default_to(&mut b, bar, "n");
    let mut kconf = b.finalize().unwrap();

    let foo = sym(&kconf, "FOO");
    let bar = sym(&kconf, "BAR");
    assert_eq!(kconf.bool_value(bar), BoolValue::N);
    assert_eq!(kconf.bool_value(foo), BoolValue::N);

    assert!(kconf.set_value(bar, "y"));
    assert!(has_diag(&kconf, "has no prompt"));
    assert_eq!(kconf.bool_value(bar), BoolValue::Y);
    assert_eq!(kconf.bool_value(foo), BoolValue::Y);

    // Still nothing to show or assign through a menu
    assert_eq!(kconf.visibility(bar), BoolValue::N);
    assert!(kconf.assignable(bar).is_empty());

    kconf.unset_value(bar);
    assert_eq!(kconf.bool_value(foo), BoolValue::N);
}

#[test]
fn test_promptless_user_value_bounded_by_dependencies() {
    let mut b = builder();
    bool_sym(&mut b, "GATE", Some("gate"));
    let (_, inner) = bool_sym(&mut b, "INNER", None);
    depends_on(&mut b, inner, "GATE");
    let mut kconf = b.finalize().unwrap();

    let inner = sym(&kconf, "INNER");
    assert!(kconf.set_value(inner, "y"));
    assert_eq!(kconf.bool_value(inner), BoolValue::N);

    let gate = sym(&kconf, "GATE");
    assert!(kconf.set_value(gate, "y"));
    assert_eq!(kconf.bool_value(inner), BoolValue::Y);
}

#[test]
fn test_user_value_respects_visibility() {
    let mut b = builder();
    bool_sym(&mut b, "GATE", Some("gate"));
    let (_, feature) = bool_sym(&mut b, "FEATURE", Some("feature"));
    depends_on(&mut b, feature, "GATE");
    default_to(&mut b, feature, "y");
    let mut kconf = b.finalize().unwrap();

    let gate = sym(&kconf, "GATE");
    let feature = sym(&kconf, "FEATURE");

    // Defaults are gated by the dependency too
    assert_eq!(kconf.visibility(feature), BoolValue::N);
    assert_eq!(kconf.str_value(feature), "n");
    assert!(kconf.assignable(feature).is_empty());

    assert!(kconf.set_value(gate, "y"));
    assert_eq!(kconf.visibility(feature), BoolValue::Y);
    assert_eq!(kconf.str_value(feature), "y");
    assert_eq!(kconf.assignable(feature), &[BoolValue::N, BoolValue::Y]);

    assert!(kconf.set_value(feature, "n"));
    assert_eq!(kconf.str_value(feature), "n");

    // The user value survives losing and regaining visibility
    assert!(kconf.set_value(gate, "n"));
    assert_eq!(kconf.str_value(feature), "n");
    assert!(kconf.set_value(gate, "y"));
    assert_eq!(kconf.str_value(feature), "n");
}

#[test]
fn test_hex_default_clamped_into_range() {
    let mut b = builder();
    let top = b.top_node();
    let (n, node) = define(&mut b, top, "N", SymbolType::Hex, Some("n"));
    let low = b.lookup_const_sym("0x10");
    let high = b.lookup_const_sym("0xaf");
    let y = b.y_expr();
    b.add_range(node, low, high, y);
    default_to(&mut b, node, "0x5");
    let kconf = b.finalize().unwrap();

    assert_eq!(kconf.str_value(n), "0x10");
    assert!(has_diag(&kconf, "clamped to 0x10"));
}

#[test]
fn test_user_value_in_range_kept_verbatim() {
    let mut b = builder();
    let top = b.top_node();
    let (n, node) = define(&mut b, top, "N", SymbolType::Hex, Some("n"));
    let low = b.lookup_const_sym("0x10");
    let high = b.lookup_const_sym("0xaf");
    let y = b.y_expr();
    b.add_range(node, low, high, y);
    default_to(&mut b, node, "0x20");
    let mut kconf = b.finalize().unwrap();

    assert!(kconf.set_value(n, "0x1A"));
    assert_eq!(kconf.str_value(n), "0x1A");

    // Out of range falls back on the default
    assert!(kconf.set_value(n, "0x5"));
    assert_eq!(kconf.str_value(n), "0x20");
    assert!(has_diag(&kconf, "outside the active range"));
}

#[test]
fn test_int_without_default_clamped_to_range() {
    let mut b = builder();
    let top = b.top_node();
    let (n, node) = define(&mut b, top, "COUNT", SymbolType::Int, Some("count"));
    let low = b.lookup_const_sym("5");
    let high = b.lookup_const_sym("10");
    let y = b.y_expr();
    b.add_range(node, low, high, y);
    let kconf = b.finalize().unwrap();

    assert_eq!(kconf.str_value(n), "5");
}

#[test]
fn test_first_active_range_wins() {
    let mut b = builder();
    bool_sym(&mut b, "BIG", Some("big"));
    let top = b.top_node();
    let (n, node) = define(&mut b, top, "COUNT", SymbolType::Int, Some("count"));
    let big = b.named_expr("BIG");
    let (low, high) = (b.lookup_const_sym("100"), b.lookup_const_sym("200"));
    b.add_range(node, low, high, big);
    let (low, high) = (b.lookup_const_sym("1"), b.lookup_const_sym("10"));
    let y = b.y_expr();
    b.add_range(node, low, high, y);
    default_to(&mut b, node, "50");
    let mut kconf = b.finalize().unwrap();

    assert_eq!(kconf.str_value(n), "10");
    let big = sym(&kconf, "BIG");
    assert!(kconf.set_value(big, "y"));
    assert_eq!(kconf.str_value(n), "100");
}

#[test]
fn test_invalid_values_rejected() {
    let mut b = builder();
    let top = b.top_node();
    let (flag, _) = bool_sym(&mut b, "FLAG", Some("flag"));
    let (count, _) = define(&mut b, top, "COUNT", SymbolType::Int, Some("count"));
    let (addr, _) = define(&mut b, top, "ADDR", SymbolType::Hex, Some("addr"));
    let mut kconf = b.finalize().unwrap();

    assert!(!kconf.set_value(flag, "m"));
    assert!(!kconf.set_value(count, "abc"));
    assert!(!kconf.set_value(addr, "xyz"));
    assert!(has_diag(&kconf, "assignment ignored"));

    assert!(kconf.set_value(count, "-3"));
    assert_eq!(kconf.str_value(count), "-3");
    assert!(kconf.set_value(addr, "ff"));
    assert_eq!(kconf.str_value(addr), "ff");
}

#[test]
fn test_constant_symbols_cannot_be_assigned() {
    let mut b = builder();
    let literal = b.lookup_const_sym("foo");
    let mut kconf = b.finalize().unwrap();
    let y = kconf.y();

    assert!(!kconf.set_value(y, "n"));
    assert_eq!(kconf.str_value(y), "y");
    assert_eq!(kconf.str_value(literal), "foo");
}

#[test]
fn test_string_user_value_and_default() {
    let mut b = builder();
    bool_sym(&mut b, "GATE", Some("gate"));
    let top = b.top_node();
    let (name, node) = define(&mut b, top, "NAME", SymbolType::String, Some("name"));
    depends_on(&mut b, node, "GATE");
    default_to(&mut b, node, "hello");
    let mut kconf = b.finalize().unwrap();

    // Not visible, and the default is gated by the dependency
    assert_eq!(kconf.str_value(name), "");

    let gate = sym(&kconf, "GATE");
    kconf.set_value(gate, "y");
    assert_eq!(kconf.str_value(name), "hello");

    assert!(kconf.set_value(name, "with \"quotes\""));
    assert_eq!(kconf.str_value(name), "with \"quotes\"");

    kconf.unset_value(name);
    assert_eq!(kconf.str_value(name), "hello");
}

#[test]
fn test_select_forces_value_and_locks_assignable() {
    let mut b = builder();
    let (_, a) = bool_sym(&mut b, "A", Some("a"));
    let (target, _) = bool_sym(&mut b, "B", Some("b"));
    let y = b.y_expr();
    b.add_select(a, target, y).unwrap();
    let mut kconf = b.finalize().unwrap();

    let a = sym(&kconf, "A");
    assert_eq!(kconf.str_value(target), "n");
    assert_eq!(kconf.assignable(target), &[BoolValue::N, BoolValue::Y]);

    assert!(kconf.set_value(a, "y"));
    assert_eq!(kconf.str_value(target), "y");
    assert_eq!(kconf.assignable(target), &[BoolValue::Y]);

    // A user n loses against the select
    assert!(kconf.set_value(target, "n"));
    assert_eq!(kconf.str_value(target), "y");

    assert!(kconf.set_value(a, "n"));
    assert_eq!(kconf.str_value(target), "n");
}

#[test]
fn test_select_condition() {
    let mut b = builder();
    bool_sym(&mut b, "COND", Some("cond"));
    let (_, a) = bool_sym(&mut b, "A", Some("a"));
    default_to(&mut b, a, "y");
    let (target, _) = bool_sym(&mut b, "B", Some("b"));
    let cond = b.named_expr("COND");
    b.add_select(a, target, cond).unwrap();
    let mut kconf = b.finalize().unwrap();

    assert_eq!(kconf.str_value(target), "n");
    let cond = sym(&kconf, "COND");
    kconf.set_value(cond, "y");
    assert_eq!(kconf.str_value(target), "y");
}

#[test]
fn test_select_over_unmet_dependencies_warns_and_wins() {
    let mut b = builder();
    bool_sym(&mut b, "DEP", Some("dep"));
    let (_, a) = bool_sym(&mut b, "A", Some("a"));
    let (target, target_node) = bool_sym(&mut b, "B", Some("b"));
    depends_on(&mut b, target_node, "DEP");
    let y = b.y_expr();
    b.add_select(a, target, y).unwrap();
    let mut kconf = b.finalize().unwrap();

    let a = sym(&kconf, "A");
    kconf.set_value(a, "y");
    assert_eq!(kconf.str_value(target), "y");
    assert!(has_diag(&kconf, "is currently being y-selected"));
    assert!(has_diag(&kconf, " - A "));
}

#[test]
fn test_imply_is_weak_and_respects_dependencies() {
    let mut b = builder();
    bool_sym(&mut b, "DEP", Some("dep"));
    let (_, a) = bool_sym(&mut b, "A", Some("a"));
    let (target, target_node) = bool_sym(&mut b, "B", Some("b"));
    depends_on(&mut b, target_node, "DEP");
    let y = b.y_expr();
    b.add_imply(a, target, y).unwrap();
    let mut kconf = b.finalize().unwrap();

    let a = sym(&kconf, "A");
    let dep = sym(&kconf, "DEP");
    kconf.set_value(a, "y");
    assert_eq!(kconf.str_value(target), "n");

    kconf.set_value(dep, "y");
    assert_eq!(kconf.str_value(target), "y");
    assert_eq!(kconf.assignable(target), &[BoolValue::N, BoolValue::Y]);

    // Unlike a select, the user can still turn it off
    kconf.set_value(target, "n");
    assert_eq!(kconf.str_value(target), "n");
}

#[test]
fn test_set_value_idempotent() {
    let mut b = builder();
    let (_, a) = bool_sym(&mut b, "A", Some("a"));
    let (target, _) = bool_sym(&mut b, "B", Some("b"));
    let y = b.y_expr();
    b.add_select(a, target, y).unwrap();
    let top = b.top_node();
    define(&mut b, top, "COUNT", SymbolType::Int, Some("count"));
    let mut kconf = b.finalize().unwrap();

    let a = sym(&kconf, "A");
    let count = sym(&kconf, "COUNT");
    let snapshot = |kconf: &kconfig_engine::Kconfig| {
        kconf
            .syms()
            .map(|s| (kconf.str_value(s), kconf.assignable(s).to_vec()))
            .collect::<Vec<_>>()
    };

    assert!(kconf.set_value(a, "y"));
    assert!(kconf.set_value(count, "12"));
    let once = snapshot(&kconf);
    assert!(kconf.set_value(a, "y"));
    assert!(kconf.set_value(count, "12"));
    assert_eq!(snapshot(&kconf), once);
}

#[test]
fn test_str_default_ignores_user_value() {
    let mut b = builder();
    let (flag, node) = bool_sym(&mut b, "FLAG", Some("flag"));
    default_to(&mut b, node, "y");
    let mut kconf = b.finalize().unwrap();

    kconf.set_value(flag, "n");
    assert_eq!(kconf.str_value(flag), "n");
    assert_eq!(kconf.str_default(flag), "y");
}

#[test]
fn test_multiple_definitions_merge_properties() {
    let mut b = builder();
    bool_sym(&mut b, "GATE", Some("gate"));
    let (feature, first) = bool_sym(&mut b, "FEATURE", None);
    depends_on(&mut b, first, "GATE");
    let top = b.top_node();
    let (_, second) = define(&mut b, top, "FEATURE", SymbolType::Bool, Some("feature"));
    default_to(&mut b, second, "y");
    let kconf = b.finalize().unwrap();

    assert_eq!(kconf.sym(feature).nodes, vec![first, second]);
    assert_eq!(kconf.unique_defined_syms().iter().filter(|&&s| s == feature).count(), 1);
    assert_eq!(kconf.defined_syms().iter().filter(|&&s| s == feature).count(), 2);
    assert_eq!(kconf.visibility(feature), BoolValue::Y);
    assert_eq!(kconf.str_value(feature), "y");
    assert!(kconf.name_and_loc(feature.into()).starts_with("FEATURE (defined at Kconfig:2, Kconfig:3)"));
}
