mod common;

use common::*;
use kconfig_engine::KconfigError;
use kconfig_engine::kconfig::{BoolValue, Item, SymbolType};
use pretty_assertions::assert_eq;

#[test]
fn test_direct_dependency_loop_rejected() {
    let mut b = builder();
    let (_, a) = bool_sym(&mut b, "A", Some("a"));
    depends_on(&mut b, a, "B");
    let (_, bb) = bool_sym(&mut b, "B", Some("b"));
    depends_on(&mut b, bb, "A");

    match b.finalize() {
        Err(KconfigError::DependencyLoop { items, chain }) => {
            assert!(items.contains(&"A".to_string()));
            assert!(items.contains(&"B".to_string()));
            assert!(chain.contains("Dependency loop\n==============="));
            assert!(chain.contains("A (defined at Kconfig:1)"));
            assert!(chain.contains("B (defined at Kconfig:2)"));
            assert!(chain.contains("...depends again on"));
        }
        other => panic!("expected a dependency loop, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_loop_through_select_rejected() {
    let mut b = builder();
    let (a, _) = bool_sym(&mut b, "A", Some("a"));
    let (_, b_node) = bool_sym(&mut b, "B", Some("b"));
    let (c, c_node) = bool_sym(&mut b, "C", Some("c"));
    depends_on(&mut b, b_node, "A");
    let y = b.y_expr();
    b.add_select(b_node, c, y).unwrap();
    b.add_select(c_node, a, y).unwrap();

    match b.finalize() {
        Err(KconfigError::DependencyLoop { items, chain }) => {
            for name in ["A", "B", "C"] {
                assert!(items.contains(&name.to_string()), "{} missing from {:?}", name, items);
            }
            assert!(chain.contains("select-related dependencies"));
        }
        other => panic!("expected a dependency loop, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_dependents_recorded() {
    let mut b = builder();
    let (gate, _) = bool_sym(&mut b, "GATE", Some("gate"));
    let (_, feature) = bool_sym(&mut b, "FEATURE", Some("feature"));
    depends_on(&mut b, feature, "GATE");
    let kconf = b.finalize().unwrap();

    let feature = sym(&kconf, "FEATURE");
    let dependents: Vec<Item> = kconf.sym(gate).dependents().collect();
    assert_eq!(dependents, vec![Item::Symbol(feature)]);
    // Constants never change, so nothing is recorded on them
    assert_eq!(kconf.sym(kconf.y()).dependents().count(), 0);
}

#[test]
fn test_invalidation_reaches_transitive_dependents() {
    let mut b = builder();
    let top = b.top_node();
    let (root, _) = bool_sym(&mut b, "ROOT", Some("root"));

    // MID defaults to ROOT
    let (_, mid) = bool_sym(&mut b, "MID", None);
    let root_expr = b.named_expr("ROOT");
    let y = b.y_expr();
    b.add_default(mid, root_expr, y);

    // SELECTED is selected by MID
    let (selected, _) = bool_sym(&mut b, "SELECTED", Some("selected"));
    let mid_sym = b.lookup_sym("MID");
    b.add_select(mid, selected, y).unwrap();

    // IMPLIED is implied by SELECTED
    let (implied, _) = bool_sym(&mut b, "IMPLIED", Some("implied"));
    let selected_node = b.model().sym(selected).nodes[0];
    b.add_imply(selected_node, implied, y).unwrap();

    // COUNT has a range whose upper bound is LIMIT, active if IMPLIED
    let (limit, limit_node) = define(&mut b, top, "LIMIT", SymbolType::Int, None);
    let ten = b.const_expr("10");
    let root_cond = b.named_expr("ROOT");
    b.add_default(limit_node, ten, root_cond);
    let three = b.const_expr("3");
    b.add_default(limit_node, three, y);
    let (count, count_node) = define(&mut b, top, "COUNT", SymbolType::Int, Some("count"));
    let zero = b.lookup_const_sym("0");
    let implied_cond = b.named_expr("IMPLIED");
    b.add_range(count_node, zero, limit, implied_cond);
    default_to(&mut b, count_node, "8");

    // SHOWN only has a visible prompt when COUNT > 5
    let (shown, shown_node) = bool_sym(&mut b, "SHOWN", None);
    let five = b.lookup_const_sym("5");
    let gt = b.relation(kconfig_engine::kconfig::RelOp::Gt, count, five);
    b.set_prompt(shown_node, "shown", gt);

    let mut kconf = b.finalize().unwrap();

    let read_all = |kconf: &kconfig_engine::Kconfig| {
        vec![
            kconf.str_value(mid_sym),
            kconf.str_value(selected),
            kconf.str_value(implied),
            kconf.str_value(limit),
            kconf.str_value(count),
            kconf.visibility(shown).to_string(),
        ]
    };

    assert_eq!(read_all(&kconf), vec!["n", "n", "n", "3", "8", "y"]);

    kconf.set_value(root, "y");
    assert_eq!(read_all(&kconf), vec!["y", "y", "y", "10", "8", "y"]);

    kconf.set_value(root, "n");
    assert_eq!(read_all(&kconf), vec!["n", "n", "n", "3", "8", "y"]);

    // Range active and bounded by LIMIT=3 through the imply chain
    kconf.set_value(implied, "y");
    assert_eq!(kconf.str_value(count), "3");
    assert_eq!(kconf.visibility(shown), BoolValue::N);
}

#[test]
fn test_unread_items_are_recomputed_after_set() {
    let mut b = builder();
    let (root, _) = bool_sym(&mut b, "ROOT", Some("root"));
    let (_, leaf) = bool_sym(&mut b, "LEAF", None);
    let root_expr = b.named_expr("ROOT");
    let y = b.y_expr();
    b.add_default(leaf, root_expr, y);
    let mut kconf = b.finalize().unwrap();

    let leaf = sym(&kconf, "LEAF");
    // LEAF was never read, so nothing stale can be returned
    kconf.set_value(root, "y");
    assert_eq!(kconf.str_value(leaf), "y");
    kconf.set_value(root, "n");
    assert_eq!(kconf.str_value(leaf), "n");
}

#[test]
fn test_invalidate_all() {
    let mut b = builder();
    let (a, _) = bool_sym(&mut b, "A", Some("a"));
    let mut kconf = b.finalize().unwrap();

    assert_eq!(kconf.str_value(a), "n");
    kconf.invalidate_all();
    assert_eq!(kconf.str_value(a), "n");
    kconf.set_value(a, "y");
    kconf.invalidate_all();
    assert_eq!(kconf.str_value(a), "y");
}
