use crate::error::{KconfigError, Result};
use crate::kconfig::expr::{BinOp, ExprId, Item};
use crate::kconfig::menu::{NodeId, NodeItem};
use crate::kconfig::model::Kconfig;
use crate::kconfig::symbol::SymbolId;
use crate::kconfig::types::{SymbolType, is_base_n, parse_int};
use std::collections::BTreeSet;

impl Kconfig {
    /// Post-finalization checks. A malformed default is fatal, everything
    /// else is only diagnosed.
    pub(crate) fn check_sanity(&self) -> Result<()> {
        self.check_sym_sanity()?;
        self.check_choice_sanity();
        self.check_multiple_definitions();
        if self.settings.warn_undef {
            self.check_undef_syms();
        }
        Ok(())
    }

    fn check_sym_sanity(&self) -> Result<()> {
        for &id in &self.unique_defined_syms {
            let sym = self.sym(id);
            let label = self.name_and_loc(Item::Symbol(id));

            match sym.orig_type {
                SymbolType::Bool => {
                    for (targets, verb) in [(&sym.selects, "selects"), (&sym.implies, "implies")] {
                        for &(target, _) in targets {
                            let ty = self.sym(target).orig_type;
                            if !matches!(ty, SymbolType::Bool | SymbolType::Unknown) {
                                self.warn(format!(
                                    "{} {} the {} symbol {}, which is not bool",
                                    label,
                                    verb,
                                    ty,
                                    self.name_and_loc(Item::Symbol(target))
                                ));
                            }
                        }
                    }
                }
                SymbolType::String | SymbolType::Int | SymbolType::Hex => {
                    let ty = sym.orig_type;
                    for &(default, _) in &sym.defaults {
                        let Some(value) = self.exprs.as_symbol(default) else {
                            return Err(KconfigError::MalformedDefault {
                                item: format!("the {} symbol {}", ty, label),
                                default: self.expr_str(default),
                            });
                        };

                        if ty == SymbolType::String {
                            let v = self.sym(value);
                            if !v.is_constant && !v.is_defined() && v.name.to_uppercase() != v.name {
                                // Probably 'default foo' with the quotes left out
                                self.warn(format!(
                                    "style: quotes recommended around default value for string symbol {}",
                                    label
                                ));
                            }
                        } else if !self.num_ok(value, ty) {
                            self.warn(format!(
                                "the {} symbol {} has a non-{} default {}",
                                ty,
                                label,
                                ty,
                                self.name_and_loc(Item::Symbol(value))
                            ));
                        }
                    }

                    if !sym.selects.is_empty() || !sym.implies.is_empty() {
                        self.warn(format!("the {} symbol {} has selects or implies", ty, label));
                    }
                }
                SymbolType::Unknown => self.warn(format!("{} defined without a type", label)),
            }

            if !sym.ranges.is_empty() {
                if !sym.orig_type.is_int_hex() {
                    self.warn(format!(
                        "the {} symbol {} has ranges, but is not int or hex",
                        sym.orig_type, label
                    ));
                } else {
                    for &(low, high, _) in &sym.ranges {
                        if !self.num_ok(low, sym.orig_type) || !self.num_ok(high, sym.orig_type) {
                            self.warn(format!(
                                "the {} symbol {} has a non-{} range [{}, {}]",
                                sym.orig_type,
                                label,
                                sym.orig_type,
                                self.name_and_loc(Item::Symbol(low)),
                                self.name_and_loc(Item::Symbol(high))
                            ));
                        }
                    }
                }
            }

            for &node in &sym.nodes {
                let n = self.node(node);
                if n.is_menuconfig && n.prompt.is_none() {
                    self.warn_at(
                        format!("the menuconfig symbol {} has no prompt", label),
                        n.location.clone(),
                    );
                }
            }
        }
        Ok(())
    }

    /// Whether `value` can serve as a value of an int or hex symbol: either
    /// a literal number or a symbol of the same type.
    fn num_ok(&self, value: SymbolId, ty: SymbolType) -> bool {
        let sym = self.sym(value);
        if !sym.is_defined() {
            return is_base_n(&sym.name, ty.radix());
        }
        sym.orig_type == ty
    }

    fn check_choice_sanity(&self) {
        for &id in &self.unique_choices {
            let choice = self.choice(id);
            let label = self.name_and_loc(Item::Choice(id));

            if choice.orig_type != SymbolType::Bool {
                self.warn(format!("{} defined with type {}", label, choice.orig_type));
            }

            if choice.nodes.iter().all(|&n| self.node(n).prompt.is_none()) {
                self.warn(format!("{} defined without a prompt", label));
            }

            for &(default, _) in &choice.defaults {
                if self.sym(default).choice != Some(id) {
                    self.warn(format!(
                        "the default selection {} of {} is not contained in the choice",
                        self.name_and_loc(Item::Symbol(default)),
                        label
                    ));
                }
            }

            for &sym_id in &choice.syms {
                let sym = self.sym(sym_id);
                let sym_label = self.name_and_loc(Item::Symbol(sym_id));

                if !sym.defaults.is_empty() {
                    self.warn(format!(
                        "default on the choice symbol {} will have no effect, as defaults \
                         do not affect choice symbols",
                        sym_label
                    ));
                }
                if sym.rev_dep != self.exprs.n {
                    self.warn_choice_select_imply(sym_id, sym.rev_dep, "selected");
                }
                if sym.weak_rev_dep != self.exprs.n {
                    self.warn_choice_select_imply(sym_id, sym.weak_rev_dep, "implied");
                }

                for &node in &sym.nodes {
                    let n = self.node(node);
                    let in_choice = n
                        .parent
                        .is_some_and(|p| self.node(p).item == NodeItem::Choice(id));
                    if in_choice && n.prompt.is_none() {
                        self.warn(format!("the choice symbol {} has no prompt", sym_label));
                    } else if !in_choice && n.prompt.is_some() {
                        self.warn(format!(
                            "the choice symbol {} is defined with a prompt outside the choice",
                            sym_label
                        ));
                    }
                }
            }
        }
    }

    fn warn_choice_select_imply(&self, sym: SymbolId, expr: ExprId, verb: &str) {
        let mut msg = format!(
            "the choice symbol {} is {} by the following symbols, but select/imply has no \
             effect on choice symbols",
            self.name_and_loc(Item::Symbol(sym)),
            verb
        );
        for term in self.split_expr(expr, BinOp::Or) {
            let first = self.split_expr(term, BinOp::And)[0];
            if let Some(item) = self.exprs.as_item(first) {
                msg.push_str(&format!("\n - {}", self.name_and_loc(item)));
            }
        }
        self.warn(msg);
    }

    /// Notes symbols and choices defined at more than one distinct location.
    /// The same file sourced twice gives identical locations, which is fine.
    fn check_multiple_definitions(&self) {
        let items = self
            .unique_defined_syms
            .iter()
            .map(|&s| Item::Symbol(s))
            .chain(self.unique_choices.iter().map(|&c| Item::Choice(c)));

        for item in items {
            let (kind, nodes) = match item {
                Item::Symbol(s) => ("Symbol", &self.sym(s).nodes),
                Item::Choice(c) => ("Choice", &self.choice(c).nodes),
            };
            let locations: BTreeSet<String> = nodes
                .iter()
                .map(|&n| self.node(n).location.to_string())
                .collect();
            if locations.len() > 1 {
                let listing: Vec<String> = locations.iter().map(|l| format!("    {}", l)).collect();
                self.info(format!(
                    "{} {} defined in multiple locations (see below). Please check if this is \
                     a correct behavior or a random name match:\n{}",
                    kind,
                    self.name(item),
                    listing.join("\n")
                ));
            }
        }
    }

    /// Warns about references to undefined symbols. Numbers are undefined
    /// symbols too but are not reported.
    fn check_undef_syms(&self) {
        let is_num = |name: &str| {
            parse_int(name, 10).is_some()
                || ((name.starts_with("0x") || name.starts_with("0X")) && is_base_n(name, 16))
        };

        for id in self.syms() {
            let sym = self.sym(id);
            if sym.is_defined() || is_num(&sym.name) {
                continue;
            }

            let mut msg = format!("undefined symbol {}:", sym.name);
            for node in self.node_iter(false) {
                if self.node_references(node, id) {
                    msg.push_str(&format!("\n\n- Referenced at {}", self.node(node).location));
                }
            }
            self.warn(msg);
        }
    }

    /// Whether any expression attached to `node` mentions `sym`.
    fn node_references(&self, node: NodeId, sym: SymbolId) -> bool {
        let n = self.node(node);
        let target = Item::Symbol(sym);
        let mut exprs = vec![n.dep];
        if let Some((_, cond)) = &n.prompt {
            exprs.push(*cond);
        }
        exprs.extend(n.defaults.iter().flat_map(|&(v, c)| [v, c]));
        exprs.extend(n.selects.iter().chain(&n.implies).map(|&(_, c)| c));
        exprs.extend(n.ranges.iter().map(|&(_, _, c)| c));

        exprs.iter().any(|&e| self.expr_items(e).contains(&target))
            || n.selects.iter().chain(&n.implies).any(|&(t, _)| t == sym)
            || n.ranges.iter().any(|&(lo, hi, _)| lo == sym || hi == sym)
    }
}
