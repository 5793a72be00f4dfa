//! One-time pass over the menu tree run by [`KconfigBuilder::finalize`].
//!
//! Node properties are folded onto their symbols and choices, parent
//! dependencies are pushed down into every child, implicit submenus are
//! created and `if` nodes are spliced out.
//!
//! [`KconfigBuilder::finalize`]: crate::kconfig::KconfigBuilder::finalize

use crate::error::{KconfigError, Result};
use crate::kconfig::choice::ChoiceId;
use crate::kconfig::expr::{ExprId, Item};
use crate::kconfig::menu::{NodeId, NodeItem};
use crate::kconfig::model::Kconfig;
use crate::kconfig::types::SymbolType;
use std::collections::HashSet;

impl Kconfig {
    pub(crate) fn finalize_tree(&mut self) -> Result<()> {
        let y = self.exprs.y;
        self.finalize_node(self.top_node, y)?;

        self.unique_defined_syms = dedup(&self.defined_syms);
        self.unique_choices = dedup(&self.choice_sites);
        log::debug!(
            "menu tree finalized: {} defined symbols, {} choices",
            self.unique_defined_syms.len(),
            self.unique_choices.len()
        );
        Ok(())
    }

    /// Finalizes `id` and everything below it. `visible_if` holds the
    /// `visible if` conditions of enclosing menus.
    fn finalize_node(&mut self, id: NodeId, visible_if: ExprId) -> Result<()> {
        let item = self.node(id).item;

        if let NodeItem::Symbol(sym) = item {
            self.add_props_to_sym(id);

            // Later siblings depending on this symbol form an implicit menu
            let mut cur = id;
            while let Some(next) = self.node(cur).next {
                if !self.auto_menu_dep(id, next) {
                    break;
                }
                self.finalize_node(next, visible_if)?;
                cur = next;
                self.nodes[cur.index()].parent = Some(id);
            }

            if cur != id {
                log::trace!("implicit menu rooted at {}", self.sym(sym).name);
                let after = self.nodes[cur.index()].next.take();
                let node = &mut self.nodes[id.index()];
                node.list = node.next;
                node.next = after;
            }
        } else if self.node(id).list.is_some() {
            let visible_if = if item == NodeItem::Menu {
                let vis = self.node(id).visibility;
                self.exprs.and(visible_if, vis)
            } else {
                visible_if
            };

            // Children must see propagated dependencies before their own
            // finalization looks ahead for implicit menus
            self.propagate_deps(id, visible_if);

            let mut cur = self.node(id).list;
            while let Some(child) = cur {
                self.finalize_node(child, visible_if)?;
                cur = self.node(child).next;
            }
        }

        if let Some(list) = self.node(id).list {
            self.flatten(list);
            self.remove_ifs(id);
        }

        // Choices without children are legal
        if let NodeItem::Choice(choice) = item {
            self.add_props_to_choice(id, choice)?;
            self.finalize_choice(id, choice);
        }
        Ok(())
    }

    /// ANDs the dependency of `id` into each child's dependency and property
    /// conditions. A choice gates its children with the choice itself.
    fn propagate_deps(&mut self, id: NodeId, visible_if: ExprId) {
        let base = match self.node(id).item {
            NodeItem::Choice(choice) => self.exprs.leaf(Item::Choice(choice)),
            _ => self.node(id).dep,
        };

        let mut cur = self.node(id).list;
        while let Some(child) = cur {
            let exprs = &mut self.exprs;
            let node = &mut self.nodes[child.index()];
            let dep = exprs.and(node.dep, base);
            node.dep = dep;

            if node.item.is_symbol_or_choice() {
                if let Some((_, cond)) = &mut node.prompt {
                    let gate = exprs.and(visible_if, dep);
                    *cond = exprs.and(*cond, gate);
                }
                for (_, cond) in &mut node.defaults {
                    *cond = exprs.and(*cond, dep);
                }
                for (_, _, cond) in &mut node.ranges {
                    *cond = exprs.and(*cond, dep);
                }
                for (_, cond) in &mut node.selects {
                    *cond = exprs.and(*cond, dep);
                }
                for (_, cond) in &mut node.implies {
                    *cond = exprs.and(*cond, dep);
                }
            } else if let Some((_, cond)) = &mut node.prompt {
                // 'visible if' only reaches symbols and choices
                *cond = exprs.and(*cond, dep);
            }

            cur = node.next;
        }
    }

    /// Appends the per-site properties of `id` to its symbol and records the
    /// reverse dependencies on selected and implied symbols.
    fn add_props_to_sym(&mut self, id: NodeId) {
        let NodeItem::Symbol(sym) = self.node(id).item else {
            return;
        };
        let node = &self.nodes[id.index()];
        let s = &mut self.syms[sym.index()];
        s.direct_dep = self.exprs.or(s.direct_dep, node.dep);
        s.defaults.extend_from_slice(&node.defaults);
        s.ranges.extend_from_slice(&node.ranges);
        s.selects.extend_from_slice(&node.selects);
        s.implies.extend_from_slice(&node.implies);

        let sym_expr = self.exprs.leaf(Item::Symbol(sym));
        let selects = node.selects.clone();
        let implies = node.implies.clone();

        for (target, cond) in selects {
            let term = self.exprs.and(sym_expr, cond);
            let t = &mut self.syms[target.index()];
            t.rev_dep = self.exprs.or(t.rev_dep, term);
        }
        for (target, cond) in implies {
            let term = self.exprs.and(sym_expr, cond);
            let t = &mut self.syms[target.index()];
            t.weak_rev_dep = self.exprs.or(t.weak_rev_dep, term);
        }
    }

    fn add_props_to_choice(&mut self, id: NodeId, choice: ChoiceId) -> Result<()> {
        let node = &self.nodes[id.index()];
        let c = &mut self.choices[choice.index()];
        c.direct_dep = self.exprs.or(c.direct_dep, node.dep);

        for &(default, cond) in &node.defaults {
            let Some(sym) = self.exprs.as_symbol(default) else {
                return Err(KconfigError::MalformedDefault {
                    item: self.name_and_loc(Item::Choice(choice)),
                    default: self.expr_str(default),
                });
            };
            self.choices[choice.index()].defaults.push((sym, cond));
        }
        Ok(())
    }

    /// True if `next` has an automatic menu dependency on the symbol of `id`:
    /// its prompt condition, or its dependency when it has no prompt,
    /// requires the symbol.
    fn auto_menu_dep(&self, id: NodeId, next: NodeId) -> bool {
        let NodeItem::Symbol(sym) = self.node(id).item else {
            return false;
        };
        let n = self.node(next);
        let cond = n.prompt.as_ref().map_or(n.dep, |(_, cond)| *cond);
        self.expr_depends_on(cond, sym)
    }

    /// Splices the children of promptless non-choice nodes in the sibling
    /// chain starting at `first` up into the chain, after their parent.
    fn flatten(&mut self, first: NodeId) {
        let mut cur = Some(first);
        while let Some(id) = cur {
            let node = self.node(id);
            let splice = match node.list {
                Some(list) if node.prompt.is_none() && !matches!(node.item, NodeItem::Choice(_)) => {
                    Some((list, node.parent))
                }
                _ => None,
            };
            if let Some((list, parent)) = splice {
                let mut last = list;
                loop {
                    self.nodes[last.index()].parent = parent;
                    match self.node(last).next {
                        Some(next) => last = next,
                        None => break,
                    }
                }
                self.nodes[last.index()].next = self.node(id).next;
                let node = &mut self.nodes[id.index()];
                node.next = Some(list);
                node.list = None;
            }
            cur = self.node(id).next;
        }
    }

    /// Unlinks already flattened `if` nodes from the children of `id`.
    fn remove_ifs(&mut self, id: NodeId) {
        let skip_ifs = |kconf: &Self, mut cur: Option<NodeId>| {
            while let Some(c) = cur {
                if kconf.node(c).item != NodeItem::If {
                    break;
                }
                cur = kconf.node(c).next;
            }
            cur
        };

        let mut cur = skip_ifs(self, self.node(id).list);
        self.nodes[id.index()].list = cur;
        while let Some(c) = cur {
            let next = skip_ifs(self, self.node(c).next);
            self.nodes[c.index()].next = next;
            cur = next;
        }
    }

    /// Registers the symbol children of a choice node as members and infers
    /// missing types.
    fn finalize_choice(&mut self, id: NodeId, choice: ChoiceId) {
        for child in self.children(id) {
            if let NodeItem::Symbol(sym) = self.node(child).item {
                self.syms[sym.index()].choice = Some(choice);
                self.choices[choice.index()].syms.push(sym);
            }
        }

        let c = &self.choices[choice.index()];
        let mut ty = c.orig_type;
        if ty == SymbolType::Unknown {
            ty = c
                .syms
                .iter()
                .map(|&s| self.sym(s).orig_type)
                .find(|&t| t != SymbolType::Unknown)
                .unwrap_or(SymbolType::Unknown);
        }
        self.choices[choice.index()].orig_type = ty;

        let members = self.choices[choice.index()].syms.clone();
        for sym in members {
            let s = &mut self.syms[sym.index()];
            if s.orig_type == SymbolType::Unknown {
                s.orig_type = ty;
            }
        }
    }
}

fn dedup<T: Copy + Eq + std::hash::Hash>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    items.iter().copied().filter(|&i| seen.insert(i)).collect()
}
