//! Dependency graph, loop detection and cache invalidation.
//!
//! Every symbol and choice records the items whose value might change when
//! its own value changes. The sets may be larger than strictly needed since
//! expressions are not analyzed beyond the items they mention.

use crate::error::{KconfigError, Result};
use crate::kconfig::choice::ChoiceId;
use crate::kconfig::expr::{ExprId, Item};
use crate::kconfig::model::Kconfig;
use crate::kconfig::symbol::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    /// On the current search path.
    InProgress,
    /// Known not to be part of a loop.
    Done,
}

struct LoopSearch {
    syms: Vec<Visit>,
    choices: Vec<Visit>,
}

/// Partial loop collected while unwinding, starting with the item where the
/// loop was closed.
type Trace = Option<Vec<Item>>;

impl Kconfig {
    /// Fills in the dependents of every item. Only defined symbols are
    /// recorded as dependents: constant and undefined symbols never change
    /// value.
    pub(crate) fn build_dep(&mut self) {
        let mut edges: Vec<(Item, Item)> = Vec::new();

        for &id in &self.unique_defined_syms {
            let sym = self.sym(id);
            let mut on: Vec<ExprId> = Vec::new();

            for &node in &sym.nodes {
                if let Some((_, cond)) = &self.node(node).prompt {
                    on.push(*cond);
                }
            }
            for &(value, cond) in &sym.defaults {
                on.extend([value, cond]);
            }
            on.extend([sym.rev_dep, sym.weak_rev_dep]);
            for &(low, high, cond) in &sym.ranges {
                edges.push((Item::Symbol(low), Item::Symbol(id)));
                edges.push((Item::Symbol(high), Item::Symbol(id)));
                on.push(cond);
            }
            // Needed for 'imply', which looks at the direct dependencies even
            // when no property carries them
            on.push(sym.direct_dep);

            for e in on {
                self.exprs
                    .for_each_item(e, |item| edges.push((item, Item::Symbol(id))));
            }
        }

        for &id in &self.unique_choices {
            let choice = self.choice(id);
            let mut on: Vec<ExprId> = choice
                .nodes
                .iter()
                .filter_map(|&node| self.node(node).prompt.as_ref().map(|(_, cond)| *cond))
                .collect();
            on.extend(choice.defaults.iter().map(|&(_, cond)| cond));

            for e in on {
                self.exprs
                    .for_each_item(e, |item| edges.push((item, Item::Choice(id))));
            }
        }

        let count = edges.len();
        for (on, dependent) in edges {
            self.depend_on(on, dependent);
        }
        log::debug!("dependency graph built with {} edges", count);
    }

    fn depend_on(&mut self, on: Item, dependent: Item) {
        match on {
            Item::Symbol(sym) => {
                let s = &mut self.syms[sym.index()];
                if !s.is_constant {
                    s.dependents.insert(dependent);
                }
            }
            Item::Choice(choice) => {
                self.choices[choice.index()].dependents.insert(dependent);
            }
        }
    }

    /// Choices also depend on their symbols, whose visibility feeds the
    /// selection. Added after loop detection, since the resulting
    /// symbol/choice cycles are expected.
    pub(crate) fn add_choice_deps(&mut self) {
        for &id in &self.unique_choices {
            for &sym in &self.choices[id.index()].syms {
                self.syms[sym.index()].dependents.insert(Item::Choice(id));
            }
        }
    }

    /// Depth-first search over the dependents graph. A loop aborts
    /// finalization with the chain of items involved.
    pub(crate) fn check_dep_loops(&self) -> Result<()> {
        let mut search = LoopSearch {
            syms: vec![Visit::Unvisited; self.syms.len()],
            choices: vec![Visit::Unvisited; self.choices.len()],
        };
        for &sym in &self.unique_defined_syms {
            self.check_dep_loop_sym(&mut search, sym, false)?;
        }
        Ok(())
    }

    fn check_dep_loop_sym(
        &self,
        search: &mut LoopSearch,
        id: SymbolId,
        ignore_choice: bool,
    ) -> Result<Trace> {
        match search.syms[id.index()] {
            Visit::Done => return Ok(None),
            Visit::InProgress => return Ok(Some(vec![Item::Symbol(id)])),
            Visit::Unvisited => {}
        }
        search.syms[id.index()] = Visit::InProgress;

        let sym = self.sym(id);
        for dep in sym.dependents() {
            // A choice shows up here when the symbol is in one of its prompt
            // or default conditions. It is not entered through a member, so
            // every member is checked.
            let trace = match dep {
                Item::Choice(choice) => self.check_dep_loop_choice(search, choice, None)?,
                Item::Symbol(s) => self.check_dep_loop_sym(search, s, false)?,
            };
            if let Some(trace) = trace {
                return self.found_dep_loop(trace, Item::Symbol(id));
            }
        }

        if let (Some(choice), false) = (sym.choice, ignore_choice) {
            if let Some(trace) = self.check_dep_loop_choice(search, choice, Some(id))? {
                return self.found_dep_loop(trace, Item::Symbol(id));
            }
        }

        search.syms[id.index()] = Visit::Done;
        Ok(None)
    }

    /// `skip` is the member the choice was entered through. Visiting it
    /// again would report a bogus `FOO -> <choice> -> FOO` loop.
    fn check_dep_loop_choice(
        &self,
        search: &mut LoopSearch,
        id: ChoiceId,
        skip: Option<SymbolId>,
    ) -> Result<Trace> {
        match search.choices[id.index()] {
            Visit::Done => return Ok(None),
            Visit::InProgress => return Ok(Some(vec![Item::Choice(id)])),
            Visit::Unvisited => {}
        }
        search.choices[id.index()] = Visit::InProgress;

        for &sym in &self.choice(id).syms {
            if Some(sym) == skip {
                continue;
            }
            if let Some(trace) = self.check_dep_loop_sym(search, sym, true)? {
                return self.found_dep_loop(trace, Item::Choice(id));
            }
        }

        search.choices[id.index()] = Visit::Done;
        Ok(None)
    }

    /// Called while unwinding. Extends the trace until it gets back to the
    /// item that closed the loop, then fails with the whole loop.
    fn found_dep_loop(&self, mut trace: Vec<Item>, cur: Item) -> Result<Trace> {
        if trace[0] != cur {
            trace.push(cur);
            return Ok(Some(trace));
        }

        let mut chain = String::from("\nDependency loop\n===============\n\n");
        for (i, &item) in trace.iter().enumerate() {
            if i > 0 {
                chain.push_str("...depends on ");
                if let Item::Symbol(sym) = item {
                    if self.sym(sym).choice.is_some() {
                        chain.push_str("the choice symbol ");
                    }
                }
            }
            chain.push_str(&self.name_and_loc(item));
            chain.push_str("\n\n");

            // The dependents sets do not say whether an edge came from a
            // select condition, so show reverse dependencies explicitly
            if let Item::Symbol(sym) = item {
                let s = self.sym(sym);
                if s.rev_dep != self.exprs.n {
                    chain.push_str(&format!(
                        "(select-related dependencies: {})\n\n",
                        self.expr_str(s.rev_dep)
                    ));
                }
                if s.weak_rev_dep != self.exprs.n {
                    chain.push_str(&format!(
                        "(imply-related dependencies: {})\n\n",
                        self.expr_str(s.weak_rev_dep)
                    ));
                }
            }
        }
        chain.push_str("...depends again on ");
        chain.push_str(&self.name_and_loc(trace[0]));

        let items = trace.iter().map(|&item| self.name(item)).collect();
        Err(KconfigError::DependencyLoop { items, chain })
    }

    /// Drops the cached values of `item` alone.
    pub(crate) fn invalidate(&self, item: Item) {
        match item {
            Item::Symbol(sym) => self.sym(sym).cache.clear(),
            Item::Choice(choice) => self.choice(choice).cache.clear(),
        }
    }

    /// Whether `item` has computed anything since its last invalidation.
    /// Visibility is computed as a side effect of every other cached value.
    pub(crate) fn has_cached_values(&self, item: Item) -> bool {
        match item {
            Item::Symbol(sym) => self.sym(sym).cache.visibility.get().is_some(),
            Item::Choice(choice) => self.choice(choice).cache.visibility.get().is_some(),
        }
    }

    /// Invalidates `item` and everything that transitively depends on it.
    ///
    /// The walk stops at items without cached values: any dependent with a
    /// cached value would have read such an item and populated its cache.
    pub(crate) fn rec_invalidate(&self, item: Item) {
        self.invalidate(item);
        let mut stack = vec![item];
        let mut visited = 1usize;

        while let Some(cur) = stack.pop() {
            let dependents = match cur {
                Item::Symbol(sym) => &self.sym(sym).dependents,
                Item::Choice(choice) => &self.choice(choice).dependents,
            };
            for &dep in dependents {
                if self.has_cached_values(dep) {
                    self.invalidate(dep);
                    stack.push(dep);
                    visited += 1;
                }
            }
        }
        log::trace!("invalidated {} item(s) starting at {}", visited, self.name(item));
    }

    /// Drops every cached value in the model.
    pub fn invalidate_all(&self) {
        for &sym in &self.unique_defined_syms {
            self.invalidate(Item::Symbol(sym));
        }
        for &choice in &self.unique_choices {
            self.invalidate(Item::Choice(choice));
        }
    }
}
