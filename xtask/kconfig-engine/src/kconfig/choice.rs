use crate::kconfig::expr::{ExprId, Item};
use crate::kconfig::menu::NodeId;
use crate::kconfig::model::Kconfig;
use crate::kconfig::symbol::{ASSIGNABLE_NONE, ASSIGNABLE_Y, SymbolId};
use crate::kconfig::types::{BoolValue, SymbolType};
use std::cell::Cell;
use std::collections::BTreeSet;

arena_id!(
    /// Handle to a choice.
    ChoiceId
);

#[derive(Debug, Default)]
pub(crate) struct ChoiceCache {
    pub(crate) visibility: Cell<Option<BoolValue>>,
    pub(crate) assignable: Cell<Option<&'static [BoolValue]>>,
    /// Outer `None` means not computed yet.
    pub(crate) selection: Cell<Option<Option<SymbolId>>>,
}

impl ChoiceCache {
    pub(crate) fn clear(&self) {
        self.visibility.set(None);
        self.assignable.set(None);
        self.selection.set(None);
    }
}

/// Exclusive selection group over bool symbols.
#[derive(Debug)]
pub struct Choice {
    pub name: Option<String>,
    pub orig_type: SymbolType,
    pub nodes: Vec<NodeId>,
    /// Member symbols in definition order, filled in by finalization.
    pub syms: Vec<SymbolId>,
    pub defaults: Vec<(SymbolId, ExprId)>,
    pub direct_dep: ExprId,
    pub user_value: Option<BoolValue>,
    /// Sticky user pick, kept across mode changes.
    pub user_selection: Option<SymbolId>,
    pub(crate) was_set: bool,
    pub(crate) dependents: BTreeSet<Item>,
    pub(crate) cache: ChoiceCache,
}

impl Choice {
    pub(crate) fn new(name: Option<&str>, n: ExprId) -> Self {
        Self {
            name: name.map(str::to_string),
            orig_type: SymbolType::Unknown,
            nodes: Vec::new(),
            syms: Vec::new(),
            defaults: Vec::new(),
            direct_dep: n,
            user_value: None,
            user_selection: None,
            was_set: false,
            dependents: BTreeSet::new(),
            cache: ChoiceCache::default(),
        }
    }

    pub fn dependents(&self) -> impl Iterator<Item = Item> + '_ {
        self.dependents.iter().copied()
    }
}

impl Kconfig {
    pub fn choice(&self, id: ChoiceId) -> &Choice {
        &self.choices[id.index()]
    }

    pub(crate) fn choice_visibility(&self, id: ChoiceId) -> BoolValue {
        let choice = self.choice(id);
        if let Some(vis) = choice.cache.visibility.get() {
            return vis;
        }
        let vis = self.prompt_visibility(&choice.nodes);
        choice.cache.visibility.set(Some(vis));
        vis
    }

    /// Mode of the choice: y unless the visibility bounds it down.
    pub(crate) fn choice_bool_value(&self, id: ChoiceId) -> BoolValue {
        let mode = self
            .choice(id)
            .user_value
            .map_or(BoolValue::Y, |user| user.max(BoolValue::Y));
        mode.min(self.choice_visibility(id))
    }

    pub(crate) fn choice_assignable(&self, id: ChoiceId) -> &'static [BoolValue] {
        let choice = self.choice(id);
        if let Some(assignable) = choice.cache.assignable.get() {
            return assignable;
        }
        let assignable = match self.choice_visibility(id) {
            BoolValue::Y => ASSIGNABLE_Y,
            BoolValue::N => ASSIGNABLE_NONE,
        };
        choice.cache.assignable.set(Some(assignable));
        assignable
    }

    /// The selected member, or `None` when the choice is not in y mode or no
    /// member is visible.
    pub fn selection(&self, id: ChoiceId) -> Option<SymbolId> {
        self.choice_selection(id)
    }

    pub(crate) fn choice_selection(&self, id: ChoiceId) -> Option<SymbolId> {
        let choice = self.choice(id);
        if let Some(selection) = choice.cache.selection.get() {
            return selection;
        }

        let selection = if self.choice_bool_value(id) != BoolValue::Y {
            None
        } else {
            match choice.user_selection {
                Some(user) if self.sym_visibility(user) != BoolValue::N => Some(user),
                _ => self.selection_from_defaults(id),
            }
        };
        choice.cache.selection.set(Some(selection));
        selection
    }

    /// First visible default with a satisfied condition, else the first
    /// visible member.
    pub(crate) fn selection_from_defaults(&self, id: ChoiceId) -> Option<SymbolId> {
        let choice = self.choice(id);
        choice
            .defaults
            .iter()
            .find(|&&(sym, cond)| {
                self.eval(cond) != BoolValue::N && self.sym_visibility(sym) != BoolValue::N
            })
            .map(|&(sym, _)| sym)
            .or_else(|| {
                choice
                    .syms
                    .iter()
                    .copied()
                    .find(|&sym| self.sym_visibility(sym) != BoolValue::N)
            })
    }

    pub(crate) fn choice_set_value(&mut self, id: ChoiceId, raw: &str) -> bool {
        let value = BoolValue::from_str_value(raw);
        let choice = self.choice(id);

        if value.is_some() && value == choice.user_value {
            self.choices[id.index()].was_set = true;
            return true;
        }

        let value = match value {
            Some(v) if choice.orig_type == SymbolType::Bool => v,
            _ => {
                let shown = value.map_or_else(|| format!("'{}'", raw), |v| v.to_string());
                self.warn(format!(
                    "the value {} is invalid for {}, which has type {} -- assignment ignored",
                    shown,
                    self.name_and_loc(Item::Choice(id)),
                    choice.orig_type
                ));
                return false;
            }
        };

        let choice = &mut self.choices[id.index()];
        choice.user_value = Some(value);
        choice.was_set = true;
        self.rec_invalidate(Item::Choice(id));
        true
    }

    pub(crate) fn choice_unset_value(&mut self, id: ChoiceId) {
        let choice = &mut self.choices[id.index()];
        if choice.user_value.is_some() || choice.user_selection.is_some() {
            choice.user_value = None;
            choice.user_selection = None;
            self.rec_invalidate(Item::Choice(id));
        }
    }
}
