use crate::kconfig::choice::ChoiceId;
use crate::kconfig::expr::{BinOp, Expr, ExprId, Item};
use crate::kconfig::menu::NodeId;
use crate::kconfig::model::Kconfig;
use crate::kconfig::types::{BoolValue, SymbolType, format_num, is_base_n, parse_int};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

arena_id!(
    /// Handle to a symbol.
    SymbolId
);

/// Value assigned by the user through `set_value` or a loaded `.config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValue {
    Bool(BoolValue),
    Str(String),
}

pub(crate) const ASSIGNABLE_NONE: &[BoolValue] = &[];
pub(crate) const ASSIGNABLE_Y: &[BoolValue] = &[BoolValue::Y];
pub(crate) const ASSIGNABLE_NY: &[BoolValue] = &[BoolValue::N, BoolValue::Y];

/// Memoized derived values. `visibility` doubles as the "has cached values"
/// flag used to prune invalidation.
#[derive(Debug, Default)]
pub(crate) struct SymbolCache {
    pub(crate) str_value: RefCell<Option<String>>,
    pub(crate) bool_value: Cell<Option<BoolValue>>,
    pub(crate) visibility: Cell<Option<BoolValue>>,
    pub(crate) assignable: Cell<Option<&'static [BoolValue]>>,
    pub(crate) write_to_conf: Cell<bool>,
    pub(crate) warned_non_bool: Cell<bool>,
}

impl SymbolCache {
    pub(crate) fn clear(&self) {
        self.str_value.replace(None);
        self.bool_value.set(None);
        self.visibility.set(None);
        self.assignable.set(None);
    }
}

#[derive(Debug)]
pub struct Symbol {
    pub name: String,
    /// Quoted literal or one of `y`/`n`. Constants are their own value.
    pub is_constant: bool,
    pub orig_type: SymbolType,
    /// Definition sites. Empty for undefined and constant symbols.
    pub nodes: Vec<NodeId>,
    pub direct_dep: ExprId,
    pub defaults: Vec<(ExprId, ExprId)>,
    pub selects: Vec<(SymbolId, ExprId)>,
    pub implies: Vec<(SymbolId, ExprId)>,
    pub ranges: Vec<(SymbolId, SymbolId, ExprId)>,
    pub rev_dep: ExprId,
    pub weak_rev_dep: ExprId,
    pub choice: Option<ChoiceId>,
    pub user_value: Option<UserValue>,
    pub(crate) was_set: bool,
    pub(crate) dependents: BTreeSet<Item>,
    pub(crate) cache: SymbolCache,
}

impl Symbol {
    pub(crate) fn new(name: &str, is_constant: bool, orig_type: SymbolType, n: ExprId) -> Self {
        Self {
            name: name.to_string(),
            is_constant,
            orig_type,
            nodes: Vec::new(),
            direct_dep: n,
            defaults: Vec::new(),
            selects: Vec::new(),
            implies: Vec::new(),
            ranges: Vec::new(),
            rev_dep: n,
            weak_rev_dep: n,
            choice: None,
            user_value: None,
            was_set: false,
            dependents: BTreeSet::new(),
            cache: SymbolCache::default(),
        }
    }

    pub fn is_defined(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Items invalidated when this symbol changes.
    pub fn dependents(&self) -> impl Iterator<Item = Item> + '_ {
        self.dependents.iter().copied()
    }
}

impl Kconfig {
    pub fn sym(&self, id: SymbolId) -> &Symbol {
        &self.syms[id.index()]
    }

    pub(crate) fn sym_visibility(&self, id: SymbolId) -> BoolValue {
        let sym = self.sym(id);
        if let Some(vis) = sym.cache.visibility.get() {
            return vis;
        }
        let vis = self.prompt_visibility(&sym.nodes);
        sym.cache.visibility.set(Some(vis));
        vis
    }

    /// Upper bound on the user value of `id`. Symbols without any prompt
    /// take user values bounded by their direct dependencies instead.
    fn user_value_bound(&self, id: SymbolId) -> BoolValue {
        if self.has_prompt(id) {
            self.sym_visibility(id)
        } else {
            self.eval(self.sym(id).direct_dep)
        }
    }

    pub(crate) fn has_prompt(&self, id: SymbolId) -> bool {
        self.sym(id)
            .nodes
            .iter()
            .any(|&n| self.node(n).prompt.is_some())
    }

    /// Highest prompt condition over `nodes`.
    pub(crate) fn prompt_visibility(&self, nodes: &[NodeId]) -> BoolValue {
        nodes
            .iter()
            .filter_map(|&n| self.node(n).prompt.as_ref())
            .map(|(_, cond)| self.eval(*cond))
            .max()
            .unwrap_or(BoolValue::N)
    }

    pub(crate) fn sym_bool_value(&self, id: SymbolId) -> BoolValue {
        let sym = self.sym(id);
        if let Some(val) = sym.cache.bool_value.get() {
            return val;
        }

        if sym.is_constant {
            return BoolValue::from(id == self.y);
        }

        if sym.orig_type != SymbolType::Bool {
            if sym.orig_type != SymbolType::Unknown && !sym.cache.warned_non_bool.replace(true) {
                self.warn(format!(
                    "The {} symbol {} is being evaluated in a logical context somewhere. \
                     It will always evaluate to n.",
                    sym.orig_type,
                    self.name_and_loc(Item::Symbol(id))
                ));
            }
            sym.cache.bool_value.set(Some(BoolValue::N));
            return BoolValue::N;
        }

        let vis = self.sym_visibility(id);
        let mut write_to_conf = vis != BoolValue::N;

        let val = match sym.choice {
            None => {
                let mut val = BoolValue::N;
                let bound = self.user_value_bound(id);
                match &sym.user_value {
                    Some(UserValue::Bool(user)) if bound != BoolValue::N => {
                        val = (*user).min(bound);
                        write_to_conf = true;
                    }
                    _ => {
                        for &(default, cond) in &sym.defaults {
                            let cond_val = self.eval(cond);
                            if cond_val != BoolValue::N {
                                val = self.eval(default).min(cond_val);
                                if val.is_y() {
                                    write_to_conf = true;
                                }
                                break;
                            }
                        }

                        // Implies only count when the direct dependencies hold
                        let weak = self.eval(sym.weak_rev_dep);
                        if weak != BoolValue::N && self.eval(sym.direct_dep) != BoolValue::N {
                            val = val.max(weak);
                            write_to_conf = true;
                        }
                    }
                }

                let rev = self.eval(sym.rev_dep);
                if rev != BoolValue::N {
                    if self.eval(sym.direct_dep) < rev {
                        self.warn_select_unsatisfied_deps(id);
                    }
                    val = val.max(rev);
                    write_to_conf = true;
                }
                val
            }
            // Choice mode bounds the visibility of its symbols
            Some(choice) if vis == BoolValue::Y => {
                BoolValue::from(self.choice_selection(choice) == Some(id))
            }
            Some(_) => BoolValue::N,
        };

        sym.cache.write_to_conf.set(write_to_conf);
        sym.cache.bool_value.set(Some(val));
        val
    }

    pub(crate) fn sym_str_value(&self, id: SymbolId) -> String {
        let sym = self.sym(id);
        if let Some(val) = sym.cache.str_value.borrow().as_ref() {
            return val.clone();
        }

        let val = match sym.orig_type {
            SymbolType::Bool => self.sym_bool_value(id).as_str().to_string(),
            // Undefined and constant symbols evaluate to their own name
            SymbolType::Unknown => sym.name.clone(),
            SymbolType::String => self.string_value(id),
            SymbolType::Int | SymbolType::Hex => self.number_value(id),
        };

        sym.cache.str_value.replace(Some(val.clone()));
        val
    }

    fn string_value(&self, id: SymbolId) -> String {
        let sym = self.sym(id);
        let vis = self.sym_visibility(id);
        sym.cache.write_to_conf.set(vis != BoolValue::N);

        if self.user_value_bound(id) != BoolValue::N {
            if let Some(UserValue::Str(user)) = &sym.user_value {
                sym.cache.write_to_conf.set(true);
                return user.clone();
            }
        }

        for &(default, cond) in &sym.defaults {
            if self.eval(cond) != BoolValue::N {
                sym.cache.write_to_conf.set(true);
                return self.default_str(default);
            }
        }
        String::new()
    }

    fn number_value(&self, id: SymbolId) -> String {
        let sym = self.sym(id);
        let ty = sym.orig_type;
        let radix = ty.radix();
        let vis = self.sym_visibility(id);
        sym.cache.write_to_conf.set(vis != BoolValue::N);

        // Unparsable bounds count as zero
        let range = sym
            .ranges
            .iter()
            .find(|&&(_, _, cond)| self.eval(cond) != BoolValue::N)
            .map(|&(low, high, _)| {
                let bound = |s: SymbolId| parse_int(&self.sym_str_value(s), radix).unwrap_or(0);
                (bound(low), bound(high))
            });

        if self.user_value_bound(id) != BoolValue::N {
            if let Some(UserValue::Str(user)) = &sym.user_value {
                if !user.is_empty() {
                    let user_num = parse_int(user, radix).unwrap_or(0);
                    match range {
                        Some((low, high)) if !(low..=high).contains(&user_num) => {
                            self.warn(format!(
                                "user value {} on the {} symbol {} ignored due to being outside \
                                 the active range ([{}, {}]) -- falling back on defaults",
                                format_num(user_num, ty),
                                ty,
                                self.name_and_loc(Item::Symbol(id)),
                                format_num(low, ty),
                                format_num(high, ty)
                            ));
                        }
                        // Kept verbatim, "0x1A" stays "0x1A"
                        _ => {
                            sym.cache.write_to_conf.set(true);
                            return user.clone();
                        }
                    }
                }
            }
        }

        let mut val = String::new();
        let mut val_num = 0;
        let mut has_default = false;
        for &(default, cond) in &sym.defaults {
            if self.eval(cond) != BoolValue::N {
                has_default = true;
                sym.cache.write_to_conf.set(true);
                val = self.default_str(default);
                val_num = parse_int(&val, radix).unwrap_or(0);
                break;
            }
        }

        // Clamping runs even without a default
        if let Some((low, high)) = range {
            let clamp = if val_num < low {
                Some(low)
            } else if val_num > high {
                Some(high)
            } else {
                None
            };
            if let Some(clamp) = clamp {
                val = format_num(clamp, ty);
                if has_default {
                    self.warn(format!(
                        "default value {} on {} clamped to {} due to being outside the active \
                         range ([{}, {}])",
                        val_num,
                        self.name_and_loc(Item::Symbol(id)),
                        format_num(clamp, ty),
                        format_num(low, ty),
                        format_num(high, ty)
                    ));
                }
            }
        }
        val
    }

    /// String value of a default that must be a single symbol.
    fn default_str(&self, default: ExprId) -> String {
        self.exprs
            .as_symbol(default)
            .map(|s| self.sym_str_value(s))
            .unwrap_or_default()
    }

    pub(crate) fn sym_assignable(&self, id: SymbolId) -> &'static [BoolValue] {
        let sym = self.sym(id);
        if let Some(assignable) = sym.cache.assignable.get() {
            return assignable;
        }

        let assignable = if sym.orig_type != SymbolType::Bool {
            ASSIGNABLE_NONE
        } else {
            match self.sym_visibility(id) {
                BoolValue::N => ASSIGNABLE_NONE,
                BoolValue::Y if sym.choice.is_some() => ASSIGNABLE_Y,
                // Locked to y by a select
                BoolValue::Y if self.eval(sym.rev_dep).is_y() => ASSIGNABLE_Y,
                BoolValue::Y => ASSIGNABLE_NY,
            }
        };
        sym.cache.assignable.set(Some(assignable));
        assignable
    }

    /// Whether the symbol produces `.config` output. Computes the value first.
    pub fn write_to_conf(&self, id: SymbolId) -> bool {
        self.sym_str_value(id);
        self.sym(id).cache.write_to_conf.get()
    }

    pub(crate) fn sym_set_value(&mut self, id: SymbolId, raw: &str, warn_no_prompt: bool) -> bool {
        let sym = self.sym(id);
        let value = match sym.orig_type {
            SymbolType::Bool => BoolValue::from_str_value(raw).map(UserValue::Bool),
            SymbolType::String => Some(UserValue::Str(raw.to_string())),
            SymbolType::Int if is_base_n(raw, 10) => Some(UserValue::Str(raw.to_string())),
            SymbolType::Hex if parse_int(raw, 16).is_some_and(|v| v >= 0) => {
                Some(UserValue::Str(raw.to_string()))
            }
            _ => None,
        };

        // Choice symbols always go through, setting one to y may change the
        // choice even when the user value is the same
        if value.is_some() && value == sym.user_value && sym.choice.is_none() {
            self.syms[id.index()].was_set = true;
            return true;
        }

        let Some(value) = value else {
            let shown = match BoolValue::from_str_value(raw) {
                Some(b) => b.to_string(),
                None => format!("'{}'", raw),
            };
            self.warn(format!(
                "the value {} is invalid for {}, which has type {} -- assignment ignored",
                shown,
                self.name_and_loc(Item::Symbol(id)),
                sym.orig_type
            ));
            return false;
        };

        if sym.is_constant {
            self.warn(format!("attempt to assign the value '{}' to the constant symbol {}", raw, sym.name));
            return false;
        }

        let selects_choice = match (&value, sym.choice) {
            (UserValue::Bool(BoolValue::Y), Some(choice)) => Some(choice),
            _ => None,
        };

        let sym = &mut self.syms[id.index()];
        sym.user_value = Some(value);
        sym.was_set = true;

        match selects_choice {
            Some(choice) => {
                let c = &mut self.choices[choice.index()];
                c.user_selection = Some(id);
                c.was_set = true;
                self.rec_invalidate(Item::Choice(choice));
            }
            None => {
                if warn_no_prompt {
                    self.warn_if_no_prompt(id);
                }
                self.rec_invalidate(Item::Symbol(id));
            }
        }
        true
    }

    pub(crate) fn sym_unset_value(&mut self, id: SymbolId) {
        let sym = &mut self.syms[id.index()];
        if sym.user_value.take().is_some() {
            self.rec_invalidate(Item::Symbol(id));
        }
    }

    fn warn_if_no_prompt(&self, id: SymbolId) {
        if !self.has_prompt(id) {
            self.warn(format!(
                "{} has no prompt, so the user value is only bounded by its direct dependencies",
                self.name_and_loc(Item::Symbol(id))
            ));
        }
    }

    /// Value the symbol would get from defaults, selects and implies alone.
    pub fn str_default(&self, id: SymbolId) -> String {
        let sym = self.sym(id);
        match sym.orig_type {
            SymbolType::Bool => {
                let mut val = BoolValue::N;
                // Defaults, selects and implies do not affect choice symbols
                if sym.choice.is_none() {
                    for &(default, cond) in &sym.defaults {
                        let cond_val = self.eval(cond);
                        if cond_val != BoolValue::N {
                            val = self.eval(default).min(cond_val);
                            break;
                        }
                    }
                    val = val
                        .max(self.eval(sym.rev_dep))
                        .max(self.eval(sym.weak_rev_dep));
                }
                val.as_str().to_string()
            }
            SymbolType::String | SymbolType::Int | SymbolType::Hex => sym
                .defaults
                .iter()
                .find(|&&(_, cond)| self.eval(cond) != BoolValue::N)
                .map(|&(default, _)| self.default_str(default))
                .unwrap_or_default(),
            SymbolType::Unknown => String::new(),
        }
    }

    fn warn_select_unsatisfied_deps(&self, id: SymbolId) {
        let sym = self.sym(id);
        let direct = self.eval(sym.direct_dep);
        let mut msg = format!(
            "{} has direct dependencies {} with value {}, but is currently being {}-selected \
             by the following symbols:",
            self.name_and_loc(Item::Symbol(id)),
            self.expr_str(sym.direct_dep),
            direct,
            self.eval(sym.rev_dep)
        );

        // 'select A if B' is stored as A && B, a plain 'select A' as A
        for select in self.split_expr(sym.rev_dep, BinOp::Or) {
            if self.eval(select) <= direct {
                continue;
            }
            let parts = self.split_expr(select, BinOp::And);
            let Some(selecting) = self.exprs.as_symbol(parts[0]) else {
                continue;
            };
            let selecting_sym = self.sym(selecting);
            msg.push_str(&format!(
                "\n - {}, with value {}, direct dependencies {} (value: {})",
                self.name_and_loc(Item::Symbol(selecting)),
                self.sym_str_value(selecting),
                self.expr_str(selecting_sym.direct_dep),
                self.eval(selecting_sym.direct_dep)
            ));
            if let Expr::And(_, cond) = self.exprs.get(select) {
                msg.push_str(&format!(
                    ", and select condition {} (value: {})",
                    self.expr_str(cond),
                    self.eval(cond)
                ));
            }
        }
        self.warn(msg);
    }
}
