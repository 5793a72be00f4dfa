use crate::config::Settings;
use crate::error::{KconfigError, Result};
use crate::kconfig::choice::{Choice, ChoiceId};
use crate::kconfig::diag::{Diagnostic, Diagnostics, Severity};
use crate::kconfig::expr::{ExprArena, ExprId, Item, RelOp};
use crate::kconfig::menu::{Location, MenuNode, NodeId, NodeItem};
use crate::kconfig::symbol::{Symbol, SymbolId};
use crate::kconfig::types::{BoolValue, SymbolType};
use std::cell::Ref;
use std::collections::HashMap;
use std::path::PathBuf;

/// A finalized configuration model.
///
/// Symbols, choices, menu nodes and expressions live in flat arenas and refer
/// to each other by handle. Derived values are computed on first read and
/// cached until a `set_value`/`unset_value` on something they depend on.
/// The model is single-threaded; hosts serving several callers must keep one
/// model per session.
#[derive(Debug)]
pub struct Kconfig {
    pub(crate) settings: Settings,
    pub(crate) syms: Vec<Symbol>,
    sym_names: HashMap<String, SymbolId>,
    const_names: HashMap<String, SymbolId>,
    pub(crate) choices: Vec<Choice>,
    named_choices: HashMap<String, ChoiceId>,
    pub(crate) nodes: Vec<MenuNode>,
    pub(crate) exprs: ExprArena,
    pub(crate) top_node: NodeId,
    pub(crate) y: SymbolId,
    pub(crate) n: SymbolId,
    /// One entry per symbol definition site, in definition order.
    pub(crate) defined_syms: Vec<SymbolId>,
    pub(crate) unique_defined_syms: Vec<SymbolId>,
    /// One entry per choice definition site.
    pub(crate) choice_sites: Vec<ChoiceId>,
    pub(crate) unique_choices: Vec<ChoiceId>,
    pub(crate) menus: Vec<NodeId>,
    pub(crate) comments: Vec<NodeId>,
    pub(crate) missing_syms: Vec<(String, String)>,
    diagnostics: Diagnostics,
}

impl Kconfig {
    fn new(root: PathBuf, settings: Settings) -> Self {
        let mut syms = Vec::new();
        let mut const_names = HashMap::new();
        let y = SymbolId::new(0);
        let n = SymbolId::new(1);
        let exprs = ExprArena::new(y, n);
        for (id, name) in [(y, "y"), (n, "n")] {
            syms.push(Symbol::new(name, true, SymbolType::Bool, exprs.n));
            const_names.insert(name.to_string(), id);
        }

        let top = MenuNode {
            prompt: Some(("Main menu".to_string(), exprs.y)),
            is_menuconfig: true,
            ..MenuNode::new(NodeItem::Menu, None, Location::new(root, 1), exprs.y)
        };

        Self {
            settings,
            syms,
            sym_names: HashMap::new(),
            const_names,
            choices: Vec::new(),
            named_choices: HashMap::new(),
            nodes: vec![top],
            exprs,
            top_node: NodeId::new(0),
            y,
            n,
            defined_syms: Vec::new(),
            unique_defined_syms: Vec::new(),
            choice_sites: Vec::new(),
            unique_choices: Vec::new(),
            menus: Vec::new(),
            comments: Vec::new(),
            missing_syms: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The constant `y` symbol.
    pub fn y(&self) -> SymbolId {
        self.y
    }

    /// The constant `n` symbol.
    pub fn n(&self) -> SymbolId {
        self.n
    }

    /// Looks up a non-constant symbol by name.
    pub fn sym_id(&self, name: &str) -> Option<SymbolId> {
        self.sym_names.get(name).copied()
    }

    pub fn named_choice(&self, name: &str) -> Option<ChoiceId> {
        self.named_choices.get(name).copied()
    }

    /// All non-constant symbols, including undefined ones, in creation order.
    pub fn syms(&self) -> impl Iterator<Item = SymbolId> + '_ {
        (0..self.syms.len())
            .map(SymbolId::new)
            .filter(|&id| !self.syms[id.index()].is_constant)
    }

    pub fn defined_syms(&self) -> &[SymbolId] {
        &self.defined_syms
    }

    /// Defined symbols in definition order, each once.
    pub fn unique_defined_syms(&self) -> &[SymbolId] {
        &self.unique_defined_syms
    }

    pub fn unique_choices(&self) -> &[ChoiceId] {
        &self.unique_choices
    }

    pub fn menus(&self) -> &[NodeId] {
        &self.menus
    }

    pub fn comments(&self) -> &[NodeId] {
        &self.comments
    }

    /// `(name, value)` pairs assigned to undefined symbols by the last load.
    pub fn missing_syms(&self) -> &[(String, String)] {
        &self.missing_syms
    }

    pub fn diagnostics(&self) -> Ref<'_, Vec<Diagnostic>> {
        self.diagnostics.entries()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    pub fn str_value(&self, item: impl Into<Item>) -> String {
        match item.into() {
            Item::Symbol(sym) => self.sym_str_value(sym),
            Item::Choice(choice) => self.choice_bool_value(choice).as_str().to_string(),
        }
    }

    pub fn bool_value(&self, item: impl Into<Item>) -> BoolValue {
        self.item_bool_value(item.into())
    }

    pub fn visibility(&self, item: impl Into<Item>) -> BoolValue {
        match item.into() {
            Item::Symbol(sym) => self.sym_visibility(sym),
            Item::Choice(choice) => self.choice_visibility(choice),
        }
    }

    /// Bool values a `set_value` would currently be honored with, lowest
    /// first. Empty for invisible and non-bool items.
    pub fn assignable(&self, item: impl Into<Item>) -> &'static [BoolValue] {
        match item.into() {
            Item::Symbol(sym) => self.sym_assignable(sym),
            Item::Choice(choice) => self.choice_assignable(choice),
        }
    }

    /// Sets the user value. Bool symbols and choices take `"n"`/`"y"`, other
    /// types take their textual value, which is kept verbatim.
    ///
    /// Returns false, with a diagnostic, if the value is malformed for the
    /// item's type. Dependent values are recomputed on their next read.
    pub fn set_value(&mut self, item: impl Into<Item>, value: &str) -> bool {
        match item.into() {
            Item::Symbol(sym) => self.sym_set_value(sym, value, true),
            Item::Choice(choice) => self.choice_set_value(choice, value),
        }
    }

    pub fn set_bool_value(&mut self, item: impl Into<Item>, value: BoolValue) -> bool {
        self.set_value(item, value.as_str())
    }

    /// Removes any user value, as if it had never been assigned. For a
    /// choice this also forgets the user selection.
    pub fn unset_value(&mut self, item: impl Into<Item>) {
        match item.into() {
            Item::Symbol(sym) => self.sym_unset_value(sym),
            Item::Choice(choice) => self.choice_unset_value(choice),
        }
    }

    pub fn name(&self, item: impl Into<Item>) -> String {
        match item.into() {
            Item::Symbol(sym) => self.sym(sym).name.clone(),
            Item::Choice(choice) => self.item_expr_str(Item::Choice(choice)),
        }
    }

    /// `NAME (defined at file:line, ...)`, or `NAME (undefined)`.
    pub fn name_and_loc(&self, item: Item) -> String {
        let (name, nodes) = match item {
            Item::Symbol(sym) => (self.sym(sym).name.clone(), &self.sym(sym).nodes),
            Item::Choice(choice) => (self.item_expr_str(item), &self.choice(choice).nodes),
        };
        if nodes.is_empty() {
            return format!("{} (undefined)", name);
        }
        let locs: Vec<String> = nodes
            .iter()
            .map(|&n| self.node(n).location.to_string())
            .collect();
        format!("{} (defined at {})", name, locs.join(", "))
    }

    pub(crate) fn warn(&self, msg: impl Into<String>) {
        self.diag(Severity::Warning, msg.into(), None);
    }

    pub(crate) fn warn_at(&self, msg: impl Into<String>, location: Location) {
        self.diag(Severity::Warning, msg.into(), Some(location));
    }

    pub(crate) fn info(&self, msg: impl Into<String>) {
        self.diag(Severity::Info, msg.into(), None);
    }

    fn diag(&self, severity: Severity, message: String, location: Option<Location>) {
        if !self.settings.warn {
            return;
        }
        self.diagnostics.push(
            Diagnostic {
                severity,
                message,
                location,
            },
            self.settings.warn_to_log,
        );
    }

    fn lookup_sym(&mut self, name: &str, is_constant: bool) -> SymbolId {
        let names = if is_constant {
            &self.const_names
        } else {
            &self.sym_names
        };
        if let Some(&id) = names.get(name) {
            return id;
        }

        let id = SymbolId::new(self.syms.len());
        self.syms
            .push(Symbol::new(name, is_constant, SymbolType::Unknown, self.exprs.n));
        if is_constant {
            self.const_names.insert(name.to_string(), id);
        } else {
            self.sym_names.insert(name.to_string(), id);
        }
        id
    }
}

/// Construction phase of a [`Kconfig`].
///
/// A front end walks its parse tree and calls these methods to create
/// symbols, choices and menu nodes and to attach properties. `finalize`
/// consumes the builder, so properties cannot be added to a read-ready model.
#[derive(Debug)]
pub struct KconfigBuilder {
    kconf: Kconfig,
    /// Last child of each node that has children, for appending.
    tails: HashMap<NodeId, NodeId>,
}

impl KconfigBuilder {
    /// Starts a model whose top node is attributed to `root` (usually the
    /// top-level Kconfig file). Settings come from the environment.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_settings(root, Settings::from_env())
    }

    pub fn with_settings(root: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            kconf: Kconfig::new(root.into(), settings),
            tails: HashMap::new(),
        }
    }

    /// Read access to the model under construction.
    pub fn model(&self) -> &Kconfig {
        &self.kconf
    }

    pub fn top_node(&self) -> NodeId {
        self.kconf.top_node
    }

    pub fn y(&self) -> SymbolId {
        self.kconf.y
    }

    pub fn n(&self) -> SymbolId {
        self.kconf.n
    }

    /// Returns the symbol called `name`, creating it if needed. A symbol may
    /// be referenced before it is defined.
    pub fn lookup_sym(&mut self, name: &str) -> SymbolId {
        self.kconf.lookup_sym(name, false)
    }

    /// Returns the constant symbol for the literal `value`. `y` and `n` map
    /// to the built-in constants.
    pub fn lookup_const_sym(&mut self, value: &str) -> SymbolId {
        self.kconf.lookup_sym(value, true)
    }

    /// Named choices are shared across definitions, anonymous ones are new
    /// on every call.
    pub fn new_choice(&mut self, name: Option<&str>) -> ChoiceId {
        if let Some(&id) = name.and_then(|name| self.kconf.named_choices.get(name)) {
            return id;
        }
        let id = ChoiceId::new(self.kconf.choices.len());
        self.kconf
            .choices
            .push(Choice::new(name, self.kconf.exprs.n));
        if let Some(name) = name {
            self.kconf.named_choices.insert(name.to_string(), id);
        }
        id
    }

    /// Appends a node for `item` as the last child of `parent`.
    pub fn add_node(&mut self, parent: NodeId, item: NodeItem, location: Location) -> NodeId {
        let kconf = &mut self.kconf;
        let id = NodeId::new(kconf.nodes.len());
        let mut node = MenuNode::new(item, Some(parent), location, kconf.exprs.y);

        match item {
            NodeItem::Symbol(sym) => {
                kconf.syms[sym.index()].nodes.push(id);
                kconf.defined_syms.push(sym);
            }
            NodeItem::Choice(choice) => {
                kconf.choices[choice.index()].nodes.push(id);
                kconf.choice_sites.push(choice);
                node.is_menuconfig = true;
            }
            NodeItem::Menu => {
                kconf.menus.push(id);
                node.is_menuconfig = true;
            }
            NodeItem::Comment => kconf.comments.push(id),
            NodeItem::If => {}
        }
        kconf.nodes.push(node);

        match self.tails.insert(parent, id) {
            Some(prev) => kconf.nodes[prev.index()].next = Some(id),
            None => kconf.nodes[parent.index()].list = Some(id),
        }
        id
    }

    /// Marks a symbol node as `menuconfig`.
    pub fn set_menuconfig(&mut self, node: NodeId) {
        self.kconf.nodes[node.index()].is_menuconfig = true;
    }

    /// Sets the type of a symbol or choice. The last type wins.
    pub fn set_type(&mut self, item: impl Into<Item>, ty: SymbolType) {
        let item = item.into();
        let current = match item {
            Item::Symbol(sym) => &mut self.kconf.syms[sym.index()].orig_type,
            Item::Choice(choice) => &mut self.kconf.choices[choice.index()].orig_type,
        };
        let previous = std::mem::replace(current, ty);
        if previous != SymbolType::Unknown && previous != ty {
            let msg = format!(
                "{} defined with multiple types, {} will be used",
                self.kconf.name_and_loc(item),
                ty
            );
            self.kconf.warn(msg);
        }
    }

    /// Sets the prompt of `node`, shown when `cond` holds.
    pub fn set_prompt(&mut self, node: NodeId, text: &str, cond: ExprId) {
        let kconf = &mut self.kconf;
        let label = kconf.node_label(node);
        if kconf.nodes[node.index()].prompt.is_some() {
            kconf.warn(format!("{} defined with multiple prompts in single location", label));
        }
        let trimmed = text.trim();
        if trimmed != text {
            kconf.warn(format!("{} has leading or trailing whitespace in its prompt", label));
        }
        kconf.nodes[node.index()].prompt = Some((trimmed.to_string(), cond));
    }

    pub fn set_help(&mut self, node: NodeId, text: &str) {
        let kconf = &mut self.kconf;
        if kconf.nodes[node.index()].help.is_some() {
            kconf.warn(format!(
                "{} defined with more than one help text -- only the last one will be used",
                kconf.node_label(node)
            ));
        }
        kconf.nodes[node.index()].help = Some(text.to_string());
    }

    /// `depends on`: ANDs `expr` into the node's dependency.
    pub fn add_dependency(&mut self, node: NodeId, expr: ExprId) {
        let dep = self.kconf.nodes[node.index()].dep;
        self.kconf.nodes[node.index()].dep = self.kconf.exprs.and(dep, expr);
    }

    /// `visible if` on a menu.
    pub fn add_visible_if(&mut self, node: NodeId, expr: ExprId) -> Result<()> {
        if self.kconf.node(node).item != NodeItem::Menu {
            return Err(KconfigError::Construction(format!(
                "'visible if' is only valid for menus ({})",
                self.kconf.node(node).location
            )));
        }
        let vis = self.kconf.nodes[node.index()].visibility;
        self.kconf.nodes[node.index()].visibility = self.kconf.exprs.and(vis, expr);
        Ok(())
    }

    pub fn add_default(&mut self, node: NodeId, value: ExprId, cond: ExprId) {
        self.kconf.nodes[node.index()].defaults.push((value, cond));
    }

    pub fn add_select(&mut self, node: NodeId, target: SymbolId, cond: ExprId) -> Result<()> {
        self.check_symbol_node(node, "select")?;
        self.kconf.nodes[node.index()].selects.push((target, cond));
        Ok(())
    }

    pub fn add_imply(&mut self, node: NodeId, target: SymbolId, cond: ExprId) -> Result<()> {
        self.check_symbol_node(node, "imply")?;
        self.kconf.nodes[node.index()].implies.push((target, cond));
        Ok(())
    }

    pub fn add_range(&mut self, node: NodeId, low: SymbolId, high: SymbolId, cond: ExprId) {
        self.kconf.nodes[node.index()].ranges.push((low, high, cond));
    }

    pub fn set_mainmenu(&mut self, text: &str) {
        let top = self.kconf.top_node.index();
        self.kconf.nodes[top].prompt = Some((text.to_string(), self.kconf.exprs.y));
    }

    fn check_symbol_node(&self, node: NodeId, what: &str) -> Result<()> {
        match self.kconf.node(node).item {
            NodeItem::Symbol(_) => Ok(()),
            _ => Err(KconfigError::Construction(format!(
                "only symbols can {} ({})",
                what,
                self.kconf.node(node).location
            ))),
        }
    }

    pub fn y_expr(&self) -> ExprId {
        self.kconf.exprs.y
    }

    pub fn n_expr(&self) -> ExprId {
        self.kconf.exprs.n
    }

    /// Leaf expression for a symbol.
    pub fn sym_expr(&mut self, sym: SymbolId) -> ExprId {
        self.kconf.exprs.leaf(Item::Symbol(sym))
    }

    /// Leaf expression for the symbol called `name`, creating it if needed.
    pub fn named_expr(&mut self, name: &str) -> ExprId {
        let sym = self.lookup_sym(name);
        self.sym_expr(sym)
    }

    /// Leaf expression for a constant literal.
    pub fn const_expr(&mut self, value: &str) -> ExprId {
        let sym = self.lookup_const_sym(value);
        self.sym_expr(sym)
    }

    pub fn choice_expr(&mut self, choice: ChoiceId) -> ExprId {
        self.kconf.exprs.leaf(Item::Choice(choice))
    }

    pub fn not(&mut self, e: ExprId) -> ExprId {
        self.kconf.exprs.not(e)
    }

    pub fn and(&mut self, e1: ExprId, e2: ExprId) -> ExprId {
        self.kconf.exprs.and(e1, e2)
    }

    pub fn or(&mut self, e1: ExprId, e2: ExprId) -> ExprId {
        self.kconf.exprs.or(e1, e2)
    }

    pub fn relation(&mut self, op: RelOp, lhs: SymbolId, rhs: SymbolId) -> ExprId {
        self.kconf.exprs.relation(op, lhs, rhs)
    }

    /// Folds node properties, propagates dependencies, builds the dependency
    /// graph and rejects dependency loops.
    pub fn finalize(self) -> Result<Kconfig> {
        let mut kconf = self.kconf;
        kconf.finalize_tree()?;
        kconf.check_sanity()?;
        kconf.build_dep();
        kconf.check_dep_loops()?;
        kconf.add_choice_deps();
        log::debug!(
            "finalized model: {} symbols, {} choices, {} nodes, {} expressions",
            kconf.syms.len(),
            kconf.choices.len(),
            kconf.nodes.len(),
            kconf.exprs.len()
        );
        Ok(kconf)
    }
}

impl Kconfig {
    /// Short label for diagnostics about a node.
    pub(crate) fn node_label(&self, node: NodeId) -> String {
        let n = self.node(node);
        match n.item {
            NodeItem::Symbol(sym) => self.name_and_loc(Item::Symbol(sym)),
            NodeItem::Choice(choice) => self.name_and_loc(Item::Choice(choice)),
            NodeItem::Menu => format!("menu at {}", n.location),
            NodeItem::Comment => format!("comment at {}", n.location),
            NodeItem::If => format!("if at {}", n.location),
        }
    }
}
