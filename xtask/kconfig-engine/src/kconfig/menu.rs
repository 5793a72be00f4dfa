use crate::kconfig::choice::ChoiceId;
use crate::kconfig::expr::ExprId;
use crate::kconfig::model::Kconfig;
use crate::kconfig::symbol::SymbolId;
use std::fmt;
use std::path::PathBuf;

arena_id!(
    /// Handle to a menu node.
    NodeId
);

/// Definition site of a node, used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeItem {
    Symbol(SymbolId),
    Choice(ChoiceId),
    Menu,
    Comment,
    /// `if` block. Removed from the tree during finalization.
    If,
}

impl NodeItem {
    pub fn is_symbol_or_choice(self) -> bool {
        matches!(self, NodeItem::Symbol(_) | NodeItem::Choice(_))
    }
}

/// One definition occurrence in the menu tree.
///
/// The tree is stored as first-child (`list`) / next-sibling (`next`) links
/// with a `parent` back-link. Property lists hold the per-site values that
/// finalization folds onto the symbol or choice.
#[derive(Debug, Clone)]
pub struct MenuNode {
    pub item: NodeItem,
    pub parent: Option<NodeId>,
    pub next: Option<NodeId>,
    pub list: Option<NodeId>,
    pub location: Location,
    pub is_menuconfig: bool,
    pub dep: ExprId,
    /// `visible if` condition, only meaningful on menus.
    pub visibility: ExprId,
    pub prompt: Option<(String, ExprId)>,
    pub help: Option<String>,
    pub defaults: Vec<(ExprId, ExprId)>,
    pub selects: Vec<(SymbolId, ExprId)>,
    pub implies: Vec<(SymbolId, ExprId)>,
    pub ranges: Vec<(SymbolId, SymbolId, ExprId)>,
}

impl MenuNode {
    pub(crate) fn new(item: NodeItem, parent: Option<NodeId>, location: Location, y: ExprId) -> Self {
        Self {
            item,
            parent,
            next: None,
            list: None,
            location,
            is_menuconfig: false,
            dep: y,
            visibility: y,
            prompt: None,
            help: None,
            defaults: Vec::new(),
            selects: Vec::new(),
            implies: Vec::new(),
            ranges: Vec::new(),
        }
    }
}

/// Pre-order walk over the menu tree. See [`Kconfig::node_iter`].
pub struct NodeIter<'a> {
    kconf: &'a Kconfig,
    cur: Option<NodeId>,
    seen: Option<Vec<bool>>,
}

impl Iterator for NodeIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let node = self.kconf.advance(self.cur?);
            self.cur = node;
            let node = node?;

            if let (Some(seen), NodeItem::Symbol(sym)) = (&mut self.seen, self.kconf.node(node).item) {
                if seen[sym.index()] {
                    continue;
                }
                seen[sym.index()] = true;
            }
            return Some(node);
        }
    }
}

impl Kconfig {
    pub fn node(&self, id: NodeId) -> &MenuNode {
        &self.nodes[id.index()]
    }

    pub fn top_node(&self) -> NodeId {
        self.top_node
    }

    pub fn mainmenu_text(&self) -> &str {
        self.node(self.top_node)
            .prompt
            .as_ref()
            .map_or("Main menu", |(text, _)| text.as_str())
    }

    /// Children of `id`, in order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut res = Vec::new();
        let mut cur = self.node(id).list;
        while let Some(c) = cur {
            res.push(c);
            cur = self.node(c).next;
        }
        res
    }

    /// Walks every node in definition order (parents before children,
    /// children before the next sibling), skipping the top node. With
    /// `unique_syms`, only the first node of each symbol is produced.
    pub fn node_iter(&self, unique_syms: bool) -> NodeIter<'_> {
        NodeIter {
            kconf: self,
            cur: Some(self.top_node),
            seen: unique_syms.then(|| vec![false; self.syms.len()]),
        }
    }

    /// Next node in pre-order after `node`, or `None` at the end.
    pub(crate) fn advance(&self, node: NodeId) -> Option<NodeId> {
        let n = self.node(node);
        if let Some(list) = n.list {
            return Some(list);
        }
        if let Some(next) = n.next {
            return Some(next);
        }
        let mut cur = node;
        while let Some(parent) = self.node(cur).parent {
            cur = parent;
            if let Some(next) = self.node(cur).next {
                return Some(next);
            }
        }
        None
    }
}
