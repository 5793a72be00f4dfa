use crate::kconfig::choice::ChoiceId;
use crate::kconfig::model::Kconfig;
use crate::kconfig::symbol::SymbolId;
use crate::kconfig::types::escape;
use std::cmp::Ordering;
use std::collections::HashMap;

arena_id!(
    /// Handle to an immutable expression stored in the model's expression arena.
    ExprId
);

/// Anything that has a value and can appear as an expression leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Item {
    Symbol(SymbolId),
    Choice(ChoiceId),
}

impl From<SymbolId> for Item {
    fn from(id: SymbolId) -> Self {
        Item::Symbol(id)
    }
}

impl From<ChoiceId> for Item {
    fn from(id: ChoiceId) -> Self {
        Item::Choice(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    pub fn as_str(self) -> &'static str {
        match self {
            RelOp::Eq => "=",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }

    /// Whether a comparison outcome satisfies this operator.
    pub fn holds(self, ord: Ordering) -> bool {
        match self {
            RelOp::Eq => ord == Ordering::Equal,
            RelOp::Ne => ord != Ordering::Equal,
            RelOp::Lt => ord == Ordering::Less,
            RelOp::Le => ord != Ordering::Greater,
            RelOp::Gt => ord == Ordering::Greater,
            RelOp::Ge => ord != Ordering::Less,
        }
    }
}

/// Operator selector for [`Kconfig::split_expr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expr {
    Item(Item),
    Not(ExprId),
    And(ExprId, ExprId),
    Or(ExprId, ExprId),
    Rel(RelOp, SymbolId, SymbolId),
}

/// Append-only expression storage. Leaves are interned, so the leaf for a
/// given item always has the same handle and `y`/`n` can be recognized by
/// handle comparison.
#[derive(Debug)]
pub(crate) struct ExprArena {
    nodes: Vec<Expr>,
    leaves: HashMap<Item, ExprId>,
    pub(crate) y: ExprId,
    pub(crate) n: ExprId,
}

impl ExprArena {
    pub(crate) fn new(y: SymbolId, n: SymbolId) -> Self {
        let mut arena = Self {
            nodes: Vec::new(),
            leaves: HashMap::new(),
            y: ExprId(0),
            n: ExprId(0),
        };
        arena.y = arena.leaf(Item::Symbol(y));
        arena.n = arena.leaf(Item::Symbol(n));
        arena
    }

    pub(crate) fn get(&self, id: ExprId) -> Expr {
        self.nodes[id.index()]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    fn push(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(self.nodes.len());
        self.nodes.push(expr);
        id
    }

    pub(crate) fn leaf(&mut self, item: Item) -> ExprId {
        if let Some(&id) = self.leaves.get(&item) {
            return id;
        }
        let id = self.push(Expr::Item(item));
        self.leaves.insert(item, id);
        id
    }

    pub(crate) fn not(&mut self, e: ExprId) -> ExprId {
        self.push(Expr::Not(e))
    }

    pub(crate) fn and(&mut self, e1: ExprId, e2: ExprId) -> ExprId {
        if e1 == self.y {
            return e2;
        }
        if e2 == self.y {
            return e1;
        }
        if e1 == self.n || e2 == self.n {
            return self.n;
        }
        self.push(Expr::And(e1, e2))
    }

    pub(crate) fn or(&mut self, e1: ExprId, e2: ExprId) -> ExprId {
        if e1 == self.n {
            return e2;
        }
        if e2 == self.n {
            return e1;
        }
        if e1 == self.y || e2 == self.y {
            return self.y;
        }
        self.push(Expr::Or(e1, e2))
    }

    pub(crate) fn relation(&mut self, op: RelOp, lhs: SymbolId, rhs: SymbolId) -> ExprId {
        self.push(Expr::Rel(op, lhs, rhs))
    }

    pub(crate) fn as_item(&self, e: ExprId) -> Option<Item> {
        match self.get(e) {
            Expr::Item(item) => Some(item),
            _ => None,
        }
    }

    pub(crate) fn as_symbol(&self, e: ExprId) -> Option<SymbolId> {
        match self.as_item(e) {
            Some(Item::Symbol(sym)) => Some(sym),
            _ => None,
        }
    }

    /// Calls `f` for every item leaf and relation operand in `e`.
    pub(crate) fn for_each_item(&self, e: ExprId, mut f: impl FnMut(Item)) {
        let mut stack = vec![e];
        while let Some(e) = stack.pop() {
            match self.get(e) {
                Expr::Item(item) => f(item),
                Expr::Not(a) => stack.push(a),
                Expr::And(a, b) | Expr::Or(a, b) => {
                    // Right first so items come out left to right
                    stack.push(b);
                    stack.push(a);
                }
                Expr::Rel(_, lhs, rhs) => {
                    f(Item::Symbol(lhs));
                    f(Item::Symbol(rhs));
                }
            }
        }
    }
}

impl Kconfig {
    pub fn expr(&self, e: ExprId) -> Expr {
        self.exprs.get(e)
    }

    pub fn y_expr(&self) -> ExprId {
        self.exprs.y
    }

    pub fn n_expr(&self) -> ExprId {
        self.exprs.n
    }

    /// Items appearing in `e`, in order of first appearance.
    pub fn expr_items(&self, e: ExprId) -> Vec<Item> {
        let mut items = Vec::new();
        self.exprs.for_each_item(e, |item| {
            if !items.contains(&item) {
                items.push(item);
            }
        });
        items
    }

    /// Top-level operands of `op` in `e`, left to right.
    ///
    /// `A || (B && C) || D` split on [`BinOp::Or`] gives `[A, B && C, D]`;
    /// an expression whose root is not `op` comes back as a single element.
    pub fn split_expr(&self, e: ExprId, op: BinOp) -> Vec<ExprId> {
        let mut res = Vec::new();
        let mut stack = vec![e];
        while let Some(e) = stack.pop() {
            match (self.exprs.get(e), op) {
                (Expr::And(a, b), BinOp::And) | (Expr::Or(a, b), BinOp::Or) => {
                    stack.push(b);
                    stack.push(a);
                }
                _ => res.push(e),
            }
        }
        res
    }

    /// Renders `e` in Kconfig syntax.
    pub fn expr_str(&self, e: ExprId) -> String {
        match self.exprs.get(e) {
            Expr::Item(item) => self.item_expr_str(item),
            Expr::And(a, b) => format!(
                "{} && {}",
                self.parenthesize(a, BinOp::Or),
                self.parenthesize(b, BinOp::Or)
            ),
            // A && B || C && D renders as (A && B) || (C && D)
            Expr::Or(a, b) => format!(
                "{} || {}",
                self.parenthesize(a, BinOp::And),
                self.parenthesize(b, BinOp::And)
            ),
            Expr::Not(a) => match self.exprs.get(a) {
                Expr::Item(item) => format!("!{}", self.item_expr_str(item)),
                _ => format!("!({})", self.expr_str(a)),
            },
            Expr::Rel(op, lhs, rhs) => format!(
                "{} {} {}",
                self.item_expr_str(Item::Symbol(lhs)),
                op.as_str(),
                self.item_expr_str(Item::Symbol(rhs))
            ),
        }
    }

    fn parenthesize(&self, e: ExprId, op: BinOp) -> String {
        match (self.exprs.get(e), op) {
            (Expr::And(..), BinOp::And) | (Expr::Or(..), BinOp::Or) => {
                format!("({})", self.expr_str(e))
            }
            _ => self.expr_str(e),
        }
    }

    pub(crate) fn item_expr_str(&self, item: Item) -> String {
        match item {
            Item::Symbol(id) => {
                let sym = &self.syms[id.index()];
                if sym.is_constant && id != self.y && id != self.n {
                    format!("\"{}\"", escape(&sym.name))
                } else {
                    sym.name.clone()
                }
            }
            Item::Choice(id) => match &self.choices[id.index()].name {
                Some(name) => format!("<choice {}>", name),
                None => "<choice>".to_string(),
            },
        }
    }

    /// True if `e` is satisfied whenever `sym` is: `sym`, `sym = y`, `sym != n`
    /// (either operand order), or an AND containing one of those.
    pub(crate) fn expr_depends_on(&self, e: ExprId, sym: SymbolId) -> bool {
        match self.exprs.get(e) {
            Expr::Item(item) => item == Item::Symbol(sym),
            Expr::Rel(op @ (RelOp::Eq | RelOp::Ne), lhs, rhs) => {
                let other = if lhs == sym {
                    rhs
                } else if rhs == sym {
                    lhs
                } else {
                    return false;
                };
                (op == RelOp::Eq && other == self.y) || (op == RelOp::Ne && other == self.n)
            }
            Expr::And(a, b) => self.expr_depends_on(a, sym) || self.expr_depends_on(b, sym),
            _ => false,
        }
    }
}
