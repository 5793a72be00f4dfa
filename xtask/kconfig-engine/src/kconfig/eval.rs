use crate::kconfig::expr::{Expr, ExprId, Item};
use crate::kconfig::model::Kconfig;
use crate::kconfig::symbol::SymbolId;
use crate::kconfig::types::{BoolValue, SymbolType, parse_int};
use std::cmp::Ordering;

impl Kconfig {
    /// Evaluates `e` to `n` or `y`.
    ///
    /// Leaves read the (possibly cached) bool value of the referenced symbol
    /// or choice. AND stops at the first `n`, OR at the first `y`.
    pub fn eval(&self, e: ExprId) -> BoolValue {
        match self.exprs.get(e) {
            Expr::Item(item) => self.item_bool_value(item),
            Expr::And(a, b) => match self.eval(a) {
                BoolValue::N => BoolValue::N,
                lhs => lhs.min(self.eval(b)),
            },
            Expr::Or(a, b) => match self.eval(a) {
                BoolValue::Y => BoolValue::Y,
                lhs => lhs.max(self.eval(b)),
            },
            Expr::Not(a) => self.eval(a).negate(),
            Expr::Rel(op, lhs, rhs) => BoolValue::from(op.holds(self.compare(lhs, rhs))),
        }
    }

    pub(crate) fn item_bool_value(&self, item: Item) -> BoolValue {
        match item {
            Item::Symbol(sym) => self.sym_bool_value(sym),
            Item::Choice(choice) => self.choice_bool_value(choice),
        }
    }

    /// Orders two relation operands. Two strings compare lexicographically;
    /// anything else is compared numerically when both sides parse, falling
    /// back on lexicographic order.
    fn compare(&self, lhs: SymbolId, rhs: SymbolId) -> Ordering {
        let lhs_type = self.syms[lhs.index()].orig_type;
        let rhs_type = self.syms[rhs.index()].orig_type;

        if lhs_type == SymbolType::String && rhs_type == SymbolType::String {
            return self.sym_str_value(lhs).cmp(&self.sym_str_value(rhs));
        }

        match (self.sym_to_num(lhs), self.sym_to_num(rhs)) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => self.sym_str_value(lhs).cmp(&self.sym_str_value(rhs)),
        }
    }

    fn sym_to_num(&self, sym: SymbolId) -> Option<i128> {
        let ty = self.syms[sym.index()].orig_type;
        if ty == SymbolType::Bool {
            return Some(i128::from(self.sym_bool_value(sym).as_u8()));
        }
        parse_int(&self.sym_str_value(sym), ty.radix())
    }
}
