/// Declares a copyable arena handle.
macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub(crate) fn new(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

mod check;
pub mod choice;
mod deps;
pub mod diag;
mod eval;
pub mod expr;
mod finalize;
pub mod menu;
pub mod model;
pub mod symbol;
pub mod types;

pub use choice::{Choice, ChoiceId};
pub use diag::{Diagnostic, Severity};
pub use expr::{BinOp, Expr, ExprId, Item, RelOp};
pub use menu::{Location, MenuNode, NodeId, NodeItem};
pub use model::{Kconfig, KconfigBuilder};
pub use symbol::{Symbol, SymbolId, UserValue};
pub use types::{BoolValue, SymbolType};
