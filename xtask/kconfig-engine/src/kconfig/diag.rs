use crate::kconfig::menu::Location;
use std::cell::{Ref, RefCell};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

/// A soft problem found while building or evaluating a configuration.
/// Diagnostics never change control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: Option<Location>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        match &self.location {
            Some(loc) => write!(f, "{}: {}: {}", loc, kind, self.message),
            None => write!(f, "{}: {}", kind, self.message),
        }
    }
}

/// Ordered diagnostic list. Interior mutability lets lazy value
/// computations record warnings through a shared reference.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    entries: RefCell<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub(crate) fn push(&self, diag: Diagnostic, echo: bool) {
        if echo {
            match diag.severity {
                Severity::Info => log::info!("{}", diag),
                Severity::Warning => log::warn!("{}", diag),
            }
        }
        self.entries.borrow_mut().push(diag);
    }

    pub(crate) fn entries(&self) -> Ref<'_, Vec<Diagnostic>> {
        self.entries.borrow()
    }

    pub(crate) fn take(&self) -> Vec<Diagnostic> {
        self.entries.take()
    }
}
