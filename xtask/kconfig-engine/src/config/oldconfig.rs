use std::fmt::Write;

/// What a configuration load found beyond plain assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigChanges {
    /// Where the assignments came from, e.g. `configuration '.config'`.
    pub source: String,
    /// Whether the load replaced the previous user values or merged into them.
    pub replaced: bool,
    /// Prompted symbols the load did not assign.
    pub new_symbols: Vec<String>,
    /// Assigned names with no definition in the model.
    pub missing_symbols: Vec<String>,
}

impl ConfigChanges {
    pub fn has_changes(&self) -> bool {
        !self.new_symbols.is_empty() || !self.missing_symbols.is_empty()
    }

    /// `Loaded configuration '...'` or `Merged configuration '...'`.
    pub fn message(&self) -> String {
        let verb = if self.replaced { "Loaded" } else { "Merged" };
        format!("{} {}", verb, self.source)
    }

    /// Multi-line report of new and missing options, empty if there are none.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        if !self.new_symbols.is_empty() {
            out.push_str("New configuration options:\n");
            for name in &self.new_symbols {
                let _ = writeln!(out, "  + {}", name);
            }
        }
        if !self.missing_symbols.is_empty() {
            out.push_str("Removed configuration options (ignored):\n");
            for name in &self.missing_symbols {
                let _ = writeln!(out, "  - {}", name);
            }
        }
        out
    }
}
