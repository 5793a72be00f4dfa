use crate::config::ConfigChanges;
use crate::error::{KconfigError, Result};
use crate::kconfig::types::unescape;
use crate::kconfig::{Item, Kconfig, Location, SymbolId, SymbolType, UserValue};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;

lazy_static! {
    static ref STRING_LITERAL_RE: Regex = Regex::new(r#"^"((?:[^\\"]|\\.)*)"$"#).unwrap();
}

/// Right-hand side of a `.config` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignedValue {
    /// `PREFIXNAME=value`, with the value as written (quotes included).
    Value(String),
    /// `# PREFIXNAME is not set`
    NotSet,
}

/// One symbol assignment, from a `.config` file or built by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: AssignedValue,
    pub location: Option<Location>,
}

impl Assignment {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AssignedValue::Value(value.into()),
            location: None,
        }
    }

    pub fn not_set(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AssignedValue::NotSet,
            location: None,
        }
    }
}

/// Line parser for the `.config` format with a given symbol prefix.
pub struct ConfigReader {
    set_re: Regex,
    unset_re: Regex,
}

impl ConfigReader {
    pub fn new(prefix: &str) -> Result<Self> {
        let prefix = regex::escape(prefix);
        Ok(Self {
            set_re: Regex::new(&format!("^{}([^=]+)=(.*)$", prefix))?,
            unset_re: Regex::new(&format!("^# {}([^ ]+) is not set$", prefix))?,
        })
    }

    /// Parses one line. Blank lines and comments give `Ok(None)`, anything
    /// else that is not an assignment is an error.
    pub fn parse_line(&self, line: &str) -> Result<Option<(String, AssignedValue)>> {
        // Trailing whitespace is not significant
        let line = line.trim_end();

        if let Some(caps) = self.set_re.captures(line) {
            return Ok(Some((
                caps[1].to_string(),
                AssignedValue::Value(caps[2].to_string()),
            )));
        }
        if let Some(caps) = self.unset_re.captures(line) {
            return Ok(Some((caps[1].to_string(), AssignedValue::NotSet)));
        }
        if line.is_empty() || line.trim_start().starts_with('#') {
            return Ok(None);
        }
        Err(KconfigError::Config(format!("ignoring malformed line '{}'", line)))
    }

    /// Parses `.config` text. Malformed lines are returned separately with
    /// their location so that loading can go on without them.
    pub fn parse(&self, text: &str, filename: &Path) -> (Vec<Assignment>, Vec<(Location, String)>) {
        let mut assignments = Vec::new();
        let mut malformed = Vec::new();

        for (i, line) in text.lines().enumerate() {
            let location = Location::new(filename, i + 1);
            match self.parse_line(line) {
                Ok(Some((name, value))) => assignments.push(Assignment {
                    name,
                    value,
                    location: Some(location),
                }),
                Ok(None) => {}
                Err(KconfigError::Config(msg)) => malformed.push((location, msg)),
                Err(e) => malformed.push((location, e.to_string())),
            }
        }
        (assignments, malformed)
    }
}

impl Kconfig {
    /// Loads a `.config` file. See [`Kconfig::load`].
    pub fn load_config(&mut self, path: impl AsRef<Path>, replace: bool) -> Result<ConfigChanges> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| KconfigError::File {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_config_str(&text, path, replace)
    }

    /// Loads `.config` text attributed to `filename`. Malformed lines are
    /// diagnosed and skipped.
    pub fn load_config_str(
        &mut self,
        text: &str,
        filename: impl AsRef<Path>,
        replace: bool,
    ) -> Result<ConfigChanges> {
        let filename = filename.as_ref();
        let reader = ConfigReader::new(&self.settings.config_prefix)?;
        let (assignments, malformed) = reader.parse(text, filename);
        for (location, msg) in malformed {
            self.warn_at(msg, location);
        }

        let mut changes = self.load(assignments, replace);
        changes.source = format!("configuration '{}'", filename.display());
        log::debug!("{}", changes.message());
        Ok(changes)
    }

    /// Applies `assignments` in order, as if each was passed to `set_value`.
    /// Symbols without a prompt take the value too, bounded by their direct
    /// dependencies, but are not reported as new when left unassigned.
    ///
    /// With `replace`, user values not assigned here are removed afterwards
    /// and the missing symbol list starts over; otherwise the assignments are
    /// merged into the current user values.
    pub fn load(
        &mut self,
        assignments: impl IntoIterator<Item = Assignment>,
        replace: bool,
    ) -> ConfigChanges {
        if replace {
            self.missing_syms.clear();
        }
        for &sym in &self.unique_defined_syms {
            self.syms[sym.index()].was_set = false;
        }
        for &choice in &self.unique_choices {
            self.choices[choice.index()].was_set = false;
        }

        let mut missing_names = Vec::new();
        for assignment in assignments {
            if let Some(name) = self.apply_assignment(assignment) {
                missing_names.push(name);
            }
        }

        let mut new_symbols = Vec::new();
        for i in 0..self.unique_defined_syms.len() {
            let sym = self.unique_defined_syms[i];
            if self.sym(sym).was_set {
                continue;
            }
            if replace {
                self.unset_value(sym);
            }
            if self.has_prompt(sym) {
                new_symbols.push(self.sym(sym).name.clone());
            }
        }
        if replace {
            for i in 0..self.unique_choices.len() {
                let choice = self.unique_choices[i];
                if !self.choice(choice).was_set {
                    self.unset_value(choice);
                }
            }
        }

        ConfigChanges {
            source: "assignments".to_string(),
            replaced: replace,
            new_symbols,
            missing_symbols: missing_names,
        }
    }

    /// Applies one assignment. Returns the name if the symbol is undefined.
    fn apply_assignment(&mut self, assignment: Assignment) -> Option<String> {
        let Assignment {
            name,
            value,
            location,
        } = assignment;
        let warn = |kconf: &Self, msg: String| match &location {
            Some(loc) => kconf.warn_at(msg, loc.clone()),
            None => kconf.warn(msg),
        };

        let sym = match self.sym_id(&name) {
            Some(sym) if self.sym(sym).is_defined() => sym,
            _ => {
                let raw = match &value {
                    AssignedValue::Value(v) => v.clone(),
                    AssignedValue::NotSet => "n".to_string(),
                };
                if self.settings.warn_assign_undef {
                    warn(
                        self,
                        format!("attempt to assign the value '{}' to the undefined symbol {}", raw, name),
                    );
                }
                self.missing_syms.push((name.clone(), raw));
                return Some(name);
            }
        };

        let ty = self.sym(sym).orig_type;
        let val = match value {
            AssignedValue::NotSet if ty != SymbolType::Bool => return None,
            AssignedValue::NotSet => "n".to_string(),
            AssignedValue::Value(raw) => match ty {
                SymbolType::Bool => {
                    // Only the first character counts
                    let Some(first) = raw.chars().next().filter(|c| matches!(c, 'y' | 'n')) else {
                        warn(
                            self,
                            format!(
                                "'{}' is not a valid value for the {} symbol {}. Assignment ignored.",
                                raw,
                                ty,
                                self.name_and_loc(Item::Symbol(sym))
                            ),
                        );
                        return None;
                    };
                    first.to_string()
                }
                SymbolType::String => match STRING_LITERAL_RE.captures(&raw) {
                    Some(caps) => unescape(&caps[1]),
                    None => {
                        warn(
                            self,
                            format!(
                                "malformed string literal in assignment to {}. Assignment ignored.",
                                self.name_and_loc(Item::Symbol(sym))
                            ),
                        );
                        return None;
                    }
                },
                _ => raw,
            },
        };

        // A y member puts the choice in y mode
        if let (Some(choice), "y") = (self.sym(sym).choice, val.as_str()) {
            self.set_value(choice, "y");
        }

        if self.sym(sym).was_set {
            self.warn_assigned_twice(sym, &val, &warn);
        }
        // .config files routinely list promptless symbols, so no warning here
        self.sym_set_value(sym, &val, false);
        None
    }

    fn warn_assigned_twice(
        &self,
        sym: SymbolId,
        new_val: &str,
        warn: &impl Fn(&Self, String),
    ) {
        let old_val = match &self.sym(sym).user_value {
            Some(UserValue::Bool(b)) => b.as_str().to_string(),
            Some(UserValue::Str(s)) => s.clone(),
            None => String::new(),
        };
        let msg = format!(
            "{} set more than once. Old value \"{}\", new value \"{}\".",
            self.name_and_loc(Item::Symbol(sym)),
            old_val,
            new_val
        );
        let enabled = if old_val == new_val {
            self.settings.warn_assign_redun
        } else {
            self.settings.warn_assign_override
        };
        if enabled {
            warn(self, msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_forms() {
        let reader = ConfigReader::new("CONFIG_").unwrap();
        assert_eq!(
            reader.parse_line("CONFIG_FOO=y  ").unwrap(),
            Some(("FOO".to_string(), AssignedValue::Value("y".to_string())))
        );
        assert_eq!(
            reader.parse_line("# CONFIG_BAR is not set").unwrap(),
            Some(("BAR".to_string(), AssignedValue::NotSet))
        );
        assert_eq!(reader.parse_line("# just a comment").unwrap(), None);
        assert_eq!(reader.parse_line("").unwrap(), None);
        assert!(reader.parse_line("FOO=y").is_err());
    }

    #[test]
    fn test_prefix_is_literal() {
        let reader = ConfigReader::new("A.").unwrap();
        assert!(reader.parse_line("A.X=1").unwrap().is_some());
        assert!(reader.parse_line("AbX=1").is_err());
    }

    #[test]
    fn test_string_literal_pattern() {
        assert!(STRING_LITERAL_RE.is_match(r#""a \"quoted\" word""#));
        assert!(!STRING_LITERAL_RE.is_match(r#""unterminated"#));
    }
}
