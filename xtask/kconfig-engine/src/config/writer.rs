use crate::error::{KconfigError, Result};
use crate::kconfig::types::escape;
use crate::kconfig::{BoolValue, Kconfig, NodeId, NodeItem, SymbolId, SymbolType};
use std::fs;
use std::path::Path;

impl Kconfig {
    /// The `.config` line for `sym`, or an empty string if the symbol is not
    /// written out. Visible bools that are off give `# PREFIXNAME is not set`.
    pub fn config_string(&self, sym: SymbolId) -> String {
        let val = self.str_value(sym);
        if !self.write_to_conf(sym) {
            return String::new();
        }

        let s = self.sym(sym);
        let prefix = &self.settings.config_prefix;
        match s.orig_type {
            SymbolType::Bool if val == "n" => format!("# {}{} is not set\n", prefix, s.name),
            SymbolType::Bool | SymbolType::Int | SymbolType::Hex => {
                format!("{}{}={}\n", prefix, s.name, val)
            }
            SymbolType::String => format!("{}{}=\"{}\"\n", prefix, s.name, escape(&val)),
            SymbolType::Unknown => String::new(),
        }
    }
}

/// `.config` and minimal configuration output.
pub struct ConfigWriter;

impl ConfigWriter {
    /// Full `.config` contents in menu order. Each symbol is written at its
    /// first definition; visible menus and comments get banner comments.
    pub fn contents(kconf: &Kconfig, header: Option<&str>) -> String {
        let mut out = header.unwrap_or(&kconf.settings.config_header).to_string();
        let mut seen = vec![false; kconf.syms.len()];
        let mut after_end_comment = false;
        let top = kconf.top_node();

        let mut node = top;
        loop {
            let n = kconf.node(node);
            if let Some(list) = n.list {
                node = list;
            } else if let Some(next) = n.next {
                node = next;
            } else {
                let mut next = None;
                let mut cur = node;
                while let Some(parent) = kconf.node(cur).parent {
                    cur = parent;
                    let p = kconf.node(cur);
                    // Leaving a visible menu
                    if p.item == NodeItem::Menu
                        && cur != top
                        && kconf.eval(p.dep).is_y()
                        && kconf.eval(p.visibility).is_y()
                    {
                        out.push_str(&format!("# end of {}\n", prompt_text(kconf, cur)));
                        after_end_comment = true;
                    }
                    if let Some(n) = p.next {
                        next = Some(n);
                        break;
                    }
                }
                match next {
                    Some(n) => node = n,
                    None => return out,
                }
            }

            let n = kconf.node(node);
            match n.item {
                NodeItem::Symbol(sym) => {
                    if std::mem::replace(&mut seen[sym.index()], true) {
                        continue;
                    }
                    let line = kconf.config_string(sym);
                    if line.is_empty() {
                        continue;
                    }
                    if after_end_comment {
                        after_end_comment = false;
                        out.push('\n');
                    }
                    out.push_str(&line);
                }
                NodeItem::Menu | NodeItem::Comment if kconf.eval(n.dep).is_y() => {
                    if n.item == NodeItem::Comment || kconf.eval(n.visibility).is_y() {
                        out.push_str(&format!("\n#\n# {}\n#\n", prompt_text(kconf, node)));
                        after_end_comment = false;
                    }
                }
                _ => {}
            }
        }
    }

    /// Writes the full configuration to `path` unless it already has these
    /// exact contents. With `save_old`, an existing file is first moved to
    /// `<path>.old`.
    pub fn write(
        kconf: &Kconfig,
        path: impl AsRef<Path>,
        header: Option<&str>,
        save_old: bool,
    ) -> Result<String> {
        let path = path.as_ref();
        let contents = Self::contents(kconf, header);
        if contents_eq(path, &contents) {
            return Ok(format!("No change to configuration in '{}'", path.display()));
        }
        if save_old {
            save_old_file(path);
        }
        write_file(path, &contents)?;
        log::info!("configuration saved to {}", path.display());
        Ok(format!("Configuration saved to '{}'", path.display()))
    }

    /// Configuration with every value that defaults would produce anyway
    /// left out. Loading it on top of the defaults gives the same values.
    pub fn min_contents(kconf: &Kconfig, header: Option<&str>) -> String {
        let mut out = header.unwrap_or(&kconf.settings.config_header).to_string();

        for &sym in kconf.unique_defined_syms() {
            let s = kconf.sym(sym);
            // Selects do not affect choice symbols
            if s.choice.is_none() && kconf.visibility(sym) <= kconf.eval(s.rev_dep) {
                continue;
            }
            if kconf.str_value(sym) == kconf.str_default(sym) {
                continue;
            }
            if let Some(choice) = s.choice {
                if s.orig_type == SymbolType::Bool
                    && kconf.bool_value(sym) == BoolValue::Y
                    && kconf.selection_from_defaults(choice) == Some(sym)
                {
                    continue;
                }
            }
            out.push_str(&kconf.config_string(sym));
        }
        out
    }

    pub fn write_min(kconf: &Kconfig, path: impl AsRef<Path>, header: Option<&str>) -> Result<String> {
        let path = path.as_ref();
        if write_if_changed(path, &Self::min_contents(kconf, header))? {
            Ok(format!("Minimal configuration saved to '{}'", path.display()))
        } else {
            Ok(format!("No change to minimal configuration in '{}'", path.display()))
        }
    }
}

fn prompt_text(kconf: &Kconfig, node: NodeId) -> &str {
    kconf
        .node(node)
        .prompt
        .as_ref()
        .map_or("", |(text, _)| text.as_str())
}

/// True if `path` holds exactly `contents`. Unreadable files compare unequal.
pub(crate) fn contents_eq(path: &Path, contents: &str) -> bool {
    fs::read_to_string(path).is_ok_and(|current| current == contents)
}

pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| KconfigError::File {
        path: path.to_path_buf(),
        source,
    })
}

/// Returns whether the file was written.
pub(crate) fn write_if_changed(path: &Path, contents: &str) -> Result<bool> {
    if contents_eq(path, contents) {
        return Ok(false);
    }
    write_file(path, contents)?;
    Ok(true)
}

/// Moves `path` to `path.old`. Symlinks are copied so the link survives.
/// Failures are not fatal, the backup is best effort.
fn save_old_file(path: &Path) {
    let mut old = path.as_os_str().to_owned();
    old.push(".old");

    let is_link = fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink());
    let res = if is_link {
        fs::copy(path, &old).map(|_| ())
    } else {
        fs::rename(path, &old)
    };
    if let Err(e) = res {
        log::debug!("no backup of {}: {}", path.display(), e);
    }
}
