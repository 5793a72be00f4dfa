use crate::config::writer::write_if_changed;
use crate::error::Result;
use crate::kconfig::types::{escape, parse_int};
use crate::kconfig::{Kconfig, SymbolType};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::path::Path;

/// ConfigGenerator produces build system inputs from a resolved model.
///
/// Only symbols that would be written to `.config` are emitted. Bools that
/// are `n` are left out of the C header entirely.
pub struct ConfigGenerator;

impl ConfigGenerator {
    /// C header with one `#define` per enabled or valued symbol, in
    /// definition order.
    pub fn autoconf_contents(kconf: &Kconfig, header: Option<&str>) -> String {
        let mut out = header.unwrap_or(&kconf.settings().header_header).to_string();
        let prefix = &kconf.settings().config_prefix;

        for &sym in kconf.unique_defined_syms() {
            let val = kconf.str_value(sym);
            if !kconf.write_to_conf(sym) {
                continue;
            }
            let name = &kconf.sym(sym).name;
            match kconf.sym(sym).orig_type {
                SymbolType::Bool if val == "y" => {
                    out.push_str(&format!("#define {}{} 1\n", prefix, name));
                }
                SymbolType::String => {
                    out.push_str(&format!("#define {}{} \"{}\"\n", prefix, name, escape(&val)));
                }
                SymbolType::Int => out.push_str(&format!("#define {}{} {}\n", prefix, name, val)),
                SymbolType::Hex => {
                    let val = if val.starts_with("0x") || val.starts_with("0X") {
                        val
                    } else {
                        format!("0x{}", val)
                    };
                    out.push_str(&format!("#define {}{} {}\n", prefix, name, val));
                }
                _ => {}
            }
        }
        out
    }

    pub fn write_autoconf(kconf: &Kconfig, path: impl AsRef<Path>, header: Option<&str>) -> Result<String> {
        let path = path.as_ref();
        if write_if_changed(path, &Self::autoconf_contents(kconf, header))? {
            Ok(format!("Kconfig header saved to '{}'", path.display()))
        } else {
            Ok(format!("No change to Kconfig header in '{}'", path.display()))
        }
    }

    /// Symbol values keyed by name (without prefix): bools as JSON booleans,
    /// int and hex as numbers, strings as strings.
    pub fn json_values(kconf: &Kconfig) -> Map<String, Value> {
        let mut values = Map::new();

        for &sym in kconf.unique_defined_syms() {
            if kconf.config_string(sym).is_empty() {
                continue;
            }

            let s = kconf.sym(sym);
            let val = kconf.str_value(sym);
            let json = match s.orig_type {
                SymbolType::Int | SymbolType::Hex if val.is_empty() => {
                    kconf.warn(format!(
                        "{} has no value set in the configuration. This can be caused e.g. \
                         by a missing default value.",
                        s.name
                    ));
                    Value::Null
                }
                SymbolType::Bool => Value::Bool(val != "n"),
                SymbolType::Int | SymbolType::Hex => parse_int(&val, s.orig_type.radix())
                    .and_then(json_number)
                    .map_or(Value::Null, Value::Number),
                _ => Value::String(val),
            };
            values.insert(s.name.clone(), json);
        }
        values
    }

    /// [`ConfigGenerator::json_values`] as sorted JSON with four-space
    /// indentation.
    pub fn json_contents(kconf: &Kconfig) -> Result<String> {
        let values = Self::json_values(kconf);
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        values.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn write_json(kconf: &Kconfig, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        if write_if_changed(path, &Self::json_contents(kconf)?)? {
            Ok(format!("JSON configuration saved to '{}'", path.display()))
        } else {
            Ok(format!("No change to JSON configuration in '{}'", path.display()))
        }
    }
}

fn json_number(value: i128) -> Option<Number> {
    i64::try_from(value)
        .map(Number::from)
        .or_else(|_| u64::try_from(value).map(Number::from))
        .ok()
}
