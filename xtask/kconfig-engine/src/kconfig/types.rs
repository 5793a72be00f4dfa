use crate::error::{KconfigError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SymbolType {
    #[default]
    Unknown,
    Bool,
    String,
    Int,
    Hex,
}

impl SymbolType {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolType::Unknown => "unknown",
            SymbolType::Bool => "bool",
            SymbolType::String => "string",
            SymbolType::Int => "int",
            SymbolType::Hex => "hex",
        }
    }

    pub fn is_int_hex(self) -> bool {
        matches!(self, SymbolType::Int | SymbolType::Hex)
    }

    /// Radix used when the value of a symbol of this type is read as a number.
    /// Zero means "detect from the prefix".
    pub(crate) fn radix(self) -> u32 {
        match self {
            SymbolType::Hex => 16,
            SymbolType::Int => 10,
            _ => 0,
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating anything in a boolean context.
///
/// Values keep the historical 0/2 encoding (`n`/`y`) so that min/max
/// arithmetic over expressions matches the `.config` semantics. The middle
/// value of the old tristate scheme cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BoolValue {
    #[default]
    N = 0,
    Y = 2,
}

impl BoolValue {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BoolValue::N => "n",
            BoolValue::Y => "y",
        }
    }

    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "n" => Some(BoolValue::N),
            "y" => Some(BoolValue::Y),
            _ => None,
        }
    }

    pub fn is_y(self) -> bool {
        self == BoolValue::Y
    }

    pub fn negate(self) -> Self {
        match self {
            BoolValue::N => BoolValue::Y,
            BoolValue::Y => BoolValue::N,
        }
    }
}

impl From<bool> for BoolValue {
    fn from(b: bool) -> Self {
        if b { BoolValue::Y } else { BoolValue::N }
    }
}

impl TryFrom<u8> for BoolValue {
    type Error = KconfigError;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(BoolValue::N),
            2 => Ok(BoolValue::Y),
            other => Err(KconfigError::InvalidBoolValue(other)),
        }
    }
}

impl fmt::Display for BoolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses `s` as an integer the way `.config` values are read: surrounding
/// whitespace and a sign are accepted, radix 16 allows an optional `0x`,
/// radix 0 picks the radix from a `0x`/`0o`/`0b` prefix.
pub fn parse_int(s: &str, radix: u32) -> Option<i128> {
    let s = s.trim();
    let (negative, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let lower = body.to_ascii_lowercase();
    let (radix, digits) = match radix {
        0 => {
            if let Some(rest) = lower.strip_prefix("0x") {
                (16, rest)
            } else if let Some(rest) = lower.strip_prefix("0o") {
                (8, rest)
            } else if let Some(rest) = lower.strip_prefix("0b") {
                (2, rest)
            } else {
                // Leading zeros are ambiguous without a prefix
                if lower.len() > 1 && lower.starts_with('0') && lower.bytes().any(|b| b != b'0') {
                    return None;
                }
                (10, lower.as_str())
            }
        }
        16 => (16, lower.strip_prefix("0x").unwrap_or(&lower)),
        r => (r, lower.as_str()),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let value = i128::from_str_radix(digits, radix).ok()?;
    Some(if negative { -value } else { value })
}

pub fn is_base_n(s: &str, radix: u32) -> bool {
    parse_int(s, radix).is_some()
}

/// Canonical textual form of a clamped number for a symbol of type `ty`.
pub(crate) fn format_num(value: i128, ty: SymbolType) -> String {
    if ty == SymbolType::Hex {
        if value < 0 {
            format!("-0x{:x}", value.unsigned_abs())
        } else {
            format!("0x{:x}", value)
        }
    } else {
        value.to_string()
    }
}

lazy_static! {
    static ref UNESCAPE_RE: Regex = Regex::new(r"\\(.)").unwrap();
}

/// Escapes `"` and `\` for `.config` string literals.
pub fn escape(s: &str) -> String {
    // Backslashes first so the added ones are not doubled
    s.replace('\\', r"\\").replace('"', r#"\""#)
}

/// Drops the backslash in front of any escaped character.
pub fn unescape(s: &str) -> String {
    UNESCAPE_RE.replace_all(s, "$1").into_owned()
}
