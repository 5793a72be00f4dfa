use std::env;

/// Knobs that affect diagnostics and output formats.
///
/// [`Settings::from_env`] reads the usual Kconfig environment variables; the
/// [`Default`] values match an empty environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Prefix of symbol names in `.config` and header output (`CONFIG_`).
    pub config_prefix: String,
    /// Text written verbatim at the top of `.config` files.
    pub config_header: String,
    /// Text written verbatim at the top of C headers.
    pub header_header: String,
    /// Record diagnostics at all.
    pub warn: bool,
    /// Echo each diagnostic through the `log` facade as it is recorded.
    pub warn_to_log: bool,
    /// Report references to undefined symbols during finalization.
    pub warn_undef: bool,
    /// Report `.config` assignments to undefined symbols.
    pub warn_assign_undef: bool,
    /// Report a symbol assigned twice with different values in one load.
    pub warn_assign_override: bool,
    /// Report a symbol assigned twice with the same value in one load.
    pub warn_assign_redun: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_prefix: "CONFIG_".to_string(),
            config_header: String::new(),
            header_header: String::new(),
            warn: true,
            warn_to_log: true,
            warn_undef: false,
            warn_assign_undef: false,
            warn_assign_override: true,
            warn_assign_redun: true,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_y = |key: &str| lookup(key).is_some_and(|v| v == "y");
        let defaults = Self::default();

        Self {
            config_prefix: lookup("CONFIG_").unwrap_or(defaults.config_prefix),
            config_header: lookup("KCONFIG_CONFIG_HEADER").unwrap_or_default(),
            header_header: lookup("KCONFIG_AUTOHEADER_HEADER").unwrap_or_default(),
            warn_undef: is_y("KCONFIG_WARN_UNDEF") || is_y("KCONFIG_STRICT"),
            warn_assign_undef: is_y("KCONFIG_WARN_UNDEF_ASSIGN"),
            ..defaults
        }
    }
}
