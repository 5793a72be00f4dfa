use log::{LevelFilter, Log, Metadata, Record};
use std::fs::File;
use std::io::Write;
use std::sync::{Mutex, OnceLock};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

// Checked once, the environment does not change under us
pub fn is_debug_enabled() -> bool {
    static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();
    *DEBUG_ENABLED.get_or_init(|| std::env::var("KCONFIG_DEBUG").is_ok())
}

fn debug_log_path() -> String {
    std::env::var("KCONFIG_DEBUG_LOG").unwrap_or_else(|_| match std::env::var("HOME") {
        Ok(home) => format!("{}/.kconfig_debug.log", home),
        Err(_) => format!("/tmp/kconfig_debug_{}.log", std::process::id()),
    })
}

/// Debug log file, opened on first use.
fn debug_log_file() -> Option<&'static Mutex<File>> {
    static DEBUG_FILE: OnceLock<Option<Mutex<File>>> = OnceLock::new();
    DEBUG_FILE
        .get_or_init(|| {
            if !is_debug_enabled() {
                return None;
            }

            let log_path = debug_log_path();
            let mut options = std::fs::OpenOptions::new();
            options.create(true).write(true).truncate(true);

            // Only the owner can read the log
            #[cfg(unix)]
            options.mode(0o600);

            match options.open(&log_path) {
                Ok(file) => Some(Mutex::new(file)),
                Err(e) => {
                    eprintln!("Warning: Failed to open debug log at '{}': {}", log_path, e);
                    None
                }
            }
        })
        .as_ref()
}

/// `log` backend writing every record to the debug log file.
struct FileLogger;

impl Log for FileLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Some(file) = debug_log_file() {
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(
                    file,
                    "[{:5}] {}: {}",
                    record.level(),
                    record.target(),
                    record.args()
                );
            }
        }
    }

    fn flush(&self) {
        if let Some(file) = debug_log_file() {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

static LOGGER: FileLogger = FileLogger;

/// Installs the file logger when `KCONFIG_DEBUG` is set.
///
/// The log goes to `KCONFIG_DEBUG_LOG`, or `$HOME/.kconfig_debug.log` by
/// default. Returns false if debugging is off, the file cannot be opened, or
/// another logger is already installed.
pub fn init_debug_logger() -> bool {
    if debug_log_file().is_none() {
        return false;
    }
    if log::set_logger(&LOGGER).is_err() {
        return false;
    }
    log::set_max_level(LevelFilter::Trace);
    true
}
