//! Kconfig configuration model and evaluation engine.
//!
//! A front end builds the model through [`KconfigBuilder`], which turns into
//! a read-ready [`Kconfig`] on `finalize`. Values are then queried and set on
//! the model, and [`config`] reads and writes the usual output files.

pub mod config;
pub mod error;
pub mod kconfig;
pub mod logger;

pub use config::Settings;
pub use error::{KconfigError, Result};
pub use kconfig::{Kconfig, KconfigBuilder};
