//! # Logging
//!
//! The crate logs through the `log` facade. Embedders that do not install
//! their own logger can call [`LoggingSystem::init`], which installs
//! `env_logger`; `RUST_LOG` takes precedence over the configured level.

use log::LevelFilter;
use once_cell::sync::OnceCell;

/// Level the process-wide logger was installed with
static INSTALLED_LEVEL: OnceCell<LevelFilter> = OnceCell::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Another logger is already installed")]
    ForeignLogger,
}

/// Parses a level name case-insensitively.
pub fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.to_uppercase().as_str() {
        "OFF" => Ok(LevelFilter::Off),
        "TRACE" => Ok(LevelFilter::Trace),
        "DEBUG" => Ok(LevelFilter::Debug),
        "INFO" => Ok(LevelFilter::Info),
        "WARN" => Ok(LevelFilter::Warn),
        "ERROR" => Ok(LevelFilter::Error),
        _ => Err(format!("Invalid log level: {}", level)),
    }
}

pub struct LoggingSystem;

impl LoggingSystem {
    /// Installs `env_logger` at `level` (default `info`). Calling it again
    /// after a successful install is a no-op.
    pub fn init(level: Option<&str>) -> Result<(), LoggingError> {
        let level_filter = match level {
            Some(level) => {
                parse_level(level).map_err(|_| LoggingError::InvalidLevel(level.to_string()))?
            }
            None => LevelFilter::Info,
        };

        if INSTALLED_LEVEL.get().is_some() {
            return Ok(());
        }
        env_logger::Builder::new()
            .filter_level(level_filter)
            .parse_default_env()
            .try_init()
            .map_err(|_| LoggingError::ForeignLogger)?;
        // a concurrent winner already recorded its level
        let _ = INSTALLED_LEVEL.set(level_filter);
        Ok(())
    }

    /// Level passed to the first successful [`init`](Self::init), if any.
    pub fn installed_level() -> Option<LevelFilter> {
        INSTALLED_LEVEL.get().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("WARN").unwrap(), LevelFilter::Warn);
        assert!(parse_level("verbose").is_err());
    }

    #[test]
    fn rejects_invalid_level() {
        assert!(matches!(
            LoggingSystem::init(Some("verbose")),
            Err(LoggingError::InvalidLevel(_))
        ));
    }
}
