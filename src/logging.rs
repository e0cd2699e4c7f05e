//! Tracing setup.
//!
//! The terminal belongs to the dashboard, so log lines go to a file when one
//! is configured and are dropped otherwise. `RUST_LOG` takes precedence over
//! the configured level.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, EnvFilter};

/// Install the global subscriber. Safe to call more than once; later calls
/// leave the first subscriber in place.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let writer = make_writer(log_file)?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .try_init();
    Ok(())
}

fn make_writer(log_file: Option<&Path>) -> Result<BoxMakeWriter> {
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Ok(BoxMakeWriter::new(Arc::new(file)))
        }
        None => Ok(BoxMakeWriter::new(io::sink)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sanctuary.log");
        assert!(make_writer(Some(&path)).is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_unwritable_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("sanctuary.log");
        assert!(make_writer(Some(&path)).is_err());
    }

    #[test]
    fn test_init_without_file() {
        assert!(init("debug", None).is_ok());
        assert!(init("info", None).is_ok());
    }
}
