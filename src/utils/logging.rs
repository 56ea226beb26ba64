//! Logger setup.
//!
//! The interactive menu owns stdout, so records go to stderr (or a file) and
//! only warnings and errors are shown unless debug logging is requested.
//! `RUST_LOG` still takes precedence over the default level.

use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::OpenOptions;

use crate::settings::Settings;

pub fn init(settings: &Settings) -> Result<()> {
    let level = if settings.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env();

    if let Some(path) = &settings.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init().context("logger already initialised")
}
