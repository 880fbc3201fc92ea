//! Process entry points for the decision engine.
//!
//! Each binary handles exactly one request per process: read settings,
//! load the model from the working directory, decide, print one JSON line
//! on stdout, exit. Diagnostics go to stderr.

pub mod handlers;
pub mod output;

use anyhow::Context;
use decision_core::config::Settings;

/// Read `decision.toml` (if any) and install logging.
pub fn bootstrap() -> anyhow::Result<Settings> {
    let settings = Settings::load().context("failed to load settings")?;
    settings.logging.init();
    Ok(settings)
}
