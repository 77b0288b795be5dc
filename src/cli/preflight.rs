//! Pre-flight checks before starting a command.
//!
//! Secrets come from the environment; these checks report a descriptive
//! configuration error up front instead of failing on the first request.

use crate::config::{AnalysisSettings, Settings};
use crate::error::{GleanError, Result};

/// Commands with configuration requirements.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// The server needs the AI key and the webhook secret.
    Serve,
    /// Fetching a transcript needs nothing beyond network access.
    Transcript,
    /// Analysis needs the AI key.
    Analyze,
}

/// Everything missing for `operation`.
pub fn problems(operation: Operation, settings: &Settings) -> Vec<GleanError> {
    let checks = match operation {
        Operation::Serve => vec![
            check_api_key(&settings.analysis),
            settings.webhook.secret().map(|_| ()),
        ],
        Operation::Transcript => vec![],
        Operation::Analyze => vec![check_api_key(&settings.analysis)],
    };

    checks.into_iter().filter_map(|c| c.err()).collect()
}

/// Fail with the first missing requirement for `operation`.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match problems(operation, settings).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn check_api_key(settings: &AnalysisSettings) -> Result<()> {
    match settings.api_key() {
        Some(_) => Ok(()),
        None => Err(GleanError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            settings.api_key_env, settings.api_key_env
        ))),
    }
}
