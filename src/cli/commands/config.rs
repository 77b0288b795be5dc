//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::Path;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: &Settings, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                Output::warning(&format!(
                    "Config already exists at {}. Use --force to overwrite.",
                    config_path.display()
                ));
                return Ok(());
            }

            let defaults = Settings::default();
            defaults.save_to(&config_path.to_path_buf())?;
            Output::success(&format!("Wrote default config to {}", config_path.display()));
            Output::kv(
                "Caption languages",
                &format!("{} (then auto-detect)", defaults.transcript.languages.join(", ")),
            );
            Output::info("Secrets are read from the environment:");
            Output::kv("AI provider key", &defaults.analysis.api_key_env);
            Output::kv("Webhook secret", &defaults.webhook.secret_env);
        }
    }

    Ok(())
}
