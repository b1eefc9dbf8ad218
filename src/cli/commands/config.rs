//! Config command implementation.

use crate::cli::ConfigAction;
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: &Settings, config: Option<&str>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            let path = config
                .map(PathBuf::from)
                .unwrap_or_else(Settings::resolved_config_path);
            if path.exists() {
                println!("{}", path.display());
            } else {
                println!("{} (not created, using defaults)", path.display());
            }
        }
    }

    Ok(())
}
