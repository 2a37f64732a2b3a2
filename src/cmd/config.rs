//! Configuration view and validation commands: `planboard config`.

use std::path::Path;

use anyhow::{Context, Result};

use super::super::ConfigCommands;
use planboard::config::{
    CONFIG_FILE_NAME, CliOverrides, PLANBOARD_DIR, PlanboardConfig, PlanboardToml,
};

pub fn cmd_config(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    command: Option<ConfigCommands>,
) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            let config = PlanboardConfig::resolve(config_path, overrides)?;
            match config.source {
                Some(ref source) => println!("# Config file: {}", source.display()),
                None => println!("# No planboard.toml found, using defaults"),
            }
            println!("# Effective values (with env/CLI overrides)");
            println!();
            print!("{}", config.to_toml_string()?);
        }
        Some(ConfigCommands::Validate) => {
            let config = PlanboardConfig::resolve(config_path, overrides)?;
            match config.source {
                Some(ref source) => println!("Configuration is valid: {}", source.display()),
                None => println!("Configuration is valid (defaults)"),
            }
        }
        Some(ConfigCommands::Init) => {
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => Path::new(PLANBOARD_DIR).join(CONFIG_FILE_NAME),
            };
            if path.exists() {
                anyhow::bail!("Config file already exists: {}", path.display());
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            PlanboardToml::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
