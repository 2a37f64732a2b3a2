//! Database setup command: `planboard init`.

use std::path::Path;

use anyhow::Result;

use planboard::board::server::open_database;
use planboard::config::{CliOverrides, PlanboardConfig};

pub fn cmd_init(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<()> {
    let config = PlanboardConfig::resolve(config_path, overrides)?;
    let db_path = config.db_path();
    open_database(db_path)?;
    println!("Planboard database initialized at {}", db_path.display());
    Ok(())
}
