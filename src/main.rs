use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use planboard::config::CliOverrides;

mod cmd;

#[derive(Parser)]
#[command(name = "planboard")]
#[command(version, about = "Project tracker server: workspaces, projects, tasks and invite links")]
pub struct Cli {
    /// Path to planboard.toml. Defaults to .planboard/planboard.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP and WebSocket server
    Serve {
        /// Port to serve on
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Database path
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Enable dev mode (CORS permissive for a local front-end dev server)
        #[arg(long)]
        dev: bool,
    },
    /// Create or migrate the database, then exit
    Init,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Check the configuration and exit
    Validate,
    /// Write a default planboard.toml
    Init,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides {
            verbose: self.verbose,
            ..Default::default()
        };
        if let Commands::Serve {
            port,
            host,
            db_path,
            dev,
        } = &self.command
        {
            overrides.port = *port;
            overrides.host = host.clone();
            overrides.db_path = db_path.clone();
            overrides.dev_mode = *dev;
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let overrides = cli.overrides();
    let config_path = cli.config.as_deref();

    match &cli.command {
        Commands::Serve { .. } => cmd::cmd_serve(config_path, &overrides).await?,
        Commands::Init => cmd::cmd_init(config_path, &overrides)?,
        Commands::Config { command } => cmd::cmd_config(config_path, &overrides, command.clone())?,
    }

    Ok(())
}
