mod config_cmd;
mod demo;
mod replay;
pub mod report;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

pub use demo::DemoCommand;
pub use replay::{replay, ReplayCommand, ReplayReport};

#[derive(Parser)]
#[command(name = "tnua")]
#[command(about = "Exercise recognition and fall detection over recorded pose streams", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "TNUA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded pose stream through a session
    Replay(ReplayCommand),

    /// Run a scripted synthetic workout
    Demo(DemoCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigSubcommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Show current configuration
    Show,

    /// Initialize configuration with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn execute(self) -> Result<()> {
        if self.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        let config_path = self.config.as_deref();
        match self.command {
            Commands::Replay(cmd) => cmd.execute(&Config::load(config_path)?),
            Commands::Demo(cmd) => cmd.execute(&Config::load(config_path)?),
            Commands::Config(subcmd) => match subcmd {
                ConfigSubcommands::Show => config_cmd::show_config(config_path),
                ConfigSubcommands::Init { force } => config_cmd::init_config(config_path, force),
            },
            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
        }
    }
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
