//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Dependency-ordered, content-hashed web resources
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: webres.toml)
    #[arg(short = 'C', long, global = true, default_value = "webres.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print script markup for the named resources and their dependencies
    #[command(visible_alias = "s")]
    Scripts {
        #[command(flatten)]
        args: EmitArgs,

        /// Page identifier passed to config providers
        #[arg(short, long)]
        page: Option<String>,
    },

    /// Print style markup for the named resources
    Styles {
        #[command(flatten)]
        args: EmitArgs,
    },

    /// Print the emission order of the named scripts
    #[command(visible_alias = "o")]
    Order {
        /// Script names
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },

    /// Validate the configuration and every catalog entry
    #[command(visible_alias = "c")]
    Check,
}

/// Shared arguments of the markup commands.
#[derive(clap::Args, Debug, Clone)]
pub struct EmitArgs {
    /// Resource names
    #[arg(value_name = "NAME", required = true)]
    pub names: Vec<String>,

    /// URL prefix of the site
    #[arg(short, long = "base-path", default_value = "")]
    pub base_path: String,

    /// Override the production flag of the configuration
    #[arg(short = 'P', long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub production: Option<bool>,
}

impl Cli {
    /// Production override requested on the command line.
    pub fn production(&self) -> Option<bool> {
        match &self.command {
            Commands::Scripts { args, .. } | Commands::Styles { args } => args.production,
            Commands::Order { .. } | Commands::Check => None,
        }
    }
}
