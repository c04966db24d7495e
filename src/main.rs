//! webres - dependency-ordered, content-hashed web resources.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use webres::cli::{self, Cli, Commands};
use webres::config::WebresConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    webres::logger::set_verbose(cli.verbose);

    let config = WebresConfig::load(&cli.config, cli.production())?;

    match &cli.command {
        Commands::Scripts { args, page } => cli::run::scripts(&config, args, page.as_deref()),
        Commands::Styles { args } => cli::run::styles(&config, args),
        Commands::Order { names } => cli::run::order(&config, names),
        Commands::Check => cli::run::check(&config),
    }
}
