//! sitemap-augment - append custom urls to a generated sitemap.xml.

mod cli;
mod config;
mod logger;
mod sitemap;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::AugmentConfig;

fn main() {
    if let Err(err) = run() {
        log!("error"; "{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);
    // The preview owns stdout
    logger::set_stderr(cli.dry_run);

    let config = AugmentConfig::load(&cli)?;

    cli::augment::run(&config, cli.dry_run, &mut std::io::stdout()).map(|_| ())
}
