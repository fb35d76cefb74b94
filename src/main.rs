use anyhow::Context;
use clap::Parser;
use log::info;

use fabrica::cli::run::run;
use fabrica::cli::Cli;
use fabrica::config::Config;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("fabrica=info")).init();
    let cli = Cli::parse();

    let config = Config::from_env().context("Can't read API settings from the environment")?;
    info!("Using account {}", config.login);
    run(cli, &config)
}
