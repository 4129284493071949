mod cart;
mod catalog;
mod commands;
mod config;
mod error;
mod event;
mod logging;
mod present;
mod store;
mod storefront;
#[cfg(test)]
mod testutil;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::catalog::CatalogClient;
use crate::present::TerminalPresenter;
use crate::storefront::Storefront;

#[derive(Parser, Debug)]
#[command(name = "brewcart")]
#[command(about = "A coffee shop storefront with an offline catalog and a persistent cart")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/brewcart/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Catalog endpoint to fetch products from
  #[arg(long)]
  catalog_url: Option<String>,

  /// Store database file
  #[arg(long)]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Command line overrides
  if let Some(url) = args.catalog_url {
    config.catalog.url = url;
  }
  if let Some(path) = args.store {
    config.store.path = Some(path);
  }

  let _log_guard = logging::init(&config.log)?;

  let client = CatalogClient::new(&config.catalog)?;
  let shop = Storefront::open(client, &config).await?;

  let mut presenter = TerminalPresenter::new(std::io::stdout().lock(), &config.display);
  let ok = commands::run(args.command, &shop, &mut presenter).await?;

  Ok(if ok {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}
