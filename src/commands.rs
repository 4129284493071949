//! Shopper commands and how each one drives the storefront.

use clap::Subcommand;
use color_eyre::Result;
use std::io::Write;

use crate::catalog::{CatalogSource, ProductId};
use crate::error::ShopError;
use crate::present::{Layout, TerminalPresenter};
use crate::storefront::Storefront;

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
  /// Show the catalog (from the cache when offline)
  Products {
    /// Only products whose name or description contains this text
    #[arg(short, long)]
    filter: Option<String>,
    /// Catalog layout
    #[arg(short, long, value_enum)]
    layout: Option<Layout>,
  },
  /// Re-fetch the catalog, failing instead of falling back to the cache
  Refresh,
  /// Show the cart
  Cart,
  /// Put a product in the cart
  Add { id: String },
  /// One more unit of a cart line
  #[command(alias = "inc")]
  Increment { id: String },
  /// One less unit of a cart line (never below one)
  #[command(alias = "dec")]
  Decrement { id: String },
  /// Set the quantity of a cart line
  Set {
    id: String,
    #[arg(allow_negative_numbers = true)]
    quantity: i64,
  },
  /// Drop a line from the cart
  #[command(alias = "rm")]
  Remove { id: String },
}

/// Run one command and render what it changed.
///
/// Returns `false` if the storefront operation failed; the failure itself has
/// already been rendered from the event it published.
pub async fn run<S, W>(
  command: Command,
  shop: &Storefront<S>,
  presenter: &mut TerminalPresenter<W>,
) -> Result<bool>
where
  S: CatalogSource,
  W: Write,
{
  let mut events = shop.subscribe();

  let outcome: Result<bool, ShopError> = match command {
    Command::Products { filter, layout } => {
      presenter.set_layout(layout);
      let loaded = shop.load_catalog().await;
      presenter.drain(&mut events)?;
      if loaded.is_ok() {
        presenter.products(&shop.filter(filter.as_deref().unwrap_or_default()))?;
      }
      loaded.map(|_| true)
    }
    Command::Refresh => {
      let refreshed = shop.refresh_catalog().await;
      presenter.drain(&mut events)?;
      if let Ok(snapshot) = &refreshed {
        presenter.products(snapshot.products())?;
      }
      refreshed.map(|_| true)
    }
    Command::Cart => match shop.cart().await {
      Ok(summary) => {
        presenter.cart(&summary)?;
        Ok(true)
      }
      Err(e) => Err(e),
    },
    Command::Add { id } => match shop.load_catalog().await {
      Ok(_) => shop.add(&ProductId::new(id)).await,
      Err(e) => Err(e),
    },
    Command::Increment { id } => shop.increment(&ProductId::new(id)).await,
    Command::Decrement { id } => shop.decrement(&ProductId::new(id)).await,
    Command::Set { id, quantity } => shop.set_quantity(&ProductId::new(id), quantity).await,
    Command::Remove { id } => shop.remove(&ProductId::new(id)).await,
  };

  presenter.drain(&mut events)?;

  match outcome {
    Ok(true) => Ok(true),
    Ok(false) => {
      presenter.note("nothing changed")?;
      Ok(true)
    }
    Err(_) => Ok(false),
  }
}
