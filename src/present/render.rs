//! Plain-text renderings of the catalog and the cart.

use crossterm::style::Stylize;
use std::io::{self, Write};

use super::utils::{format_cached_at, format_price, truncate};
use super::Layout;
use crate::cart::{CartEntry, CartSummary};
use crate::catalog::{CatalogOrigin, CatalogSnapshot, Product};

pub fn catalog_banner<W: Write>(out: &mut W, snapshot: &CatalogSnapshot) -> io::Result<()> {
  match snapshot.origin {
    CatalogOrigin::Unloaded => Ok(()),
    CatalogOrigin::Network => writeln!(
      out,
      "{}",
      format!("{} products", snapshot.len()).dim()
    ),
    CatalogOrigin::Offline => writeln!(
      out,
      "{}",
      format!(
        "offline: showing cached catalog ({} products, {})",
        snapshot.len(),
        format_cached_at(snapshot.cached_at)
      )
      .yellow()
    ),
  }
}

pub fn products<W: Write>(
  out: &mut W,
  products: &[Product],
  layout: Layout,
  currency: &str,
) -> io::Result<()> {
  if products.is_empty() {
    return writeln!(out, "{}", "no products".dim());
  }

  match layout {
    Layout::Grid => {
      writeln!(
        out,
        "{}",
        format!("{:<6} {:<28} {:>12}  {}", "ID", "NAME", "PRICE", "DESCRIPTION").bold()
      )?;
      for product in products {
        writeln!(
          out,
          "{:<6} {:<28} {:>12}  {}",
          truncate(product.id.as_str(), 6),
          truncate(&product.name, 28),
          format_price(product.price, currency),
          truncate(&product.description, 40)
        )?;
      }
    }
    Layout::List => {
      for product in products {
        writeln!(
          out,
          "{} {}  {}",
          format!("[{}]", product.id).dim(),
          product.name.as_str().bold(),
          format_price(product.price, currency).green()
        )?;
        if !product.description.is_empty() {
          writeln!(out, "    {}", product.description)?;
        }
        if !product.image_url.is_empty() {
          writeln!(out, "    {}", product.image_url.as_str().dim())?;
        }
      }
    }
  }

  Ok(())
}

pub fn cart<W: Write>(out: &mut W, summary: &CartSummary, currency: &str) -> io::Result<()> {
  if summary.is_empty() {
    return writeln!(out, "{}", "cart is empty".dim());
  }

  writeln!(
    out,
    "{}",
    format!(
      "{:<6} {:<28} {:>12} {:>5} {:>12}",
      "ID", "NAME", "PRICE", "QTY", "TOTAL"
    )
    .bold()
  )?;

  for entry in &summary.entries {
    cart_row(out, entry, currency)?;
  }

  writeln!(
    out,
    "{}",
    format!(
      "{} items, total {}",
      summary.item_count(),
      format_price(summary.total(), currency)
    )
    .bold()
  )
}

fn cart_row<W: Write>(out: &mut W, entry: &CartEntry, currency: &str) -> io::Result<()> {
  writeln!(
    out,
    "{:<6} {:<28} {:>12} {:>5} {:>12}",
    truncate(entry.id.as_str(), 6),
    truncate(&entry.name, 28),
    format_price(entry.price, currency),
    entry.quantity,
    format_price(entry.line_total(), currency)
  )
}
