//! Terminal presentation of storefront events.

mod render;
mod utils;

use crossterm::style::Stylize;
use serde::Deserialize;
use std::io::{self, Write};

use crate::cart::CartSummary;
use crate::catalog::Product;
use crate::config::DisplayConfig;
use crate::event::{EventStream, ShopEvent};

/// How the catalog is laid out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
  /// One row per product in aligned columns
  #[default]
  Grid,
  /// One block per product with description and image
  List,
}

/// Renders storefront events to a terminal (or any writer)
pub struct TerminalPresenter<W: Write> {
  out: W,
  layout: Layout,
  currency: String,
}

impl<W: Write> TerminalPresenter<W> {
  pub fn new(out: W, display: &DisplayConfig) -> Self {
    Self {
      out,
      layout: display.layout,
      currency: display.currency.clone(),
    }
  }

  /// Switch layout for subsequent catalog renders; `None` keeps the current one.
  pub fn set_layout(&mut self, layout: Option<Layout>) {
    if let Some(layout) = layout {
      self.layout = layout;
    }
  }

  /// Redraw whatever an event says changed.
  pub fn handle(&mut self, event: &ShopEvent) -> io::Result<()> {
    match event {
      ShopEvent::CatalogLoaded(snapshot) => render::catalog_banner(&mut self.out, snapshot),
      ShopEvent::CartChanged(summary) => self.cart(summary),
      ShopEvent::OperationFailed { operation, message } => writeln!(
        self.out,
        "{}",
        format!("{} failed: {}", operation, message).red()
      ),
    }
  }

  /// Render every event published so far.
  pub fn drain(&mut self, events: &mut EventStream) -> io::Result<()> {
    while let Some(event) = events.try_next() {
      self.handle(&event)?;
    }
    self.out.flush()
  }

  pub fn products(&mut self, products: &[Product]) -> io::Result<()> {
    render::products(&mut self.out, products, self.layout, &self.currency)
  }

  pub fn cart(&mut self, summary: &CartSummary) -> io::Result<()> {
    render::cart(&mut self.out, summary, &self.currency)
  }

  pub fn note(&mut self, message: &str) -> io::Result<()> {
    writeln!(self.out, "{}", message.dim())
  }

  #[cfg(test)]
  pub fn into_inner(self) -> W {
    self.out
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cart::CartEntry;
  use crate::catalog::{CatalogSnapshot, ProductId};
  use crate::event::EventBus;
  use crate::store::CollectionMeta;
  use crate::testutil::product;
  use std::sync::Arc;

  fn presenter(layout: Layout) -> TerminalPresenter<Vec<u8>> {
    let mut presenter = TerminalPresenter::new(Vec::new(), &DisplayConfig::default());
    presenter.set_layout(Some(layout));
    presenter
  }

  fn output(presenter: TerminalPresenter<Vec<u8>>) -> String {
    String::from_utf8(presenter.into_inner()).unwrap()
  }

  #[test]
  fn test_grid_shows_one_row_per_product() {
    let mut presenter = presenter(Layout::Grid);
    presenter
      .products(&[product("1", "Signature Blend", 12.99), product("2", "Kona", 30.0)])
      .unwrap();

    let out = output(presenter);
    assert!(out.contains("Signature Blend"));
    assert!(out.contains("12.99 dh"));
    assert!(out.contains("30.00 dh"));
  }

  #[test]
  fn test_list_shows_description_and_image() {
    let mut kona = product("2", "Kona", 30.0);
    kona.description = "Smooth and nutty".to_string();
    kona.image_url = "https://example.com/kona.jpg".to_string();

    let mut presenter = presenter(Layout::List);
    presenter.products(&[kona]).unwrap();

    let out = output(presenter);
    assert!(out.contains("Smooth and nutty"));
    assert!(out.contains("kona.jpg"));
  }

  #[test]
  fn test_cart_shows_line_totals_and_grand_total() {
    let mut sumatra = CartEntry::from_product(&product("p1", "Sumatra", 25.0));
    sumatra.quantity = 2;
    let kona = CartEntry::from_product(&product("p2", "Kona", 30.0));

    let mut presenter = presenter(Layout::Grid);
    presenter
      .cart(&CartSummary::new(vec![sumatra, kona]))
      .unwrap();

    let out = output(presenter);
    assert!(out.contains("50.00 dh"));
    assert!(out.contains("3 items, total 80.00 dh"));
  }

  #[test]
  fn test_drain_renders_published_events() {
    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let offline = CatalogSnapshot::offline(
      vec![product("p1", "Sumatra", 25.0)],
      CollectionMeta::default(),
    );

    bus.publish(ShopEvent::CatalogLoaded(Arc::new(offline)));
    bus.publish(ShopEvent::CartChanged(CartSummary::default()));
    bus.publish(ShopEvent::OperationFailed {
      operation: "add",
      message: format!("product `{}` is not in the current catalog", ProductId::new("x")),
    });

    let mut presenter = presenter(Layout::Grid);
    presenter.drain(&mut events).unwrap();

    let out = output(presenter);
    assert!(out.contains("offline: showing cached catalog (1 products, never cached)"));
    assert!(out.contains("cart is empty"));
    assert!(out.contains("add failed: product `x` is not in the current catalog"));
  }
}
