use serde::{Deserialize, Serialize};

use crate::catalog::{Product, ProductId};
use crate::store::{Collection, Record};

/// A cart line.
///
/// Name, price and image are copied from the product when it is first added
/// and are not refreshed when the catalog changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
  pub id: ProductId,
  pub name: String,
  pub price: f64,
  #[serde(default)]
  pub image_url: String,
  pub quantity: u32,
}

impl CartEntry {
  /// New entry for `product` with a quantity of one.
  pub fn from_product(product: &Product) -> Self {
    Self {
      id: product.id.clone(),
      name: product.name.clone(),
      price: product.price,
      image_url: product.image_url.clone(),
      quantity: 1,
    }
  }

  pub fn line_total(&self) -> f64 {
    self.price * f64::from(self.quantity)
  }
}

impl Record for CartEntry {
  const COLLECTION: Collection = Collection::Cart;

  fn key(&self) -> &str {
    self.id.as_str()
  }
}

/// What adding a product that is already in the cart does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddPolicy {
  /// Bump the existing entry's quantity by one
  #[default]
  Increment,
  /// Overwrite the entry with a fresh copy at quantity one
  Reset,
}

/// The whole cart with totals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSummary {
  pub entries: Vec<CartEntry>,
}

impl CartSummary {
  pub fn new(entries: Vec<CartEntry>) -> Self {
    Self { entries }
  }

  /// Number of units across all lines.
  pub fn item_count(&self) -> u64 {
    self.entries.iter().map(|e| u64::from(e.quantity)).sum()
  }

  pub fn total(&self) -> f64 {
    self.entries.iter().map(CartEntry::line_total).sum()
  }

  #[allow(dead_code)]
  pub fn get(&self, id: &ProductId) -> Option<&CartEntry> {
    self.entries.iter().find(|e| &e.id == id)
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::{entry, product};

  #[test]
  fn test_entry_copies_product() {
    let mut kona = product("p1", "Kona", 25.0);
    kona.image_url = "kona.jpg".to_string();

    let entry = CartEntry::from_product(&kona);
    assert_eq!(entry.id, kona.id);
    assert_eq!(entry.price, 25.0);
    assert_eq!(entry.image_url, "kona.jpg");
    assert_eq!(entry.quantity, 1);
  }

  #[test]
  fn test_summary_totals() {
    let mut a = entry("a", 2);
    a.price = 10.0;
    let mut b = entry("b", 3);
    b.price = 2.5;

    let summary = CartSummary::new(vec![a, b]);
    assert_eq!(summary.item_count(), 5);
    assert!((summary.total() - 27.5).abs() < f64::EPSILON);
  }

  #[test]
  fn test_add_policy_parses_lowercase() {
    let policy: AddPolicy = serde_yaml::from_str("reset").unwrap();
    assert_eq!(policy, AddPolicy::Reset);
    assert_eq!(AddPolicy::default(), AddPolicy::Increment);
  }
}
