//! In-memory view of the catalog the cart adds from.

use chrono::{DateTime, Utc};

use super::types::{Product, ProductId};
use crate::store::CollectionMeta;

/// Indicates where a catalog snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrigin {
  /// Nothing has been loaded yet
  Unloaded,
  /// Fresh data from the remote source
  Network,
  /// Remote source unreachable, serving the cached catalog
  Offline,
}

/// A loaded catalog together with the store generation it corresponds to.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
  products: Vec<Product>,
  /// Generation of the products collection this snapshot was read or written as
  pub generation: u64,
  pub origin: CatalogOrigin,
  /// When the cached copy was written (None if it was never written)
  pub cached_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
  /// Snapshot used before the first load.
  pub fn unloaded() -> Self {
    Self {
      products: Vec::new(),
      generation: 0,
      origin: CatalogOrigin::Unloaded,
      cached_at: None,
    }
  }

  /// Snapshot of freshly fetched products.
  pub fn from_network(products: Vec<Product>, meta: CollectionMeta) -> Self {
    Self {
      products,
      generation: meta.generation,
      origin: CatalogOrigin::Network,
      cached_at: meta.replaced_at,
    }
  }

  /// Snapshot read back from the cache.
  pub fn offline(products: Vec<Product>, meta: CollectionMeta) -> Self {
    Self {
      products,
      generation: meta.generation,
      origin: CatalogOrigin::Offline,
      cached_at: meta.replaced_at,
    }
  }

  pub fn products(&self) -> &[Product] {
    &self.products
  }

  pub fn len(&self) -> usize {
    self.products.len()
  }

  #[allow(dead_code)]
  pub fn is_empty(&self) -> bool {
    self.products.is_empty()
  }

  pub fn find(&self, id: &ProductId) -> Option<&Product> {
    self.products.iter().find(|p| &p.id == id)
  }

  /// Products whose name or description contains `text`, ignoring case.
  /// Blank text matches everything.
  pub fn filter(&self, text: &str) -> Vec<Product> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
      return self.products.clone();
    }

    self
      .products
      .iter()
      .filter(|p| p.matches(&needle))
      .cloned()
      .collect()
  }
}
