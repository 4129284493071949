//! Cache-aside layer between the remote catalog and the local store.

use std::collections::HashMap;
use std::future::Future;
use tracing::{info, warn};

use super::snapshot::CatalogSnapshot;
use super::types::{Product, ProductId};
use crate::error::{FetchError, ShopError, StoreError};
use crate::store::SqliteStore;

/// Keeps the `products` collection in step with the remote catalog.
///
/// The remote source is always authoritative. The cached copy is only read
/// when a fetch fails; there is no expiry or staleness check.
#[derive(Clone)]
pub struct CatalogCache {
  store: SqliteStore,
}

impl CatalogCache {
  pub fn new(store: SqliteStore) -> Self {
    Self { store }
  }

  /// Fetch the catalog and replace the cached copy with it.
  ///
  /// Fails with `FetchFailed` if the fetcher does, leaving the cache as it
  /// was; the caller is expected to fall back to `load_cached`.
  pub async fn refresh<F, Fut>(&self, fetcher: F) -> Result<CatalogSnapshot, ShopError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<Product>, FetchError>>,
  {
    let products = fetcher().await?;
    Ok(self.store_fetched(products).await?)
  }

  /// Every cached product. An empty cache is not an error.
  pub async fn load_cached(&self) -> Result<CatalogSnapshot, StoreError> {
    let (products, meta) = self.store.get_all_with_meta::<Product>().await?;

    info!(
      count = products.len(),
      generation = meta.generation,
      "catalog loaded from cache"
    );
    Ok(CatalogSnapshot::offline(products, meta))
  }

  /// Refresh, falling back to the cached copy when the fetch fails.
  ///
  /// A fetched catalog that cannot be written to the cache is still
  /// returned; only a failed fetch followed by an unreadable cache is an
  /// error.
  pub async fn load<F, Fut>(&self, fetcher: F) -> Result<CatalogSnapshot, StoreError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<Product>, FetchError>>,
  {
    let products = match fetcher().await {
      Ok(products) => products,
      Err(e) => {
        warn!(error = %e, "catalog fetch failed, serving cached catalog");
        return self.load_cached().await;
      }
    };

    match self.store_fetched(products.clone()).await {
      Ok(snapshot) => Ok(snapshot),
      Err(e) => {
        warn!(error = %e, "fetched catalog could not be cached");
        let meta = self.store.meta::<Product>().await.unwrap_or_default();
        Ok(CatalogSnapshot::from_network(products, meta))
      }
    }
  }

  async fn store_fetched(&self, products: Vec<Product>) -> Result<CatalogSnapshot, StoreError> {
    let products = dedupe_by_id(products);
    let meta = self.store.replace_all(products.clone()).await?;

    info!(
      count = products.len(),
      generation = meta.generation,
      "catalog refreshed"
    );
    Ok(CatalogSnapshot::from_network(products, meta))
  }
}

/// Collapse repeated ids so the snapshot matches what the store keeps: the
/// last record wins, at the position of the first.
fn dedupe_by_id(products: Vec<Product>) -> Vec<Product> {
  let mut positions: HashMap<ProductId, usize> = HashMap::with_capacity(products.len());
  let mut unique: Vec<Product> = Vec::with_capacity(products.len());

  for product in products {
    match positions.get(&product.id) {
      Some(&at) => {
        warn!(id = %product.id, "duplicate product id in catalog, keeping the later record");
        unique[at] = product;
      }
      None => {
        positions.insert(product.id.clone(), unique.len());
        unique.push(product);
      }
    }
  }

  unique
}
