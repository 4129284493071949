//! Storefront facade wiring the catalog, the cart and the event bus.

use color_eyre::{eyre::eyre, Result};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, info, warn};

use crate::cart::{CartEngine, CartSummary};
use crate::catalog::{CatalogCache, CatalogSnapshot, CatalogSource, Product, ProductId};
use crate::config::Config;
use crate::error::ShopError;
use crate::event::{EventBus, EventStream, ShopEvent};
use crate::store::SqliteStore;

/// Entry point for the presentation layer.
///
/// Holds the current catalog snapshot that cart additions are resolved
/// against. Every operation that fails is logged and announced as
/// `ShopEvent::OperationFailed` before the error is returned; prior state is
/// left as it was.
#[derive(Clone)]
pub struct Storefront<S: CatalogSource> {
  source: S,
  catalog: CatalogCache,
  cart: CartEngine,
  snapshot: Arc<RwLock<Arc<CatalogSnapshot>>>,
  events: EventBus,
}

impl<S: CatalogSource> Storefront<S> {
  /// Open the store named in `config` and build a storefront over it.
  pub async fn open(source: S, config: &Config) -> Result<Self> {
    let path = config.store.resolve_path()?;
    let store = SqliteStore::open(&path)
      .await
      .map_err(|e| eyre!("Failed to open store at {}: {}", path.display(), e))?;

    info!(path = %path.display(), policy = ?config.cart.add_policy, "storefront ready");
    Ok(Self::new(source, store, config))
  }

  pub fn new(source: S, store: SqliteStore, config: &Config) -> Self {
    let events = EventBus::default();
    Self {
      source,
      catalog: CatalogCache::new(store.clone()),
      cart: CartEngine::new(store, config.cart.add_policy, events.clone()),
      snapshot: Arc::new(RwLock::new(Arc::new(CatalogSnapshot::unloaded()))),
      events,
    }
  }

  pub fn subscribe(&self) -> EventStream {
    self.events.subscribe()
  }

  /// The catalog snapshot cart additions currently resolve against.
  pub fn catalog(&self) -> Arc<CatalogSnapshot> {
    let current = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&current)
  }

  /// Fetch the catalog, falling back to the cached copy if the fetch fails.
  pub async fn load_catalog(&self) -> Result<Arc<CatalogSnapshot>, ShopError> {
    let source = self.source.clone();
    let loaded = self
      .catalog
      .load(|| async move { source.fetch_products().await })
      .await
      .map_err(ShopError::from);

    let snapshot = self.guard("load_catalog", loaded)?;
    Ok(self.install(snapshot))
  }

  /// Fetch the catalog without falling back; a failed fetch leaves the
  /// current snapshot in place.
  pub async fn refresh_catalog(&self) -> Result<Arc<CatalogSnapshot>, ShopError> {
    let source = self.source.clone();
    let refreshed = self
      .catalog
      .refresh(|| async move { source.fetch_products().await })
      .await;

    let snapshot = self.guard("refresh_catalog", refreshed)?;
    Ok(self.install(snapshot))
  }

  /// Products in the current snapshot matching `text`.
  pub fn filter(&self, text: &str) -> Vec<Product> {
    self.catalog().filter(text)
  }

  pub async fn cart(&self) -> Result<CartSummary, ShopError> {
    let summary = self.cart.summary().await.map_err(ShopError::from);
    self.guard("cart", summary)
  }

  pub async fn add(&self, id: &ProductId) -> Result<bool, ShopError> {
    let catalog = self.catalog();
    let added = self.cart.add(&catalog, id).await;
    self.guard("add", added)
  }

  pub async fn increment(&self, id: &ProductId) -> Result<bool, ShopError> {
    let changed = self.cart.increment(id).await;
    self.guard("increment", changed)
  }

  pub async fn decrement(&self, id: &ProductId) -> Result<bool, ShopError> {
    let changed = self.cart.decrement(id).await;
    self.guard("decrement", changed)
  }

  pub async fn set_quantity(&self, id: &ProductId, quantity: i64) -> Result<bool, ShopError> {
    let changed = self.cart.set_quantity(id, quantity).await;
    self.guard("set_quantity", changed)
  }

  pub async fn remove(&self, id: &ProductId) -> Result<bool, ShopError> {
    let removed = self.cart.remove(id).await;
    self.guard("remove", removed)
  }

  fn install(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
    let snapshot = Arc::new(snapshot);
    {
      let mut current = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
      *current = Arc::clone(&snapshot);
    }
    self.events.publish(ShopEvent::CatalogLoaded(Arc::clone(&snapshot)));
    snapshot
  }

  /// Log and announce a failed operation.
  fn guard<T>(&self, operation: &'static str, result: Result<T, ShopError>) -> Result<T, ShopError> {
    result.map_err(|e| {
      if e.is_rejection() {
        warn!(operation, error = %e, "storefront operation rejected");
      } else {
        error!(operation, error = %e, "storefront operation failed");
      }
      self.events.publish(ShopEvent::OperationFailed {
        operation,
        message: e.to_string(),
      });
      e
    })
  }
}
