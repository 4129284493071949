//! Cart mutations against the local store.

use tracing::{debug, info, warn};

use super::types::{AddPolicy, CartEntry, CartSummary};
use crate::catalog::{CatalogSnapshot, ProductId};
use crate::error::{ShopError, StoreError};
use crate::event::{EventBus, ShopEvent};
use crate::store::SqliteStore;

/// Applies cart mutations and announces the resulting cart.
///
/// Every mutation is a single read-modify-write on one cart entry, so
/// repeated mutations on the same product converge to their net effect
/// without locking here. After a mutation that changed the store the whole
/// cart is re-read and published as `ShopEvent::CartChanged`; mutations that
/// turn out to be no-ops publish nothing.
#[derive(Clone)]
pub struct CartEngine {
  store: SqliteStore,
  policy: AddPolicy,
  events: EventBus,
}

impl CartEngine {
  pub fn new(store: SqliteStore, policy: AddPolicy, events: EventBus) -> Self {
    Self {
      store,
      policy,
      events,
    }
  }

  /// Current cart contents.
  pub async fn entries(&self) -> Result<Vec<CartEntry>, StoreError> {
    self.store.get_all().await
  }

  pub async fn summary(&self) -> Result<CartSummary, StoreError> {
    Ok(CartSummary::new(self.entries().await?))
  }

  /// Put `id` from `catalog` in the cart.
  ///
  /// An entry that already exists is handled according to the add policy.
  pub async fn add(&self, catalog: &CatalogSnapshot, id: &ProductId) -> Result<bool, ShopError> {
    let product = catalog
      .find(id)
      .ok_or_else(|| ShopError::ProductNotFound(id.clone()))?;
    let fresh = CartEntry::from_product(product);

    let written = match self.policy {
      AddPolicy::Reset => {
        self.store.put(&fresh).await?;
        fresh
      }
      AddPolicy::Increment => self
        .store
        .update(id.as_str(), move |current: Option<CartEntry>| {
          Some(match current {
            Some(mut entry) => {
              entry.quantity = entry.quantity.saturating_add(1);
              entry
            }
            None => fresh,
          })
        })
        .await?
        .ok_or_else(|| StoreError::Unavailable(format!("add of `{}` wrote nothing", id)))?,
    };

    info!(
      id = %id,
      quantity = written.quantity,
      generation = catalog.generation,
      "added to cart"
    );
    self.changed().await;
    Ok(true)
  }

  /// Add one unit. No-op if the product is not in the cart.
  pub async fn increment(&self, id: &ProductId) -> Result<bool, ShopError> {
    self
      .apply(id, "increment", |entry| {
        entry.quantity = entry.quantity.saturating_add(1);
        true
      })
      .await
  }

  /// Take one unit away, never going below one.
  pub async fn decrement(&self, id: &ProductId) -> Result<bool, ShopError> {
    self
      .apply(id, "decrement", |entry| {
        if entry.quantity <= 1 {
          return false;
        }
        entry.quantity -= 1;
        true
      })
      .await
  }

  /// Set the quantity outright. No-op if the product is not in the cart.
  pub async fn set_quantity(&self, id: &ProductId, quantity: i64) -> Result<bool, ShopError> {
    let quantity = u32::try_from(quantity)
      .ok()
      .filter(|q| *q >= 1)
      .ok_or(ShopError::InvalidQuantity(quantity))?;

    self
      .apply(id, "set_quantity", move |entry| {
        entry.quantity = quantity;
        true
      })
      .await
  }

  /// Drop the product from the cart whatever its quantity.
  pub async fn remove(&self, id: &ProductId) -> Result<bool, ShopError> {
    let removed = self.store.delete::<CartEntry>(id.as_str()).await?;
    if !removed {
      debug!(id = %id, "remove: not in cart");
      return Ok(false);
    }

    info!(id = %id, "removed from cart");
    self.changed().await;
    Ok(true)
  }

  /// Run `f` against an existing entry and store the result if `f` reports a
  /// change.
  async fn apply<F>(&self, id: &ProductId, operation: &'static str, f: F) -> Result<bool, ShopError>
  where
    F: FnOnce(&mut CartEntry) -> bool + Send + 'static,
  {
    let written = self
      .store
      .update(id.as_str(), move |current: Option<CartEntry>| {
        let mut entry = current?;
        f(&mut entry).then_some(entry)
      })
      .await?;

    match written {
      Some(entry) => {
        info!(id = %id, quantity = entry.quantity, operation, "cart updated");
        self.changed().await;
        Ok(true)
      }
      None => {
        debug!(id = %id, operation, "cart unchanged");
        Ok(false)
      }
    }
  }

  /// Re-read the whole cart and announce it.
  async fn changed(&self) {
    self.announce(self.summary().await);
  }

  /// The mutation has already committed, so a failed re-read is logged and
  /// not reported as a failed operation.
  fn announce(&self, summary: Result<CartSummary, StoreError>) {
    match summary {
      Ok(summary) => self.events.publish(ShopEvent::CartChanged(summary)),
      Err(e) => warn!(error = %e, "cart changed but could not be re-read"),
    }
  }
}
