//! Error types for the store, the catalog source and storefront operations.

use thiserror::Error;

use crate::catalog::ProductId;
use crate::store::Collection;

/// Errors raised by the local store.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The store could not be opened, upgraded or reached.
  #[error("local store unavailable: {0}")]
  Unavailable(String),

  /// A statement against one collection failed.
  #[error("{collection} operation failed: {source}")]
  Query {
    collection: Collection,
    #[source]
    source: rusqlite::Error,
  },

  /// A record could not be serialized for storage.
  #[error("failed to encode {collection} record `{id}`: {source}")]
  Encode {
    collection: Collection,
    id: String,
    #[source]
    source: serde_json::Error,
  },
}

impl StoreError {
  pub(crate) fn query(collection: Collection) -> impl FnOnce(rusqlite::Error) -> Self {
    move |source| Self::Query { collection, source }
  }
}

/// Errors raised while fetching the remote catalog.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("catalog source answered {0}")]
  Status(reqwest::StatusCode),

  #[error("catalog body is not a product list: {0}")]
  Body(#[from] serde_json::Error),
}

/// Errors surfaced by storefront operations.
#[derive(Debug, Error)]
pub enum ShopError {
  #[error(transparent)]
  Store(#[from] StoreError),

  #[error("catalog fetch failed: {0}")]
  FetchFailed(#[from] FetchError),

  #[error("product `{0}` is not in the current catalog")]
  ProductNotFound(ProductId),

  #[error("invalid quantity {0}: must be at least 1")]
  InvalidQuantity(i64),
}

impl ShopError {
  /// Whether the failure came from the shopper's input rather than from the
  /// store or the network.
  pub fn is_rejection(&self) -> bool {
    matches!(self, Self::ProductNotFound(_) | Self::InvalidQuantity(_))
  }
}
