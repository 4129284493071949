//! Record and collection types shared by the store.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// The independent record collections held by the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
  /// Cached copy of the remote catalog
  Products,
  /// Shopping cart entries
  Cart,
}

impl Collection {
  pub const ALL: [Collection; 2] = [Collection::Products, Collection::Cart];

  /// Name of the table backing this collection.
  pub fn name(self) -> &'static str {
    match self {
      Self::Products => "products",
      Self::Cart => "cart",
    }
  }
}

impl fmt::Display for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Trait for records that can be persisted in a collection.
///
/// Records are stored as JSON documents keyed by `key()`; the record type
/// decides which collection it lives in.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Collection this record type is stored in
  const COLLECTION: Collection;

  /// Unique key of this record within its collection
  fn key(&self) -> &str;
}
