//! Product catalog: remote source, local cache and in-memory snapshot.

mod cache;
mod client;
mod snapshot;
mod types;

pub use cache::CatalogCache;
pub use client::{CatalogClient, CatalogSource};
pub use snapshot::{CatalogOrigin, CatalogSnapshot};
pub use types::{Product, ProductId};
