//! Local record store for the catalog cache and the cart.
//!
//! One versioned SQLite database holding two independent collections:
//! - `products`: last catalog fetched from the remote source
//! - `cart`: the shopper's cart entries
//!
//! Every operation is scoped to a single collection and completes or fails
//! on its own.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{CollectionMeta, SqliteStore};
pub use traits::{Collection, Record};
