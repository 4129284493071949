//! Store schema and upgrade step.

use rusqlite::Connection;
use tracing::{debug, info};

use super::traits::Collection;
use crate::error::StoreError;

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Per-collection bookkeeping (generation counter and replacement time).
const META_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS store_meta (
    collection TEXT PRIMARY KEY,
    generation INTEGER NOT NULL DEFAULT 0,
    replaced_at TEXT
);
"#;

fn collection_schema(collection: Collection) -> String {
  format!(
    "CREATE TABLE IF NOT EXISTS {} (
         id TEXT PRIMARY KEY,
         data BLOB NOT NULL,
         stored_at TEXT NOT NULL DEFAULT (datetime('now'))
     );",
    collection.name()
  )
}

/// Bring the store up to `SCHEMA_VERSION`.
///
/// Only creates what is missing, so running it against an already current
/// store leaves every record in place. A store written by a newer version is
/// refused.
pub fn migrate(conn: &mut Connection) -> Result<(), StoreError> {
  let found: i64 = conn
    .query_row("PRAGMA user_version", [], |row| row.get(0))
    .map_err(|e| StoreError::Unavailable(format!("Failed to read schema version: {}", e)))?;

  if found > SCHEMA_VERSION {
    return Err(StoreError::Unavailable(format!(
      "store schema v{} is newer than supported v{}",
      found, SCHEMA_VERSION
    )));
  }

  let tx = conn
    .transaction()
    .map_err(|e| StoreError::Unavailable(format!("Failed to begin migration: {}", e)))?;

  for collection in Collection::ALL {
    tx.execute_batch(&collection_schema(collection))
      .map_err(|e| {
        StoreError::Unavailable(format!("Failed to create {} collection: {}", collection, e))
      })?;
  }

  tx.execute_batch(META_SCHEMA)
    .map_err(|e| StoreError::Unavailable(format!("Failed to create store metadata: {}", e)))?;

  tx.pragma_update(None, "user_version", SCHEMA_VERSION)
    .map_err(|e| StoreError::Unavailable(format!("Failed to record schema version: {}", e)))?;

  tx.commit()
    .map_err(|e| StoreError::Unavailable(format!("Failed to commit migration: {}", e)))?;

  if found < SCHEMA_VERSION {
    info!(from = found, to = SCHEMA_VERSION, "store schema upgraded");
  } else {
    debug!(version = found, "store schema current");
  }

  Ok(())
}
