//! SQLite-backed local store.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use super::schema;
use super::traits::Record;
use crate::error::StoreError;

/// Bookkeeping kept for a collection alongside its records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionMeta {
  /// Bumped every time the collection is replaced wholesale
  pub generation: u64,
  /// When the collection was last replaced wholesale
  pub replaced_at: Option<DateTime<Utc>>,
}

/// Local record store on a single SQLite connection.
///
/// Each operation runs on the blocking pool and holds the connection for its
/// whole duration, so operations are serialized and every operation is atomic
/// with respect to the others. Nothing spans more than one collection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
  /// Open or create the store at `path`, upgrading the schema if needed.
  pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
    let path = path.into();
    run_blocking(move || {
      // Ensure parent directory exists
      if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
          StoreError::Unavailable(format!(
            "Failed to create store directory {}: {}",
            parent.display(),
            e
          ))
        })?;
      }

      let conn = Connection::open(&path).map_err(|e| {
        StoreError::Unavailable(format!("Failed to open store at {}: {}", path.display(), e))
      })?;

      debug!(path = %path.display(), "store opened");
      Self::init(conn)
    })
    .await
  }

  /// Open a store that lives only as long as this handle.
  #[allow(dead_code)]
  pub async fn open_in_memory() -> Result<Self, StoreError> {
    run_blocking(|| {
      let conn = Connection::open_in_memory()
        .map_err(|e| StoreError::Unavailable(format!("Failed to open in-memory store: {}", e)))?;
      Self::init(conn)
    })
    .await
  }

  fn init(mut conn: Connection) -> Result<Self, StoreError> {
    schema::migrate(&mut conn)?;
    Ok(Self {
      conn: Arc::new(Mutex::new(conn)),
    })
  }

  /// Run `f` against the connection on the blocking pool.
  async fn with_conn<R, F>(&self, f: F) -> Result<R, StoreError>
  where
    R: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<R, StoreError> + Send + 'static,
  {
    let conn = Arc::clone(&self.conn);
    run_blocking(move || {
      let mut conn = conn
        .lock()
        .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))?;
      f(&mut conn)
    })
    .await
  }

  /// Every record in the collection, in insertion order.
  pub async fn get_all<T: Record>(&self) -> Result<Vec<T>, StoreError> {
    self.with_conn(|conn| read_all::<T>(conn)).await
  }

  /// Every record together with the collection's bookkeeping, read in one
  /// operation so a concurrent `replace_all` cannot split them.
  pub async fn get_all_with_meta<T: Record>(&self) -> Result<(Vec<T>, CollectionMeta), StoreError> {
    let collection = T::COLLECTION;
    self
      .with_conn(move |conn| {
        let records = read_all::<T>(conn)?;
        let meta = read_meta(conn, collection.name()).map_err(StoreError::query(collection))?;
        Ok((records, meta))
      })
      .await
  }

  /// Point lookup by key.
  #[allow(dead_code)]
  pub async fn get<T: Record>(&self, id: &str) -> Result<Option<T>, StoreError> {
    let id = id.to_owned();
    self.with_conn(move |conn| read_one::<T>(conn, &id)).await
  }

  /// Insert or replace a record by key.
  pub async fn put<T: Record>(&self, record: &T) -> Result<(), StoreError> {
    let record = record.clone();
    self.with_conn(move |conn| write_one(conn, &record)).await
  }

  /// Remove a record. Returns whether anything was removed; a missing key is
  /// not an error.
  pub async fn delete<T: Record>(&self, id: &str) -> Result<bool, StoreError> {
    let collection = T::COLLECTION;
    let id = id.to_owned();
    self
      .with_conn(move |conn| {
        let removed = conn
          .execute(
            &format!("DELETE FROM {} WHERE id = ?1", collection.name()),
            params![id],
          )
          .map_err(StoreError::query(collection))?;
        debug!(%collection, id = %id, removed, "delete");
        Ok(removed > 0)
      })
      .await
  }

  /// Remove every record in the collection.
  #[allow(dead_code)]
  pub async fn clear<T: Record>(&self) -> Result<(), StoreError> {
    let collection = T::COLLECTION;
    self
      .with_conn(move |conn| {
        conn
          .execute(&format!("DELETE FROM {}", collection.name()), [])
          .map_err(StoreError::query(collection))?;
        debug!(%collection, "cleared");
        Ok(())
      })
      .await
  }

  /// Read-modify-write one record as a single store operation.
  ///
  /// `f` receives the current record (if any) and returns the record to
  /// store; returning `None` leaves the collection untouched. Returns what
  /// was written.
  pub async fn update<T, F>(&self, id: &str, f: F) -> Result<Option<T>, StoreError>
  where
    T: Record,
    F: FnOnce(Option<T>) -> Option<T> + Send + 'static,
  {
    let collection = T::COLLECTION;
    let id = id.to_owned();
    self
      .with_conn(move |conn| {
        let tx = conn.transaction().map_err(StoreError::query(collection))?;

        let current = read_one::<T>(&tx, &id)?;
        let next = match f(current) {
          Some(next) => next,
          None => return Ok(None),
        };

        if next.key() != id {
          warn!(%collection, id = %id, key = next.key(), "update changed record key");
        }
        write_one(&tx, &next)?;
        tx.commit().map_err(StoreError::query(collection))?;

        Ok(Some(next))
      })
      .await
  }

  /// Swap the whole collection for `records` in one transaction.
  ///
  /// Readers see either the previous contents or the new ones, never an
  /// empty collection in between. Bumps the collection generation.
  pub async fn replace_all<T: Record>(&self, records: Vec<T>) -> Result<CollectionMeta, StoreError> {
    let collection = T::COLLECTION;
    self
      .with_conn(move |conn| {
        let tx = conn.transaction().map_err(StoreError::query(collection))?;

        tx.execute(&format!("DELETE FROM {}", collection.name()), [])
          .map_err(StoreError::query(collection))?;

        for record in &records {
          write_one(&tx, record)?;
        }

        tx.execute(
          "INSERT INTO store_meta (collection, generation, replaced_at)
           VALUES (?1, 1, datetime('now'))
           ON CONFLICT(collection) DO UPDATE SET
             generation = generation + 1,
             replaced_at = excluded.replaced_at",
          params![collection.name()],
        )
        .map_err(StoreError::query(collection))?;

        let meta = read_meta(&tx, collection.name()).map_err(StoreError::query(collection))?;
        tx.commit().map_err(StoreError::query(collection))?;

        debug!(%collection, count = records.len(), generation = meta.generation, "replaced");
        Ok(meta)
      })
      .await
  }

  /// Run raw SQL against the store, for tests that need rows the typed API
  /// cannot produce.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &str) -> Result<(), StoreError> {
    let sql = sql.to_owned();
    self
      .with_conn(move |conn| {
        conn
          .execute_batch(&sql)
          .map_err(|e| StoreError::Unavailable(e.to_string()))
      })
      .await
  }

  /// Generation and replacement time of the collection.
  pub async fn meta<T: Record>(&self) -> Result<CollectionMeta, StoreError> {
    let collection = T::COLLECTION;
    self
      .with_conn(move |conn| read_meta(conn, collection.name()).map_err(StoreError::query(collection)))
      .await
  }
}

async fn run_blocking<R, F>(f: F) -> Result<R, StoreError>
where
  R: Send + 'static,
  F: FnOnce() -> Result<R, StoreError> + Send + 'static,
{
  tokio::task::spawn_blocking(f)
    .await
    .map_err(|e| StoreError::Unavailable(format!("Store worker failed: {}", e)))?
}

fn read_all<T: Record>(conn: &Connection) -> Result<Vec<T>, StoreError> {
  let collection = T::COLLECTION;

  let mut stmt = conn
    .prepare(&format!(
      "SELECT id, data FROM {} ORDER BY rowid",
      collection.name()
    ))
    .map_err(StoreError::query(collection))?;

  let rows = stmt
    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)))
    .map_err(StoreError::query(collection))?;

  let mut records = Vec::new();
  for row in rows {
    let (id, data) = row.map_err(StoreError::query(collection))?;
    match serde_json::from_slice::<T>(&data) {
      Ok(record) => records.push(record),
      Err(e) => warn!(%collection, id = %id, error = %e, "skipping undecodable record"),
    }
  }

  Ok(records)
}

fn read_one<T: Record>(conn: &Connection, id: &str) -> Result<Option<T>, StoreError> {
  let collection = T::COLLECTION;

  let data: Option<Vec<u8>> = conn
    .query_row(
      &format!("SELECT data FROM {} WHERE id = ?1", collection.name()),
      params![id],
      |row| row.get(0),
    )
    .optional()
    .map_err(StoreError::query(collection))?;

  Ok(data.and_then(|data| match serde_json::from_slice(&data) {
    Ok(record) => Some(record),
    Err(e) => {
      warn!(%collection, id, error = %e, "ignoring undecodable record");
      None
    }
  }))
}

fn write_one<T: Record>(conn: &Connection, record: &T) -> Result<(), StoreError> {
  let collection = T::COLLECTION;
  let data = serde_json::to_vec(record).map_err(|source| StoreError::Encode {
    collection,
    id: record.key().to_owned(),
    source,
  })?;

  // Upsert in place so the row keeps its position
  conn
    .execute(
      &format!(
        "INSERT INTO {} (id, data, stored_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET data = excluded.data, stored_at = excluded.stored_at",
        collection.name()
      ),
      params![record.key(), data],
    )
    .map_err(StoreError::query(collection))?;

  Ok(())
}

fn read_meta(conn: &Connection, collection: &str) -> rusqlite::Result<CollectionMeta> {
  let row: Option<(i64, Option<String>)> = conn
    .query_row(
      "SELECT generation, replaced_at FROM store_meta WHERE collection = ?1",
      params![collection],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?;

  Ok(match row {
    Some((generation, replaced_at)) => CollectionMeta {
      generation: u64::try_from(generation).unwrap_or_default(),
      replaced_at: replaced_at.as_deref().and_then(parse_datetime),
    },
    None => CollectionMeta::default(),
  })
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  match chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
    Ok(dt) => Some(dt.and_utc()),
    Err(e) => {
      warn!(value = s, error = %e, "unparseable store timestamp");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cart::CartEntry;
  use crate::catalog::Product;
  use crate::testutil::{entry, product};

  #[tokio::test]
  async fn test_put_then_get_round_trips() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let record = product("p1", "Sumatra", 25.0);

    store.put(&record).await.unwrap();

    let loaded: Option<Product> = store.get("p1").await.unwrap();
    assert_eq!(loaded, Some(record));
  }

  #[tokio::test]
  async fn test_get_missing_is_none() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let loaded: Option<CartEntry> = store.get("nope").await.unwrap();
    assert!(loaded.is_none());
  }

  #[tokio::test]
  async fn test_put_is_an_upsert() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.put(&entry("a", 1)).await.unwrap();
    store.put(&entry("b", 1)).await.unwrap();
    store.put(&entry("a", 4)).await.unwrap();

    let all: Vec<CartEntry> = store.get_all().await.unwrap();
    assert_eq!(all.len(), 2);
    // Upsert keeps the original position
    assert_eq!(all[0].id.as_str(), "a");
    assert_eq!(all[0].quantity, 4);
  }

  #[tokio::test]
  async fn test_delete_twice_is_not_an_error() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.put(&entry("p1", 2)).await.unwrap();

    assert!(store.delete::<CartEntry>("p1").await.unwrap());
    assert!(store.get::<CartEntry>("p1").await.unwrap().is_none());

    assert!(!store.delete::<CartEntry>("p1").await.unwrap());
    assert!(store.get::<CartEntry>("p1").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_clear_then_get_all_is_empty() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.put(&product("p1", "Kona", 12.0)).await.unwrap();
    store.put(&product("p2", "Yirgacheffe", 14.5)).await.unwrap();

    store.clear::<Product>().await.unwrap();

    let all: Vec<Product> = store.get_all().await.unwrap();
    assert!(all.is_empty());
  }

  #[tokio::test]
  async fn test_collections_are_independent() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.put(&product("p1", "Kona", 12.0)).await.unwrap();
    store.put(&entry("p1", 3)).await.unwrap();

    store.clear::<Product>().await.unwrap();

    assert!(store.get::<Product>("p1").await.unwrap().is_none());
    assert_eq!(store.get::<CartEntry>("p1").await.unwrap().unwrap().quantity, 3);
  }

  #[tokio::test]
  async fn test_replace_all_drops_previous_ids() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .replace_all(vec![product("old1", "Old", 1.0), product("old2", "Older", 2.0)])
      .await
      .unwrap();

    let fresh = vec![product("new1", "New", 3.0)];
    let meta = store.replace_all(fresh.clone()).await.unwrap();

    let all: Vec<Product> = store.get_all().await.unwrap();
    assert_eq!(all, fresh);
    assert_eq!(meta.generation, 2);
    assert!(meta.replaced_at.is_some());
    assert_eq!(store.meta::<Product>().await.unwrap(), meta);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_records_and_meta_are_read_together() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    // Generation n always holds n products
    let writer = {
      let store = store.clone();
      tokio::spawn(async move {
        for generation in 1..=30 {
          let products = (0..generation)
            .map(|i| product(&format!("p{}", i), "Blend", 1.0))
            .collect::<Vec<_>>();
          store.replace_all(products).await.unwrap();
        }
      })
    };

    for _ in 0..60 {
      let (products, meta) = store.get_all_with_meta::<Product>().await.unwrap();
      assert_eq!(products.len() as u64, meta.generation);
    }
    writer.await.unwrap();

    let (products, meta) = store.get_all_with_meta::<Product>().await.unwrap();
    assert_eq!(products.len(), 30);
    assert_eq!(meta.generation, 30);
  }

  #[tokio::test]
  async fn test_meta_of_untouched_collection_is_default() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let meta = store.meta::<CartEntry>().await.unwrap();
    assert_eq!(meta, CollectionMeta::default());
  }

  #[tokio::test]
  async fn test_update_absent_writes_nothing() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let written = store
      .update::<CartEntry, _>("p1", |current| current)
      .await
      .unwrap();

    assert!(written.is_none());
    assert!(store.get_all::<CartEntry>().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_update_can_insert_and_modify() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let inserted = store
      .update("p1", |current: Option<CartEntry>| {
        Some(current.unwrap_or_else(|| entry("p1", 1)))
      })
      .await
      .unwrap();
    assert_eq!(inserted.unwrap().quantity, 1);

    let bumped = store
      .update("p1", |current: Option<CartEntry>| {
        current.map(|mut e| {
          e.quantity += 1;
          e
        })
      })
      .await
      .unwrap();
    assert_eq!(bumped.unwrap().quantity, 2);
    assert_eq!(store.get::<CartEntry>("p1").await.unwrap().unwrap().quantity, 2);
  }

  #[tokio::test]
  async fn test_concurrent_updates_do_not_lose_writes() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.put(&entry("p1", 1)).await.unwrap();

    let tasks: Vec<_> = (0..40)
      .map(|_| {
        let store = store.clone();
        tokio::spawn(async move {
          store
            .update("p1", |current: Option<CartEntry>| {
              current.map(|mut e| {
                e.quantity += 1;
                e
              })
            })
            .await
        })
      })
      .collect();

    for result in futures::future::join_all(tasks).await {
      result.unwrap().unwrap();
    }

    assert_eq!(store.get::<CartEntry>("p1").await.unwrap().unwrap().quantity, 41);
  }

  #[tokio::test]
  async fn test_reopen_keeps_records() {
    let path = std::env::temp_dir()
      .join(format!("brewcart-reopen-{}", std::process::id()))
      .join("store.db");
    let _ = std::fs::remove_file(&path);

    {
      let store = SqliteStore::open(&path).await.unwrap();
      store.put(&entry("p1", 5)).await.unwrap();
    }

    let store = SqliteStore::open(&path).await.unwrap();
    assert_eq!(store.get::<CartEntry>("p1").await.unwrap().unwrap().quantity, 5);

    drop(store);
    if let Some(dir) = path.parent() {
      let _ = std::fs::remove_dir_all(dir);
    }
  }

  #[tokio::test]
  async fn test_undecodable_rows_are_skipped() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.put(&entry("good", 1)).await.unwrap();
    store
      .execute_raw("INSERT INTO cart (id, data) VALUES ('bad', CAST('not json' AS BLOB))")
      .await
      .unwrap();

    let all: Vec<CartEntry> = store.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(store.get::<CartEntry>("bad").await.unwrap().is_none());
  }
}
