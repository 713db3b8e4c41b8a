//! [`SqliteStore`]: the SQLite implementation of [`CrudStore`].

use std::{future::Future, path::Path};

use docket_core::{
  page::{Page, PageQuery},
  store::CrudStore,
};
use rusqlite::Transaction;
use tracing::info;

use crate::{
  Error, Result,
  schema::SCHEMA,
  services::{Services, Wired},
  tx::execute_in_transaction,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Docket practice store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    info!(path = %path.display(), "opened practice store");
    Ok(store)
  }

  /// Open an in-memory store for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `work` against the service graph on the database thread.
  ///
  /// Each service call inside `work` that writes more than one statement
  /// opens its own transaction.
  pub async fn with_services<T, F>(&self, work: F) -> Result<T>
  where
    F: FnOnce(&Services<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(work(&Services::new(conn))))
      .await?
  }

  /// Run `work` inside one transaction spanning every service call it makes.
  /// Pass the handle on as `Some(tx)`; the whole unit commits or rolls back
  /// together.
  pub async fn transaction<T, F>(&self, work: F) -> Result<T>
  where
    F: FnOnce(&Services<'_>, &Transaction<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let services = Services::new(conn);
        Ok(execute_in_transaction(conn, None, |tx| work(&services, tx)))
      })
      .await?
  }
}

// ─── CrudStore impl ──────────────────────────────────────────────────────────

impl<R: Wired> CrudStore<R> for SqliteStore {
  type Error = Error;

  fn create(
    &self,
    input: R::Create,
  ) -> impl Future<Output = Result<R>> + Send + '_ {
    self.with_services(move |services| R::service(services).create(input, None))
  }

  fn find(
    &self,
    query: PageQuery,
    with_deleted: bool,
  ) -> impl Future<Output = Result<Page<R>>> + Send + '_ {
    self.with_services(move |services| {
      R::service(services).find(&query, with_deleted, None)
    })
  }

  fn find_one(
    &self,
    id: i64,
    with_deleted: bool,
  ) -> impl Future<Output = Result<R>> + Send + '_ {
    self.with_services(move |services| {
      R::service(services).find_one(id, with_deleted, None)
    })
  }

  fn update(
    &self,
    id: i64,
    patch: R::Update,
  ) -> impl Future<Output = Result<R>> + Send + '_ {
    self.with_services(move |services| R::service(services).update(id, patch, None))
  }

  fn delete(&self, id: i64) -> impl Future<Output = Result<()>> + Send + '_ {
    self.with_services(move |services| R::service(services).delete(id, None))
  }

  fn restore(&self, id: i64) -> impl Future<Output = Result<R>> + Send + '_ {
    self.with_services(move |services| R::service(services).restore(id, None))
  }

  fn hard_delete(&self, id: i64) -> impl Future<Output = Result<()>> + Send + '_ {
    self.with_services(move |services| R::service(services).hard_delete(id, None))
  }
}
