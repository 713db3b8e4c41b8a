//! The repository gateway: generic single-table data access.
//!
//! [`Gateway`] knows nothing about relations. It reads and writes one table
//! through the [`Table`] mapping an entity provides, enforces the soft-delete
//! lifecycle, and runs allow-listed pagination queries. Every method takes a
//! [`Tx`] and runs on the caller's transaction when one is supplied.

use std::marker::PhantomData;

use chrono::Utc;
use docket_core::{
  lifecycle::TransitionError,
  page::{FilterOp, ResolvedQuery},
  store::Resource,
};
use rusqlite::{Connection, OptionalExtension as _, Row, params, params_from_iter, types::Value};

use crate::{Error, Result, encode, tx::Tx};

/// Row mapping for an entity stored in a single table.
pub trait Table: Resource {
  const TABLE: &'static str;

  /// Select list, in any order; rows are read by column name.
  const SELECT: &'static str;

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

  /// Every stored column except `id` and `deleted_at`, with its value.
  fn writable(&self) -> Vec<(&'static str, Value)>;
}

pub(crate) fn not_found<R: Resource>(id: i64) -> Error {
  docket_core::Error::NotFound { entity: R::NAME, id }.into()
}

fn refused<R: Resource>(id: i64, reason: TransitionError) -> Error {
  docket_core::Error::InvalidTransition { entity: R::NAME, id, reason }.into()
}

pub struct Gateway<'c, R> {
  conn:   &'c Connection,
  entity: PhantomData<fn() -> R>,
}

impl<R> Clone for Gateway<'_, R> {
  fn clone(&self) -> Self { *self }
}

impl<R> Copy for Gateway<'_, R> {}

impl<'c, R: Table> Gateway<'c, R> {
  pub fn new(conn: &'c Connection) -> Self { Self { conn, entity: PhantomData } }

  /// The connection to run on: the transaction when supplied.
  pub fn db<'a>(self, tx: Tx<'a>) -> &'a Connection
  where
    'c: 'a,
  {
    match tx {
      Some(tx) => &**tx,
      None => self.conn,
    }
  }

  pub fn find_one(&self, id: i64, with_deleted: bool, tx: Tx<'_>) -> Result<R> {
    let live = if with_deleted { "" } else { " AND deleted_at IS NULL" };
    let sql = format!("SELECT {} FROM {} WHERE id = ?1{live}", R::SELECT, R::TABLE);
    self
      .db(tx)
      .query_row(&sql, [id], R::from_row)
      .optional()?
      .ok_or_else(|| not_found::<R>(id))
  }

  /// Insert `row` and return the assigned id. `row.id()` is ignored.
  pub fn insert(&self, row: &R, tx: Tx<'_>) -> Result<i64> {
    let values = row.writable();
    let columns: Vec<&str> = values.iter().map(|(column, _)| *column).collect();
    let placeholders: Vec<String> =
      (1..=values.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
      "INSERT INTO {} ({}) VALUES ({})",
      R::TABLE,
      columns.join(", "),
      placeholders.join(", "),
    );

    let db = self.db(tx);
    db.execute(&sql, params_from_iter(values.into_iter().map(|(_, v)| v)))?;
    Ok(db.last_insert_rowid())
  }

  /// Write every column of an active row back to storage.
  pub fn save(&self, row: &R, tx: Tx<'_>) -> Result<()> {
    let values = row.writable();
    let assignments: Vec<String> = values
      .iter()
      .enumerate()
      .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
      .collect();
    let sql = format!(
      "UPDATE {} SET {} WHERE id = ?{} AND deleted_at IS NULL",
      R::TABLE,
      assignments.join(", "),
      values.len() + 1,
    );

    let params = values
      .into_iter()
      .map(|(_, v)| v)
      .chain(std::iter::once(Value::Integer(row.id())));
    let changed = self.db(tx).execute(&sql, params_from_iter(params))?;
    if changed == 0 {
      return Err(not_found::<R>(row.id()));
    }
    Ok(())
  }

  /// `Active → SoftDeleted`.
  pub fn soft_delete(&self, id: i64, tx: Tx<'_>) -> Result<()> {
    let current = self.find_one(id, true, tx)?;
    let at = Utc::now();
    current
      .lifecycle()
      .soft_delete(at)
      .map_err(|reason| refused::<R>(id, reason))?;

    let changed = self.db(tx).execute(
      &format!(
        "UPDATE {} SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        R::TABLE
      ),
      params![encode::encode_dt(at), id],
    )?;
    if changed == 0 {
      return Err(not_found::<R>(id));
    }
    Ok(())
  }

  /// `SoftDeleted → Active`.
  pub fn restore(&self, id: i64, tx: Tx<'_>) -> Result<()> {
    let current = self.find_one(id, true, tx)?;
    current
      .lifecycle()
      .restore()
      .map_err(|reason| refused::<R>(id, reason))?;

    self.db(tx).execute(
      &format!(
        "UPDATE {} SET deleted_at = NULL, updated_at = ?1 WHERE id = ?2",
        R::TABLE
      ),
      params![encode::encode_dt(Utc::now()), id],
    )?;
    Ok(())
  }

  /// Remove the row permanently, soft-deleted or not.
  pub fn hard_delete(&self, id: i64, tx: Tx<'_>) -> Result<()> {
    let current = self.find_one(id, true, tx)?;
    current
      .lifecycle()
      .hard_delete()
      .map_err(|reason| refused::<R>(id, reason))?;

    self
      .db(tx)
      .execute(&format!("DELETE FROM {} WHERE id = ?1", R::TABLE), [id])?;
    Ok(())
  }

  /// Run a resolved pagination query. Returns the page of rows and the total
  /// number of matching rows.
  ///
  /// Column names come from the entity's allow-list and are spliced into the
  /// statement; user-supplied values are always bound.
  pub fn paginate(
    &self,
    query: &ResolvedQuery,
    with_deleted: bool,
    tx: Tx<'_>,
  ) -> Result<(Vec<R>, usize)> {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if !with_deleted {
      clauses.push("deleted_at IS NULL".to_owned());
    }
    if let Some(term) = &query.search {
      if !query.search_columns.is_empty() {
        let likes: Vec<String> = query
          .search_columns
          .iter()
          .map(|column| {
            params.push(Value::Text(format!("%{term}%")));
            format!("{column} LIKE ?")
          })
          .collect();
        clauses.push(format!("({})", likes.join(" OR ")));
      }
    }
    for (column, op) in &query.filters {
      clauses.push(filter_clause(column, op, &mut params));
    }

    let filter = if clauses.is_empty() {
      String::new()
    } else {
      format!(" WHERE {}", clauses.join(" AND "))
    };

    let db = self.db(tx);
    let total: i64 = db.query_row(
      &format!("SELECT COUNT(*) FROM {}{filter}", R::TABLE),
      params_from_iter(params.iter()),
      |row| row.get(0),
    )?;

    let mut order: Vec<String> = query
      .sort
      .iter()
      .map(|(column, dir)| format!("{column} {dir}"))
      .collect();
    if !query.sort.iter().any(|(column, _)| *column == "id") {
      order.push("id ASC".to_owned());
    }

    let sql = format!(
      "SELECT {} FROM {}{filter} ORDER BY {} LIMIT ? OFFSET ?",
      R::SELECT,
      R::TABLE,
      order.join(", "),
    );
    params.push(Value::Integer(to_i64(query.limit)));
    params.push(Value::Integer(to_i64(query.offset())));

    let mut stmt = db.prepare(&sql)?;
    let rows = stmt
      .query_map(params_from_iter(params.iter()), R::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok((rows, usize::try_from(total).unwrap_or_default()))
  }
}

fn to_i64(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

fn filter_clause(column: &str, op: &FilterOp, params: &mut Vec<Value>) -> String {
  let mut bind = |value: &str| params.push(Value::Text(value.to_owned()));
  match op {
    FilterOp::Eq(v) => {
      bind(v);
      format!("{column} = ?")
    }
    FilterOp::Not(v) => {
      bind(v);
      format!("{column} <> ?")
    }
    FilterOp::Null => format!("{column} IS NULL"),
    FilterOp::NotNull => format!("{column} IS NOT NULL"),
    FilterOp::In(values) => {
      values.iter().for_each(|v| bind(v));
      let marks = vec!["?"; values.len()].join(", ");
      format!("{column} IN ({marks})")
    }
    FilterOp::Gt(v) => {
      bind(v);
      format!("{column} > ?")
    }
    FilterOp::Gte(v) => {
      bind(v);
      format!("{column} >= ?")
    }
    FilterOp::Lt(v) => {
      bind(v);
      format!("{column} < ?")
    }
    FilterOp::Lte(v) => {
      bind(v);
      format!("{column} <= ?")
    }
    // SQLite's LIKE is case-insensitive for ASCII.
    FilterOp::ILike(v) => {
      bind(&format!("%{v}%"));
      format!("{column} LIKE ?")
    }
  }
}
