//! Child-collection replacement for parent-owned rows (contract parties,
//! company categories).

use rusqlite::Transaction;
use tracing::debug;

use crate::Result;

/// Replace every child of `parent_id` in `table` with one row per spec.
///
/// `None` leaves the existing children untouched; `Some(&[])` removes them
/// all. Requires an open transaction so the delete and the inserts land
/// together; the caller owns the commit.
pub fn replace<S>(
  tx: &Transaction<'_>,
  table: &'static str,
  parent_column: &'static str,
  parent_id: i64,
  specs: Option<&[S]>,
  mut insert: impl FnMut(&Transaction<'_>, &S) -> Result<()>,
) -> Result<()> {
  let Some(specs) = specs else {
    return Ok(());
  };

  let removed = tx.execute(
    &format!("DELETE FROM {table} WHERE {parent_column} = ?1"),
    [parent_id],
  )?;
  for spec in specs {
    insert(tx, spec)?;
  }

  debug!(table, parent_id, removed, inserted = specs.len(), "replaced children");
  Ok(())
}
