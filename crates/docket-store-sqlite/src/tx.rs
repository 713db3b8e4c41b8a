//! Transaction coordination.
//!
//! Every data-access method takes a [`Tx`]: `None` runs on the bare
//! connection, `Some` redirects the call through an open transaction owned
//! by the caller. [`execute_in_transaction`] is the only place a transaction
//! is opened, committed or rolled back.

use rusqlite::{Connection, Transaction};
use tracing::{debug, warn};

use crate::Result;

/// An optional handle to a caller-owned transaction.
pub type Tx<'a> = Option<&'a Transaction<'a>>;

/// Run `work` inside a single commit/rollback boundary.
///
/// With a caller-supplied handle the work simply joins it: nothing is
/// committed, rolled back or released here. Otherwise a fresh transaction is
/// opened, committed if `work` succeeds and rolled back if it fails. A panic
/// inside `work` drops the transaction, which rolls it back.
pub fn execute_in_transaction<T>(
  conn: &Connection,
  tx: Tx<'_>,
  work: impl FnOnce(&Transaction<'_>) -> Result<T>,
) -> Result<T> {
  if let Some(tx) = tx {
    return work(tx);
  }

  let tx = conn.unchecked_transaction()?;
  match work(&tx) {
    Ok(value) => {
      tx.commit()?;
      Ok(value)
    }
    Err(err) => {
      debug!(error = %err, "rolling back transaction");
      if let Err(rollback) = tx.rollback() {
        warn!(error = %rollback, "transaction rollback failed");
      }
      Err(err)
    }
  }
}
