//! SQLite backend for the Docket practice store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Each store call ships one closure to
//! that thread; the closure builds the [`Services`] graph over the connection
//! and runs a whole unit of work, transaction included, synchronously.

mod encode;
mod schema;
mod store;

pub mod children;
pub mod error;
pub mod gateway;
pub mod resolve;
pub mod services;
pub mod tx;

pub use error::{Error, Result};
pub use services::{EntityService, Services, Wired};
pub use store::SqliteStore;
pub use tx::{Tx, execute_in_transaction};

#[cfg(test)]
mod tests;
