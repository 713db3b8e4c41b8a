//! Core types and trait definitions for the Docket practice store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::CrudStore`]; the API layer depends on
//! that abstraction only.

pub mod category;
pub mod company;
pub mod contract;
pub mod error;
pub mod lifecycle;
pub mod matter;
pub mod page;
pub mod risk;
pub mod store;
pub mod user;
pub mod validate;

pub use error::{Classify, Error, ErrorKind, Result};
