//! The `CrudStore` trait and the `Resource` description every entity
//! provides.
//!
//! The trait is implemented by storage backends (e.g. `docket-store-sqlite`).
//! The API layer is generic over it and never names a concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
  category::Category,
  company::Company,
  contract::Contract,
  error::Classify,
  lifecycle::Lifecycle,
  matter::Matter,
  page::{Page, PageQuery, PaginateConfig},
  risk::Risk,
  user::User,
  validate::Validate,
};

/// Static description of an entity type: its payloads and its pagination
/// allow-list.
pub trait Resource: Serialize + Send + Sync + Sized + 'static {
  /// Human-readable entity name used in error messages, e.g. `"Contract"`.
  const NAME: &'static str;

  type Create: DeserializeOwned + Validate + Send + 'static;
  type Update: DeserializeOwned + Validate + Send + 'static;

  fn id(&self) -> i64;

  fn deleted_at(&self) -> Option<DateTime<Utc>>;

  fn lifecycle(&self) -> Lifecycle {
    Lifecycle::from_deleted_at(self.deleted_at())
  }

  fn paginate_config() -> &'static PaginateConfig;

  /// Record the authenticated user on a create payload. Most entities do
  /// not track their author.
  fn stamp_actor(_input: &mut Self::Create, _user_id: i64) {}
}

/// Abstraction over a practice store backend for one resource type.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CrudStore<R: Resource>: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  /// Persist a new row and return it as stored.
  fn create(
    &self,
    input: R::Create,
  ) -> impl Future<Output = Result<R, Self::Error>> + Send + '_;

  /// Return one page of rows. Soft-deleted rows are included only when
  /// `with_deleted` is set.
  fn find(
    &self,
    query: PageQuery,
    with_deleted: bool,
  ) -> impl Future<Output = Result<Page<R>, Self::Error>> + Send + '_;

  /// Fetch a row by id. Soft-deleted rows count as not found unless
  /// `with_deleted` is set.
  fn find_one(
    &self,
    id: i64,
    with_deleted: bool,
  ) -> impl Future<Output = Result<R, Self::Error>> + Send + '_;

  /// Merge `patch` into the stored row. Absent fields are left untouched.
  fn update(
    &self,
    id: i64,
    patch: R::Update,
  ) -> impl Future<Output = Result<R, Self::Error>> + Send + '_;

  /// Soft delete: `Active → SoftDeleted`.
  fn delete(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// `SoftDeleted → Active`.
  fn restore(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<R, Self::Error>> + Send + '_;

  /// Remove the row permanently.
  fn hard_delete(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// A backend that stores every practice resource.
pub trait PracticeStore:
  CrudStore<User>
  + CrudStore<Category>
  + CrudStore<Company>
  + CrudStore<Matter>
  + CrudStore<Contract>
  + CrudStore<Risk>
  + 'static
{
}

impl<S> PracticeStore for S where
  S: CrudStore<User>
    + CrudStore<Category>
    + CrudStore<Company>
    + CrudStore<Matter>
    + CrudStore<Contract>
    + CrudStore<Risk>
    + 'static
{
}
