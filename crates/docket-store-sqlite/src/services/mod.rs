//! Per-entity services and their explicit wiring.
//!
//! A service is a cheap `Copy` view over the connection plus the sibling
//! services it resolves relations through. [`Services::new`] builds the whole
//! graph, leaves first, each time a unit of work reaches the database thread.

mod categories;
mod companies;
mod contracts;
mod matters;
mod risks;
mod users;

use docket_core::{
  category::Category,
  company::Company,
  contract::Contract,
  matter::Matter,
  page::{Page, PageQuery},
  risk::Risk,
  user::User,
};
use rusqlite::Connection;

pub use self::{
  categories::CategoriesService,
  companies::CompaniesService,
  contracts::ContractsService,
  matters::MattersService,
  risks::RisksService,
  users::UsersService,
};
use crate::{
  Result,
  gateway::{Gateway, Table},
  tx::Tx,
};

/// The operations every entity service exposes. Each takes an optional
/// transaction handle; with `None`, writes that span several statements
/// open their own.
pub trait EntityService<R: Table> {
  fn gateway(&self) -> Gateway<'_, R>;

  fn create(&self, input: R::Create, tx: Tx<'_>) -> Result<R>;

  /// Load → merge → save. Absent fields are untouched, explicit nulls clear.
  fn update(&self, id: i64, patch: R::Update, tx: Tx<'_>) -> Result<R>;

  /// Attach owned child collections to a row just read from its table.
  fn hydrate(&self, row: R, _tx: Tx<'_>) -> Result<R> { Ok(row) }

  fn find(&self, query: &PageQuery, with_deleted: bool, tx: Tx<'_>) -> Result<Page<R>> {
    let resolved = query.resolve(R::paginate_config())?;
    let (rows, total) = self.gateway().paginate(&resolved, with_deleted, tx)?;
    let data = rows
      .into_iter()
      .map(|row| self.hydrate(row, tx))
      .collect::<Result<_>>()?;
    Ok(Page { data, meta: resolved.meta(total) })
  }

  fn find_one(&self, id: i64, with_deleted: bool, tx: Tx<'_>) -> Result<R> {
    let row = self.gateway().find_one(id, with_deleted, tx)?;
    self.hydrate(row, tx)
  }

  fn delete(&self, id: i64, tx: Tx<'_>) -> Result<()> {
    self.gateway().soft_delete(id, tx)
  }

  fn restore(&self, id: i64, tx: Tx<'_>) -> Result<R> {
    self.gateway().restore(id, tx)?;
    self.find_one(id, false, tx)
  }

  fn hard_delete(&self, id: i64, tx: Tx<'_>) -> Result<()> {
    self.gateway().hard_delete(id, tx)
  }
}

/// The service graph for one connection.
#[derive(Clone, Copy)]
pub struct Services<'c> {
  pub users:      UsersService<'c>,
  pub categories: CategoriesService<'c>,
  pub companies:  CompaniesService<'c>,
  pub matters:    MattersService<'c>,
  pub contracts:  ContractsService<'c>,
  pub risks:      RisksService<'c>,
}

impl<'c> Services<'c> {
  pub fn new(conn: &'c Connection) -> Self {
    let users = UsersService::new(conn);
    let categories = CategoriesService::new(conn);
    let companies = CompaniesService::new(conn, categories);
    let matters = MattersService::new(conn, companies, users);
    let contracts = ContractsService::new(conn, matters, companies, users);
    let risks = RisksService::new(conn, matters, companies, users);
    Self { users, categories, companies, matters, contracts, risks }
  }
}

/// Maps an entity type to its service in the graph.
pub trait Wired: Table {
  fn service<'s>(services: &'s Services<'_>) -> &'s dyn EntityService<Self>;
}

impl Wired for User {
  fn service<'s>(services: &'s Services<'_>) -> &'s dyn EntityService<Self> {
    &services.users
  }
}

impl Wired for Category {
  fn service<'s>(services: &'s Services<'_>) -> &'s dyn EntityService<Self> {
    &services.categories
  }
}

impl Wired for Company {
  fn service<'s>(services: &'s Services<'_>) -> &'s dyn EntityService<Self> {
    &services.companies
  }
}

impl Wired for Matter {
  fn service<'s>(services: &'s Services<'_>) -> &'s dyn EntityService<Self> {
    &services.matters
  }
}

impl Wired for Contract {
  fn service<'s>(services: &'s Services<'_>) -> &'s dyn EntityService<Self> {
    &services.contracts
  }
}

impl Wired for Risk {
  fn service<'s>(services: &'s Services<'_>) -> &'s dyn EntityService<Self> {
    &services.risks
  }
}
