use chrono::Utc;
use docket_core::category::{Category, CreateCategory, UpdateCategory};
use rusqlite::{Connection, Row, types::Value};

use super::EntityService;
use crate::{
  Result,
  encode::{decode_dt, decode_opt_dt, dt, text},
  gateway::{Gateway, Table},
  tx::Tx,
};

impl Table for Category {
  const TABLE: &'static str = "categories";
  const SELECT: &'static str = "id, name, created_at, updated_at, deleted_at";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get("id")?,
      name:       row.get("name")?,
      created_at: decode_dt(row, "created_at")?,
      updated_at: decode_dt(row, "updated_at")?,
      deleted_at: decode_opt_dt(row, "deleted_at")?,
    })
  }

  fn writable(&self) -> Vec<(&'static str, Value)> {
    vec![
      ("name", text(&self.name)),
      ("created_at", dt(self.created_at)),
      ("updated_at", dt(self.updated_at)),
    ]
  }
}

#[derive(Clone, Copy)]
pub struct CategoriesService<'c> {
  conn: &'c Connection,
}

impl<'c> CategoriesService<'c> {
  pub fn new(conn: &'c Connection) -> Self { Self { conn } }
}

impl EntityService<Category> for CategoriesService<'_> {
  fn gateway(&self) -> Gateway<'_, Category> { Gateway::new(self.conn) }

  fn create(&self, input: CreateCategory, tx: Tx<'_>) -> Result<Category> {
    let now = Utc::now();
    let category = Category {
      id:         0,
      name:       input.name.trim().to_owned(),
      created_at: now,
      updated_at: now,
      deleted_at: None,
    };
    let id = self.gateway().insert(&category, tx)?;
    self.find_one(id, false, tx)
  }

  fn update(&self, id: i64, patch: UpdateCategory, tx: Tx<'_>) -> Result<Category> {
    let mut category = self.gateway().find_one(id, false, tx)?;
    if let Some(name) = patch.name {
      category.name = name.trim().to_owned();
    }
    category.updated_at = Utc::now();
    self.gateway().save(&category, tx)?;
    self.find_one(id, false, tx)
  }
}
