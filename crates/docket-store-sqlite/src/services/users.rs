use chrono::Utc;
use docket_core::user::{CreateUser, UpdateUser, User};
use rusqlite::{Connection, Row, types::Value};

use super::EntityService;
use crate::{
  Result,
  encode::{decode_dt, decode_enum, decode_opt_dt, dt, text},
  gateway::{Gateway, Table},
  tx::Tx,
};

impl Table for User {
  const TABLE: &'static str = "users";
  const SELECT: &'static str =
    "id, email, full_name, role, created_at, updated_at, deleted_at";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get("id")?,
      email:      row.get("email")?,
      full_name:  row.get("full_name")?,
      role:       decode_enum(row, "role")?,
      created_at: decode_dt(row, "created_at")?,
      updated_at: decode_dt(row, "updated_at")?,
      deleted_at: decode_opt_dt(row, "deleted_at")?,
    })
  }

  fn writable(&self) -> Vec<(&'static str, Value)> {
    vec![
      ("email", text(&self.email)),
      ("full_name", text(&self.full_name)),
      ("role", text(self.role)),
      ("created_at", dt(self.created_at)),
      ("updated_at", dt(self.updated_at)),
    ]
  }
}

#[derive(Clone, Copy)]
pub struct UsersService<'c> {
  conn: &'c Connection,
}

impl<'c> UsersService<'c> {
  pub fn new(conn: &'c Connection) -> Self { Self { conn } }
}

impl EntityService<User> for UsersService<'_> {
  fn gateway(&self) -> Gateway<'_, User> { Gateway::new(self.conn) }

  fn create(&self, input: CreateUser, tx: Tx<'_>) -> Result<User> {
    let now = Utc::now();
    let user = User {
      id:         0,
      email:      input.email.trim().to_owned(),
      full_name:  input.full_name,
      role:       input.role.unwrap_or_default(),
      created_at: now,
      updated_at: now,
      deleted_at: None,
    };
    let id = self.gateway().insert(&user, tx)?;
    self.find_one(id, false, tx)
  }

  fn update(&self, id: i64, patch: UpdateUser, tx: Tx<'_>) -> Result<User> {
    let mut user = self.gateway().find_one(id, false, tx)?;
    if let Some(email) = patch.email {
      user.email = email.trim().to_owned();
    }
    if let Some(full_name) = patch.full_name {
      user.full_name = full_name;
    }
    if let Some(role) = patch.role {
      user.role = role;
    }
    user.updated_at = Utc::now();
    self.gateway().save(&user, tx)?;
    self.find_one(id, false, tx)
  }
}
