//! Users: the people who own matters, contracts and risks.
//!
//! Credentials are not stored here; authentication happens upstream and
//! only the resulting user id reaches this service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  Result,
  page::{Column, PaginateConfig, SortDirection},
  store::Resource,
  validate::{Checks, Validate},
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  EnumString,
  Display,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
  Admin,
  #[default]
  Lawyer,
  Paralegal,
  Staff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         i64,
  /// Unique across all rows.
  pub email:      String,
  pub full_name:  String,
  pub role:       UserRole,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
  pub email:     String,
  pub full_name: String,
  pub role:      Option<UserRole>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
  pub email:     Option<String>,
  pub full_name: Option<String>,
  pub role:      Option<UserRole>,
}

impl Validate for CreateUser {
  fn validate(&self) -> Result<()> {
    Checks::new()
      .email("email", &self.email)
      .max_len("email", &self.email, 254)
      .text("fullName", &self.full_name, 200)
      .finish()
  }
}

impl Validate for UpdateUser {
  fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    if let Some(email) = &self.email {
      checks.email("email", email).max_len("email", email, 254);
    }
    if let Some(full_name) = &self.full_name {
      checks.text("fullName", full_name, 200);
    }
    checks.finish()
  }
}

static COLUMNS: &[Column] = &[
  Column::new("id", "id").sortable().filterable(),
  Column::new("email", "email").sortable().searchable().filterable(),
  Column::new("fullName", "full_name").sortable().searchable(),
  Column::new("role", "role").sortable().filterable(),
  Column::new("createdAt", "created_at").sortable(),
];

static PAGINATE: PaginateConfig = PaginateConfig {
  columns:       COLUMNS,
  default_sort:  &[("id", SortDirection::Desc)],
  default_limit: PaginateConfig::DEFAULT_LIMIT,
  max_limit:     PaginateConfig::MAX_LIMIT,
};

impl Resource for User {
  const NAME: &'static str = "User";

  type Create = CreateUser;
  type Update = UpdateUser;

  fn id(&self) -> i64 { self.id }

  fn deleted_at(&self) -> Option<DateTime<Utc>> { self.deleted_at }

  fn paginate_config() -> &'static PaginateConfig { &PAGINATE }
}
