//! Categories: flat labels attached to companies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  page::{Column, PaginateConfig, SortDirection},
  store::Resource,
  validate::{Checks, Validate},
};

/// Names are unique across every row, soft-deleted ones included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub id:         i64,
  pub name:       String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategory {
  pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategory {
  pub name: Option<String>,
}

impl Validate for CreateCategory {
  fn validate(&self) -> Result<()> {
    Checks::new().text("name", &self.name, 100).finish()
  }
}

impl Validate for UpdateCategory {
  fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    if let Some(name) = &self.name {
      checks.text("name", name, 100);
    }
    checks.finish()
  }
}

static COLUMNS: &[Column] = &[
  Column::new("id", "id").sortable().filterable(),
  Column::new("name", "name").sortable().searchable().filterable(),
  Column::new("createdAt", "created_at").sortable(),
  Column::new("updatedAt", "updated_at").sortable(),
];

static PAGINATE: PaginateConfig = PaginateConfig {
  columns:       COLUMNS,
  default_sort:  &[("id", SortDirection::Desc)],
  default_limit: PaginateConfig::DEFAULT_LIMIT,
  max_limit:     PaginateConfig::MAX_LIMIT,
};

impl Resource for Category {
  const NAME: &'static str = "Category";

  type Create = CreateCategory;
  type Update = UpdateCategory;

  fn id(&self) -> i64 { self.id }

  fn deleted_at(&self) -> Option<DateTime<Utc>> { self.deleted_at }

  fn paginate_config() -> &'static PaginateConfig { &PAGINATE }
}
