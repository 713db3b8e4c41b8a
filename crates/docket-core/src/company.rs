//! Companies: clients, counterparties and contract signatories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  page::{Column, PaginateConfig, SortDirection},
  store::Resource,
  validate::{Checks, Patch, Validate},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
  pub id:                  i64,
  pub name:                String,
  pub registration_number: Option<String>,
  pub industry:            Option<String>,
  pub website:             Option<String>,
  pub notes:               Option<String>,
  /// Categories attached through the `company_categories` join table.
  pub category_ids:        Vec<i64>,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
  pub deleted_at:          Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompany {
  pub name:                String,
  pub registration_number: Option<String>,
  pub industry:            Option<String>,
  pub website:             Option<String>,
  pub notes:               Option<String>,
  #[serde(default)]
  pub category_ids:        Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompany {
  pub name:                Option<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub registration_number: Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub industry:            Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub website:             Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub notes:               Patch<String>,
  /// Replaces the whole set when present.
  pub category_ids:        Option<Vec<String>>,
}

impl Validate for CreateCompany {
  fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    checks.text("name", &self.name, 200);
    for id in &self.category_ids {
      checks.reference("categoryIds", id);
    }
    checks.finish()
  }
}

impl Validate for UpdateCompany {
  fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    if let Some(name) = &self.name {
      checks.text("name", name, 200);
    }
    for id in self.category_ids.iter().flatten() {
      checks.reference("categoryIds", id);
    }
    checks.finish()
  }
}

static COLUMNS: &[Column] = &[
  Column::new("id", "id").sortable().filterable(),
  Column::new("name", "name").sortable().searchable().filterable(),
  Column::new("registrationNumber", "registration_number")
    .searchable()
    .filterable(),
  Column::new("industry", "industry").sortable().searchable().filterable(),
  Column::new("createdAt", "created_at").sortable(),
];

static PAGINATE: PaginateConfig = PaginateConfig {
  columns:       COLUMNS,
  default_sort:  &[("name", SortDirection::Asc)],
  default_limit: PaginateConfig::DEFAULT_LIMIT,
  max_limit:     PaginateConfig::MAX_LIMIT,
};

impl Resource for Company {
  const NAME: &'static str = "Company";

  type Create = CreateCompany;
  type Update = UpdateCompany;

  fn id(&self) -> i64 { self.id }

  fn deleted_at(&self) -> Option<DateTime<Utc>> { self.deleted_at }

  fn paginate_config() -> &'static PaginateConfig { &PAGINATE }
}
