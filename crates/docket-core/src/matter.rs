//! Matters: the unit of legal work that contracts and risks hang off.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  Result,
  page::{Column, PaginateConfig, SortDirection},
  store::Resource,
  validate::{Checks, Patch, Validate},
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
pub enum MatterStatus {
  #[default]
  Open,
  OnHold,
  Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matter {
  pub id:          i64,
  pub title:       String,
  /// Firm-internal file reference, e.g. `"2024-LIT-017"`.
  pub reference:   Option<String>,
  pub status:      MatterStatus,
  pub description: Option<String>,
  /// The client company.
  pub company_id:  Option<i64>,
  /// The responsible lawyer.
  pub lead_id:     Option<i64>,
  pub opened_on:   Option<NaiveDate>,
  pub closed_on:   Option<NaiveDate>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
  pub deleted_at:  Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatter {
  pub title:       String,
  pub reference:   Option<String>,
  pub status:      Option<MatterStatus>,
  pub description: Option<String>,
  pub company_id:  Option<String>,
  pub lead_id:     Option<String>,
  pub opened_on:   Option<NaiveDate>,
  pub closed_on:   Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatter {
  pub title:       Option<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub reference:   Patch<String>,
  pub status:      Option<MatterStatus>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub description: Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub company_id:  Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub lead_id:     Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub opened_on:   Patch<NaiveDate>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub closed_on:   Patch<NaiveDate>,
}

impl Validate for CreateMatter {
  fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    checks.text("title", &self.title, 300);
    if let Some(id) = &self.company_id {
      checks.reference("companyId", id);
    }
    if let Some(id) = &self.lead_id {
      checks.reference("leadId", id);
    }
    if let (Some(opened), Some(closed)) = (self.opened_on, self.closed_on) {
      checks.check("closedOn", closed >= opened, "must not be before openedOn");
    }
    checks.finish()
  }
}

impl Validate for UpdateMatter {
  fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    if let Some(title) = &self.title {
      checks.text("title", title, 300);
    }
    if let Some(Some(id)) = &self.company_id {
      checks.reference("companyId", id);
    }
    if let Some(Some(id)) = &self.lead_id {
      checks.reference("leadId", id);
    }
    checks.finish()
  }
}

static COLUMNS: &[Column] = &[
  Column::new("id", "id").sortable().filterable(),
  Column::new("title", "title").sortable().searchable().filterable(),
  Column::new("reference", "reference").sortable().searchable().filterable(),
  Column::new("status", "status").sortable().filterable(),
  Column::new("companyId", "company_id").filterable(),
  Column::new("leadId", "lead_id").filterable(),
  Column::new("openedOn", "opened_on").sortable().filterable(),
  Column::new("createdAt", "created_at").sortable(),
];

static PAGINATE: PaginateConfig = PaginateConfig {
  columns:       COLUMNS,
  default_sort:  &[("id", SortDirection::Desc)],
  default_limit: PaginateConfig::DEFAULT_LIMIT,
  max_limit:     PaginateConfig::MAX_LIMIT,
};

impl Resource for Matter {
  const NAME: &'static str = "Matter";

  type Create = CreateMatter;
  type Update = UpdateMatter;

  fn id(&self) -> i64 { self.id }

  fn deleted_at(&self) -> Option<DateTime<Utc>> { self.deleted_at }

  fn paginate_config() -> &'static PaginateConfig { &PAGINATE }
}
