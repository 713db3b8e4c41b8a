//! Risks raised against a matter or a company.
//!
//! A risk belongs to exactly one parent. That rule lives in storage as CHECK
//! constraints; DTO validation only covers field shapes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  Result,
  contract::Priority,
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
  Serialize,
  Deserialize,
  EnumString,
  Display,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Likelihood {
  Rare,
  Unlikely,
  Possible,
  Likely,
  AlmostCertain,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  EnumString,
  Display,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tolerance {
  Low,
  Medium,
  High,
}

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
pub enum MitigationStatus {
  #[default]
  NotStarted,
  InProgress,
  Completed,
}

pub const MAX_SCORE: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
  pub id:                   i64,
  pub title:                String,
  pub category:             String,
  pub score:                i64,
  pub likelihood:           Likelihood,
  pub priority:             Priority,
  pub tolerance:            Tolerance,
  pub financial_impact_min: Option<Decimal>,
  pub financial_impact_max: Option<Decimal>,
  pub currency:             Option<String>,
  pub mitigation_plan:      Option<String>,
  pub mitigation_status:    MitigationStatus,
  pub owner_id:             Option<i64>,
  pub matter_id:            Option<i64>,
  pub company_id:           Option<i64>,
  pub created_at:           DateTime<Utc>,
  pub updated_at:           DateTime<Utc>,
  pub deleted_at:           Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRisk {
  pub title:                String,
  pub category:             String,
  pub score:                i64,
  pub likelihood:           Likelihood,
  pub priority:             Option<Priority>,
  pub tolerance:            Tolerance,
  pub financial_impact_min: Option<Decimal>,
  pub financial_impact_max: Option<Decimal>,
  pub currency:             Option<String>,
  pub mitigation_plan:      Option<String>,
  pub mitigation_status:    Option<MitigationStatus>,
  pub owner_id:             Option<String>,
  pub matter_id:            Option<String>,
  pub company_id:           Option<String>,
}

impl CreateRisk {
  pub fn new(
    title: impl Into<String>,
    category: impl Into<String>,
    score: i64,
    likelihood: Likelihood,
    tolerance: Tolerance,
  ) -> Self {
    Self {
      title: title.into(),
      category: category.into(),
      score,
      likelihood,
      priority: None,
      tolerance,
      financial_impact_min: None,
      financial_impact_max: None,
      currency: None,
      mitigation_plan: None,
      mitigation_status: None,
      owner_id: None,
      matter_id: None,
      company_id: None,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRisk {
  pub title:                Option<String>,
  pub category:             Option<String>,
  pub score:                Option<i64>,
  pub likelihood:           Option<Likelihood>,
  pub priority:             Option<Priority>,
  pub tolerance:            Option<Tolerance>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub financial_impact_min: Patch<Decimal>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub financial_impact_max: Patch<Decimal>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub currency:             Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub mitigation_plan:      Patch<String>,
  pub mitigation_status:    Option<MitigationStatus>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub owner_id:             Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub matter_id:            Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub company_id:           Patch<String>,
}

fn check_impact(
  checks: &mut Checks,
  min: Option<Decimal>,
  max: Option<Decimal>,
) {
  for (field, value) in [("financialImpactMin", min), ("financialImpactMax", max)]
  {
    if let Some(value) = value {
      checks.check(field, !value.is_sign_negative(), "must not be negative");
    }
  }
  if let (Some(min), Some(max)) = (min, max) {
    checks.check(
      "financialImpactMax",
      max >= min,
      "must not be less than financialImpactMin",
    );
  }
}

impl Validate for CreateRisk {
  fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    checks
      .text("title", &self.title, 300)
      .text("category", &self.category, 100)
      .range("score", self.score, 0, MAX_SCORE);
    check_impact(&mut checks, self.financial_impact_min, self.financial_impact_max);
    if let Some(code) = &self.currency {
      checks.currency("currency", code);
    }
    for (field, raw) in [
      ("ownerId", &self.owner_id),
      ("matterId", &self.matter_id),
      ("companyId", &self.company_id),
    ] {
      if let Some(raw) = raw {
        checks.reference(field, raw);
      }
    }
    checks.finish()
  }
}

impl Validate for UpdateRisk {
  fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    if let Some(title) = &self.title {
      checks.text("title", title, 300);
    }
    if let Some(category) = &self.category {
      checks.text("category", category, 100);
    }
    if let Some(score) = self.score {
      checks.range("score", score, 0, MAX_SCORE);
    }
    check_impact(
      &mut checks,
      self.financial_impact_min.flatten(),
      self.financial_impact_max.flatten(),
    );
    if let Some(Some(code)) = &self.currency {
      checks.currency("currency", code);
    }
    for (field, raw) in [
      ("ownerId", &self.owner_id),
      ("matterId", &self.matter_id),
      ("companyId", &self.company_id),
    ] {
      if let Some(Some(raw)) = raw {
        checks.reference(field, raw);
      }
    }
    checks.finish()
  }
}

static COLUMNS: &[Column] = &[
  Column::new("id", "id").sortable().filterable(),
  Column::new("title", "title").sortable().searchable().filterable(),
  Column::new("category", "category").sortable().searchable().filterable(),
  Column::new("score", "score").sortable().filterable(),
  Column::new("likelihood", "likelihood").sortable().filterable(),
  Column::new("priority", "priority").sortable().filterable(),
  Column::new("tolerance", "tolerance").filterable(),
  Column::new("mitigationStatus", "mitigation_status").sortable().filterable(),
  Column::new("mitigationPlan", "mitigation_plan").searchable(),
  Column::new("ownerId", "owner_id").filterable(),
  Column::new("matterId", "matter_id").filterable(),
  Column::new("companyId", "company_id").filterable(),
  Column::new("createdAt", "created_at").sortable(),
];

static PAGINATE: PaginateConfig = PaginateConfig {
  columns:       COLUMNS,
  default_sort:  &[("score", SortDirection::Desc), ("id", SortDirection::Desc)],
  default_limit: PaginateConfig::DEFAULT_LIMIT,
  max_limit:     PaginateConfig::MAX_LIMIT,
};

impl Resource for Risk {
  const NAME: &'static str = "Risk";

  type Create = CreateRisk;
  type Update = UpdateRisk;

  fn id(&self) -> i64 { self.id }

  fn deleted_at(&self) -> Option<DateTime<Utc>> { self.deleted_at }

  fn paginate_config() -> &'static PaginateConfig { &PAGINATE }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn score_out_of_range() {
    let input = CreateRisk::new("Late delivery", "supply", 11, Likelihood::Likely, Tolerance::Low);
    let crate::Error::Validation(fields) = input.validate().unwrap_err() else {
      panic!("expected validation error");
    };
    assert_eq!(fields[0].to_string(), "score: must be between 0 and 10");
  }

  #[test]
  fn impact_bounds_are_ordered() {
    let mut input =
      CreateRisk::new("Penalty", "regulatory", 4, Likelihood::Possible, Tolerance::Medium);
    input.financial_impact_min = Some(Decimal::new(5000, 0));
    input.financial_impact_max = Some(Decimal::new(100, 0));
    assert!(input.validate().is_err());

    input.financial_impact_max = Some(Decimal::new(7500, 0));
    input.currency = Some("EUR".into());
    assert!(input.validate().is_ok());
  }

  #[test]
  fn parentless_risk_passes_dto_validation() {
    let input = CreateRisk::new("Orphan", "misc", 0, Likelihood::Rare, Tolerance::High);
    assert!(input.validate().is_ok());
  }
}
