//! Contracts and their parties.
//!
//! A contract owns its [`ContractParty`] rows: they are written in the same
//! transaction as the contract and replaced wholesale on update, never
//! patched one by one.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  Result,
  page::{Column, PaginateConfig, SortDirection},
  store::Resource,
  validate::{Checks, Patch, Validate},
};

// ─── Enums ───────────────────────────────────────────────────────────────────

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
pub enum ContractType {
  Nda,
  Service,
  Employment,
  Licensing,
  Lease,
  Purchase,
  Partnership,
  Other,
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
pub enum ContractStatus {
  #[default]
  Draft,
  InReview,
  Negotiation,
  Executed,
  Expired,
  Terminated,
}

/// Shared by contracts and risks.
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
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
  Critical,
}

// ─── Value types ─────────────────────────────────────────────────────────────

/// A monetary amount. Stored as two columns; serialised with the amount as a
/// decimal string so no precision is lost in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
  pub amount:   Decimal,
  pub currency: String,
}

impl Money {
  fn check(&self, field: &str, checks: &mut Checks) {
    checks
      .check(field, !self.amount.is_sign_negative(), "amount must not be negative")
      .currency(field, &self.currency);
  }
}

// ─── Parties ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractParty {
  pub id:          i64,
  pub contract_id: i64,
  pub company_id:  i64,
  /// Free text, e.g. "licensor", "guarantor".
  pub role:        String,
  pub signatory:   Option<String>,
}

/// One entry of `partiesInvolved`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParty {
  pub company_id: String,
  pub role:       String,
  pub signatory:  Option<String>,
}

impl NewParty {
  fn check(&self, checks: &mut Checks) {
    checks
      .reference("partiesInvolved.companyId", &self.company_id)
      .text("partiesInvolved.role", &self.role, 100);
  }
}

// ─── Contract ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
  pub id:              i64,
  pub title:           String,
  pub contract_type:   ContractType,
  pub status:          ContractStatus,
  pub priority:        Priority,
  pub value:           Option<Money>,
  pub effective_date:  Option<NaiveDate>,
  pub execution_date:  Option<NaiveDate>,
  pub expiration_date: Option<NaiveDate>,
  pub payment_terms:   Option<String>,
  pub notes:           Option<String>,
  pub matter_id:       Option<i64>,
  /// The owning (client) company.
  pub company_id:      Option<i64>,
  pub counterparty_id: Option<i64>,
  /// Internal lawyer responsible for the contract.
  pub legal_owner_id:  Option<i64>,
  /// `None` only on rows imported before authorship was tracked.
  pub created_by_id:   Option<i64>,
  pub parties:         Vec<ContractParty>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  pub deleted_at:      Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContract {
  pub title:            String,
  pub contract_type:    ContractType,
  pub status:           Option<ContractStatus>,
  pub priority:         Option<Priority>,
  pub value:            Option<Money>,
  pub effective_date:   Option<NaiveDate>,
  pub execution_date:   Option<NaiveDate>,
  pub expiration_date:  Option<NaiveDate>,
  pub payment_terms:    Option<String>,
  pub notes:            Option<String>,
  pub matter_id:        Option<String>,
  pub company_id:       Option<String>,
  pub counterparty_id:  Option<String>,
  pub legal_owner_id:   Option<String>,
  #[serde(default)]
  pub parties_involved: Vec<NewParty>,
  /// Set from the authenticated user, never from the payload.
  #[serde(skip)]
  pub created_by_id:    Option<i64>,
}

impl CreateContract {
  /// A minimal payload with every optional field unset.
  pub fn new(title: impl Into<String>, contract_type: ContractType) -> Self {
    Self {
      title: title.into(),
      contract_type,
      status: None,
      priority: None,
      value: None,
      effective_date: None,
      execution_date: None,
      expiration_date: None,
      payment_terms: None,
      notes: None,
      matter_id: None,
      company_id: None,
      counterparty_id: None,
      legal_owner_id: None,
      parties_involved: Vec::new(),
      created_by_id: None,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContract {
  pub title:            Option<String>,
  pub contract_type:    Option<ContractType>,
  pub status:           Option<ContractStatus>,
  pub priority:         Option<Priority>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub value:            Patch<Money>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub effective_date:   Patch<NaiveDate>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub execution_date:   Patch<NaiveDate>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub expiration_date:  Patch<NaiveDate>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub payment_terms:    Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub notes:            Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub matter_id:        Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub company_id:       Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub counterparty_id:  Patch<String>,
  #[serde(default, with = "::serde_with::rust::double_option")]
  pub legal_owner_id:   Patch<String>,
  /// `None` keeps the current parties; `Some` replaces all of them.
  pub parties_involved: Option<Vec<NewParty>>,
}

fn check_refs<'a>(
  checks: &mut Checks,
  refs: impl IntoIterator<Item = (&'static str, Option<&'a String>)>,
) {
  for (field, raw) in refs {
    if let Some(raw) = raw {
      checks.reference(field, raw);
    }
  }
}

impl Validate for CreateContract {
  fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    checks.text("title", &self.title, 300);
    if let Some(value) = &self.value {
      value.check("value", &mut checks);
    }
    if let (Some(from), Some(until)) = (self.effective_date, self.expiration_date) {
      checks.check(
        "expirationDate",
        until >= from,
        "must not be before effectiveDate",
      );
    }
    check_refs(&mut checks, [
      ("matterId", self.matter_id.as_ref()),
      ("companyId", self.company_id.as_ref()),
      ("counterpartyId", self.counterparty_id.as_ref()),
      ("legalOwnerId", self.legal_owner_id.as_ref()),
    ]);
    for party in &self.parties_involved {
      party.check(&mut checks);
    }
    checks.finish()
  }
}

impl Validate for UpdateContract {
  fn validate(&self) -> Result<()> {
    let mut checks = Checks::new();
    if let Some(title) = &self.title {
      checks.text("title", title, 300);
    }
    if let Some(Some(value)) = &self.value {
      value.check("value", &mut checks);
    }
    check_refs(&mut checks, [
      ("matterId", self.matter_id.as_ref().and_then(Option::as_ref)),
      ("companyId", self.company_id.as_ref().and_then(Option::as_ref)),
      ("counterpartyId", self.counterparty_id.as_ref().and_then(Option::as_ref)),
      ("legalOwnerId", self.legal_owner_id.as_ref().and_then(Option::as_ref)),
    ]);
    for party in self.parties_involved.iter().flatten() {
      party.check(&mut checks);
    }
    checks.finish()
  }
}

static COLUMNS: &[Column] = &[
  Column::new("id", "id").sortable().filterable(),
  Column::new("title", "title").sortable().searchable().filterable(),
  Column::new("contractType", "contract_type").sortable().filterable(),
  Column::new("status", "status").sortable().filterable(),
  Column::new("priority", "priority").sortable().filterable(),
  Column::new("effectiveDate", "effective_date").sortable().filterable(),
  Column::new("expirationDate", "expiration_date").sortable().filterable(),
  Column::new("notes", "notes").searchable(),
  Column::new("matterId", "matter_id").filterable(),
  Column::new("companyId", "company_id").filterable(),
  Column::new("counterpartyId", "counterparty_id").filterable(),
  Column::new("legalOwnerId", "legal_owner_id").filterable(),
  Column::new("createdAt", "created_at").sortable(),
  Column::new("updatedAt", "updated_at").sortable(),
];

static PAGINATE: PaginateConfig = PaginateConfig {
  columns:       COLUMNS,
  default_sort:  &[("id", SortDirection::Desc)],
  default_limit: PaginateConfig::DEFAULT_LIMIT,
  max_limit:     PaginateConfig::MAX_LIMIT,
};

impl Resource for Contract {
  const NAME: &'static str = "Contract";

  type Create = CreateContract;
  type Update = UpdateContract;

  fn id(&self) -> i64 { self.id }

  fn deleted_at(&self) -> Option<DateTime<Utc>> { self.deleted_at }

  fn paginate_config() -> &'static PaginateConfig { &PAGINATE }

  fn stamp_actor(input: &mut CreateContract, user_id: i64) {
    input.created_by_id = Some(user_id);
  }
}
