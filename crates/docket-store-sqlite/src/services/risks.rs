use chrono::Utc;
use docket_core::{
  risk::{CreateRisk, Risk, UpdateRisk},
  validate::merge,
};
use rusqlite::{Connection, Row, types::Value};

use super::{CompaniesService, EntityService, MattersService, UsersService};
use crate::{
  Result,
  encode::{decimal, decode_decimal, decode_dt, decode_enum, decode_opt_dt, dt, opt_int, opt_text, text},
  gateway::{Gateway, Table},
  resolve::{patch_id, resolve, resolve_patch},
  tx::{Tx, execute_in_transaction},
};

impl Table for Risk {
  const TABLE: &'static str = "risks";
  const SELECT: &'static str = "id, title, category, score, likelihood, priority, \
                                tolerance, financial_impact_min, financial_impact_max, \
                                currency, mitigation_plan, mitigation_status, owner_id, \
                                matter_id, company_id, created_at, updated_at, deleted_at";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                   row.get("id")?,
      title:                row.get("title")?,
      category:             row.get("category")?,
      score:                row.get("score")?,
      likelihood:           decode_enum(row, "likelihood")?,
      priority:             decode_enum(row, "priority")?,
      tolerance:            decode_enum(row, "tolerance")?,
      financial_impact_min: decode_decimal(row, "financial_impact_min")?,
      financial_impact_max: decode_decimal(row, "financial_impact_max")?,
      currency:             row.get("currency")?,
      mitigation_plan:      row.get("mitigation_plan")?,
      mitigation_status:    decode_enum(row, "mitigation_status")?,
      owner_id:             row.get("owner_id")?,
      matter_id:            row.get("matter_id")?,
      company_id:           row.get("company_id")?,
      created_at:           decode_dt(row, "created_at")?,
      updated_at:           decode_dt(row, "updated_at")?,
      deleted_at:           decode_opt_dt(row, "deleted_at")?,
    })
  }

  fn writable(&self) -> Vec<(&'static str, Value)> {
    vec![
      ("title", text(&self.title)),
      ("category", text(&self.category)),
      ("score", Value::Integer(self.score)),
      ("likelihood", text(self.likelihood)),
      ("priority", text(self.priority)),
      ("tolerance", text(self.tolerance)),
      ("financial_impact_min", decimal(self.financial_impact_min)),
      ("financial_impact_max", decimal(self.financial_impact_max)),
      ("currency", opt_text(self.currency.as_deref())),
      ("mitigation_plan", opt_text(self.mitigation_plan.as_deref())),
      ("mitigation_status", text(self.mitigation_status)),
      ("owner_id", opt_int(self.owner_id)),
      ("matter_id", opt_int(self.matter_id)),
      ("company_id", opt_int(self.company_id)),
      ("created_at", dt(self.created_at)),
      ("updated_at", dt(self.updated_at)),
    ]
  }
}

/// Risks hang off exactly one matter or company. That rule is left to the
/// table's CHECK constraints; this service only resolves the references.
#[derive(Clone, Copy)]
pub struct RisksService<'c> {
  conn:      &'c Connection,
  matters:   MattersService<'c>,
  companies: CompaniesService<'c>,
  users:     UsersService<'c>,
}

impl<'c> RisksService<'c> {
  pub fn new(
    conn: &'c Connection,
    matters: MattersService<'c>,
    companies: CompaniesService<'c>,
    users: UsersService<'c>,
  ) -> Self {
    Self { conn, matters, companies, users }
  }
}

impl EntityService<Risk> for RisksService<'_> {
  fn gateway(&self) -> Gateway<'_, Risk> { Gateway::new(self.conn) }

  fn create(&self, input: CreateRisk, tx: Tx<'_>) -> Result<Risk> {
    execute_in_transaction(self.conn, tx, |tx| {
      let tx = Some(tx);
      let owner = resolve("ownerId", input.owner_id.as_deref(), |id| {
        self.users.find_one(id, false, tx)
      })?;
      let matter = resolve("matterId", input.matter_id.as_deref(), |id| {
        self.matters.find_one(id, false, tx)
      })?;
      let company = resolve("companyId", input.company_id.as_deref(), |id| {
        self.companies.find_one(id, false, tx)
      })?;

      let now = Utc::now();
      let risk = Risk {
        id:                   0,
        title:                input.title.trim().to_owned(),
        category:             input.category.trim().to_owned(),
        score:                input.score,
        likelihood:           input.likelihood,
        priority:             input.priority.unwrap_or_default(),
        tolerance:            input.tolerance,
        financial_impact_min: input.financial_impact_min,
        financial_impact_max: input.financial_impact_max,
        currency:             input.currency,
        mitigation_plan:      input.mitigation_plan,
        mitigation_status:    input.mitigation_status.unwrap_or_default(),
        owner_id:             owner.map(|u| u.id),
        matter_id:            matter.map(|m| m.id),
        company_id:           company.map(|c| c.id),
        created_at:           now,
        updated_at:           now,
        deleted_at:           None,
      };
      let id = self.gateway().insert(&risk, tx)?;
      self.find_one(id, false, tx)
    })
  }

  fn update(&self, id: i64, patch: UpdateRisk, tx: Tx<'_>) -> Result<Risk> {
    execute_in_transaction(self.conn, tx, |tx| {
      let tx = Some(tx);
      let mut risk = self.gateway().find_one(id, false, tx)?;

      let owner = resolve_patch("ownerId", &patch.owner_id, |id| {
        self.users.find_one(id, false, tx)
      })?;
      let matter = resolve_patch("matterId", &patch.matter_id, |id| {
        self.matters.find_one(id, false, tx)
      })?;
      let company = resolve_patch("companyId", &patch.company_id, |id| {
        self.companies.find_one(id, false, tx)
      })?;

      if let Some(title) = patch.title {
        risk.title = title.trim().to_owned();
      }
      if let Some(category) = patch.category {
        risk.category = category.trim().to_owned();
      }
      if let Some(score) = patch.score {
        risk.score = score;
      }
      if let Some(likelihood) = patch.likelihood {
        risk.likelihood = likelihood;
      }
      if let Some(priority) = patch.priority {
        risk.priority = priority;
      }
      if let Some(tolerance) = patch.tolerance {
        risk.tolerance = tolerance;
      }
      if let Some(status) = patch.mitigation_status {
        risk.mitigation_status = status;
      }
      merge(&mut risk.financial_impact_min, patch.financial_impact_min);
      merge(&mut risk.financial_impact_max, patch.financial_impact_max);
      merge(&mut risk.currency, patch.currency);
      merge(&mut risk.mitigation_plan, patch.mitigation_plan);
      merge(&mut risk.owner_id, patch_id(owner));
      merge(&mut risk.matter_id, patch_id(matter));
      merge(&mut risk.company_id, patch_id(company));

      risk.updated_at = Utc::now();
      self.gateway().save(&risk, tx)?;
      self.find_one(id, false, tx)
    })
  }
}
