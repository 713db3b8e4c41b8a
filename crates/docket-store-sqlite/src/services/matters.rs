use chrono::Utc;
use docket_core::{
  matter::{CreateMatter, Matter, UpdateMatter},
  validate::merge,
};
use rusqlite::{Connection, Row, types::Value};

use super::{CompaniesService, EntityService, UsersService};
use crate::{
  Result,
  encode::{date, decode_date, decode_dt, decode_enum, decode_opt_dt, dt, opt_int, opt_text, text},
  gateway::{Gateway, Table},
  resolve::{patch_id, resolve, resolve_patch},
  tx::{Tx, execute_in_transaction},
};

impl Table for Matter {
  const TABLE: &'static str = "matters";
  const SELECT: &'static str = "id, title, reference, status, description, company_id, \
                                lead_id, opened_on, closed_on, created_at, updated_at, \
                                deleted_at";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get("id")?,
      title:       row.get("title")?,
      reference:   row.get("reference")?,
      status:      decode_enum(row, "status")?,
      description: row.get("description")?,
      company_id:  row.get("company_id")?,
      lead_id:     row.get("lead_id")?,
      opened_on:   decode_date(row, "opened_on")?,
      closed_on:   decode_date(row, "closed_on")?,
      created_at:  decode_dt(row, "created_at")?,
      updated_at:  decode_dt(row, "updated_at")?,
      deleted_at:  decode_opt_dt(row, "deleted_at")?,
    })
  }

  fn writable(&self) -> Vec<(&'static str, Value)> {
    vec![
      ("title", text(&self.title)),
      ("reference", opt_text(self.reference.as_deref())),
      ("status", text(self.status)),
      ("description", opt_text(self.description.as_deref())),
      ("company_id", opt_int(self.company_id)),
      ("lead_id", opt_int(self.lead_id)),
      ("opened_on", date(self.opened_on)),
      ("closed_on", date(self.closed_on)),
      ("created_at", dt(self.created_at)),
      ("updated_at", dt(self.updated_at)),
    ]
  }
}

#[derive(Clone, Copy)]
pub struct MattersService<'c> {
  conn:      &'c Connection,
  companies: CompaniesService<'c>,
  users:     UsersService<'c>,
}

impl<'c> MattersService<'c> {
  pub fn new(
    conn: &'c Connection,
    companies: CompaniesService<'c>,
    users: UsersService<'c>,
  ) -> Self {
    Self { conn, companies, users }
  }
}

impl EntityService<Matter> for MattersService<'_> {
  fn gateway(&self) -> Gateway<'_, Matter> { Gateway::new(self.conn) }

  fn create(&self, input: CreateMatter, tx: Tx<'_>) -> Result<Matter> {
    execute_in_transaction(self.conn, tx, |tx| {
      let tx = Some(tx);
      let company = resolve("companyId", input.company_id.as_deref(), |id| {
        self.companies.find_one(id, false, tx)
      })?;
      let lead = resolve("leadId", input.lead_id.as_deref(), |id| {
        self.users.find_one(id, false, tx)
      })?;

      let now = Utc::now();
      let matter = Matter {
        id:          0,
        title:       input.title.trim().to_owned(),
        reference:   input.reference,
        status:      input.status.unwrap_or_default(),
        description: input.description,
        company_id:  company.map(|c| c.id),
        lead_id:     lead.map(|u| u.id),
        opened_on:   input.opened_on,
        closed_on:   input.closed_on,
        created_at:  now,
        updated_at:  now,
        deleted_at:  None,
      };
      let id = self.gateway().insert(&matter, tx)?;
      self.find_one(id, false, tx)
    })
  }

  fn update(&self, id: i64, patch: UpdateMatter, tx: Tx<'_>) -> Result<Matter> {
    execute_in_transaction(self.conn, tx, |tx| {
      let tx = Some(tx);
      let mut matter = self.gateway().find_one(id, false, tx)?;

      let company = resolve_patch("companyId", &patch.company_id, |id| {
        self.companies.find_one(id, false, tx)
      })?;
      let lead = resolve_patch("leadId", &patch.lead_id, |id| {
        self.users.find_one(id, false, tx)
      })?;

      if let Some(title) = patch.title {
        matter.title = title.trim().to_owned();
      }
      if let Some(status) = patch.status {
        matter.status = status;
      }
      merge(&mut matter.reference, patch.reference);
      merge(&mut matter.description, patch.description);
      merge(&mut matter.company_id, patch_id(company));
      merge(&mut matter.lead_id, patch_id(lead));
      merge(&mut matter.opened_on, patch.opened_on);
      merge(&mut matter.closed_on, patch.closed_on);

      if let (Some(opened), Some(closed)) = (matter.opened_on, matter.closed_on) {
        if closed < opened {
          return Err(
            docket_core::Error::invalid("closedOn", "must not be before openedOn")
              .into(),
          );
        }
      }

      matter.updated_at = Utc::now();
      self.gateway().save(&matter, tx)?;
      self.find_one(id, false, tx)
    })
  }
}
