use chrono::Utc;
use docket_core::{
  company::{Company, CreateCompany, UpdateCompany},
  validate::merge,
};
use rusqlite::{Connection, Row, Transaction, types::Value};

use super::{CategoriesService, EntityService};
use crate::{
  Result,
  children,
  encode::{decode_dt, decode_opt_dt, dt, opt_text, text},
  gateway::{Gateway, Table},
  resolve::resolve_one,
  tx::{Tx, execute_in_transaction},
};

impl Table for Company {
  const TABLE: &'static str = "companies";
  const SELECT: &'static str = "id, name, registration_number, industry, website, \
                                notes, created_at, updated_at, deleted_at";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get("id")?,
      name:                row.get("name")?,
      registration_number: row.get("registration_number")?,
      industry:            row.get("industry")?,
      website:             row.get("website")?,
      notes:               row.get("notes")?,
      category_ids:        Vec::new(),
      created_at:          decode_dt(row, "created_at")?,
      updated_at:          decode_dt(row, "updated_at")?,
      deleted_at:          decode_opt_dt(row, "deleted_at")?,
    })
  }

  fn writable(&self) -> Vec<(&'static str, Value)> {
    vec![
      ("name", text(&self.name)),
      ("registration_number", opt_text(self.registration_number.as_deref())),
      ("industry", opt_text(self.industry.as_deref())),
      ("website", opt_text(self.website.as_deref())),
      ("notes", opt_text(self.notes.as_deref())),
      ("created_at", dt(self.created_at)),
      ("updated_at", dt(self.updated_at)),
    ]
  }
}

#[derive(Clone, Copy)]
pub struct CompaniesService<'c> {
  conn:       &'c Connection,
  categories: CategoriesService<'c>,
}

impl<'c> CompaniesService<'c> {
  pub fn new(conn: &'c Connection, categories: CategoriesService<'c>) -> Self {
    Self { conn, categories }
  }

  /// Replace the company's category links. Each id is resolved against the
  /// live categories; repeats collapse into one link.
  fn replace_categories(
    &self,
    tx: &Transaction<'_>,
    company_id: i64,
    category_ids: Option<&[String]>,
  ) -> Result<()> {
    children::replace(
      tx,
      "company_categories",
      "company_id",
      company_id,
      category_ids,
      |tx, raw| {
        let category = resolve_one("categoryIds", raw, |id| {
          self.categories.find_one(id, false, Some(tx))
        })?;
        tx.execute(
          "INSERT OR IGNORE INTO company_categories (company_id, category_id)
           VALUES (?1, ?2)",
          [company_id, category.id],
        )?;
        Ok(())
      },
    )
  }
}

impl EntityService<Company> for CompaniesService<'_> {
  fn gateway(&self) -> Gateway<'_, Company> { Gateway::new(self.conn) }

  fn hydrate(&self, mut company: Company, tx: Tx<'_>) -> Result<Company> {
    let mut stmt = self.gateway().db(tx).prepare_cached(
      "SELECT category_id FROM company_categories
       WHERE company_id = ?1 ORDER BY category_id",
    )?;
    company.category_ids = stmt
      .query_map([company.id], |row| row.get(0))?
      .collect::<rusqlite::Result<_>>()?;
    Ok(company)
  }

  fn create(&self, input: CreateCompany, tx: Tx<'_>) -> Result<Company> {
    execute_in_transaction(self.conn, tx, |tx| {
      let now = Utc::now();
      let company = Company {
        id:                  0,
        name:                input.name.trim().to_owned(),
        registration_number: input.registration_number,
        industry:            input.industry,
        website:             input.website,
        notes:               input.notes,
        category_ids:        Vec::new(),
        created_at:          now,
        updated_at:          now,
        deleted_at:          None,
      };
      let id = self.gateway().insert(&company, Some(tx))?;
      self.replace_categories(tx, id, Some(&input.category_ids))?;
      self.find_one(id, false, Some(tx))
    })
  }

  fn update(&self, id: i64, patch: UpdateCompany, tx: Tx<'_>) -> Result<Company> {
    execute_in_transaction(self.conn, tx, |tx| {
      let mut company = self.gateway().find_one(id, false, Some(tx))?;
      if let Some(name) = patch.name {
        company.name = name.trim().to_owned();
      }
      merge(&mut company.registration_number, patch.registration_number);
      merge(&mut company.industry, patch.industry);
      merge(&mut company.website, patch.website);
      merge(&mut company.notes, patch.notes);
      company.updated_at = Utc::now();

      self.gateway().save(&company, Some(tx))?;
      self.replace_categories(tx, id, patch.category_ids.as_deref())?;
      self.find_one(id, false, Some(tx))
    })
  }
}
