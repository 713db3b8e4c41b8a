//! Contracts: the one service that composes lookups across matters,
//! companies and users and rewrites an owned child collection, all inside a
//! single transaction.

use chrono::Utc;
use docket_core::{
  contract::{Contract, ContractParty, CreateContract, Money, NewParty, UpdateContract},
  validate::merge,
};
use rusqlite::{Connection, Row, Transaction, params, types::Value};

use super::{CompaniesService, EntityService, MattersService, UsersService};
use crate::{
  Result,
  children,
  encode::{
    date, decimal, decode_date, decode_decimal, decode_dt, decode_enum,
    decode_opt_dt, dt, opt_int, opt_text, text,
  },
  gateway::{Gateway, Table},
  resolve::{patch_id, resolve, resolve_id, resolve_one, resolve_patch},
  tx::{Tx, execute_in_transaction},
};

impl Table for Contract {
  const TABLE: &'static str = "contracts";
  const SELECT: &'static str = "id, title, contract_type, status, priority, \
                                value_amount, value_currency, effective_date, \
                                execution_date, expiration_date, payment_terms, notes, \
                                matter_id, company_id, counterparty_id, legal_owner_id, \
                                created_by_id, created_at, updated_at, deleted_at";

  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    let amount = decode_decimal(row, "value_amount")?;
    let currency: Option<String> = row.get("value_currency")?;
    let value = match (amount, currency) {
      (Some(amount), Some(currency)) => Some(Money { amount, currency }),
      _ => None,
    };

    Ok(Self {
      id:              row.get("id")?,
      title:           row.get("title")?,
      contract_type:   decode_enum(row, "contract_type")?,
      status:          decode_enum(row, "status")?,
      priority:        decode_enum(row, "priority")?,
      value,
      effective_date:  decode_date(row, "effective_date")?,
      execution_date:  decode_date(row, "execution_date")?,
      expiration_date: decode_date(row, "expiration_date")?,
      payment_terms:   row.get("payment_terms")?,
      notes:           row.get("notes")?,
      matter_id:       row.get("matter_id")?,
      company_id:      row.get("company_id")?,
      counterparty_id: row.get("counterparty_id")?,
      legal_owner_id:  row.get("legal_owner_id")?,
      created_by_id:   row.get("created_by_id")?,
      parties:         Vec::new(),
      created_at:      decode_dt(row, "created_at")?,
      updated_at:      decode_dt(row, "updated_at")?,
      deleted_at:      decode_opt_dt(row, "deleted_at")?,
    })
  }

  fn writable(&self) -> Vec<(&'static str, Value)> {
    vec![
      ("title", text(&self.title)),
      ("contract_type", text(self.contract_type)),
      ("status", text(self.status)),
      ("priority", text(self.priority)),
      ("value_amount", decimal(self.value.as_ref().map(|v| v.amount))),
      (
        "value_currency",
        opt_text(self.value.as_ref().map(|v| v.currency.as_str())),
      ),
      ("effective_date", date(self.effective_date)),
      ("execution_date", date(self.execution_date)),
      ("expiration_date", date(self.expiration_date)),
      ("payment_terms", opt_text(self.payment_terms.as_deref())),
      ("notes", opt_text(self.notes.as_deref())),
      ("matter_id", opt_int(self.matter_id)),
      ("company_id", opt_int(self.company_id)),
      ("counterparty_id", opt_int(self.counterparty_id)),
      ("legal_owner_id", opt_int(self.legal_owner_id)),
      ("created_by_id", opt_int(self.created_by_id)),
      ("created_at", dt(self.created_at)),
      ("updated_at", dt(self.updated_at)),
    ]
  }
}

fn party_from_row(row: &Row<'_>) -> rusqlite::Result<ContractParty> {
  Ok(ContractParty {
    id:          row.get("id")?,
    contract_id: row.get("contract_id")?,
    company_id:  row.get("company_id")?,
    role:        row.get("role")?,
    signatory:   row.get("signatory")?,
  })
}

#[derive(Clone, Copy)]
pub struct ContractsService<'c> {
  conn:      &'c Connection,
  matters:   MattersService<'c>,
  companies: CompaniesService<'c>,
  users:     UsersService<'c>,
}

impl<'c> ContractsService<'c> {
  pub fn new(
    conn: &'c Connection,
    matters: MattersService<'c>,
    companies: CompaniesService<'c>,
    users: UsersService<'c>,
  ) -> Self {
    Self { conn, matters, companies, users }
  }

  /// Replace the contract's parties. Each party's company must be live.
  fn replace_parties(
    &self,
    tx: &Transaction<'_>,
    contract_id: i64,
    parties: Option<&[NewParty]>,
  ) -> Result<()> {
    children::replace(
      tx,
      "contract_parties",
      "contract_id",
      contract_id,
      parties,
      |tx, party| {
        let company = resolve_one("partiesInvolved.companyId", &party.company_id, |id| {
          self.companies.find_one(id, false, Some(tx))
        })?;
        tx.execute(
          "INSERT INTO contract_parties (contract_id, company_id, role, signatory)
           VALUES (?1, ?2, ?3, ?4)",
          params![contract_id, company.id, party.role.trim(), party.signatory],
        )?;
        Ok(())
      },
    )
  }
}

impl EntityService<Contract> for ContractsService<'_> {
  fn gateway(&self) -> Gateway<'_, Contract> { Gateway::new(self.conn) }

  fn hydrate(&self, mut contract: Contract, tx: Tx<'_>) -> Result<Contract> {
    let mut stmt = self.gateway().db(tx).prepare_cached(
      "SELECT id, contract_id, company_id, role, signatory
       FROM contract_parties WHERE contract_id = ?1 ORDER BY id",
    )?;
    contract.parties = stmt
      .query_map([contract.id], party_from_row)?
      .collect::<rusqlite::Result<_>>()?;
    Ok(contract)
  }

  fn create(&self, input: CreateContract, tx: Tx<'_>) -> Result<Contract> {
    execute_in_transaction(self.conn, tx, |tx| {
      let handle = Some(tx);
      let matter = resolve("matterId", input.matter_id.as_deref(), |id| {
        self.matters.find_one(id, false, handle)
      })?;
      let company = resolve("companyId", input.company_id.as_deref(), |id| {
        self.companies.find_one(id, false, handle)
      })?;
      let counterparty =
        resolve("counterpartyId", input.counterparty_id.as_deref(), |id| {
          self.companies.find_one(id, false, handle)
        })?;
      let legal_owner =
        resolve("legalOwnerId", input.legal_owner_id.as_deref(), |id| {
          self.users.find_one(id, false, handle)
        })?;
      let created_by = input
        .created_by_id
        .map(|id| {
          resolve_id("createdById", id, |id| self.users.find_one(id, false, handle))
        })
        .transpose()?;

      let now = Utc::now();
      let contract = Contract {
        id:              0,
        title:           input.title.trim().to_owned(),
        contract_type:   input.contract_type,
        status:          input.status.unwrap_or_default(),
        priority:        input.priority.unwrap_or_default(),
        value:           input.value,
        effective_date:  input.effective_date,
        execution_date:  input.execution_date,
        expiration_date: input.expiration_date,
        payment_terms:   input.payment_terms,
        notes:           input.notes,
        matter_id:       matter.map(|m| m.id),
        company_id:      company.map(|c| c.id),
        counterparty_id: counterparty.map(|c| c.id),
        legal_owner_id:  legal_owner.map(|u| u.id),
        created_by_id:   created_by.map(|u| u.id),
        parties:         Vec::new(),
        created_at:      now,
        updated_at:      now,
        deleted_at:      None,
      };

      let id = self.gateway().insert(&contract, handle)?;
      self.replace_parties(tx, id, Some(&input.parties_involved))?;
      self.find_one(id, false, handle)
    })
  }

  fn update(&self, id: i64, patch: UpdateContract, tx: Tx<'_>) -> Result<Contract> {
    execute_in_transaction(self.conn, tx, |tx| {
      let handle = Some(tx);
      let mut contract = self.gateway().find_one(id, false, handle)?;

      let matter = resolve_patch("matterId", &patch.matter_id, |id| {
        self.matters.find_one(id, false, handle)
      })?;
      let company = resolve_patch("companyId", &patch.company_id, |id| {
        self.companies.find_one(id, false, handle)
      })?;
      let counterparty =
        resolve_patch("counterpartyId", &patch.counterparty_id, |id| {
          self.companies.find_one(id, false, handle)
        })?;
      let legal_owner = resolve_patch("legalOwnerId", &patch.legal_owner_id, |id| {
        self.users.find_one(id, false, handle)
      })?;

      if let Some(title) = patch.title {
        contract.title = title.trim().to_owned();
      }
      if let Some(contract_type) = patch.contract_type {
        contract.contract_type = contract_type;
      }
      if let Some(status) = patch.status {
        contract.status = status;
      }
      if let Some(priority) = patch.priority {
        contract.priority = priority;
      }
      merge(&mut contract.value, patch.value);
      merge(&mut contract.effective_date, patch.effective_date);
      merge(&mut contract.execution_date, patch.execution_date);
      merge(&mut contract.expiration_date, patch.expiration_date);
      merge(&mut contract.payment_terms, patch.payment_terms);
      merge(&mut contract.notes, patch.notes);
      merge(&mut contract.matter_id, patch_id(matter));
      merge(&mut contract.company_id, patch_id(company));
      merge(&mut contract.counterparty_id, patch_id(counterparty));
      merge(&mut contract.legal_owner_id, patch_id(legal_owner));

      if let (Some(from), Some(until)) =
        (contract.effective_date, contract.expiration_date)
      {
        if until < from {
          return Err(
            docket_core::Error::invalid(
              "expirationDate",
              "must not be before effectiveDate",
            )
            .into(),
          );
        }
      }

      contract.updated_at = Utc::now();
      self.gateway().save(&contract, handle)?;
      self.replace_parties(tx, id, patch.parties_involved.as_deref())?;
      self.find_one(id, false, handle)
    })
  }
}
