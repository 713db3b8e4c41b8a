//! Integration tests for `SqliteStore` against an in-memory database.

use docket_core::{
  Classify, ErrorKind,
  category::{Category, CreateCategory, UpdateCategory},
  company::{Company, CreateCompany, UpdateCompany},
  contract::{Contract, ContractType, CreateContract, NewParty},
  matter::{CreateMatter, Matter},
  page::{Page, PageQuery},
  risk::{CreateRisk, Likelihood, Risk, Tolerance},
  store::CrudStore,
  user::{CreateUser, User},
};
use serde_json::json;

use crate::{EntityService, Error, Result, SqliteStore, Wired};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn create<R: Wired>(s: &SqliteStore, input: R::Create) -> Result<R> {
  <SqliteStore as CrudStore<R>>::create(s, input).await
}

async fn find<R: Wired>(s: &SqliteStore, pairs: &[(&str, &str)]) -> Result<Page<R>> {
  let query = PageQuery::from_pairs(pairs.iter().copied())?;
  <SqliteStore as CrudStore<R>>::find(s, query, false).await
}

async fn find_one<R: Wired>(s: &SqliteStore, id: i64, with_deleted: bool) -> Result<R> {
  <SqliteStore as CrudStore<R>>::find_one(s, id, with_deleted).await
}

async fn update<R: Wired>(s: &SqliteStore, id: i64, patch: R::Update) -> Result<R> {
  <SqliteStore as CrudStore<R>>::update(s, id, patch).await
}

async fn delete<R: Wired>(s: &SqliteStore, id: i64) -> Result<()> {
  <SqliteStore as CrudStore<R>>::delete(s, id).await
}

async fn restore<R: Wired>(s: &SqliteStore, id: i64) -> Result<R> {
  <SqliteStore as CrudStore<R>>::restore(s, id).await
}

async fn hard_delete<R: Wired>(s: &SqliteStore, id: i64) -> Result<()> {
  <SqliteStore as CrudStore<R>>::hard_delete(s, id).await
}

async fn count(s: &SqliteStore, table: &'static str) -> i64 {
  s.with_services(move |services| {
    let conn = services.users.gateway().db(None);
    Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
  })
  .await
  .unwrap()
}

async fn category(s: &SqliteStore, name: &str) -> Category {
  create(s, CreateCategory { name: name.into() }).await.unwrap()
}

async fn company(s: &SqliteStore, name: &str) -> Company {
  create(s, CreateCompany { name: name.into(), ..Default::default() })
    .await
    .unwrap()
}

async fn user(s: &SqliteStore, email: &str) -> User {
  create(s, CreateUser {
    email:     email.into(),
    full_name: "Avery Quinn".into(),
    role:      None,
  })
  .await
  .unwrap()
}

async fn matter(s: &SqliteStore, title: &str) -> Matter {
  create(s, CreateMatter { title: title.into(), ..Default::default() })
    .await
    .unwrap()
}

fn party(company: &Company, role: &str) -> NewParty {
  NewParty {
    company_id: company.id.to_string(),
    role:       role.into(),
    signatory:  None,
  }
}

fn patch<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
  serde_json::from_value(value).unwrap()
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_find_one() {
  let s = store().await;
  let created = category(&s, "Suppliers").await;
  assert!(created.id > 0);
  assert!(created.deleted_at.is_none());

  let fetched: Category = find_one(&s, created.id, false).await.unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn soft_delete_hides_row_unless_with_deleted() {
  let s = store().await;
  let c = category(&s, "Litigation").await;

  delete::<Category>(&s, c.id).await.unwrap();

  let err = find_one::<Category>(&s, c.id, false).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert_eq!(err.to_string(), format!("Category with ID {} not found", c.id));

  let hidden: Category = find_one(&s, c.id, true).await.unwrap();
  assert!(hidden.deleted_at.is_some());

  let page: Page<Category> = find(&s, &[]).await.unwrap();
  assert_eq!(page.meta.total_items, 0);
}

#[tokio::test]
async fn deleting_twice_is_refused() {
  let s = store().await;
  let c = category(&s, "Tax").await;
  delete::<Category>(&s, c.id).await.unwrap();

  let err = delete::<Category>(&s, c.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert!(err.to_string().contains("is already deleted"));
}

#[tokio::test]
async fn restore_active_row_is_refused() {
  let s = store().await;
  let c = category(&s, "Employment").await;

  let err = restore::<Category>(&s, c.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert!(err.to_string().contains("is not deleted"));
}

#[tokio::test]
async fn restore_brings_row_back() {
  let s = store().await;
  let c = category(&s, "Real estate").await;
  delete::<Category>(&s, c.id).await.unwrap();

  let restored: Category = restore(&s, c.id).await.unwrap();
  assert!(restored.deleted_at.is_none());
  assert!(find_one::<Category>(&s, c.id, false).await.is_ok());
}

#[tokio::test]
async fn hard_delete_removes_row_for_good() {
  let s = store().await;
  let c = category(&s, "IP").await;
  delete::<Category>(&s, c.id).await.unwrap();
  hard_delete::<Category>(&s, c.id).await.unwrap();

  let err = find_one::<Category>(&s, c.id, true).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert!(hard_delete::<Category>(&s, c.id).await.is_err());
}

#[tokio::test]
async fn update_missing_row_is_not_found() {
  let s = store().await;
  let err = update::<Category>(&s, 404, UpdateCategory { name: Some("x".into()) })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ─── Constraints ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_category_name_conflicts() {
  let s = store().await;
  category(&s, "Banking").await;

  let err = create::<Category>(&s, CreateCategory { name: "Banking".into() })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn soft_deleted_names_stay_reserved() {
  let s = store().await;
  let c = category(&s, "Insurance").await;
  delete::<Category>(&s, c.id).await.unwrap();

  let err = create::<Category>(&s, CreateCategory { name: "Insurance".into() })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn duplicate_user_email_conflicts() {
  let s = store().await;
  user(&s, "avery@firm.example").await;
  let err = create::<User>(&s, CreateUser {
    email:     "avery@firm.example".into(),
    full_name: "Someone Else".into(),
    role:      None,
  })
  .await
  .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn hard_deleting_a_referenced_company_conflicts() {
  let s = store().await;
  let acme = company(&s, "Acme").await;
  let mut input = CreateContract::new("Supply agreement", ContractType::Purchase);
  input.parties_involved = vec![party(&acme, "supplier")];
  create::<Contract>(&s, input).await.unwrap();

  let err = hard_delete::<Company>(&s, acme.id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
  assert!(find_one::<Company>(&s, acme.id, false).await.is_ok());
}

#[tokio::test]
async fn risk_needs_exactly_one_parent() {
  let s = store().await;
  let m = matter(&s, "Acme v. Globex").await;
  let acme = company(&s, "Acme").await;

  let orphan = CreateRisk::new("Missed deadline", "procedural", 6, Likelihood::Possible, Tolerance::Low);
  let err = create::<Risk>(&s, orphan.clone()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert_eq!(err.details(), ["risk must belong to a matter or a company"]);

  let mut both = orphan.clone();
  both.matter_id = Some(m.id.to_string());
  both.company_id = Some(acme.id.to_string());
  let err = create::<Risk>(&s, both).await.unwrap_err();
  assert!(matches!(err, Error::Check { ref constraint, .. } if constraint == "chk_risks_single_parent"));

  let mut scoped = orphan;
  scoped.matter_id = Some(m.id.to_string());
  let risk: Risk = create(&s, scoped).await.unwrap();
  assert_eq!(risk.matter_id, Some(m.id));
  assert_eq!(count(&s, "risks").await, 1);
}

#[tokio::test]
async fn clearing_a_risks_only_parent_is_rejected() {
  let s = store().await;
  let m = matter(&s, "Data breach").await;
  let mut input = CreateRisk::new("Regulator fine", "regulatory", 8, Likelihood::Likely, Tolerance::Low);
  input.matter_id = Some(m.id.to_string());
  let risk: Risk = create(&s, input).await.unwrap();

  let err = update::<Risk>(&s, risk.id, patch(json!({ "matterId": null })))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let unchanged: Risk = find_one(&s, risk.id, false).await.unwrap();
  assert_eq!(unchanged.matter_id, Some(m.id));
}

// ─── Pagination ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_page_of_categories() {
  let s = store().await;
  for i in 1..=12 {
    category(&s, &format!("Category {i:02}")).await;
  }

  let page: Page<Category> = find(&s, &[("page", "2"), ("limit", "5")]).await.unwrap();
  assert_eq!(page.data.len(), 5);
  assert_eq!(page.meta.current_page, 2);
  assert_eq!(page.meta.items_per_page, 5);
  assert_eq!(page.meta.total_items, 12);
  assert_eq!(page.meta.total_pages, 3);
  // Default order is newest first.
  assert_eq!(page.data[0].name, "Category 07");
}

#[tokio::test]
async fn search_and_filter() {
  let s = store().await;
  for name in ["Acme Holdings", "Globex", "Acme Logistics"] {
    company(&s, name).await;
  }

  let page: Page<Company> = find(&s, &[("search", "acme")]).await.unwrap();
  let names: Vec<_> = page.data.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, ["Acme Holdings", "Acme Logistics"]);

  let page: Page<Company> = find(&s, &[("filter.name", "$ilike:LOGIST")]).await.unwrap();
  assert_eq!(page.meta.total_items, 1);

  let page: Page<Company> = find(&s, &[("filter.name", "$in:Globex,Initech")]).await.unwrap();
  assert_eq!(page.data[0].name, "Globex");
}

#[tokio::test]
async fn unknown_sort_column_is_rejected() {
  let s = store().await;
  let err = find::<Company>(&s, &[("sortBy", "deletedAt:ASC")]).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

// ─── Relations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_relation_names_entity_and_field() {
  let s = store().await;
  let mut input = CreateContract::new("NDA", ContractType::Nda);
  input.matter_id = Some("42".into());

  let err = create::<Contract>(&s, input).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert!(err.to_string().contains("Matter with ID 42 not found"));
  assert!(err.to_string().contains("matterId"));
  assert_eq!(count(&s, "contracts").await, 0);
}

#[tokio::test]
async fn soft_deleted_rows_cannot_be_referenced() {
  let s = store().await;
  let m = matter(&s, "Closed file").await;
  delete::<Matter>(&s, m.id).await.unwrap();

  let mut input = CreateContract::new("Late addendum", ContractType::Service);
  input.matter_id = Some(m.id.to_string());
  let err = create::<Contract>(&s, input).await.unwrap_err();
  assert!(matches!(err, Error::RelationNotFound { entity: "Matter", .. }));
}

#[tokio::test]
async fn contract_records_relations_and_author() {
  let s = store().await;
  let lawyer = user(&s, "lawyer@firm.example").await;
  let client = company(&s, "Client Co").await;
  let other = company(&s, "Other Side Ltd").await;
  let m = matter(&s, "Client Co licensing").await;

  let mut input: CreateContract = patch(json!({
    "title": "Software licence",
    "contractType": "licensing",
    "value": { "amount": "12500.50", "currency": "EUR" },
    "effectiveDate": "2025-01-01",
    "expirationDate": "2026-01-01",
    "matterId": m.id.to_string(),
    "companyId": client.id.to_string(),
    "counterpartyId": other.id.to_string(),
    "legalOwnerId": lawyer.id.to_string(),
  }));
  input.parties_involved = vec![party(&client, "licensee"), party(&other, "licensor")];
  input.created_by_id = Some(lawyer.id);

  let contract: Contract = create(&s, input).await.unwrap();
  assert_eq!(contract.matter_id, Some(m.id));
  assert_eq!(contract.counterparty_id, Some(other.id));
  assert_eq!(contract.created_by_id, Some(lawyer.id));
  assert_eq!(contract.value.as_ref().unwrap().amount.to_string(), "12500.50");
  let roles: Vec<_> = contract.parties.iter().map(|p| p.role.as_str()).collect();
  assert_eq!(roles, ["licensee", "licensor"]);

  let fetched: Contract = find_one(&s, contract.id, false).await.unwrap();
  assert_eq!(fetched, contract);
}

#[tokio::test]
async fn contract_needs_no_matter_or_company() {
  let s = store().await;
  let contract: Contract = create(&s, CreateContract::new("Standalone NDA", ContractType::Nda))
    .await
    .unwrap();
  assert!(contract.matter_id.is_none());
  assert!(contract.company_id.is_none());
  assert!(contract.parties.is_empty());
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_party_rolls_back_the_whole_contract() {
  let s = store().await;
  let acme = company(&s, "Acme").await;

  let mut input = CreateContract::new("Framework agreement", ContractType::Service);
  input.parties_involved = vec![
    party(&acme, "client"),
    NewParty { company_id: "999".into(), role: "vendor".into(), signatory: None },
  ];

  let err = create::<Contract>(&s, input).await.unwrap_err();
  assert!(matches!(err, Error::RelationNotFound { field: "partiesInvolved.companyId", id: 999, .. }));
  assert_eq!(count(&s, "contracts").await, 0);
  assert_eq!(count(&s, "contract_parties").await, 0);
}

#[tokio::test]
async fn failed_update_leaves_contract_untouched() {
  let s = store().await;
  let acme = company(&s, "Acme").await;
  let mut input = CreateContract::new("Lease", ContractType::Lease);
  input.parties_involved = vec![party(&acme, "tenant")];
  let original: Contract = create(&s, input).await.unwrap();

  let err = update::<Contract>(&s, original.id, patch(json!({
    "title": "Lease (amended)",
    "partiesInvolved": [{ "companyId": "999", "role": "landlord" }],
  })))
  .await
  .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let current: Contract = find_one(&s, original.id, false).await.unwrap();
  assert_eq!(current, original);
}

#[tokio::test]
async fn parties_replaced_only_when_given() {
  let s = store().await;
  let acme = company(&s, "Acme").await;
  let globex = company(&s, "Globex").await;
  let mut input = CreateContract::new("Partnership", ContractType::Partnership);
  input.parties_involved = vec![party(&acme, "partner"), party(&globex, "partner")];
  let contract: Contract = create(&s, input).await.unwrap();

  // Omitted: untouched.
  let kept: Contract = update(&s, contract.id, patch(json!({ "status": "negotiation" })))
    .await
    .unwrap();
  assert_eq!(kept.parties, contract.parties);

  // Given: replaced wholesale.
  let replaced: Contract = update(&s, contract.id, patch(json!({
    "partiesInvolved": [{ "companyId": globex.id.to_string(), "role": "sole partner" }],
  })))
  .await
  .unwrap();
  assert_eq!(replaced.parties.len(), 1);
  assert_eq!(replaced.parties[0].company_id, globex.id);
  assert_eq!(replaced.parties[0].role, "sole partner");
  assert_eq!(count(&s, "contract_parties").await, 1);

  // Empty: cleared.
  let cleared: Contract = update(&s, contract.id, patch(json!({ "partiesInvolved": [] })))
    .await
    .unwrap();
  assert!(cleared.parties.is_empty());
}

#[tokio::test]
async fn explicit_null_clears_and_absent_keeps() {
  let s = store().await;
  let mut input = CreateContract::new("Services", ContractType::Service);
  input.notes = Some("first draft".into());
  input.payment_terms = Some("net 30".into());
  let contract: Contract = create(&s, input).await.unwrap();

  let updated: Contract = update(&s, contract.id, patch(json!({ "notes": null })))
    .await
    .unwrap();
  assert_eq!(updated.notes, None);
  assert_eq!(updated.payment_terms.as_deref(), Some("net 30"));
  assert!(updated.updated_at >= contract.updated_at);
  assert_eq!(updated.created_at, contract.created_at);
}

#[tokio::test]
async fn hard_deleting_a_contract_cascades_to_parties() {
  let s = store().await;
  let acme = company(&s, "Acme").await;
  let mut input = CreateContract::new("Employment", ContractType::Employment);
  input.parties_involved = vec![party(&acme, "employer")];
  let contract: Contract = create(&s, input).await.unwrap();

  delete::<Contract>(&s, contract.id).await.unwrap();
  assert_eq!(count(&s, "contract_parties").await, 1);

  hard_delete::<Contract>(&s, contract.id).await.unwrap();
  assert_eq!(count(&s, "contract_parties").await, 0);
}

#[tokio::test]
async fn caller_transaction_spans_services() {
  let s = store().await;

  let result: Result<()> = s
    .transaction(|services, tx| {
      let cat = services
        .categories
        .create(CreateCategory { name: "Energy".into() }, Some(tx))?;
      services.companies.create(
        CreateCompany {
          name: "Windfarm plc".into(),
          category_ids: vec![cat.id.to_string()],
          ..Default::default()
        },
        Some(tx),
      )?;
      Err(Error::Conflict("abandon".into()))
    })
    .await;

  assert!(result.is_err());
  assert_eq!(count(&s, "categories").await, 0);
  assert_eq!(count(&s, "companies").await, 0);
  assert_eq!(count(&s, "company_categories").await, 0);
}

#[tokio::test]
async fn caller_transaction_commits_together() {
  let s = store().await;

  let company: Company = s
    .transaction(|services, tx| {
      let cat = services
        .categories
        .create(CreateCategory { name: "Shipping".into() }, Some(tx))?;
      services.companies.create(
        CreateCompany {
          name: "Oceanic".into(),
          category_ids: vec![cat.id.to_string()],
          ..Default::default()
        },
        Some(tx),
      )
    })
    .await
    .unwrap();

  assert_eq!(company.category_ids.len(), 1);
  assert_eq!(count(&s, "company_categories").await, 1);
}

// ─── Company categories ──────────────────────────────────────────────────────

#[tokio::test]
async fn company_categories_are_replaced_and_deduplicated() {
  let s = store().await;
  let a = category(&s, "A").await;
  let b = category(&s, "B").await;

  let acme: Company = create(&s, CreateCompany {
    name: "Acme".into(),
    category_ids: vec![a.id.to_string(), a.id.to_string()],
    ..Default::default()
  })
  .await
  .unwrap();
  assert_eq!(acme.category_ids, [a.id]);

  let renamed: Company = update(&s, acme.id, UpdateCompany {
    name: Some("Acme Corp".into()),
    ..Default::default()
  })
  .await
  .unwrap();
  assert_eq!(renamed.category_ids, [a.id]);

  let moved: Company = update(&s, acme.id, UpdateCompany {
    category_ids: Some(vec![b.id.to_string()]),
    ..Default::default()
  })
  .await
  .unwrap();
  assert_eq!(moved.category_ids, [b.id]);
}

#[tokio::test]
async fn unknown_category_is_a_scoped_not_found() {
  let s = store().await;
  let err = create::<Company>(&s, CreateCompany {
    name: "Nobody".into(),
    category_ids: vec!["77".into()],
    ..Default::default()
  })
  .await
  .unwrap_err();
  assert!(err.to_string().contains("Category with ID 77 not found"));
  assert_eq!(count(&s, "companies").await, 0);
}
