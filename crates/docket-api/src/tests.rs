//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, Response, StatusCode},
};
use docket_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::app;

async fn make_app() -> axum::Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  app(Arc::new(store), "/api")
}

async fn send(
  app: &axum::Router,
  method: &str,
  uri: &str,
  user: Option<&str>,
  body: Option<Value>,
) -> Response<Body> {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(user) = user {
    builder = builder.header("x-user-id", user);
  }
  let req = match body {
    Some(body) => builder
      .header("content-type", "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  app.clone().oneshot(req).await.unwrap()
}

async fn json_body(resp: Response<Body>) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

/// `POST` as user 1 and return the created row.
async fn post(app: &axum::Router, uri: &str, body: Value) -> Value {
  let resp = send(app, "POST", uri, Some("1"), Some(body)).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  json_body(resp).await
}

async fn seed_user(app: &axum::Router) -> Value {
  post(
    app,
    "/api/users",
    json!({ "email": "ada@example.com", "fullName": "Ada Lovelace" }),
  )
  .await
}

// ── Health & routing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn health_needs_no_identity() {
  let app = make_app().await;
  let resp = send(&app, "GET", "/api/health", None, None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn unknown_route_gets_the_envelope() {
  let app = make_app().await;
  let resp = send(&app, "GET", "/api/nowhere", Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let body = json_body(resp).await;
  assert_eq!(body["statusCode"], 404);
  assert_eq!(body["message"], "Cannot GET /api/nowhere");
  assert_eq!(body["error"], "Not Found");
  assert_eq!(body["path"], "/api/nowhere");
  assert_eq!(body["method"], "GET");
  assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
  let app = make_app().await;
  let resp = send(&app, "GET", "/api/companies", None, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = send(&app, "GET", "/api/companies", Some("abc"), None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(json_body(resp).await["statusCode"], 401);
}

// ── CRUD ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_fetch_company() {
  let app = make_app().await;
  let created = post(&app, "/api/companies", json!({ "name": "Acme" })).await;
  let id = created["id"].as_i64().unwrap();

  let resp = send(&app, "GET", &format!("/api/companies/{id}"), Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["name"], "Acme");
}

#[tokio::test]
async fn validation_failures_list_every_field() {
  let app = make_app().await;
  let resp = send(
    &app,
    "POST",
    "/api/users",
    Some("1"),
    Some(json!({ "email": "not-an-email", "fullName": "  " })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let body = json_body(resp).await;
  let messages = body["message"].as_array().unwrap();
  assert_eq!(messages.len(), 2, "{body}");
  assert!(messages.iter().any(|m| m.as_str().unwrap().starts_with("email:")));
  assert!(messages.iter().any(|m| m.as_str().unwrap().starts_with("fullName:")));
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
  let app = make_app().await;
  let req = Request::builder()
    .method("POST")
    .uri("/api/categories")
    .header("x-user-id", "1")
    .header("content-type", "application/json")
    .body(Body::from("{ nope"))
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(resp).await["statusCode"], 400);
}

#[tokio::test]
async fn non_numeric_id_is_bad_request() {
  let app = make_app().await;
  let resp = send(&app, "GET", "/api/matters/abc", Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(resp).await["message"], json!(["id: must be a positive integer"]));
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
  let app = make_app().await;
  seed_user(&app).await;
  let resp = send(
    &app,
    "POST",
    "/api/users",
    Some("1"),
    Some(json!({ "email": "ada@example.com", "fullName": "Another Ada" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn patch_clears_with_null_and_keeps_absent() {
  let app = make_app().await;
  let created = post(
    &app,
    "/api/companies",
    json!({ "name": "Acme", "industry": "Widgets", "website": "https://acme.test" }),
  )
  .await;
  let id = created["id"].as_i64().unwrap();

  let resp = send(
    &app,
    "PATCH",
    &format!("/api/companies/{id}"),
    Some("1"),
    Some(json!({ "industry": null })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["industry"], Value::Null);
  assert_eq!(body["website"], "https://acme.test");
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn soft_delete_restore_and_hard_delete() {
  let app = make_app().await;
  let created = post(&app, "/api/categories", json!({ "name": "Litigation" })).await;
  let url = format!("/api/categories/{}", created["id"]);

  let resp = send(&app, "DELETE", &url, Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = send(&app, "GET", &url, Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = send(&app, "GET", &format!("{url}?withDeleted=true"), Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert!(json_body(resp).await["deletedAt"].is_string());

  let resp = send(&app, "DELETE", &url, Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = send(&app, "POST", &format!("{url}/restore"), Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["deletedAt"], Value::Null);

  let resp = send(&app, "POST", &format!("{url}/restore"), Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = send(&app, "DELETE", &format!("{url}/hard"), Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = send(&app, "GET", &format!("{url}?withDeleted=true"), Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_pages_with_links() {
  let app = make_app().await;
  for n in 1..=7 {
    post(&app, "/api/categories", json!({ "name": format!("Category {n}") })).await;
  }

  let resp = send(
    &app,
    "GET",
    "/api/categories?limit=3&page=2&sortBy=name:ASC",
    Some("1"),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let body = json_body(resp).await;
  assert_eq!(body["data"].as_array().unwrap().len(), 3);
  assert_eq!(body["data"][0]["name"], "Category 4");
  assert_eq!(body["meta"]["totalItems"], 7);
  assert_eq!(body["meta"]["totalPages"], 3);
  assert_eq!(body["meta"]["currentPage"], 2);

  let next = body["links"]["next"].as_str().unwrap();
  assert!(next.starts_with("/api/categories?"), "{next}");
  assert!(next.contains("page=3"), "{next}");
  assert!(next.contains("sortBy=name%3AASC"), "{next}");
  assert!(body["links"]["previous"].as_str().unwrap().contains("page=1"));
}

#[tokio::test]
async fn unknown_sort_column_is_bad_request() {
  let app = make_app().await;
  let resp = send(&app, "GET", "/api/users?sortBy=password", Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn huge_page_is_rejected_and_store_keeps_serving() {
  let app = make_app().await;
  post(&app, "/api/categories", json!({ "name": "Employment" })).await;

  let resp = send(
    &app,
    "GET",
    &format!("/api/categories?page={}&limit=100", usize::MAX),
    Some("1"),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(resp).await["message"], json!(["page: is too large"]));

  let resp = send(&app, "GET", "/api/categories", Some("1"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["meta"]["totalItems"], 1);
}

// ── Relations ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn contract_is_stamped_with_its_author() {
  let app = make_app().await;
  let user = seed_user(&app).await;
  let user_id = user["id"].to_string();
  let company = post(&app, "/api/companies", json!({ "name": "Acme" })).await;

  let resp = send(
    &app,
    "POST",
    "/api/contracts",
    Some(&user_id),
    Some(json!({
      "title": "Master services agreement",
      "contractType": "service",
      "companyId": company["id"].to_string(),
      "partiesInvolved": [
        { "companyId": company["id"].to_string(), "role": "supplier" }
      ],
      "createdById": "999"
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let body = json_body(resp).await;
  assert_eq!(body["createdById"], user["id"]);
  assert_eq!(body["status"], "draft");
  assert_eq!(body["parties"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_relation_is_not_found() {
  let app = make_app().await;
  let resp = send(
    &app,
    "POST",
    "/api/matters",
    Some("1"),
    Some(json!({ "title": "Acme v. Globex", "companyId": "42" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let message = json_body(resp).await["message"].as_str().unwrap().to_owned();
  assert!(message.contains("Company with ID 42 not found"), "{message}");
}

#[tokio::test]
async fn risk_needs_a_parent() {
  let app = make_app().await;
  let resp = send(
    &app,
    "POST",
    "/api/risks",
    Some("1"),
    Some(json!({
      "title": "Key supplier insolvency",
      "category": "financial",
      "score": 7,
      "likelihood": "possible",
      "tolerance": "low"
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
