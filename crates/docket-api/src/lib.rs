//! JSON REST API for Docket.
//!
//! Exposes an axum [`Router`] backed by any
//! [`docket_core::store::PracticeStore`]. Identity comes from the
//! `X-User-Id` header set by the gateway in front of the service; TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = docket_api::app(Arc::new(store), "/api");
//! ```

pub mod crud;
pub mod error;
pub mod extract;
pub mod links;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Json, Router,
  http::{Method, Uri},
  middleware,
  routing::get,
};
use docket_core::{
  category::Category,
  company::Company,
  contract::Contract,
  matter::Matter,
  risk::Risk,
  store::PracticeStore,
  user::User,
};
use serde_json::{Value, json};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub use error::ApiError;

use crate::crud::resource;

/// Build the resource router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: PracticeStore>(store: Arc<S>) -> Router<()> {
  let router = Router::new().route("/health", get(health));
  let router = resource::<S, User>(router, "/users");
  let router = resource::<S, Category>(router, "/categories");
  let router = resource::<S, Company>(router, "/companies");
  let router = resource::<S, Matter>(router, "/matters");
  let router = resource::<S, Contract>(router, "/contracts");
  let router = resource::<S, Risk>(router, "/risks");
  router.with_state(store)
}

/// The complete application: resources mounted under `prefix`, an enveloped
/// `404` for unknown routes, panic recovery and request tracing.
pub fn app<S: PracticeStore>(store: Arc<S>, prefix: &str) -> Router<()> {
  let api = api_router(store);
  let prefix = prefix.trim_end_matches('/');
  let router = if prefix.is_empty() {
    Router::new().merge(api)
  } else {
    Router::new().nest(prefix, api)
  };

  router
    .fallback(no_route)
    .layer(CatchPanicLayer::custom(error::panic_response))
    .layer(middleware::from_fn(error::error_envelope))
    .layer(TraceLayer::new_for_http())
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

async fn no_route(method: Method, uri: Uri) -> ApiError {
  ApiError::NoRoute { method, path: uri.path().to_owned() }
}
