//! API error type, its [`IntoResponse`] implementation, and the envelope
//! middleware that gives every failed response the same JSON shape.
//!
//! ```json
//! {
//!   "statusCode": 404,
//!   "message": "Contract with ID 9 not found",
//!   "error": "Not Found",
//!   "timestamp": "2026-01-01T00:00:00.000Z",
//!   "path": "/api/contracts/9",
//!   "method": "GET"
//! }
//! ```
//!
//! Validation failures carry `message` as an array of `"<field>: <reason>"`
//! strings.

use std::{any::Any, error::Error as StdError};

use axum::{
  Json,
  extract::Request,
  http::{Method, StatusCode},
  middleware::Next,
  response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use docket_core::{Classify, ErrorKind};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

/// An error returned by an API handler or extractor.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(&'static str),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Invalid(#[from] docket_core::Error),

  #[error("Cannot {method} {path}")]
  NoRoute { method: Method, path: String },

  #[error("store error")]
  Store {
    kind:    ErrorKind,
    details: Vec<String>,
    source:  Box<dyn StdError + Send + Sync>,
  },

  #[error("handler panicked: {0}")]
  Panic(String),
}

impl ApiError {
  /// Wrap a store error, keeping its classification.
  pub fn store<E>(err: E) -> Self
  where
    E: StdError + Classify + Send + Sync + 'static,
  {
    Self::Store { kind: err.kind(), details: err.details(), source: Box::new(err) }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::NoRoute { .. } => StatusCode::NOT_FOUND,
      Self::Panic(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Self::Invalid(e) => status_for(e.kind()),
      Self::Store { kind, .. } => status_for(*kind),
    }
  }

  /// The client-facing `message`: field failures as an array, otherwise the
  /// error's display text. Server errors never leak their cause.
  fn message(&self) -> Value {
    let details = match self {
      Self::Invalid(e) => e.details(),
      Self::Store { details, .. } => details.clone(),
      _ => Vec::new(),
    };
    if self.status().is_server_error() {
      return Value::String("Internal server error".to_owned());
    }
    if self.status() == StatusCode::BAD_REQUEST && !details.is_empty() {
      return Value::from(details);
    }
    match self {
      Self::Store { source, .. } => Value::String(source.to_string()),
      Self::Unauthorized(reason) => Value::String((*reason).to_owned()),
      Self::BadRequest(reason) => Value::String(reason.clone()),
      other => Value::String(other.to_string()),
    }
  }
}

fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::Validation => StatusCode::BAD_REQUEST,
    ErrorKind::Conflict => StatusCode::CONFLICT,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

/// The full error chain, outermost first.
fn chain(err: &dyn StdError) -> String {
  let mut out = err.to_string();
  let mut next = err.source();
  while let Some(cause) = next {
    out.push_str(": ");
    out.push_str(&cause.to_string());
    next = cause.source();
  }
  out
}

/// What a failed handler leaves for [`error_envelope`] to render.
#[derive(Debug, Clone)]
pub struct ErrorReport {
  pub message: Value,
  pub cause:   String,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let report = ErrorReport { message: self.message(), cause: chain(&self) };
    let mut response = (status, Json(report.message.clone())).into_response();
    response.extensions_mut().insert(report);
    response
  }
}

/// Response for a panic caught by `CatchPanicLayer`.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
  let message = payload
    .downcast_ref::<String>()
    .cloned()
    .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_owned()))
    .unwrap_or_else(|| "unknown panic".to_owned());
  ApiError::Panic(message).into_response()
}

// ─── Envelope ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
  status_code: u16,
  message:     Value,
  error:       &'static str,
  timestamp:   String,
  path:        String,
  method:      String,
}

/// Rewrite every 4xx/5xx response into the error envelope and log it:
/// server errors at `error` with their cause chain, client errors at `debug`.
///
/// Responses that did not come from [`ApiError`] (e.g. axum's own
/// `405 Method Not Allowed`) get the status reason as their message.
pub async fn error_envelope(req: Request, next: Next) -> Response {
  let method = req.method().clone();
  let path = req.uri().path().to_owned();
  let response = next.run(req).await;

  let status = response.status();
  if !status.is_client_error() && !status.is_server_error() {
    return response;
  }

  let reason = status.canonical_reason().unwrap_or("Error");
  let report = response.extensions().get::<ErrorReport>().cloned();
  let (message, cause) = match report {
    Some(ErrorReport { message, cause }) => (message, cause),
    None => (Value::String(reason.to_owned()), reason.to_owned()),
  };

  if status.is_server_error() {
    error!(%method, %path, status = status.as_u16(), error = %cause, "request failed");
  } else {
    debug!(%method, %path, status = status.as_u16(), error = %cause, "request rejected");
  }

  let envelope = Envelope {
    status_code: status.as_u16(),
    message,
    error: reason,
    timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    path,
    method: method.to_string(),
  };
  (status, Json(envelope)).into_response()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validation_details_become_an_array() {
    let err = ApiError::from(docket_core::Error::invalid("title", "must not be blank"));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.message(), serde_json::json!(["title: must not be blank"]));
  }

  #[test]
  fn not_found_keeps_the_entity_message() {
    let err = ApiError::from(docket_core::Error::NotFound { entity: "Risk", id: 4 });
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert_eq!(err.message(), Value::String("Risk with ID 4 not found".into()));
  }

  #[test]
  fn server_errors_hide_their_cause() {
    let err = ApiError::Panic("boom".into());
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.message(), Value::String("Internal server error".into()));
    assert_eq!(chain(&err), "handler panicked: boom");
  }
}
