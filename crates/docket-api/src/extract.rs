//! Request extractors shared by every resource handler.

use axum::{
  Json,
  extract::{FromRequest, FromRequestParts, Path, Query, Request},
  http::request::Parts,
};
use docket_core::{page::PageQuery, validate::Validate};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Header carrying the authenticated user's id. Set by the gateway in front
/// of the service.
pub const USER_HEADER: &str = "x-user-id";

// ─── Actor ───────────────────────────────────────────────────────────────────

/// The authenticated caller. Rejects with `401` when the header is missing
/// or not a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(USER_HEADER)
      .ok_or(ApiError::Unauthorized("missing user identity"))?;
    raw
      .to_str()
      .ok()
      .and_then(|s| s.trim().parse::<i64>().ok())
      .filter(|id| *id > 0)
      .map(Actor)
      .ok_or(ApiError::Unauthorized("invalid user identity"))
  }
}

// ─── Entity id ───────────────────────────────────────────────────────────────

/// The `{id}` path segment, which must be a positive integer.
#[derive(Debug, Clone, Copy)]
pub struct EntityId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for EntityId {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Path(raw) = Path::<String>::from_request_parts(parts, state)
      .await
      .map_err(|rej| ApiError::BadRequest(rej.body_text()))?;
    raw
      .parse::<i64>()
      .ok()
      .filter(|id| *id > 0)
      .map(EntityId)
      .ok_or_else(|| docket_core::Error::invalid("id", "must be a positive integer").into())
  }
}

// ─── Body ────────────────────────────────────────────────────────────────────

/// A JSON body that has passed its payload's [`Validate`] checks.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
  S: Send + Sync,
  T: DeserializeOwned + Validate,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<T>::from_request(req, state)
      .await
      .map_err(|rej| ApiError::BadRequest(rej.body_text()))?;
    value.validate()?;
    Ok(Self(value))
  }
}

// ─── Query string ────────────────────────────────────────────────────────────

/// Parse `withDeleted`. Absent means `false`.
fn with_deleted(pairs: &[(String, String)]) -> Result<bool, ApiError> {
  match pairs.iter().rev().find(|(key, _)| key == "withDeleted") {
    None => Ok(false),
    Some((_, value)) => match value.as_str() {
      "true" | "1" => Ok(true),
      "false" | "0" | "" => Ok(false),
      _ => Err(docket_core::Error::invalid("withDeleted", "must be a boolean").into()),
    },
  }
}

async fn query_pairs<S: Send + Sync>(
  parts: &mut Parts,
  state: &S,
) -> Result<Vec<(String, String)>, ApiError> {
  let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
    .await
    .map_err(|rej| ApiError::BadRequest(rej.body_text()))?;
  Ok(pairs)
}

/// The list endpoint's query string: pagination parameters plus
/// `withDeleted`. The raw pairs are kept for building navigation links.
#[derive(Debug, Clone)]
pub struct ListParams {
  pub query:        PageQuery,
  pub with_deleted: bool,
  pub raw:          Vec<(String, String)>,
}

impl<S: Send + Sync> FromRequestParts<S> for ListParams {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let raw = query_pairs(parts, state).await?;
    let query = PageQuery::from_pairs(raw.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    Ok(Self { query, with_deleted: with_deleted(&raw)?, raw })
  }
}

/// `?withDeleted=` on single-row reads.
#[derive(Debug, Clone, Copy)]
pub struct WithDeleted(pub bool);

impl<S: Send + Sync> FromRequestParts<S> for WithDeleted {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let raw = query_pairs(parts, state).await?;
    Ok(Self(with_deleted(&raw)?))
  }
}
