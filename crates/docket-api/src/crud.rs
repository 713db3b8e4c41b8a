//! Generic handlers mounted once per resource.
//!
//! | Method   | Path                    | Success |
//! |----------|-------------------------|---------|
//! | `GET`    | `/{resource}`           | `200` paginated list |
//! | `POST`   | `/{resource}`           | `201` created row |
//! | `GET`    | `/{resource}/{id}`      | `200` |
//! | `PATCH`  | `/{resource}/{id}`      | `200` merged row |
//! | `DELETE` | `/{resource}/{id}`      | `204` soft delete |
//! | `POST`   | `/{resource}/{id}/restore` | `200` restored row |
//! | `DELETE` | `/{resource}/{id}/hard` | `204` permanent delete |
//!
//! Every route requires an [`Actor`]. `GET` routes accept `withDeleted`.

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{OriginalUri, State},
  http::StatusCode,
  response::IntoResponse,
  routing::{delete, get, post},
};
use docket_core::store::{CrudStore, Resource};

use crate::{
  error::ApiError,
  extract::{Actor, EntityId, ListParams, ValidJson, WithDeleted},
  links::Paginated,
};

/// Add the full route set for `R` under `base` (e.g. `/contracts`).
pub fn resource<S, R>(router: Router<Arc<S>>, base: &str) -> Router<Arc<S>>
where
  S: CrudStore<R> + 'static,
  R: Resource,
{
  router
    .route(base, get(list::<S, R>).post(create::<S, R>))
    .route(
      &format!("{base}/{{id}}"),
      get(find_one::<S, R>).patch(update::<S, R>).delete(remove::<S, R>),
    )
    .route(&format!("{base}/{{id}}/restore"), post(restore::<S, R>))
    .route(&format!("{base}/{{id}}/hard"), delete(hard_delete::<S, R>))
}

// ─── Read ────────────────────────────────────────────────────────────────────

/// `GET /{resource}?page=&limit=&sortBy=&search=&searchBy=&filter.<col>=&withDeleted=`
pub async fn list<S, R>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  OriginalUri(uri): OriginalUri,
  params: ListParams,
) -> Result<Json<Paginated<R>>, ApiError>
where
  S: CrudStore<R>,
  R: Resource,
{
  let page = store
    .find(params.query, params.with_deleted)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(Paginated::new(page, uri.path(), &params.raw)))
}

/// `GET /{resource}/{id}[?withDeleted=true]`
pub async fn find_one<S, R>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  EntityId(id): EntityId,
  WithDeleted(with_deleted): WithDeleted,
) -> Result<Json<R>, ApiError>
where
  S: CrudStore<R>,
  R: Resource,
{
  let row = store.find_one(id, with_deleted).await.map_err(ApiError::store)?;
  Ok(Json(row))
}

// ─── Write ───────────────────────────────────────────────────────────────────

/// `POST /{resource}`
pub async fn create<S, R>(
  State(store): State<Arc<S>>,
  Actor(user_id): Actor,
  ValidJson(mut input): ValidJson<R::Create>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CrudStore<R>,
  R: Resource,
{
  R::stamp_actor(&mut input, user_id);
  let row = store.create(input).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(row)))
}

/// `PATCH /{resource}/{id}`: absent fields are untouched, `null` clears.
pub async fn update<S, R>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  EntityId(id): EntityId,
  ValidJson(patch): ValidJson<R::Update>,
) -> Result<Json<R>, ApiError>
where
  S: CrudStore<R>,
  R: Resource,
{
  let row = store.update(id, patch).await.map_err(ApiError::store)?;
  Ok(Json(row))
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// `DELETE /{resource}/{id}`
pub async fn remove<S, R>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  EntityId(id): EntityId,
) -> Result<StatusCode, ApiError>
where
  S: CrudStore<R>,
  R: Resource,
{
  store.delete(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /{resource}/{id}/restore`
pub async fn restore<S, R>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  EntityId(id): EntityId,
) -> Result<Json<R>, ApiError>
where
  S: CrudStore<R>,
  R: Resource,
{
  let row = store.restore(id).await.map_err(ApiError::store)?;
  Ok(Json(row))
}

/// `DELETE /{resource}/{id}/hard`
pub async fn hard_delete<S, R>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  EntityId(id): EntityId,
) -> Result<StatusCode, ApiError>
where
  S: CrudStore<R>,
  R: Resource,
{
  store.hard_delete(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
