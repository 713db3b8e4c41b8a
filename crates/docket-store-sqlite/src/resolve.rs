//! Relation resolution: turn textual foreign-key identifiers from a payload
//! into live rows through the owning sibling service.

use docket_core::{
  store::Resource,
  validate::{Patch, parse_ref},
};

use crate::{Error, Result};

/// Resolve one identifier. A missing target becomes
/// [`Error::RelationNotFound`] naming `field`; every other error propagates.
pub fn resolve_one<R: Resource>(
  field: &'static str,
  raw: &str,
  find: impl FnOnce(i64) -> Result<R>,
) -> Result<R> {
  resolve_id(field, parse_ref(field, raw)?, find)
}

/// Like [`resolve_one`] for an identifier that is already numeric.
pub fn resolve_id<R: Resource>(
  field: &'static str,
  id: i64,
  find: impl FnOnce(i64) -> Result<R>,
) -> Result<R> {
  find(id).map_err(|err| match err {
    Error::Core(docket_core::Error::NotFound { entity, id }) => {
      Error::RelationNotFound { field, entity, id }
    }
    other => other,
  })
}

/// Resolve an optional identifier; `None` stays `None`.
pub fn resolve<R: Resource>(
  field: &'static str,
  raw: Option<&str>,
  find: impl FnOnce(i64) -> Result<R>,
) -> Result<Option<R>> {
  raw.map(|raw| resolve_one(field, raw, find)).transpose()
}

/// Resolve a tri-state update field: absent stays absent, `null` clears,
/// a value is resolved.
pub fn resolve_patch<R: Resource>(
  field: &'static str,
  raw: &Patch<String>,
  find: impl FnOnce(i64) -> Result<R>,
) -> Result<Patch<R>> {
  match raw {
    None => Ok(None),
    Some(None) => Ok(Some(None)),
    Some(Some(raw)) => resolve_one(field, raw, find).map(|row| Some(Some(row))),
  }
}

/// The id of a resolved patch, in the shape [`docket_core::validate::merge`]
/// expects.
pub fn patch_id<R: Resource>(resolved: Patch<R>) -> Patch<i64> {
  resolved.map(|row| row.map(|row| row.id()))
}
