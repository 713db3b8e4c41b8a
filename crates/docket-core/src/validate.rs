//! Declarative input checks for DTOs.
//!
//! Every create/update payload implements [`Validate`]; the API layer runs it
//! before the payload reaches a store, so services only see well-formed input.

use std::fmt;

use serde::Serialize;

use crate::{Error, Result};

/// A tri-state update field: `None` leaves the stored value untouched,
/// `Some(None)` clears it, `Some(Some(v))` replaces it.
///
/// Deserialise with `#[serde(default, with = "::serde_with::rust::double_option")]`.
pub type Patch<T> = Option<Option<T>>;

/// Apply a [`Patch`] to a nullable field.
pub fn merge<T>(slot: &mut Option<T>, patch: Patch<T>) {
  if let Some(value) = patch {
    *slot = value;
  }
}

/// A single field-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

impl FieldError {
  pub fn new(field: &str, message: impl Into<String>) -> Self {
    Self { field: field.to_owned(), message: message.into() }
  }
}

impl fmt::Display for FieldError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.field, self.message)
  }
}

pub trait Validate {
  fn validate(&self) -> Result<()>;
}

/// Parse a textual foreign-key identifier.
pub fn parse_ref(field: &str, raw: &str) -> Result<i64> {
  match raw.trim().parse::<i64>() {
    Ok(id) if id > 0 => Ok(id),
    _ => Err(Error::invalid(
      field,
      format!("{raw:?} is not a valid identifier"),
    )),
  }
}

/// Accumulates failures so a payload reports every bad field at once.
#[derive(Debug, Default)]
pub struct Checks {
  errors: Vec<FieldError>,
}

impl Checks {
  pub fn new() -> Self { Self::default() }

  pub fn check(
    &mut self,
    field: &str,
    ok: bool,
    message: impl Into<String>,
  ) -> &mut Self {
    if !ok {
      self.errors.push(FieldError::new(field, message));
    }
    self
  }

  pub fn not_blank(&mut self, field: &str, value: &str) -> &mut Self {
    self.check(field, !value.trim().is_empty(), "should not be empty")
  }

  pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
    self.check(
      field,
      value.chars().count() <= max,
      format!("must be at most {max} characters"),
    )
  }

  /// `not_blank` + `max_len`.
  pub fn text(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
    self.not_blank(field, value).max_len(field, value, max)
  }

  pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) -> &mut Self {
    self.check(
      field,
      (min..=max).contains(&value),
      format!("must be between {min} and {max}"),
    )
  }

  pub fn reference(&mut self, field: &str, raw: &str) -> &mut Self {
    if let Err(Error::Validation(mut errs)) = parse_ref(field, raw) {
      self.errors.append(&mut errs);
    }
    self
  }

  /// ISO 4217-shaped: three ASCII uppercase letters.
  pub fn currency(&mut self, field: &str, code: &str) -> &mut Self {
    self.check(
      field,
      code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()),
      "must be a three-letter uppercase currency code",
    )
  }

  pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
    let ok = value
      .split_once('@')
      .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    self.check(field, ok, "must be an email address")
  }

  pub fn finish(&mut self) -> Result<()> {
    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(std::mem::take(&mut self.errors)))
    }
  }
}
