//! Error types for `docket-core`.

use thiserror::Error;

use crate::{lifecycle::TransitionError, validate::FieldError};

/// The coarse class of an error, used by transport layers to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The addressed row does not exist, or a lifecycle precondition failed.
  NotFound,
  /// The input was rejected before or by the storage layer.
  Validation,
  /// A uniqueness or referential constraint was violated.
  Conflict,
  Internal,
}

/// Implemented by every error type a [`crate::store::CrudStore`] can return.
pub trait Classify {
  fn kind(&self) -> ErrorKind;

  /// Per-field failures, rendered as `"<field>: <reason>"`. Empty unless the
  /// error is a validation failure.
  fn details(&self) -> Vec<String> { Vec::new() }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} with ID {id} not found")]
  NotFound { entity: &'static str, id: i64 },

  #[error("{entity} with ID {id} {reason}")]
  InvalidTransition {
    entity: &'static str,
    id:     i64,
    reason: TransitionError,
  },

  #[error("validation failed: {}", join_fields(.0))]
  Validation(Vec<FieldError>),

  #[error("invalid query: {0}")]
  InvalidQuery(String),
}

impl Error {
  /// A validation error carrying a single field failure.
  pub fn invalid(field: &str, message: impl Into<String>) -> Self {
    Self::Validation(vec![FieldError::new(field, message)])
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::NotFound { .. } | Self::InvalidTransition { .. } => {
        ErrorKind::NotFound
      }
      Self::Validation(_) | Self::InvalidQuery(_) => ErrorKind::Validation,
    }
  }

  fn details(&self) -> Vec<String> {
    match self {
      Self::Validation(fields) => fields.iter().map(ToString::to_string).collect(),
      Self::InvalidQuery(message) => vec![message.clone()],
      _ => Vec::new(),
    }
  }
}

fn join_fields(errors: &[FieldError]) -> String {
  errors
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
