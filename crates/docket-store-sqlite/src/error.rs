//! Error type for `docket-store-sqlite`.

use docket_core::{Classify, ErrorKind};
use rusqlite::ffi;
use thiserror::Error;

use crate::schema;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] docket_core::Error),

  /// A textual foreign key on the input named a row that does not exist.
  #[error("{entity} with ID {id} not found (referenced by {field})")]
  RelationNotFound {
    field:  &'static str,
    entity: &'static str,
    id:     i64,
  },

  /// A unique or foreign-key constraint rejected the write.
  #[error("{0}")]
  Conflict(String),

  /// A CHECK constraint rejected the write.
  #[error("{message}")]
  Check {
    constraint: String,
    message:    String,
  },

  #[error("sqlite error: {0}")]
  Sqlite(rusqlite::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
  fn from(err: rusqlite::Error) -> Self {
    let (extended, detail) = match &err {
      rusqlite::Error::SqliteFailure(failure, detail) => {
        (failure.extended_code, detail.clone().unwrap_or_default())
      }
      _ => (0, String::new()),
    };

    match extended {
      ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
        let columns = detail
          .split_once(": ")
          .map_or(detail.as_str(), |(_, columns)| columns);
        Self::Conflict(format!(
          "a row with the same {} already exists",
          field_names(columns)
        ))
      }
      ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Self::Conflict(
        "the row is still referenced by other records".to_owned(),
      ),
      ffi::SQLITE_CONSTRAINT_CHECK => match schema::check_message(&detail) {
        Some((constraint, message)) => Self::Check {
          constraint: constraint.to_owned(),
          message:    message.to_owned(),
        },
        None => Self::Check { constraint: String::new(), message: detail },
      },
      _ => Self::Sqlite(err),
    }
  }
}

/// `"companies.registration_number, t.x"` → `"registrationNumber, x"`.
fn field_names(columns: &str) -> String {
  columns
    .split(", ")
    .map(|qualified| {
      let column = qualified.rsplit_once('.').map_or(qualified, |(_, c)| c);
      let mut parts = column.split('_');
      let head = parts.next().unwrap_or_default().to_owned();
      parts.fold(head, |mut out, part| {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
          out.extend(first.to_uppercase());
          out.push_str(chars.as_str());
        }
        out
      })
    })
    .collect::<Vec<_>>()
    .join(", ")
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(err) => err.kind(),
      Self::RelationNotFound { .. } => ErrorKind::NotFound,
      Self::Conflict(_) => ErrorKind::Conflict,
      Self::Check { .. } => ErrorKind::Validation,
      Self::Sqlite(_) | Self::Database(_) => ErrorKind::Internal,
    }
  }

  fn details(&self) -> Vec<String> {
    match self {
      Self::Core(err) => err.details(),
      Self::Check { message, .. } => vec![message.clone()],
      _ => Vec::new(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
