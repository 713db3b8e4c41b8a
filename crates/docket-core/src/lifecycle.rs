//! Row lifecycle: the soft-delete state machine shared by every entity.
//!
//! Storage keeps a nullable `deleted_at` column; this module gives it an
//! explicit shape so transitions are checked in one place.
//!
//! ```text
//! absent ──create──▶ Active ──delete──▶ SoftDeleted ──restore──▶ Active
//!                      │                     │
//!                      └──────hard_delete────┴──────▶ HardDeleted
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The lifecycle state of a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Lifecycle {
  Active,
  SoftDeleted { at: DateTime<Utc> },
  /// Terminal. The row no longer exists in storage.
  HardDeleted,
}

/// Why a lifecycle transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
  AlreadyDeleted,
  NotDeleted,
  Gone,
}

impl fmt::Display for TransitionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::AlreadyDeleted => "is already deleted",
      Self::NotDeleted => "is not deleted",
      Self::Gone => "has been permanently deleted",
    })
  }
}

impl Lifecycle {
  /// Derive the state from a stored `deleted_at` column.
  pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
    match deleted_at {
      Some(at) => Self::SoftDeleted { at },
      None => Self::Active,
    }
  }

  pub fn is_active(&self) -> bool { matches!(self, Self::Active) }

  /// The value to store in `deleted_at` for this state.
  pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
    match self {
      Self::SoftDeleted { at } => Some(*at),
      Self::Active | Self::HardDeleted => None,
    }
  }

  /// `Active → SoftDeleted`.
  pub fn soft_delete(self, at: DateTime<Utc>) -> Result<Self, TransitionError> {
    match self {
      Self::Active => Ok(Self::SoftDeleted { at }),
      Self::SoftDeleted { .. } => Err(TransitionError::AlreadyDeleted),
      Self::HardDeleted => Err(TransitionError::Gone),
    }
  }

  /// `SoftDeleted → Active`. Restoring an active row is refused rather than
  /// treated as a no-op.
  pub fn restore(self) -> Result<Self, TransitionError> {
    match self {
      Self::SoftDeleted { .. } => Ok(Self::Active),
      Self::Active => Err(TransitionError::NotDeleted),
      Self::HardDeleted => Err(TransitionError::Gone),
    }
  }

  /// `Active | SoftDeleted → HardDeleted`. Irreversible.
  pub fn hard_delete(self) -> Result<Self, TransitionError> {
    match self {
      Self::Active | Self::SoftDeleted { .. } => Ok(Self::HardDeleted),
      Self::HardDeleted => Err(TransitionError::Gone),
    }
  }
}
