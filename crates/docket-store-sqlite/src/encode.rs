//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`, decimals as their canonical string and enums as their
//! snake_case name. Decoding failures surface as
//! [`rusqlite::Error::FromSqlConversionFailure`] so they flow through row
//! mappers unchanged.

use std::{error::Error as StdError, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{
  Row,
  types::{Type, Value},
};
use rust_decimal::Decimal;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Writing ─────────────────────────────────────────────────────────────────

pub fn text(value: impl AsRef<str>) -> Value { Value::Text(value.as_ref().to_owned()) }

pub fn opt_text(value: Option<&str>) -> Value { value.map_or(Value::Null, text) }

pub fn opt_int(value: Option<i64>) -> Value { value.map_or(Value::Null, Value::Integer) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn dt(value: DateTime<Utc>) -> Value { Value::Text(encode_dt(value)) }

pub fn date(value: Option<NaiveDate>) -> Value {
  value.map_or(Value::Null, |d| Value::Text(d.format(DATE_FORMAT).to_string()))
}

pub fn decimal(value: Option<Decimal>) -> Value {
  value.map_or(Value::Null, |d| Value::Text(d.to_string()))
}

// ─── Reading ─────────────────────────────────────────────────────────────────

fn parse_text<T, E>(
  row: &Row<'_>,
  column: &str,
  raw: &str,
  parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<T>
where
  E: StdError + Send + Sync + 'static,
{
  parse(raw).map_err(|err| {
    let idx = row.as_ref().column_index(column).unwrap_or_default();
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
  })
}

fn parse_opt<T, E>(
  row: &Row<'_>,
  column: &str,
  parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<Option<T>>
where
  E: StdError + Send + Sync + 'static,
{
  let raw: Option<String> = row.get(column)?;
  raw
    .map(|raw| parse_text(row, column, &raw, parse))
    .transpose()
}

fn parse_required<T, E>(
  row: &Row<'_>,
  column: &str,
  parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<T>
where
  E: StdError + Send + Sync + 'static,
{
  let raw: String = row.get(column)?;
  parse_text(row, column, &raw, parse)
}

fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
  DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

pub fn decode_dt(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
  parse_required(row, column, parse_rfc3339)
}

pub fn decode_opt_dt(
  row: &Row<'_>,
  column: &str,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
  parse_opt(row, column, parse_rfc3339)
}

pub fn decode_date(
  row: &Row<'_>,
  column: &str,
) -> rusqlite::Result<Option<NaiveDate>> {
  parse_opt(row, column, |raw| NaiveDate::parse_from_str(raw, DATE_FORMAT))
}

pub fn decode_decimal(
  row: &Row<'_>,
  column: &str,
) -> rusqlite::Result<Option<Decimal>> {
  parse_opt(row, column, Decimal::from_str)
}

/// Decode a strum-backed enum column.
pub fn decode_enum<E>(row: &Row<'_>, column: &str) -> rusqlite::Result<E>
where
  E: FromStr,
  E::Err: StdError + Send + Sync + 'static,
{
  parse_required(row, column, E::from_str)
}
