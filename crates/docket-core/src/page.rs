//! Pagination contract: query parsing, column allow-lists and the page
//! envelope returned by [`crate::store::CrudStore::find`].
//!
//! Query syntax follows the common `page`/`limit`/`sortBy=col:DIR`/
//! `search`/`searchBy`/`filter.<col>=$op:value` convention. Columns are
//! addressed by their API (camelCase) names and mapped to SQL names through
//! each entity's [`PaginateConfig`]; anything outside the allow-list is
//! rejected, which is what makes it safe for backends to splice the SQL
//! names into statements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result};

// ─── Column allow-list ───────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SortDirection {
  Asc,
  Desc,
}

/// One column an entity exposes to pagination queries.
#[derive(Debug, Clone, Copy)]
pub struct Column {
  /// API-facing name, e.g. `createdAt`.
  pub name:       &'static str,
  /// Column name in storage, e.g. `created_at`.
  pub sql:        &'static str,
  pub sortable:   bool,
  pub searchable: bool,
  pub filterable: bool,
}

impl Column {
  pub const fn new(name: &'static str, sql: &'static str) -> Self {
    Self { name, sql, sortable: false, searchable: false, filterable: false }
  }

  pub const fn sortable(mut self) -> Self {
    self.sortable = true;
    self
  }

  pub const fn searchable(mut self) -> Self {
    self.searchable = true;
    self
  }

  pub const fn filterable(mut self) -> Self {
    self.filterable = true;
    self
  }
}

/// Per-entity pagination settings.
#[derive(Debug)]
pub struct PaginateConfig {
  pub columns:       &'static [Column],
  pub default_sort:  &'static [(&'static str, SortDirection)],
  pub default_limit: usize,
  pub max_limit:     usize,
}

impl PaginateConfig {
  pub const DEFAULT_LIMIT: usize = 20;
  pub const MAX_LIMIT: usize = 100;

  fn column(&self, name: &str) -> Option<&'static Column> {
    self.columns.iter().find(|c| c.name == name)
  }
}

// ─── Filters ─────────────────────────────────────────────────────────────────

/// A parsed `filter.<column>` operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOp {
  Eq(String),
  Not(String),
  Null,
  NotNull,
  In(Vec<String>),
  Gt(String),
  Gte(String),
  Lt(String),
  Lte(String),
  /// Case-insensitive substring match.
  ILike(String),
}

impl FilterOp {
  pub fn parse(raw: &str) -> Result<Self> {
    if !raw.starts_with('$') {
      return Ok(Self::Eq(raw.to_owned()));
    }
    if raw == "$null" {
      return Ok(Self::Null);
    }
    if raw == "$not:$null" {
      return Ok(Self::NotNull);
    }
    let (op, value) = raw
      .split_once(':')
      .ok_or_else(|| Error::InvalidQuery(format!("malformed filter {raw:?}")))?;
    let value = value.to_owned();
    Ok(match op {
      "$eq" => Self::Eq(value),
      "$not" => Self::Not(value),
      "$in" => Self::In(value.split(',').map(str::to_owned).collect()),
      "$gt" => Self::Gt(value),
      "$gte" => Self::Gte(value),
      "$lt" => Self::Lt(value),
      "$lte" => Self::Lte(value),
      "$ilike" => Self::ILike(value),
      other => {
        return Err(Error::InvalidQuery(format!(
          "unsupported filter operator {other:?}"
        )));
      }
    })
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// A pagination request as received, before it is checked against an
/// entity's allow-list.
#[derive(Debug, Clone, Default)]
pub struct PageQuery {
  pub page:      Option<usize>,
  pub limit:     Option<usize>,
  pub sort_by:   Vec<(String, SortDirection)>,
  pub search:    Option<String>,
  pub search_by: Vec<String>,
  /// `(column, raw operator string)` in request order.
  pub filter:    Vec<(String, String)>,
}

impl PageQuery {
  /// Build from decoded query-string pairs. Keys that are not part of the
  /// pagination vocabulary are ignored.
  pub fn from_pairs<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
  ) -> Result<Self> {
    let mut query = Self::default();
    for (key, value) in pairs {
      match key {
        "page" => query.page = Some(parse_number("page", value)?),
        "limit" => query.limit = Some(parse_number("limit", value)?),
        "sortBy" => {
          let (column, dir) = match value.split_once(':') {
            Some((column, dir)) => (
              column,
              dir.parse::<SortDirection>().map_err(|_| {
                Error::InvalidQuery(format!("invalid sort direction {dir:?}"))
              })?,
            ),
            None => (value, SortDirection::Asc),
          };
          query.sort_by.push((column.to_owned(), dir));
        }
        "search" if !value.is_empty() => query.search = Some(value.to_owned()),
        "searchBy" => query.search_by.push(value.to_owned()),
        _ => {
          if let Some(column) = key.strip_prefix("filter.") {
            query.filter.push((column.to_owned(), value.to_owned()));
          }
        }
      }
    }
    Ok(query)
  }

  /// Check every referenced column against `config` and apply defaults.
  pub fn resolve(&self, config: &PaginateConfig) -> Result<ResolvedQuery> {
    let page = self.page.unwrap_or(1).max(1);
    let limit = match self.limit {
      Some(l) if l >= 1 => l.min(config.max_limit),
      _ => config.default_limit,
    };
    // The offset is bound as an SQLite integer.
    (page - 1)
      .checked_mul(limit)
      .filter(|offset| i64::try_from(*offset).is_ok())
      .ok_or_else(|| Error::invalid("page", "is too large"))?;

    let requested_sort: Vec<(String, SortDirection)> = if self.sort_by.is_empty()
    {
      config
        .default_sort
        .iter()
        .map(|(name, dir)| ((*name).to_owned(), *dir))
        .collect()
    } else {
      self.sort_by.clone()
    };

    let mut sort = Vec::with_capacity(requested_sort.len());
    for (name, dir) in &requested_sort {
      let column = config
        .column(name)
        .filter(|c| c.sortable)
        .ok_or_else(|| Error::invalid("sortBy", format!("cannot sort by {name:?}")))?;
      sort.push((column.sql, *dir));
    }

    let search_by: Vec<&'static Column> = if self.search_by.is_empty() {
      config.columns.iter().filter(|c| c.searchable).collect()
    } else {
      self
        .search_by
        .iter()
        .map(|name| {
          config.column(name).filter(|c| c.searchable).ok_or_else(|| {
            Error::invalid("searchBy", format!("cannot search by {name:?}"))
          })
        })
        .collect::<Result<_>>()?
    };

    let mut filters = Vec::with_capacity(self.filter.len());
    for (name, raw) in &self.filter {
      let column = config
        .column(name)
        .filter(|c| c.filterable)
        .ok_or_else(|| {
          Error::invalid(&format!("filter.{name}"), "column is not filterable")
        })?;
      filters.push((column.sql, FilterOp::parse(raw)?));
    }

    Ok(ResolvedQuery {
      page,
      limit,
      sort,
      search: self.search.clone(),
      search_columns: search_by.iter().map(|c| c.sql).collect(),
      filters,
      echo_sort: requested_sort,
      echo_search_by: search_by.iter().map(|c| c.name.to_owned()).collect(),
      echo_filter: self.filter.clone(),
    })
  }
}

fn parse_number(field: &str, raw: &str) -> Result<usize> {
  raw
    .parse()
    .map_err(|_| Error::invalid(field, format!("{raw:?} is not a number")))
}

/// A [`PageQuery`] checked against an allow-list, with SQL column names.
#[derive(Debug, Clone)]
pub struct ResolvedQuery {
  pub page:           usize,
  pub limit:          usize,
  pub sort:           Vec<(&'static str, SortDirection)>,
  pub search:         Option<String>,
  pub search_columns: Vec<&'static str>,
  pub filters:        Vec<(&'static str, FilterOp)>,
  echo_sort:          Vec<(String, SortDirection)>,
  echo_search_by:     Vec<String>,
  echo_filter:        Vec<(String, String)>,
}

impl ResolvedQuery {
  pub fn offset(&self) -> usize { (self.page - 1) * self.limit }

  /// Build the response metadata once the total row count is known.
  pub fn meta(&self, total_items: usize) -> PageMeta {
    let mut filter: BTreeMap<String, serde_json::Value> = BTreeMap::new();
    for (column, raw) in &self.echo_filter {
      let raw = serde_json::Value::String(raw.clone());
      match filter.remove(column) {
        None => {
          filter.insert(column.clone(), raw);
        }
        Some(serde_json::Value::Array(mut values)) => {
          values.push(raw);
          filter.insert(column.clone(), serde_json::Value::Array(values));
        }
        Some(previous) => {
          filter.insert(column.clone(), serde_json::Value::Array(vec![previous, raw]));
        }
      }
    }

    PageMeta {
      items_per_page: self.limit,
      total_items,
      current_page: self.page,
      total_pages: total_items.div_ceil(self.limit),
      sort_by: self.echo_sort.clone(),
      search_by: self.echo_search_by.clone(),
      search: self.search.clone(),
      filter: (!filter.is_empty()).then_some(filter),
    }
  }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
  pub items_per_page: usize,
  pub total_items:    usize,
  pub current_page:   usize,
  pub total_pages:    usize,
  pub sort_by:        Vec<(String, SortDirection)>,
  pub search_by:      Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub search:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub filter:         Option<BTreeMap<String, serde_json::Value>>,
}

/// One page of rows plus metadata. Transport layers add navigation links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub data: Vec<T>,
  pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Classify as _;

  static COLUMNS: &[Column] = &[
    Column::new("id", "id").sortable().filterable(),
    Column::new("name", "name").sortable().searchable().filterable(),
    Column::new("createdAt", "created_at").sortable(),
  ];

  static CONFIG: PaginateConfig = PaginateConfig {
    columns:       COLUMNS,
    default_sort:  &[("id", SortDirection::Desc)],
    default_limit: PaginateConfig::DEFAULT_LIMIT,
    max_limit:     PaginateConfig::MAX_LIMIT,
  };

  fn query(pairs: &[(&str, &str)]) -> PageQuery {
    PageQuery::from_pairs(pairs.iter().copied()).unwrap()
  }

  #[test]
  fn defaults_apply() {
    let resolved = query(&[]).resolve(&CONFIG).unwrap();
    assert_eq!(resolved.page, 1);
    assert_eq!(resolved.limit, 20);
    assert_eq!(resolved.sort, [("id", SortDirection::Desc)]);
    assert_eq!(resolved.search_columns, ["name"]);
  }

  #[test]
  fn limit_is_clamped() {
    let resolved = query(&[("limit", "500"), ("page", "0")])
      .resolve(&CONFIG)
      .unwrap();
    assert_eq!(resolved.limit, 100);
    assert_eq!(resolved.page, 1);
  }

  #[test]
  fn page_past_the_offset_range_is_rejected() {
    let max = usize::MAX.to_string();
    let err = query(&[("page", max.as_str()), ("limit", "100")])
      .resolve(&CONFIG)
      .unwrap_err();
    assert_eq!(err.details(), ["page: is too large"]);

    let resolved = query(&[("page", "1000000")]).resolve(&CONFIG).unwrap();
    assert_eq!(resolved.offset(), 999_999 * 20);
  }

  #[test]
  fn sort_by_maps_to_sql_names() {
    let resolved = query(&[("sortBy", "createdAt:desc"), ("sortBy", "name")])
      .resolve(&CONFIG)
      .unwrap();
    assert_eq!(
      resolved.sort,
      [("created_at", SortDirection::Desc), ("name", SortDirection::Asc)]
    );
  }

  #[test]
  fn unknown_columns_are_rejected() {
    assert!(query(&[("sortBy", "password:ASC")]).resolve(&CONFIG).is_err());
    assert!(query(&[("searchBy", "id")]).resolve(&CONFIG).is_err());
    assert!(query(&[("filter.createdAt", "x")]).resolve(&CONFIG).is_err());
  }

  #[test]
  fn filter_operators() {
    assert_eq!(FilterOp::parse("draft").unwrap(), FilterOp::Eq("draft".into()));
    assert_eq!(FilterOp::parse("$null").unwrap(), FilterOp::Null);
    assert_eq!(FilterOp::parse("$not:$null").unwrap(), FilterOp::NotNull);
    assert_eq!(
      FilterOp::parse("$in:a,b").unwrap(),
      FilterOp::In(vec!["a".into(), "b".into()])
    );
    assert!(FilterOp::parse("$regex:.*").is_err());
  }

  #[test]
  fn meta_counts_pages() {
    let resolved = query(&[("page", "2"), ("limit", "5"), ("filter.name", "$ilike:acme")])
      .resolve(&CONFIG)
      .unwrap();
    assert_eq!(resolved.offset(), 5);

    let meta = resolved.meta(11);
    assert_eq!(meta.current_page, 2);
    assert_eq!(meta.items_per_page, 5);
    assert_eq!(meta.total_pages, 3);
    assert_eq!(
      meta.filter.unwrap()["name"],
      serde_json::Value::String("$ilike:acme".into())
    );
  }
}
