//! Navigation links for paginated responses.

use docket_core::page::{Page, PageMeta};
use serde::Serialize;
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Links {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first:    Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub previous: Option<String>,
  pub current:  String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next:     Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last:     Option<String>,
}

/// A page as served: rows, metadata and links.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
  pub data:  Vec<T>,
  pub meta:  PageMeta,
  pub links: Links,
}

impl<T> Paginated<T> {
  pub fn new(page: Page<T>, path: &str, raw: &[(String, String)]) -> Self {
    let links = Links::build(path, raw, &page.meta);
    Self { data: page.data, meta: page.meta, links }
  }
}

impl Links {
  /// Links point at `path` with the request's own query string, `page` and
  /// `limit` replaced. `first`/`previous` are omitted on the first page and
  /// `next`/`last` on the last.
  pub fn build(path: &str, raw: &[(String, String)], meta: &PageMeta) -> Self {
    let href = |page: usize| {
      let mut query = form_urlencoded::Serializer::new(String::new());
      for (key, value) in raw.iter().filter(|(k, _)| k != "page" && k != "limit") {
        query.append_pair(key, value);
      }
      query
        .append_pair("page", &page.to_string())
        .append_pair("limit", &meta.items_per_page.to_string());
      format!("{path}?{}", query.finish())
    };

    let current = meta.current_page;
    let has_previous = current > 1;
    let has_next = current < meta.total_pages;
    Self {
      first:    has_previous.then(|| href(1)),
      previous: has_previous.then(|| href(current - 1)),
      current:  href(current),
      next:     has_next.then(|| href(current + 1)),
      last:     has_next.then(|| href(meta.total_pages)),
    }
  }
}
