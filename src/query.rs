//! Rowdeck - Read-only queries over the current dataset
//!
//! Every operation takes one snapshot from the [`DatasetStore`] up front and
//! works on it to the end, so a concurrent upload is either fully visible or
//! not visible at all.

use serde::Serialize;
use thiserror::Error;

use crate::data::{Dataset, DatasetStore, Row};

/// Page used when the caller doesn't supply one
pub const DEFAULT_PAGE: usize = 1;
/// Page size used when the caller doesn't supply one
pub const DEFAULT_LIMIT: usize = 10;

/// Errors reported by the query operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Nothing has been ingested since startup
    #[error("No data available.")]
    NoData,

    #[error("Search query is required.")]
    MissingQuery,

    #[error("Invalid pagination parameters.")]
    InvalidPagination,
}

impl QueryError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::NoData => 500,
            QueryError::MissingQuery => 400,
            QueryError::InvalidPagination => 400,
        }
    }
}

/// One window of rows plus the size of the collection it was cut from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub data: Vec<Row>,
}

impl PageResult {
    /// Cut `[(page-1)*limit, page*limit)` out of `rows`, clipped to its length.
    fn window<'a, I>(rows: I, total: usize, page: usize, limit: usize) -> Self
    where
        I: Iterator<Item = &'a Row>,
    {
        let start = (page - 1).saturating_mul(limit);
        let data = if start >= total {
            Vec::new()
        } else {
            rows.skip(start).take(limit).cloned().collect()
        };
        Self {
            page,
            limit,
            total,
            data,
        }
    }
}

/// Rows where any field contains `query`, ignoring case, in dataset order.
pub fn search(store: &DatasetStore, query: Option<&str>) -> Result<Vec<Row>, QueryError> {
    let dataset = store.snapshot().ok_or(QueryError::NoData)?;
    let needle = needle(query)?;
    Ok(matches(&dataset, &needle).cloned().collect())
}

/// A page of the full dataset. Absent parameters fall back to
/// [`DEFAULT_PAGE`] and [`DEFAULT_LIMIT`].
pub fn paginate(
    store: &DatasetStore,
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<PageResult, QueryError> {
    let dataset = store.snapshot().ok_or(QueryError::NoData)?;
    let (page, limit) = parse_window(page, limit)?;
    Ok(PageResult::window(
        dataset.rows().iter(),
        dataset.row_count(),
        page,
        limit,
    ))
}

/// Search, then paginate the matches. `total` is the number of matches.
pub fn search_page(
    store: &DatasetStore,
    query: Option<&str>,
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<PageResult, QueryError> {
    let dataset = store.snapshot().ok_or(QueryError::NoData)?;
    let needle = needle(query)?;
    let (page, limit) = parse_window(page, limit)?;

    let total = matches(&dataset, &needle).count();
    Ok(PageResult::window(
        matches(&dataset, &needle),
        total,
        page,
        limit,
    ))
}

fn needle(query: Option<&str>) -> Result<String, QueryError> {
    match query {
        Some(q) if !q.is_empty() => Ok(q.to_lowercase()),
        _ => Err(QueryError::MissingQuery),
    }
}

fn matches<'a>(dataset: &'a Dataset, needle: &'a str) -> impl Iterator<Item = &'a Row> + 'a {
    dataset
        .rows()
        .iter()
        .filter(move |row| row.contains_lowercase(needle))
}

fn parse_window(page: Option<&str>, limit: Option<&str>) -> Result<(usize, usize), QueryError> {
    Ok((
        parse_positive(page, DEFAULT_PAGE)?,
        parse_positive(limit, DEFAULT_LIMIT)?,
    ))
}

/// Parse a base-10 integer >= 1, allowing surrounding whitespace.
fn parse_positive(raw: Option<&str>, default: usize) -> Result<usize, QueryError> {
    match raw {
        None => Ok(default),
        Some(s) => s
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(QueryError::InvalidPagination),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(i: usize, name: &str, body: &str) -> Row {
        Row {
            post_id: (i / 5 + 1).to_string(),
            id: i.to_string(),
            name: name.into(),
            email: format!("user{i}@example.com"),
            body: body.into(),
        }
    }

    fn store_with(rows: Vec<Row>) -> DatasetStore {
        let store = DatasetStore::new();
        store.replace(Dataset::new(rows, "test.csv", 0));
        store
    }

    fn numbered(n: usize) -> DatasetStore {
        store_with((1..=n).map(|i| row(i, &format!("User {i}"), "lorem")).collect())
    }

    #[test]
    fn test_no_data_before_first_ingest() {
        let store = DatasetStore::new();
        assert_eq!(search(&store, Some("x")), Err(QueryError::NoData));
        assert_eq!(paginate(&store, None, None), Err(QueryError::NoData));
        assert_eq!(search_page(&store, Some("x"), None, None), Err(QueryError::NoData));
        assert_eq!(QueryError::NoData.status_code(), 500);
    }

    #[test]
    fn test_empty_dataset_is_not_an_error() {
        let store = store_with(vec![]);
        assert_eq!(search(&store, Some("x")), Ok(vec![]));
        let page = paginate(&store, None, None).unwrap();
        assert_eq!(page.total, 0);
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_missing_query() {
        let store = numbered(3);
        assert_eq!(search(&store, None), Err(QueryError::MissingQuery));
        assert_eq!(search(&store, Some("")), Err(QueryError::MissingQuery));
        assert_eq!(QueryError::MissingQuery.status_code(), 400);
    }

    #[test]
    fn test_search_case_insensitive_across_fields() {
        let store = store_with(vec![
            row(1, "John Doe", "Hello World"),
            row(2, "Jane Roe", "nothing here"),
            row(3, "Max", "say HELLO"),
        ]);

        let hits = search(&store, Some("hello")).unwrap();
        assert_eq!(hits.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["1", "3"]);

        let hits = search(&store, Some("JANE")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Jane Roe");

        // email and id fields are searched too
        assert_eq!(search(&store, Some("USER3@")).unwrap().len(), 1);
        assert_eq!(search(&store, Some("2")).unwrap().len(), 1);
        assert!(search(&store, Some("zzz")).unwrap().is_empty());
    }

    #[test]
    fn test_search_is_idempotent_and_ordered() {
        let store = numbered(30);
        let first = search(&store, Some("user 1")).unwrap();
        let second = search(&store, Some("user 1")).unwrap();
        assert_eq!(first, second);
        let ids: Vec<usize> = first.iter().map(|r| r.id.parse().unwrap()).collect();
        assert_eq!(ids, [1, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19]);
    }

    #[test]
    fn test_paginate_last_partial_page() {
        let store = numbered(25);
        let page = paginate(&store, Some("3"), Some("10")).unwrap();
        assert_eq!(page.page, 3);
        assert_eq!(page.limit, 10);
        assert_eq!(page.total, 25);
        let ids: Vec<&str> = page.data.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["21", "22", "23", "24", "25"]);
    }

    #[test]
    fn test_paginate_out_of_range() {
        let store = numbered(25);
        let page = paginate(&store, Some("4"), Some("10")).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, 25);

        let huge = usize::MAX.to_string();
        let page = paginate(&store, Some(&huge), Some(&huge)).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, 25);
    }

    #[test]
    fn test_paginate_defaults() {
        let store = numbered(25);
        let page = paginate(&store, None, None).unwrap();
        assert_eq!((page.page, page.limit), (DEFAULT_PAGE, DEFAULT_LIMIT));
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.data[0].id, "1");
    }

    #[test]
    fn test_invalid_pagination() {
        let store = numbered(5);
        for (page, limit) in [
            ("0", "10"),
            ("1", "0"),
            ("-1", "10"),
            ("1", "-5"),
            ("abc", "10"),
            ("1", ""),
            ("1.5", "10"),
        ] {
            assert_eq!(
                paginate(&store, Some(page), Some(limit)),
                Err(QueryError::InvalidPagination),
                "page={page:?} limit={limit:?}"
            );
        }
        assert_eq!(QueryError::InvalidPagination.status_code(), 400);
    }

    #[test]
    fn test_paginate_serializes_shape() {
        let store = numbered(2);
        let value = serde_json::to_value(paginate(&store, Some("2"), Some("1")).unwrap()).unwrap();
        assert_eq!(value["page"], 2);
        assert_eq!(value["limit"], 1);
        assert_eq!(value["total"], 2);
        assert_eq!(value["data"][0]["postId"], "1");
        assert_eq!(value["data"][0]["id"], "2");
    }

    #[test]
    fn test_search_page_composes() {
        let store = numbered(30);
        let page = search_page(&store, Some("user 2"), Some("2"), Some("5")).unwrap();
        // "user 2" matches 2, 20..=29
        assert_eq!(page.total, 11);
        let ids: Vec<&str> = page.data.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["24", "25", "26", "27", "28"]);

        assert_eq!(
            search_page(&store, Some(""), Some("1"), Some("5")),
            Err(QueryError::MissingQuery)
        );
        assert_eq!(
            search_page(&store, Some("user"), Some("0"), None),
            Err(QueryError::InvalidPagination)
        );
    }
}
