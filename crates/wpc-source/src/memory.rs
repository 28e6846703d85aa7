//! In-memory data source.

use std::cmp::Ordering;
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;
use wpc_model::{
    DataSource, FetchError, FetchPage, FetchParams, Filters, SortDirection, SortState,
};

/// A row together with its JSON form, used for matching and ordering.
#[derive(Debug, Clone)]
struct Entry<R> {
    row: R,
    value: Value,
}

/// Serves paged queries over a `Vec` of rows.
///
/// Rows are matched and ordered through their JSON representation:
///
/// - search is a case-insensitive substring match against every string and
///   number field of a row, after trimming the term
/// - a filter value matches a field when equal to it; an array filter value
///   matches when any element is equal
/// - sorting orders by one field, missing and `null` values first, and
///   keeps the original order between equal values
///
/// The reported total counts rows matching search and filters.
#[derive(Debug)]
pub struct MemorySource<R> {
    entries: RwLock<Vec<Entry<R>>>,
}

impl<R: Serialize + Clone> MemorySource<R> {
    pub fn new(rows: Vec<R>) -> Result<Self, serde_json::Error> {
        Ok(Self {
            entries: RwLock::new(to_entries(rows)?),
        })
    }

    /// Replace every row. Pages already cached by a consumer are not
    /// affected until it refreshes.
    pub fn set_rows(&self, rows: Vec<R>) -> Result<(), serde_json::Error> {
        let entries = to_entries(rows)?;
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = entries;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Answer `params` synchronously.
    pub fn query(&self, params: &FetchParams) -> FetchPage<R> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        let term = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        let mut matching: Vec<&Entry<R>> = entries
            .iter()
            .filter(|entry| term.as_deref().is_none_or(|t| matches_search(&entry.value, t)))
            .filter(|entry| {
                params
                    .filters
                    .as_ref()
                    .is_none_or(|filters| matches_filters(&entry.value, filters))
            })
            .collect();

        if let Some(sort) = &params.sort {
            sort_entries(&mut matching, sort);
        }

        let total = matching.len();
        let rows: Vec<R> = matching
            .into_iter()
            .skip(params.offset)
            .take(params.page_size)
            .map(|entry| entry.row.clone())
            .collect();

        tracing::trace!(
            "Memory query at offset {}: {} of {} matching row(s)",
            params.offset,
            rows.len(),
            total
        );

        FetchPage::new(rows, total)
    }
}

impl<R> DataSource for MemorySource<R>
where
    R: Serialize + Clone + Send + Sync + 'static,
{
    type Row = R;

    async fn fetch(&self, params: FetchParams) -> Result<FetchPage<R>, FetchError> {
        Ok(self.query(&params))
    }
}

fn to_entries<R: Serialize>(rows: Vec<R>) -> Result<Vec<Entry<R>>, serde_json::Error> {
    rows.into_iter()
        .map(|row| {
            let value = serde_json::to_value(&row)?;
            Ok(Entry { row, value })
        })
        .collect()
}

fn matches_search(value: &Value, term: &str) -> bool {
    match value {
        Value::String(s) => s.to_lowercase().contains(term),
        Value::Number(n) => n.to_string().contains(term),
        Value::Object(fields) => fields.values().any(|field| match field {
            Value::String(_) | Value::Number(_) => matches_search(field, term),
            _ => false,
        }),
        _ => false,
    }
}

fn matches_filters(value: &Value, filters: &Filters) -> bool {
    filters.iter().all(|(field, expected)| {
        let actual = value.get(field).unwrap_or(&Value::Null);
        match expected {
            Value::Array(options) => options.contains(actual),
            _ => actual == expected,
        }
    })
}

fn sort_entries<R>(entries: &mut [&Entry<R>], sort: &SortState) {
    let Some(column) = sort.column.as_deref() else {
        return;
    };
    entries.sort_by(|a, b| {
        let ordering = compare_values(a.value.get(column), b.value.get(column));
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_) | Value::Object(_)) => 4,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
