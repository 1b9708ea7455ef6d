/// Query state and partial query updates.
///
/// A `Query` is a plain value. The view controller never edits one in
/// place: each interaction produces a `QueryUpdate` which is merged into a
/// fresh `Query` that then replaces the old one wholesale.

use crate::predicate::Filter;
use crate::sort::{SortDirection, SortSpec};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Page size used when neither the configuration nor an update sets one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Complete view state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Query {
    pub search_text: String,
    /// One filter per field name
    pub filters: BTreeMap<String, Filter>,
    pub sort: Option<SortSpec>,
    /// Zero-based page index
    pub page: usize,
    pub page_size: usize,
}

impl Default for Query {
    fn default() -> Self {
        Query {
            search_text: String::new(),
            filters: BTreeMap::new(),
            sort: None,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Query {
    /// Returns a new query with the fields named by `update` replaced.
    pub fn merge(&self, update: &QueryUpdate) -> Query {
        let mut next = self.clone();

        if let Some(text) = &update.search_text {
            next.search_text = text.clone();
        }

        if update.clear_filters {
            next.filters.clear();
        }
        for (field, filter) in &update.filters {
            match filter {
                Some(filter) => {
                    next.filters.insert(field.clone(), filter.clone());
                }
                None => {
                    next.filters.remove(field);
                }
            }
        }

        if update.clear_sort {
            next.sort = None;
        }
        match (&update.sort_column, update.sort_direction) {
            (Some(column), direction) => {
                // Keep the current direction when only the column is re-sent
                let current = next.sort.as_ref().filter(|s| &s.column == column);
                let direction = direction
                    .or_else(|| current.map(|s| s.direction))
                    .unwrap_or_default();
                next.sort = Some(SortSpec::new(column.clone(), direction));
            }
            (None, Some(direction)) => {
                if let Some(sort) = next.sort.as_mut() {
                    sort.direction = direction;
                }
            }
            (None, None) => {}
        }

        if let Some(page) = update.page {
            next.page = page;
        }
        if let Some(page_size) = update.page_size {
            next.page_size = page_size;
        }

        next
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        let filters: Vec<String> = self
            .filters
            .iter()
            .map(|(field, f)| format!("{}:{}", field, f.kind()))
            .collect();
        let sort = self
            .sort
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string());

        format!(
            "search={:?} filters=[{}] sort={} page={} size={}",
            truncate(&self.search_text, 32),
            filters.join(","),
            sort,
            self.page,
            self.page_size
        )
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// A partial query: only the fields that are set get replaced.
///
/// Deserializes from the shape a rendering layer sends, e.g.
/// `{"searchText": "mouse"}`, `{"sortColumn": "product", "sortDirection": "asc"}`,
/// `{"page": 2}` or
/// `{"filters": {"region": {"kind": "category", "value": "asia"}}}`.
/// A `null` filter removes that field's filter.
///
/// A bare number under a `<field>Min` or `<field>Max` key is shorthand for
/// a range bound: `{"filters": {"priceMin": 0, "priceMax": 50}}` sets
/// `price` to `Range { min: 0, max: 50 }`. Like any filter update it
/// replaces the field's current filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryUpdate {
    pub search_text: Option<String>,
    #[serde(deserialize_with = "deserialize_filters")]
    pub filters: BTreeMap<String, Option<Filter>>,
    /// Drop every filter before applying `filters`
    pub clear_filters: bool,
    pub sort_column: Option<String>,
    pub sort_direction: Option<SortDirection>,
    /// Drop the sort before applying `sort_column`
    pub clear_sort: bool,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl QueryUpdate {
    pub fn search(text: impl Into<String>) -> Self {
        QueryUpdate::default().with_search(text)
    }

    pub fn filter(field: impl Into<String>, filter: Filter) -> Self {
        QueryUpdate::default().with_filter(field, filter)
    }

    pub fn sort(column: impl Into<String>, direction: SortDirection) -> Self {
        QueryUpdate::default().with_sort(column, direction)
    }

    pub fn page(page: usize) -> Self {
        QueryUpdate::default().with_page(page)
    }

    pub fn page_size(page_size: usize) -> Self {
        QueryUpdate::default().with_page_size(page_size)
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, filter: Filter) -> Self {
        self.filters.insert(field.into(), Some(filter));
        self
    }

    pub fn without_filter(mut self, field: impl Into<String>) -> Self {
        self.filters.insert(field.into(), None);
        self
    }

    pub fn with_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_column = Some(column.into());
        self.sort_direction = Some(direction);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// True if merging this update would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == QueryUpdate::default()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilterEntry {
    Filter(Filter),
    Bound(f64),
}

fn deserialize_filters<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, Option<Filter>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Option<FilterEntry>> = BTreeMap::deserialize(deserializer)?;
    let mut filters = BTreeMap::new();

    for (key, entry) in raw {
        let bound = match entry {
            None => {
                filters.insert(key, None);
                continue;
            }
            Some(FilterEntry::Filter(filter)) => {
                filters.insert(key, Some(filter));
                continue;
            }
            Some(FilterEntry::Bound(bound)) => bound,
        };

        let (field, is_min) = match (key.strip_suffix("Min"), key.strip_suffix("Max")) {
            (Some(field), _) if !field.is_empty() => (field, true),
            (_, Some(field)) if !field.is_empty() => (field, false),
            _ => {
                return Err(D::Error::custom(format!(
                    "filter '{}' is a bare number; use '{}Min'/'{}Max' or a filter object",
                    key, key, key
                )))
            }
        };

        let slot = filters.entry(field.to_string()).or_insert(None);
        let (min, max) = match slot {
            Some(Filter::Range { min, max }) => (*min, *max),
            _ => (None, None),
        };
        *slot = Some(if is_min {
            Filter::range(Some(bound), max)
        } else {
            Filter::range(min, Some(bound))
        });
    }

    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_replaces_only_named_fields() {
        let base = Query::default().merge(
            &QueryUpdate::search("mouse")
                .with_filter("region", Filter::category("asia"))
                .with_sort("price", SortDirection::Descending)
                .with_page(2),
        );

        let next = base.merge(&QueryUpdate::filter("price", Filter::at_most(50.0)));
        assert_eq!(next.search_text, "mouse");
        assert_eq!(next.filters.len(), 2);
        assert_eq!(next.sort, Some(SortSpec::descending("price")));
        assert_eq!(next.page, 2);
        assert_eq!(next.page_size, DEFAULT_PAGE_SIZE);

        // the source query is untouched
        assert_eq!(base.filters.len(), 1);
    }

    #[test]
    fn test_filter_replace_and_remove() {
        let q = Query::default()
            .merge(&QueryUpdate::filter("region", Filter::category("asia")))
            .merge(&QueryUpdate::filter("region", Filter::category("europe")));
        assert_eq!(q.filters.get("region"), Some(&Filter::category("europe")));

        let q = q.merge(&QueryUpdate::default().without_filter("region"));
        assert!(q.filters.is_empty());
    }

    #[test]
    fn test_clear_filters_runs_before_new_filters() {
        let q = Query::default()
            .merge(&QueryUpdate::filter("region", Filter::category("asia")))
            .merge(&QueryUpdate {
                clear_filters: true,
                ..QueryUpdate::filter("price", Filter::at_least(1.0))
            });
        assert_eq!(q.filters.keys().collect::<Vec<_>>(), vec!["price"]);
    }

    #[test]
    fn test_sort_direction_only_update() {
        let q = Query::default().merge(&QueryUpdate::sort("product", SortDirection::Ascending));
        let q = q.merge(&QueryUpdate {
            sort_direction: Some(SortDirection::Descending),
            ..Default::default()
        });
        assert_eq!(q.sort, Some(SortSpec::descending("product")));

        // with no sort column there is nothing to flip
        let q = Query::default().merge(&QueryUpdate {
            sort_direction: Some(SortDirection::Descending),
            ..Default::default()
        });
        assert_eq!(q.sort, None);
    }

    #[test]
    fn test_sort_column_keeps_direction_for_same_column() {
        let q = Query::default().merge(&QueryUpdate::sort("price", SortDirection::Descending));
        let same = q.merge(&QueryUpdate {
            sort_column: Some("price".to_string()),
            ..Default::default()
        });
        assert_eq!(same.sort, Some(SortSpec::descending("price")));

        let other = q.merge(&QueryUpdate {
            sort_column: Some("product".to_string()),
            ..Default::default()
        });
        assert_eq!(other.sort, Some(SortSpec::ascending("product")));
    }

    #[test]
    fn test_clear_sort() {
        let q = Query::default().merge(&QueryUpdate::sort("price", SortDirection::Descending));
        let q = q.merge(&QueryUpdate {
            clear_sort: true,
            ..Default::default()
        });
        assert_eq!(q.sort, None);
    }

    #[test]
    fn test_update_from_json() {
        let update: QueryUpdate = serde_json::from_str(
            r#"{
                "searchText": "hub",
                "filters": {"price": {"kind": "range", "min": 0}, "region": null},
                "sortColumn": "product",
                "sortDirection": "asc",
                "page": 2
            }"#,
        )
        .unwrap();

        assert_eq!(update.search_text.as_deref(), Some("hub"));
        assert_eq!(update.filters.get("price"), Some(&Some(Filter::at_least(0.0))));
        assert_eq!(update.filters.get("region"), Some(&None));
        assert_eq!(update.sort_direction, Some(SortDirection::Ascending));
        assert_eq!(update.page, Some(2));
        assert_eq!(update.page_size, None);
    }

    #[test]
    fn test_update_from_json_with_bound_keys() {
        let json = r#"{"filters": {"priceMin": 0, "priceMax": 50.5, "stockMin": -3}}"#;
        let update: QueryUpdate = serde_json::from_str(json).unwrap();

        assert_eq!(update.filters.len(), 2);
        assert_eq!(
            update.filters.get("price"),
            Some(&Some(Filter::range(Some(0.0), Some(50.5))))
        );
        assert_eq!(update.filters.get("stock"), Some(&Some(Filter::at_least(-3.0))));
    }

    #[test]
    fn test_update_from_json_rejects_bare_number_without_suffix() {
        assert!(serde_json::from_str::<QueryUpdate>(r#"{"filters": {"price": 10}}"#).is_err());
        assert!(serde_json::from_str::<QueryUpdate>(r#"{"filters": {"Min": 10}}"#).is_err());
    }

    #[test]
    fn test_is_empty() {
        assert!(QueryUpdate::default().is_empty());
        assert!(!QueryUpdate::page(0).is_empty());
    }

    #[test]
    fn test_summary_truncates_long_search() {
        let q = Query::default().merge(&QueryUpdate::search("x".repeat(1000)));
        let summary = q.summary();
        assert!(summary.len() < 120);
        assert!(summary.contains("..."));
    }
}
