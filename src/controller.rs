/// DataGrid View Controller
///
/// Owns the current `Query` for one view and recomputes the visible page
/// for every user interaction:
///
/// 1. validate the partial update against the store's schema
/// 2. merge it into a fresh `Query`
/// 3. filter (predicate engine), sort (sort engine)
/// 4. clamp the page into range, then slice (pager)
///
/// Updates are applied strictly in call order and each call runs to
/// completion, so the result of the latest call is the authoritative view.
/// A rejected update leaves the current query untouched.

use crate::config::{ConfigError, ViewConfig};
use crate::pager::{self, PageError};
use crate::predicate::{MatchContext, Matcher};
use crate::query::{Query, QueryUpdate};
use crate::sort::{self, SortKey, SortSpec};
use crate::store::{Record, RecordStore};
use crate::value::FieldType;
use serde::Serialize;
use std::rc::Rc;
use thiserror::Error;

/// Reasons a query update is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("{kind} filter cannot be applied to {field_type} field '{field}'")]
    FilterTypeMismatch {
        field: String,
        kind: &'static str,
        field_type: FieldType,
    },

    #[error("unknown sort column '{0}'")]
    UnknownSortColumn(String),

    #[error("page size must be at least 1")]
    ZeroPageSize,

    #[error(transparent)]
    Page(#[from] PageError),
}

/// Immutable snapshot of one computed page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResult {
    /// Records on the current page, in display order
    pub rows: Vec<Record>,
    /// Zero-based page index after clamping
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    /// Records matching the query, across all pages
    pub total_count: usize,
    /// Records in the store before filtering
    pub source_count: usize,
    /// Set when nothing matched; `rows` is then empty
    pub is_empty: bool,
    pub sort: Option<SortSpec>,
}

impl ViewResult {
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.page_count
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Ids of the records on this page, in order.
    pub fn row_ids(&self) -> Vec<&str> {
        self.rows.iter().map(Record::id).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Drives the search → filter → sort → paginate pipeline for one view
///
/// # Examples
///
/// ```
/// use datagrid::{sample, Filter, QueryUpdate, ViewController};
/// use std::rc::Rc;
///
/// let store = Rc::new(sample::products().unwrap());
/// let mut view = ViewController::new(store, sample::product_config()).unwrap();
///
/// let result = view
///     .on_query_change(QueryUpdate::filter("region", Filter::category("asia")))
///     .unwrap();
/// assert!(result.rows.iter().all(|r| r.get("region").unwrap().as_text() == Some("asia")));
/// ```
#[derive(Debug)]
pub struct ViewController {
    store: Rc<RecordStore>,
    config: ViewConfig,
    initial: Query,
    query: Query,
}

impl ViewController {
    pub fn new(store: Rc<RecordStore>, config: ViewConfig) -> Result<Self, ConfigError> {
        config.validate(store.schema())?;

        let initial = Query {
            sort: config.default_sort.clone(),
            page_size: config.page_size,
            ..Query::default()
        };

        log::debug!(
            "view over '{}' ({} records), page size {}",
            store.name(),
            store.len(),
            config.page_size
        );

        Ok(ViewController {
            store,
            config,
            query: initial.clone(),
            initial,
        })
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// The query as of the last accepted update. Its `page` is the clamped
    /// page of the last result.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Applies a partial update and returns the new page.
    pub fn on_query_change(&mut self, update: QueryUpdate) -> Result<ViewResult, ViewError> {
        if let Err(err) = self.validate(&update) {
            log::warn!("rejected query update: {}", err);
            return Err(err);
        }

        let next = self.query.merge(&update);
        let result = self.compute(&next)?;

        self.query = Query {
            page: result.page,
            ..next
        };
        Ok(result)
    }

    /// Recomputes the page for the current query.
    pub fn current(&self) -> Result<ViewResult, ViewError> {
        self.compute(&self.query)
    }

    /// Returns to the initial query (configured sort and page size).
    pub fn reset(&mut self) -> Result<ViewResult, ViewError> {
        let result = self.compute(&self.initial)?;
        self.query = self.initial.clone();
        Ok(result)
    }

    /// Convenience for `on_query_change(QueryUpdate::page(page))`.
    pub fn go_to_page(&mut self, page: usize) -> Result<ViewResult, ViewError> {
        self.on_query_change(QueryUpdate::page(page))
    }

    pub fn next_page(&mut self) -> Result<ViewResult, ViewError> {
        let page = self.query.page.saturating_add(1);
        self.go_to_page(page)
    }

    pub fn previous_page(&mut self) -> Result<ViewResult, ViewError> {
        let page = self.query.page.saturating_sub(1);
        self.go_to_page(page)
    }

    fn validate(&self, update: &QueryUpdate) -> Result<(), ViewError> {
        let schema = self.store.schema();

        for (field, filter) in &update.filters {
            let field_type = schema
                .field_type(field)
                .ok_or_else(|| ViewError::UnknownField(field.clone()))?;
            if let Some(filter) = filter {
                if !filter.applies_to(field_type) {
                    return Err(ViewError::FilterTypeMismatch {
                        field: field.clone(),
                        kind: filter.kind(),
                        field_type,
                    });
                }
            }
        }

        if let Some(column) = &update.sort_column {
            if !schema.contains(column) {
                return Err(ViewError::UnknownSortColumn(column.clone()));
            }
        }

        if update.page_size == Some(0) {
            return Err(ViewError::ZeroPageSize);
        }

        Ok(())
    }

    fn compute(&self, query: &Query) -> Result<ViewResult, ViewError> {
        let ctx = MatchContext {
            search_fields: &self.config.search_fields,
            any_sentinel: &self.config.any_sentinel,
        };
        let matcher = Matcher::new(query, ctx);

        let mut matched: Vec<&Record> = self
            .store
            .records()
            .iter()
            .filter(|r| matcher.matches(r))
            .collect();
        log::trace!(
            "{} of {} records match {} predicates",
            matched.len(),
            self.store.len(),
            matcher.active_predicates()
        );

        if let Some(sort) = &query.sort {
            sort::sort_records_by(&mut matched, &[SortKey::from(sort)]);
        }

        let total_count = matched.len();
        let page_count = pager::page_count(total_count, query.page_size);
        let page = pager::clamp_page(query.page, page_count);
        if page != query.page {
            log::trace!("clamped page {} to {} ({} pages)", query.page, page, page_count);
        }

        let rows = if total_count == 0 {
            Vec::new()
        } else {
            pager::paginate(&matched, page, query.page_size)?
                .rows
                .into_iter()
                .cloned()
                .collect()
        };

        log::debug!(
            "{} -> {} matches, page {}/{}",
            query.summary(),
            total_count,
            page,
            page_count
        );

        Ok(ViewResult {
            rows,
            page,
            page_size: query.page_size,
            page_count,
            total_count,
            source_count: self.store.len(),
            is_empty: total_count == 0,
            sort: query.sort.clone(),
        })
    }
}
