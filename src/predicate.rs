/// Predicate engine: decides whether a record belongs to the current view.
///
/// A query carries free search text plus one `Filter` per field. Every
/// active predicate must hold for a record to match (logical AND):
///
/// - search text: case-insensitive substring over the configured fields
/// - `Range`: inclusive numeric bounds, either side optional
/// - `DateRange`: inclusive chronological bounds, either side optional
/// - `Category`: exact match, the "any" sentinel disables it
/// - `Flag`: boolean equality
///
/// Matching is total. Inputs are treated as opaque text and odd but
/// well-typed values (negative or inverted bounds) just narrow the result.

use crate::query::Query;
use crate::store::Record;
use crate::value::{FieldType, FieldValue};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default sentinel meaning "no category restriction".
pub const ANY_SENTINEL: &str = "all";

/// A predicate over a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Filter {
    /// Numeric value within `[min, max]`; an absent bound is unbounded.
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// Date within `[from, to]`; an absent bound is unbounded.
    DateRange {
        #[serde(default)]
        from: Option<NaiveDate>,
        #[serde(default)]
        to: Option<NaiveDate>,
    },
    /// Exact match against an enumerated value.
    Category { value: String },
    Flag { value: bool },
}

impl Filter {
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Filter::Range { min, max }
    }

    pub fn at_least(min: f64) -> Self {
        Filter::Range { min: Some(min), max: None }
    }

    pub fn at_most(max: f64) -> Self {
        Filter::Range { min: None, max: Some(max) }
    }

    pub fn date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Filter::DateRange { from, to }
    }

    pub fn category(value: impl Into<String>) -> Self {
        Filter::Category { value: value.into() }
    }

    pub fn flag(value: bool) -> Self {
        Filter::Flag { value }
    }

    /// Whether this filter kind can be applied to a field of `field_type`.
    pub fn applies_to(&self, field_type: FieldType) -> bool {
        match self {
            Filter::Range { .. } => field_type.is_numeric(),
            Filter::DateRange { .. } => field_type == FieldType::Date,
            Filter::Category { .. } => field_type.is_textual(),
            Filter::Flag { .. } => field_type == FieldType::Bool,
        }
    }

    /// Short name of the filter kind, used in errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Filter::Range { .. } => "range",
            Filter::DateRange { .. } => "dateRange",
            Filter::Category { .. } => "category",
            Filter::Flag { .. } => "flag",
        }
    }

    /// False when the filter cannot exclude anything: a range without
    /// bounds or a category set to the sentinel.
    pub fn is_active(&self, any_sentinel: &str) -> bool {
        match self {
            Filter::Range { min, max } => bound(*min).is_some() || bound(*max).is_some(),
            Filter::DateRange { from, to } => from.is_some() || to.is_some(),
            Filter::Category { value } => !value.eq_ignore_ascii_case(any_sentinel),
            Filter::Flag { .. } => true,
        }
    }

    /// Evaluates the filter against one field value.
    pub fn test(&self, value: Option<&FieldValue>) -> bool {
        match self {
            Filter::Range { min, max } => {
                let Some(n) = value.and_then(FieldValue::as_f64) else {
                    return false;
                };
                bound(*min).map_or(true, |lo| n >= lo) && bound(*max).map_or(true, |hi| n <= hi)
            }
            Filter::DateRange { from, to } => {
                let Some(d) = value.and_then(FieldValue::as_date) else {
                    return false;
                };
                from.map_or(true, |lo| d >= lo) && to.map_or(true, |hi| d <= hi)
            }
            Filter::Category { value: wanted } => {
                value.and_then(FieldValue::as_text) == Some(wanted.as_str())
            }
            Filter::Flag { value: wanted } => value.and_then(FieldValue::as_bool) == Some(*wanted),
        }
    }
}

/// NaN bounds carry no information and are treated as absent.
fn bound(b: Option<f64>) -> Option<f64> {
    b.filter(|v| !v.is_nan())
}

/// Settings the predicate engine needs beyond the query itself.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub search_fields: &'a [String],
    pub any_sentinel: &'a str,
}

/// A query compiled for repeated evaluation: the search needle is
/// normalized once and inactive filters are dropped.
#[derive(Debug)]
pub struct Matcher<'q> {
    needle: Option<String>,
    search_fields: &'q [String],
    filters: Vec<(&'q str, &'q Filter)>,
}

impl<'q> Matcher<'q> {
    pub fn new(query: &'q Query, ctx: MatchContext<'q>) -> Self {
        let trimmed = query.search_text.trim();
        let needle = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        };

        let filters = query
            .filters
            .iter()
            .filter(|(_, f)| f.is_active(ctx.any_sentinel))
            .map(|(field, f)| (field.as_str(), f))
            .collect();

        Matcher {
            needle,
            search_fields: ctx.search_fields,
            filters,
        }
    }

    /// Number of predicates that take part in matching.
    pub fn active_predicates(&self) -> usize {
        self.filters.len() + usize::from(self.needle.is_some())
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.matches_search(record)
            && self
                .filters
                .iter()
                .all(|(field, filter)| filter.test(record.get(field)))
    }

    fn matches_search(&self, record: &Record) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };
        self.search_fields.iter().any(|field| {
            record
                .get(field)
                .and_then(FieldValue::search_text)
                .map_or(false, |text| text.to_lowercase().contains(needle.as_str()))
        })
    }
}

/// Returns true if `record` satisfies every active predicate of `query`.
pub fn matches(record: &Record, query: &Query, ctx: MatchContext<'_>) -> bool {
    Matcher::new(query, ctx).matches(record)
}

/// Filters `records` down to the matching ones, preserving input order.
pub fn filter_records<'r>(
    records: &'r [Record],
    query: &Query,
    ctx: MatchContext<'_>,
) -> Vec<&'r Record> {
    let matcher = Matcher::new(query, ctx);
    records.iter().filter(|r| matcher.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RecordStore, Schema};
    use std::collections::HashMap;

    fn store() -> RecordStore {
        let schema = Schema::new("id", vec![
            ("id".to_string(), FieldType::Integer, false),
            ("product".to_string(), FieldType::Text, false),
            ("region".to_string(), FieldType::Category, false),
            ("price".to_string(), FieldType::Number, true),
            ("released".to_string(), FieldType::Date, false),
            ("in_stock".to_string(), FieldType::Bool, false),
        ]);

        let items = [
            (1, "Wireless Mouse", "asia", Some(29.99), "2023-02-01", true),
            (2, "Mechanical Keyboard", "europe", Some(89.5), "2023-05-10", false),
            (3, "USB-C Hub", "asia", Some(45.0), "2024-01-20", true),
            (4, "Monitor Arm", "americas", None, "2022-11-30", true),
        ];

        let rows = items
            .iter()
            .map(|(id, product, region, price, released, stock)| {
                let mut row = HashMap::new();
                row.insert("id".to_string(), FieldValue::Integer(*id));
                row.insert("product".to_string(), FieldValue::text(*product));
                row.insert("region".to_string(), FieldValue::text(*region));
                row.insert(
                    "price".to_string(),
                    price.map(FieldValue::Number).unwrap_or(FieldValue::Null),
                );
                row.insert(
                    "released".to_string(),
                    FieldValue::Date(NaiveDate::parse_from_str(released, "%Y-%m-%d").unwrap()),
                );
                row.insert("in_stock".to_string(), FieldValue::Bool(*stock));
                row
            })
            .collect();

        RecordStore::new("products", schema, rows).unwrap()
    }

    fn ids(records: &[&Record]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    fn run(query: &Query) -> Vec<String> {
        let store = store();
        let fields = vec!["product".to_string(), "region".to_string()];
        let ctx = MatchContext { search_fields: &fields, any_sentinel: ANY_SENTINEL };
        ids(&filter_records(store.records(), query, ctx))
    }

    fn with_filter(field: &str, filter: Filter) -> Query {
        let mut query = Query::default();
        query.filters.insert(field.to_string(), filter);
        query
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let mut query = Query::default();
        query.search_text = "   \t ".to_string();
        assert_eq!(run(&query).len(), 4);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let mut query = Query::default();
        query.search_text = "  KEY ".to_string();
        assert_eq!(run(&query), vec!["2"]);

        query.search_text = "ASIA".to_string();
        assert_eq!(run(&query), vec!["1", "3"]);
    }

    #[test]
    fn test_search_treats_input_as_opaque_text() {
        let long = "a".repeat(1000);
        for text in [
            "<script>alert(1)</script>",
            "SELECT * FROM products",
            "${}",
            "!@#$%",
            "\u{0}\n\r",
            long.as_str(),
        ] {
            let mut query = Query::default();
            query.search_text = text.to_string();
            assert!(run(&query).is_empty(), "unexpected match for {:?}", text);
        }
    }

    #[test]
    fn test_range_is_inclusive() {
        let between = with_filter("price", Filter::range(Some(29.99), Some(45.0)));
        assert_eq!(run(&between), vec!["1", "3"]);
        assert_eq!(run(&with_filter("price", Filter::at_least(50.0))), vec!["2"]);
        assert_eq!(run(&with_filter("price", Filter::at_most(29.99))), vec!["1"]);
    }

    #[test]
    fn test_range_excludes_null_values() {
        assert_eq!(run(&with_filter("price", Filter::at_least(0.0))), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_unbounded_range_is_inactive() {
        assert_eq!(run(&with_filter("price", Filter::range(None, None))).len(), 4);
        assert_eq!(run(&with_filter("price", Filter::range(Some(f64::NAN), None))).len(), 4);
    }

    #[test]
    fn test_negative_and_inverted_ranges_yield_no_rows() {
        assert!(run(&with_filter("price", Filter::range(Some(-100.0), Some(-50.0)))).is_empty());
        assert!(run(&with_filter("price", Filter::range(Some(100.0), Some(10.0)))).is_empty());
    }

    #[test]
    fn test_category_exact_match_and_sentinel() {
        assert_eq!(run(&with_filter("region", Filter::category("asia"))), vec!["1", "3"]);
        assert!(run(&with_filter("region", Filter::category("Asia"))).is_empty());
        assert_eq!(run(&with_filter("region", Filter::category("all"))).len(), 4);
        assert_eq!(run(&with_filter("region", Filter::category("ALL"))).len(), 4);
    }

    #[test]
    fn test_date_range() {
        let from = NaiveDate::from_ymd_opt(2023, 1, 1);
        let to = NaiveDate::from_ymd_opt(2023, 12, 31);
        assert_eq!(run(&with_filter("released", Filter::date_range(from, to))), vec!["1", "2"]);
        assert_eq!(run(&with_filter("released", Filter::date_range(None, from))), vec!["4"]);
    }

    #[test]
    fn test_flag() {
        assert_eq!(run(&with_filter("in_stock", Filter::flag(false))), vec!["2"]);
    }

    #[test]
    fn test_predicates_are_anded() {
        let mut query = with_filter("region", Filter::category("asia"));
        query.filters.insert("price".to_string(), Filter::at_least(40.0));
        assert_eq!(run(&query), vec!["3"]);

        query.search_text = "mouse".to_string();
        assert!(run(&query).is_empty());
    }

    #[test]
    fn test_matches_single_record() {
        let store = store();
        let fields = vec!["product".to_string()];
        let ctx = MatchContext { search_fields: &fields, any_sentinel: ANY_SENTINEL };
        let query = with_filter("region", Filter::category("europe"));

        assert!(!matches(store.get(0).unwrap(), &query, ctx));
        assert!(matches(store.get(1).unwrap(), &query, ctx));
    }

    #[test]
    fn test_active_predicate_count() {
        let mut query = with_filter("region", Filter::category("all"));
        query.filters.insert("price".to_string(), Filter::at_most(10.0));
        query.search_text = "x".to_string();
        let fields = vec!["product".to_string()];
        let ctx = MatchContext { search_fields: &fields, any_sentinel: ANY_SENTINEL };
        assert_eq!(Matcher::new(&query, ctx).active_predicates(), 2);
    }

    #[test]
    fn test_filter_applies_to() {
        assert!(Filter::at_least(1.0).applies_to(FieldType::Integer));
        assert!(!Filter::at_least(1.0).applies_to(FieldType::Text));
        assert!(Filter::category("x").applies_to(FieldType::Category));
        assert!(!Filter::flag(true).applies_to(FieldType::Category));
    }

    #[test]
    fn test_filter_json_shape() {
        let f: Filter = serde_json::from_str(r#"{"kind": "range", "min": 0}"#).unwrap();
        assert_eq!(f, Filter::at_least(0.0));

        let f: Filter =
            serde_json::from_str(r#"{"kind": "dateRange", "to": "2024-01-31"}"#).unwrap();
        assert_eq!(f, Filter::date_range(None, NaiveDate::from_ymd_opt(2024, 1, 31)));
    }
}
