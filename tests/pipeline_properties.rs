use datagrid::{
    sample, FieldType, FieldValue, Filter, QueryUpdate, RecordStore, Schema, SortDirection,
    ViewConfig, ViewController,
};
use proptest::prelude::*;
use std::collections::HashMap;
use std::rc::Rc;

fn catalogue_view(size: usize, page_size: usize) -> ViewController {
    let store = sample::catalogue(size).unwrap();
    ViewController::new(Rc::new(store), sample::product_config().with_page_size(page_size)).unwrap()
}

/// A store of `(id, score)` rows for checking sort order.
fn scored_view(scores: &[i64]) -> ViewController {
    let schema = Schema::new("id", vec![
        ("id".to_string(), FieldType::Integer, false),
        ("score".to_string(), FieldType::Integer, false),
    ]);
    let rows = scores
        .iter()
        .enumerate()
        .map(|(i, score)| {
            let mut row = HashMap::new();
            row.insert("id".to_string(), FieldValue::Integer(i as i64));
            row.insert("score".to_string(), FieldValue::Integer(*score));
            row
        })
        .collect();
    let store = RecordStore::new("scores", schema, rows).unwrap();
    let page_size = scores.len().max(1);
    ViewController::new(Rc::new(store), ViewConfig::default().with_page_size(page_size)).unwrap()
}

fn direction_of(descending: bool) -> SortDirection {
    if descending {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    }
}

fn region() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("asia"), Just("europe"), Just("americas"), Just("all")]
}

#[test]
fn test_empty_store() {
    let mut view = catalogue_view(0, 10);
    let result = view.on_query_change(QueryUpdate::page(3)).unwrap();
    assert!(result.is_empty);
    assert_eq!(result.page, 0);
    assert_eq!(result.page_count, 0);
}

proptest! {
    #[test]
    fn prop_page_stays_in_range(size in 0usize..80, page_size in 1usize..15, page in 0usize..30) {
        let mut view = catalogue_view(size, page_size);
        let result = view.on_query_change(QueryUpdate::page(page)).unwrap();

        if result.page_count == 0 {
            prop_assert_eq!(result.page, 0);
            prop_assert!(result.rows.is_empty());
        } else {
            prop_assert!(result.page < result.page_count);
            prop_assert!(!result.rows.is_empty());
        }
        prop_assert!(result.rows.len() <= page_size);
        prop_assert_eq!(result.is_empty, result.total_count == 0);
        prop_assert!(result.total_count <= result.source_count);
    }

    #[test]
    fn prop_pages_cover_every_match(
        size in 0usize..60,
        page_size in 1usize..10,
        region in region(),
    ) {
        let mut view = catalogue_view(size, page_size);
        let first = view
            .on_query_change(QueryUpdate::filter("region", Filter::category(region)))
            .unwrap();

        let mut seen = Vec::new();
        for page in 0..first.page_count {
            let result = view.go_to_page(page).unwrap();
            seen.extend(result.row_ids().into_iter().map(str::to_string));
        }
        prop_assert_eq!(seen.len(), first.total_count);
        seen.sort();
        seen.dedup();
        prop_assert_eq!(seen.len(), first.total_count);
    }

    #[test]
    fn prop_any_search_text_is_total(text in "\\PC{0,64}") {
        let mut view = catalogue_view(30, 10);
        let result = view.on_query_change(QueryUpdate::search(text.clone())).unwrap();
        prop_assert!(result.total_count <= 30);
        prop_assert_eq!(view.query().search_text.as_str(), text.as_str());
    }

    #[test]
    fn prop_same_update_twice_is_idempotent(
        text in "[a-z ]{0,6}",
        region in region(),
        min in -50.0f64..400.0,
        descending in any::<bool>(),
        page in 0usize..5,
    ) {
        let direction = direction_of(descending);
        let update = QueryUpdate::search(text)
            .with_filter("region", Filter::category(region))
            .with_filter("price", Filter::at_least(min))
            .with_sort("price", direction)
            .with_page(page);

        let mut view = catalogue_view(40, 7);
        let first = view.on_query_change(update.clone()).unwrap();
        let second = view.on_query_change(update).unwrap();
        prop_assert_eq!(&first, &second);
    }

    #[test]
    fn prop_sort_is_stable_in_both_directions(
        scores in prop::collection::vec(0i64..5, 0..40),
        descending in any::<bool>(),
    ) {
        let direction = direction_of(descending);
        let mut view = scored_view(&scores);
        let result = view.on_query_change(QueryUpdate::sort("score", direction)).unwrap();

        let ordered: Vec<(i64, i64)> = result
            .rows
            .iter()
            .map(|r| {
                let id = r.get("id").and_then(FieldValue::as_i64).unwrap();
                let score = r.get("score").and_then(FieldValue::as_i64).unwrap();
                (score, id)
            })
            .collect();

        for pair in ordered.windows(2) {
            let ((s1, id1), (s2, id2)) = (pair[0], pair[1]);
            match direction {
                SortDirection::Ascending => {
                    prop_assert!(s1 <= s2);
                }
                SortDirection::Descending => {
                    prop_assert!(s1 >= s2);
                }
            }
            if s1 == s2 {
                prop_assert!(id1 < id2);
            }
        }
    }

    #[test]
    fn prop_last_region_toggle_wins(toggles in prop::collection::vec(region(), 1..12)) {
        let mut view = catalogue_view(30, 50);
        let mut last = None;
        for region in &toggles {
            let update = QueryUpdate::filter("region", Filter::category(*region));
            last = Some(view.on_query_change(update).unwrap());
        }
        let result = last.unwrap();
        let wanted = *toggles.last().unwrap();

        for row in &result.rows {
            let region = row.get("region").and_then(FieldValue::as_text).unwrap();
            if wanted != "all" {
                prop_assert_eq!(region, wanted);
            }
        }
        if wanted == "all" {
            prop_assert_eq!(result.total_count, 30);
        }
    }

    #[test]
    fn prop_inverted_bounds_match_nothing(lo in 0.0f64..500.0, gap in 0.5f64..100.0) {
        let mut view = catalogue_view(30, 10);
        let result = view
            .on_query_change(QueryUpdate::filter("price", Filter::range(Some(lo + gap), Some(lo))))
            .unwrap();
        prop_assert!(result.is_empty);
    }
}
