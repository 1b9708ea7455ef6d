/// A small product catalogue used by the demo, the benchmarks and tests.

use crate::config::ViewConfig;
use crate::sort::SortSpec;
use crate::store::{RecordStore, Schema, StoreError};
use crate::value::{FieldType, FieldValue};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Schema of the product catalogue
pub fn product_schema() -> Schema {
    Schema::new("id", vec![
        ("id".to_string(), FieldType::Integer, false),
        ("product".to_string(), FieldType::Text, false),
        ("category".to_string(), FieldType::Category, false),
        ("region".to_string(), FieldType::Category, false),
        ("status".to_string(), FieldType::Category, false),
        ("price".to_string(), FieldType::Number, false),
        ("stock".to_string(), FieldType::Integer, true),
        ("released".to_string(), FieldType::Date, false),
        ("inStock".to_string(), FieldType::Bool, false),
    ])
}

type ProductRow = (
    i64,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    f64,
    Option<i64>,
    (i32, u32, u32),
    bool,
);

const PRODUCTS: [ProductRow; 6] = [
    (1, "Wireless Mouse", "electronics", "asia", "active", 24.99, Some(120), (2023, 3, 14), true),
    (2, "Standing Desk", "furniture", "europe", "active", 349.0, Some(8), (2022, 11, 2), true),
    (3, "USB-C Hub", "electronics", "americas", "discontinued", 39.5, None, (2021, 6, 30), false),
    (4, "Desk Lamp", "furniture", "asia", "active", 45.0, Some(0), (2023, 1, 9), false),
    (
        5,
        "Mechanical Keyboard",
        "electronics",
        "europe",
        "backorder",
        129.99,
        Some(42),
        (2024, 2, 20),
        true,
    ),
    (6, "Office Chair", "furniture", "asia", "active", 219.0, Some(15), (2022, 8, 17), true),
];

fn product_rows(count: usize) -> Vec<HashMap<String, FieldValue>> {
    (0..count)
        .map(|i| {
            let (id, product, category, region, status, price, stock, (y, m, d), in_stock) =
                PRODUCTS[i % PRODUCTS.len()];
            let cycle = (i / PRODUCTS.len()) as i64;

            let mut row = HashMap::new();
            row.insert("id".to_string(), FieldValue::Integer(id + cycle * PRODUCTS.len() as i64));
            let name = if cycle == 0 {
                product.to_string()
            } else {
                format!("{} {}", product, cycle + 1)
            };
            row.insert("product".to_string(), FieldValue::text(name));
            row.insert("category".to_string(), FieldValue::text(category));
            row.insert("region".to_string(), FieldValue::text(region));
            row.insert("status".to_string(), FieldValue::text(status));
            row.insert("price".to_string(), FieldValue::Number(price + cycle as f64));
            row.insert(
                "stock".to_string(),
                stock.map(FieldValue::Integer).unwrap_or(FieldValue::Null),
            );
            row.insert(
                "released".to_string(),
                NaiveDate::from_ymd_opt(y, m, d)
                    .map(FieldValue::Date)
                    .unwrap_or(FieldValue::Null),
            );
            row.insert("inStock".to_string(), FieldValue::Bool(in_stock));
            row
        })
        .collect()
}

/// The six-product catalogue.
pub fn products() -> Result<RecordStore, StoreError> {
    catalogue(PRODUCTS.len())
}

/// `count` products, repeating the catalogue with renamed, re-priced copies.
pub fn catalogue(count: usize) -> Result<RecordStore, StoreError> {
    RecordStore::new("products", product_schema(), product_rows(count))
}

/// Searches product name, category, region and status; 10 rows per page.
pub fn product_config() -> ViewConfig {
    ViewConfig::searching(["product", "category", "region", "status"])
}

/// `product_config` sorted by price, most expensive first.
pub fn product_config_by_price() -> ViewConfig {
    product_config().with_default_sort(SortSpec::descending("price"))
}
