/// DataGrid Record Store
///
/// A `RecordStore` holds the full, immutable source list of records for one
/// view. It is built once at load time, validated against a `Schema`, and
/// never mutated afterwards: the pipeline only produces read-only derived
/// views of it.

use crate::value::{FieldType, FieldValue};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

/// Errors raised while building a record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("row {row}: missing value for field '{field}'")]
    MissingField { row: usize, field: String },

    #[error("row {row}: field '{field}' is not nullable")]
    NullValue { row: usize, field: String },

    #[error("row {row}: field '{field}' expects {expected}, got {found}")]
    TypeMismatch {
        row: usize,
        field: String,
        expected: FieldType,
        found: String,
    },

    #[error("duplicate record identifier '{0}'")]
    DuplicateId(String),

    #[error("expected a JSON array of objects")]
    NotAnArray,

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
}

/// Declaration of a single schema field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
}

/// Schema definition with field names, types and the identifier field.
///
/// # Examples
///
/// ```
/// use datagrid::{FieldType, Schema};
///
/// let schema = Schema::new("id", vec![
///     ("id".to_string(), FieldType::Integer, false),
///     ("region".to_string(), FieldType::Category, false),
/// ]);
///
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.field_type("region"), Some(FieldType::Category));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    id_field: String,
    fields: Vec<FieldDef>,
}

impl Schema {
    /// Creates a schema from `(name, type, nullable)` tuples.
    pub fn new(id_field: impl Into<String>, fields: Vec<(String, FieldType, bool)>) -> Self {
        Schema {
            id_field: id_field.into(),
            fields: fields
                .into_iter()
                .map(|(name, field_type, nullable)| FieldDef { name, field_type, nullable })
                .collect(),
        }
    }

    /// Parses a schema document: `{"idField": "id", "fields": [{"name": .., "type": ..}]}`.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.check()?;
        Ok(schema)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the type of a field by name, or None if not found.
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.field(name).map(|f| f.field_type)
    }

    fn check(&self) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        for def in &self.fields {
            if !seen.insert(def.name.as_str()) {
                return Err(StoreError::InvalidSchema(format!(
                    "field '{}' declared twice",
                    def.name
                )));
            }
        }
        match self.field(&self.id_field) {
            None => Err(StoreError::InvalidSchema(format!(
                "identifier field '{}' is not declared",
                self.id_field
            ))),
            Some(def) if def.nullable => Err(StoreError::InvalidSchema(format!(
                "identifier field '{}' must not be nullable",
                self.id_field
            ))),
            Some(_) => Ok(()),
        }
    }
}

/// An immutable record: field values in schema order plus the rendered
/// identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(skip)]
    id: String,
    #[serde(flatten)]
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// The identifier value, rendered as text.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Holds the fixed source list of records for a view.
///
/// # Examples
///
/// ```
/// use datagrid::{FieldType, FieldValue, RecordStore, Schema};
/// use std::collections::HashMap;
///
/// let schema = Schema::new("id", vec![
///     ("id".to_string(), FieldType::Integer, false),
///     ("product".to_string(), FieldType::Text, false),
///     ("price".to_string(), FieldType::Number, true),
/// ]);
///
/// let mut row = HashMap::new();
/// row.insert("id".to_string(), FieldValue::Integer(1));
/// row.insert("product".to_string(), FieldValue::text("Laptop"));
/// row.insert("price".to_string(), FieldValue::Number(999.99));
///
/// let store = RecordStore::new("products", schema, vec![row]).unwrap();
/// assert_eq!(store.len(), 1);
/// assert_eq!(store.get(0).unwrap().get("product").unwrap().as_text(), Some("Laptop"));
/// ```
#[derive(Debug, Clone)]
pub struct RecordStore {
    name: String,
    schema: Schema,
    records: Rc<[Record]>,
}

impl RecordStore {
    /// Validates every row against the schema and freezes the result.
    ///
    /// All rows are checked before the store is built; a single invalid row
    /// rejects the whole load.
    pub fn new(
        name: impl Into<String>,
        schema: Schema,
        rows: Vec<HashMap<String, FieldValue>>,
    ) -> Result<Self, StoreError> {
        schema.check()?;

        let mut ids = HashSet::with_capacity(rows.len());
        let mut records = Vec::with_capacity(rows.len());

        for (row_idx, mut row) in rows.into_iter().enumerate() {
            let mut fields = IndexMap::with_capacity(schema.len());
            for def in schema.fields() {
                let value = row.remove(&def.name).ok_or_else(|| StoreError::MissingField {
                    row: row_idx,
                    field: def.name.clone(),
                })?;
                check_value(row_idx, def, &value)?;
                fields.insert(def.name.clone(), widen(def, value));
            }

            let id = fields
                .get(schema.id_field())
                .map(|v| v.to_string())
                .unwrap_or_default();
            if !ids.insert(id.clone()) {
                return Err(StoreError::DuplicateId(id));
            }
            records.push(Record { id, fields });
        }

        let name = name.into();
        log::debug!("loaded {} records into store '{}'", records.len(), name);

        Ok(RecordStore {
            name,
            schema,
            records: records.into(),
        })
    }

    /// Builds a store from a JSON array of objects.
    ///
    /// Values are coerced by the schema: dates are ISO `YYYY-MM-DD` strings,
    /// a missing key or JSON `null` becomes `Null`. Keys not declared in the
    /// schema are ignored.
    ///
    /// ```
    /// use datagrid::{FieldType, RecordStore, Schema};
    ///
    /// let schema = Schema::new("id", vec![
    ///     ("id".to_string(), FieldType::Integer, false),
    ///     ("name".to_string(), FieldType::Text, false),
    /// ]);
    /// let json = r#"[{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]"#;
    /// let store = RecordStore::from_json("users", schema, json).unwrap();
    /// assert_eq!(store.len(), 2);
    /// ```
    pub fn from_json(name: &str, schema: Schema, json: &str) -> Result<Self, StoreError> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        let items = parsed.as_array().ok_or(StoreError::NotAnArray)?;

        let mut rows = Vec::with_capacity(items.len());
        for (row_idx, item) in items.iter().enumerate() {
            let obj = item.as_object().ok_or(StoreError::NotAnArray)?;
            let mut row = HashMap::new();
            for def in schema.fields() {
                let value = match obj.get(&def.name) {
                    None | Some(serde_json::Value::Null) => FieldValue::Null,
                    Some(v) => json_to_value(row_idx, def, v)?,
                };
                row.insert(def.name.clone(), value);
            }
            rows.push(row);
        }

        Self::new(name, schema, rows)
    }

    /// Builds a store from CSV text with a header row.
    ///
    /// Every declared field must appear in the header. Empty cells become
    /// `Null`.
    pub fn from_csv(name: &str, schema: Schema, csv_text: &str) -> Result<Self, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_text.as_bytes());

        let headers = reader.headers()?.clone();
        let mut positions = Vec::with_capacity(schema.len());
        for def in schema.fields() {
            let pos = headers
                .iter()
                .position(|h| h == def.name)
                .ok_or_else(|| StoreError::MissingField { row: 0, field: def.name.clone() })?;
            positions.push((def, pos));
        }

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let mut row = HashMap::new();
            for (def, pos) in &positions {
                let cell = record.get(*pos).unwrap_or("");
                row.insert(def.name.clone(), parse_cell(row_idx, def, cell)?);
            }
            rows.push(row);
        }

        Self::new(name, schema, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Looks a record up by its rendered identifier.
    pub fn find(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }
}

fn check_value(row: usize, def: &FieldDef, value: &FieldValue) -> Result<(), StoreError> {
    if value.is_null() {
        if !def.nullable {
            return Err(StoreError::NullValue { row, field: def.name.clone() });
        }
        return Ok(());
    }
    let finite = value.as_f64().map_or(true, f64::is_finite);
    if !value.matches_type(def.field_type) || !finite {
        return Err(StoreError::TypeMismatch {
            row,
            field: def.name.clone(),
            expected: def.field_type,
            found: format!("{:?}", value),
        });
    }
    Ok(())
}

/// Integers stored in a `Number` field become `Number` so the field only
/// ever compares floats against floats.
fn widen(def: &FieldDef, value: FieldValue) -> FieldValue {
    match (def.field_type, value) {
        (FieldType::Number, FieldValue::Integer(n)) => FieldValue::Number(n as f64),
        (_, value) => value,
    }
}

fn mismatch(row: usize, def: &FieldDef, found: impl ToString) -> StoreError {
    StoreError::TypeMismatch {
        row,
        field: def.name.clone(),
        expected: def.field_type,
        found: found.to_string(),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Convert a JSON value to a field value of the declared type
fn json_to_value(
    row: usize,
    def: &FieldDef,
    value: &serde_json::Value,
) -> Result<FieldValue, StoreError> {
    use serde_json::Value;

    let converted = match (def.field_type, value) {
        (FieldType::Text | FieldType::Category, Value::String(s)) => {
            Some(FieldValue::Text(s.clone()))
        }
        (FieldType::Integer, Value::Number(n)) => n.as_i64().map(FieldValue::Integer),
        (FieldType::Number, Value::Number(n)) => n.as_f64().map(FieldValue::Number),
        (FieldType::Date, Value::String(s)) => parse_date(s).map(FieldValue::Date),
        (FieldType::Bool, Value::Bool(b)) => Some(FieldValue::Bool(*b)),
        _ => None,
    };

    converted.ok_or_else(|| mismatch(row, def, value))
}

/// Parse a CSV cell into a field value of the declared type
fn parse_cell(row: usize, def: &FieldDef, cell: &str) -> Result<FieldValue, StoreError> {
    if cell.is_empty() {
        return Ok(FieldValue::Null);
    }

    let parsed = match def.field_type {
        FieldType::Text | FieldType::Category => Some(FieldValue::Text(cell.to_string())),
        FieldType::Integer => cell.parse::<i64>().ok().map(FieldValue::Integer),
        FieldType::Number => cell.parse::<f64>().ok().map(FieldValue::Number),
        FieldType::Date => parse_date(cell).map(FieldValue::Date),
        FieldType::Bool => {
            if cell.eq_ignore_ascii_case("true") {
                Some(FieldValue::Bool(true))
            } else if cell.eq_ignore_ascii_case("false") {
                Some(FieldValue::Bool(false))
            } else {
                None
            }
        }
    };

    parsed.ok_or_else(|| mismatch(row, def, format!("'{}'", cell)))
}
