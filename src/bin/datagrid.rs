/// DataGrid command line
///
/// Loads a record set (or the built-in product catalogue), applies one query
/// and prints the resulting page as JSON.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use datagrid::{
    sample, FieldType, Filter, QueryUpdate, RecordStore, Schema, SortSpec, ViewConfig,
    ViewController,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Parser)]
#[command(name = "datagrid", version, about = "Search, filter, sort and page a table of records")]
struct Cli {
    /// Records to load (.json array or .csv with a header row)
    #[arg(long, requires = "schema")]
    records: Option<PathBuf>,

    /// Schema document for --records
    #[arg(long, requires = "records")]
    schema: Option<PathBuf>,

    /// View configuration (searchFields, pageSize, defaultSort, anySentinel)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Free-text search over the configured search fields
    #[arg(long)]
    search: Option<String>,

    /// Exact-match filter on a category or bool field, e.g. region=asia
    #[arg(long = "filter", value_name = "FIELD=VALUE")]
    filters: Vec<String>,

    /// Lower bound on a numeric or date field, e.g. price=10
    #[arg(long = "min", value_name = "FIELD=VALUE")]
    mins: Vec<String>,

    /// Upper bound on a numeric or date field, e.g. released=2023-12-31
    #[arg(long = "max", value_name = "FIELD=VALUE")]
    maxs: Vec<String>,

    /// Sort column, optionally with direction, e.g. price:desc
    #[arg(long)]
    sort: Option<String>,

    /// Zero-based page index
    #[arg(long)]
    page: Option<usize>,

    #[arg(long)]
    page_size: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    let store = load_store(&cli)?;
    let config = match &cli.config {
        Some(path) => ViewConfig::from_json(&read(path)?)
            .with_context(|| format!("invalid config {}", path.display()))?,
        None if cli.records.is_none() => sample::product_config(),
        None => ViewConfig::searching(text_fields(store.schema())),
    };

    log::info!("loaded {} records from '{}'", store.len(), store.name());

    let update = build_update(&cli, store.schema())?;
    let mut view = ViewController::new(Rc::new(store), config)?;
    let result = view.on_query_change(update)?;

    println!("{}", result.to_json()?);
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn load_store(cli: &Cli) -> Result<RecordStore> {
    let (Some(records), Some(schema)) = (&cli.records, &cli.schema) else {
        return Ok(sample::products()?);
    };

    let schema = Schema::from_json(&read(schema)?)
        .with_context(|| format!("invalid schema {}", schema.display()))?;
    let name = records
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("records");
    let text = read(records)?;

    let is_csv = records
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let store = if is_csv {
        RecordStore::from_csv(name, schema, &text)
    } else {
        RecordStore::from_json(name, schema, &text)
    };
    store.with_context(|| format!("cannot load {}", records.display()))
}

fn text_fields(schema: &Schema) -> Vec<String> {
    schema
        .fields()
        .iter()
        .filter(|f| f.field_type.is_textual())
        .map(|f| f.name.clone())
        .collect()
}

fn split_assignment(arg: &str) -> Result<(&str, &str)> {
    arg.split_once('=')
        .map(|(field, value)| (field.trim(), value.trim()))
        .ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{}'", arg))
}

#[derive(Default)]
struct Bounds {
    min: Option<String>,
    max: Option<String>,
}

fn build_update(cli: &Cli, schema: &Schema) -> Result<QueryUpdate> {
    let mut update = QueryUpdate {
        search_text: cli.search.clone(),
        page: cli.page,
        page_size: cli.page_size,
        ..QueryUpdate::default()
    };

    for arg in &cli.filters {
        let (field, value) = split_assignment(arg)?;
        let filter = match schema.field_type(field) {
            Some(FieldType::Bool) => Filter::flag(
                value
                    .parse()
                    .with_context(|| format!("'{}' is not true or false", value))?,
            ),
            _ => Filter::category(value),
        };
        update = update.with_filter(field, filter);
    }

    let mut bounds: BTreeMap<&str, Bounds> = BTreeMap::new();
    for arg in &cli.mins {
        let (field, value) = split_assignment(arg)?;
        bounds.entry(field).or_default().min = Some(value.to_string());
    }
    for arg in &cli.maxs {
        let (field, value) = split_assignment(arg)?;
        bounds.entry(field).or_default().max = Some(value.to_string());
    }
    for (field, bounds) in bounds {
        let filter = match schema.field_type(field) {
            Some(FieldType::Date) => Filter::date_range(
                bounds.min.as_deref().map(parse_date).transpose()?,
                bounds.max.as_deref().map(parse_date).transpose()?,
            ),
            _ => Filter::range(
                bounds.min.as_deref().map(parse_number).transpose()?,
                bounds.max.as_deref().map(parse_number).transpose()?,
            ),
        };
        update = update.with_filter(field, filter);
    }

    if let Some(sort) = &cli.sort {
        let Some(spec) = SortSpec::parse(sort) else {
            bail!("invalid sort '{}', expected column[:asc|desc]", sort);
        };
        update = update.with_sort(spec.column, spec.direction);
    }

    Ok(update)
}

fn parse_number(s: &str) -> Result<f64> {
    s.parse().with_context(|| format!("'{}' is not a number", s))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("'{}' is not a YYYY-MM-DD date", s))
}
