/// DataGrid - Tabular Data View Pipeline
///
/// Turns a fixed, schema-checked list of records into the page a user is
/// looking at: free-text search, per-field filters, a stable sort and
/// pagination, recomputed from scratch on every query change.
///
/// The pipeline is split into independent stages that can be used on their
/// own: `predicate` (search and filters), `sort`, `pager`. The
/// `ViewController` composes them over a `RecordStore`.

pub mod value;
pub mod store;
pub mod predicate;
pub mod sort;
pub mod pager;
pub mod query;
pub mod config;
pub mod controller;
pub mod board;
pub mod sample;

pub use value::{FieldType, FieldValue};
pub use store::{FieldDef, Record, RecordStore, Schema, StoreError};
pub use predicate::{Filter, MatchContext, Matcher};
pub use sort::{SortDirection, SortKey, SortSpec};
pub use pager::{PageError, PageSlice};
pub use query::{Query, QueryUpdate};
pub use config::{ConfigError, ViewConfig};
pub use controller::{ViewController, ViewError, ViewResult};
pub use board::{Board, BoardError};
