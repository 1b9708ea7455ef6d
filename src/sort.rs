/// DataGrid Sort Engine
///
/// Orders filtered records by one or more columns. Sorting is always stable:
/// records that compare equal keep their relative input order, in both
/// directions. Descending order reverses the comparator, not the output, so
/// ties are still broken by input position.

use crate::store::Record;
use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order (smallest first)
    #[default]
    #[serde(rename = "asc", alias = "ascending")]
    Ascending,
    /// Descending order (largest first)
    #[serde(rename = "desc", alias = "descending")]
    Descending,
}

impl SortDirection {
    /// Parses `asc`/`desc` (or the long forms), ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("asc"),
            SortDirection::Descending => f.write_str("desc"),
        }
    }
}

/// The user-facing sort state: a column and a direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        SortSpec {
            column: column.into(),
            direction,
        }
    }

    pub fn ascending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Ascending)
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Descending)
    }

    /// Parses `column`, `column:asc` or `column:desc`.
    pub fn parse(s: &str) -> Option<Self> {
        let (column, direction) = match s.split_once(':') {
            Some((column, dir)) => (column, SortDirection::parse(dir)?),
            None => (s, SortDirection::Ascending),
        };
        let column = column.trim();
        if column.is_empty() {
            return None;
        }
        Some(SortSpec::new(column, direction))
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.column, self.direction)
    }
}

/// A single sort key specifying a column, direction and NULL placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub direction: SortDirection,
    /// Whether NULL values should be placed first or last
    pub nulls_first: bool,
}

impl SortKey {
    /// Ascending key, nulls last.
    pub fn ascending(column: impl Into<String>) -> Self {
        SortKey::new(column, SortDirection::Ascending, false)
    }

    /// Descending key, nulls last.
    pub fn descending(column: impl Into<String>) -> Self {
        SortKey::new(column, SortDirection::Descending, false)
    }

    pub fn new(column: impl Into<String>, direction: SortDirection, nulls_first: bool) -> Self {
        SortKey {
            column: column.into(),
            direction,
            nulls_first,
        }
    }

    /// Compare two records on this key.
    ///
    /// NULL placement does not flip with the direction: with
    /// `nulls_first == false` nulls end up last both ascending and
    /// descending.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let val_a = a.get(&self.column).filter(|v| !v.is_null());
        let val_b = b.get(&self.column).filter(|v| !v.is_null());

        match (val_a, val_b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => {
                if self.nulls_first {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (Some(_), None) => {
                if self.nulls_first {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (Some(x), Some(y)) => {
                let base = FieldValue::compare(x, y);
                match self.direction {
                    SortDirection::Ascending => base,
                    SortDirection::Descending => base.reverse(),
                }
            }
        }
    }
}

impl From<&SortSpec> for SortKey {
    fn from(spec: &SortSpec) -> Self {
        SortKey::new(spec.column.clone(), spec.direction, false)
    }
}

/// Sorts `records` in place by a single column.
pub fn sort_records(records: &mut [&Record], column: &str, direction: SortDirection) {
    let key = SortKey::new(column, direction, false);
    records.sort_by(|a, b| key.compare(a, b));
}

/// Sorts `records` in place by several keys: the first is primary, later
/// keys only break ties of the earlier ones. Remaining ties keep input order.
pub fn sort_records_by(records: &mut [&Record], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    records.sort_by(|a, b| {
        keys.iter()
            .map(|key| key.compare(a, b))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}
