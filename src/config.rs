/// View configuration: which fields are searched, page size, default sort
/// and the categorical "any" sentinel.

use crate::predicate::ANY_SENTINEL;
use crate::query::DEFAULT_PAGE_SIZE;
use crate::sort::SortSpec;
use crate::store::Schema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("search field '{0}' is not in the schema")]
    UnknownSearchField(String),

    #[error("default sort column '{0}' is not in the schema")]
    UnknownSortColumn(String),

    #[error("page size must be at least 1")]
    ZeroPageSize,

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for one view over a record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConfig {
    /// Fields matched against the search text
    pub search_fields: Vec<String>,
    pub page_size: usize,
    pub default_sort: Option<SortSpec>,
    /// Category value that disables a category filter
    pub any_sentinel: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            search_fields: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            default_sort: None,
            any_sentinel: ANY_SENTINEL.to_string(),
        }
    }
}

impl ViewConfig {
    /// Config that searches the given fields with default paging.
    pub fn searching<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ViewConfig {
            search_fields: fields.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_default_sort(mut self, sort: SortSpec) -> Self {
        self.default_sort = Some(sort);
        self
    }

    /// Parses a JSON configuration; missing keys take their defaults.
    ///
    /// ```
    /// use datagrid::ViewConfig;
    ///
    /// let json = r#"{"searchFields": ["product"], "pageSize": 25}"#;
    /// let config = ViewConfig::from_json(json).unwrap();
    /// assert_eq!(config.page_size, 25);
    /// assert_eq!(config.any_sentinel, "all");
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ViewConfig = serde_json::from_str(json)?;
        if config.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        Ok(config)
    }

    /// Checks the configuration against the schema it will be used with.
    pub fn validate(&self, schema: &Schema) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if let Some(field) = self.search_fields.iter().find(|f| !schema.contains(f)) {
            return Err(ConfigError::UnknownSearchField(field.clone()));
        }
        if let Some(sort) = &self.default_sort {
            if !schema.contains(&sort.column) {
                return Err(ConfigError::UnknownSortColumn(sort.column.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldType;

    fn schema() -> Schema {
        Schema::new("id", vec![
            ("id".to_string(), FieldType::Integer, false),
            ("product".to_string(), FieldType::Text, false),
        ])
    }

    #[test]
    fn test_defaults() {
        let config = ViewConfig::default();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.any_sentinel, "all");
        assert!(config.default_sort.is_none());
    }

    #[test]
    fn test_from_json_with_sort() {
        let config = ViewConfig::from_json(
            r#"{
                "searchFields": ["product"],
                "defaultSort": {"column": "product", "direction": "desc"},
                "anySentinel": "any"
            }"#,
        )
        .unwrap();
        assert_eq!(config.default_sort, Some(SortSpec::descending("product")));
        assert_eq!(config.any_sentinel, "any");
        assert!(config.validate(&schema()).is_ok());
    }

    #[test]
    fn test_from_json_rejects_zero_page_size() {
        assert!(matches!(
            ViewConfig::from_json(r#"{"pageSize": 0}"#),
            Err(ConfigError::ZeroPageSize)
        ));
    }

    #[test]
    fn test_validate_unknown_fields() {
        let config = ViewConfig::searching(["title"]);
        assert!(matches!(
            config.validate(&schema()),
            Err(ConfigError::UnknownSearchField(ref f)) if f == "title"
        ));

        let config =
            ViewConfig::searching(["product"]).with_default_sort(SortSpec::ascending("price"));
        assert!(matches!(
            config.validate(&schema()),
            Err(ConfigError::UnknownSortColumn(_))
        ));
    }
}
