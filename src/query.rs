//! List parameters: filters, search, sort and offset pagination.

use crate::case::to_snake_case;
use crate::config::{ColumnDef, TableDef};
use crate::error::AppError;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

pub const DEFAULT_SORT_BY: &str = "created_at";
pub const DEFAULT_PER_PAGE: u32 = 15;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(AppError::BadRequest(format!(
                "invalid sort order: {} (expected asc or desc)",
                s
            ))),
        }
    }
}

/// Page-size bounds applied to query-string input.
#[derive(Clone, Copy, Debug)]
pub struct Paging {
    pub default_per_page: u32,
    pub max_per_page: u32,
}

impl Default for Paging {
    fn default() -> Self {
        Paging {
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: 100,
        }
    }
}

/// Unchecked list request, as received. Field names are checked against a table in `resolve`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    pub filters: Vec<(String, String)>,
    pub search: String,
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub per_page: u32,
    /// 1-indexed.
    pub page: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            filters: Vec::new(),
            search: String::new(),
            sort_by: DEFAULT_SORT_BY.into(),
            sort_order: SortOrder::Desc,
            per_page: DEFAULT_PER_PAGE,
            page: 1,
        }
    }
}

impl ListQuery {
    pub fn filter(mut self, field: &str, value: impl Into<String>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort_by = field.to_string();
        self.sort_order = order;
        self
    }

    pub fn per_page(mut self, n: u32) -> Self {
        self.per_page = n;
        self
    }

    pub fn page(mut self, n: u32) -> Self {
        self.page = n;
        self
    }

    /// Parse query-string pairs: `filters[field]`, `search`, `sort_by`, `sort_order`,
    /// `per_page`, `page`. camelCase keys are accepted. Unknown keys are ignored.
    pub fn from_params(params: &HashMap<String, String>, paging: Paging) -> Result<Self, AppError> {
        let mut q = ListQuery {
            per_page: paging.default_per_page,
            ..ListQuery::default()
        };
        for (k, v) in params {
            let key = to_snake_case(k);
            match key.as_str() {
                "search" => q.search = v.clone(),
                "sort_by" => q.sort_by = to_snake_case(v.trim()),
                "sort_order" => q.sort_order = v.parse()?,
                "per_page" => q.per_page = parse_count("per_page", v)?,
                "page" => q.page = parse_count("page", v)?,
                _ => {
                    if let Some(field) = key.strip_prefix("filters[").and_then(|f| f.strip_suffix(']')) {
                        q.filters.push((field.to_string(), v.clone()));
                    }
                }
            }
        }
        q.filters.sort();
        q.per_page = q.per_page.clamp(1, paging.max_per_page.max(1));
        q.page = q.page.max(1);
        Ok(q)
    }

    /// Check field names against the table's allow-lists and type the filter values.
    pub fn resolve(&self, table: &'static TableDef) -> Result<ResolvedQuery, AppError> {
        let mut filters = Vec::with_capacity(self.filters.len());
        for (field, raw) in &self.filters {
            let column = table
                .column(field)
                .filter(|c| table.filterable.contains(&c.name))
                .ok_or_else(|| AppError::BadRequest(format!("filtering by '{}' is not allowed", field)))?;
            let value = column
                .ty
                .parse_filter(raw)
                .map_err(|e| AppError::BadRequest(format!("filter '{}' {}", field, e)))?;
            filters.push((column, value));
        }
        let sort = table
            .column(&self.sort_by)
            .filter(|c| table.sortable.contains(&c.name))
            .ok_or_else(|| AppError::BadRequest(format!("sorting by '{}' is not allowed", self.sort_by)))?;
        let search = Some(self.search.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(ResolvedQuery {
            filters,
            search,
            sort,
            order: self.sort_order,
            per_page: self.per_page.max(1),
            page: self.page.max(1),
        })
    }
}

fn parse_count(name: &str, raw: &str) -> Result<u32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be a positive integer", name)))
}

/// List request whose identifiers all come from static table metadata.
#[derive(Clone, Debug)]
pub struct ResolvedQuery {
    pub filters: Vec<(&'static ColumnDef, Value)>,
    pub search: Option<String>,
    pub sort: &'static ColumnDef,
    pub order: SortOrder,
    pub per_page: u32,
    pub page: u32,
}

impl ResolvedQuery {
    pub fn limit(&self) -> u64 {
        self.per_page as u64
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }
}
