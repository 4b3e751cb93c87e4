//! Shop listing parameters, sorting and pagination.
//!
//! `GET /api/shop` accepts loosely-typed query strings. [`ShopParams`] holds
//! them as received; [`ShopQuery::try_from`] applies defaults and clamping
//! and validates the sort options against a fixed whitelist so that only
//! known column names are ever interpolated into SQL.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Products created within this many days are flagged `is_new` in listings.
pub const NEW_PRODUCT_WINDOW_DAYS: i64 = 7;

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw query string parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Validation failures for [`ShopParams`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopParamsError {
    #[error("Invalid {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("Invalid sortBy: {0}")]
    InvalidSortField(String),
    #[error("Invalid sortOrder: {0}")]
    InvalidSortOrder(String),
}

/// Sortable listing columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
    Name,
    Rating,
}

impl SortField {
    /// SQL expression to order by. `rating` is the computed select alias.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "p.created_at",
            Self::Price => "p.price",
            Self::Name => "p.name",
            Self::Rating => "rating",
        }
    }
}

impl FromStr for SortField {
    type Err = ShopParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.strip_prefix("p.").unwrap_or(trimmed) {
            "created_at" | "newest" => Ok(Self::CreatedAt),
            "price" => Ok(Self::Price),
            "name" => Ok(Self::Name),
            "rating" | "popularity" => Ok(Self::Rating),
            _ => Err(ShopParamsError::InvalidSortField(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ShopParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ShopParamsError::InvalidSortOrder(s.to_owned())),
        }
    }
}

/// Validated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for ShopQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            category: None,
            min_price: Decimal::ZERO,
            max_price: Decimal::from(1_000_000),
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ShopQuery {
    /// Rows to skip for the current page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_int(field: &'static str, value: &str) -> Result<i64, ShopParamsError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ShopParamsError::InvalidNumber {
            field,
            value: value.to_owned(),
        })
}

fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, ShopParamsError> {
    Decimal::from_str(value.trim()).map_err(|_| ShopParamsError::InvalidNumber {
        field,
        value: value.to_owned(),
    })
}

impl TryFrom<ShopParams> for ShopQuery {
    type Error = ShopParamsError;

    fn try_from(params: ShopParams) -> Result<Self, Self::Error> {
        let defaults = Self::default();

        let page = match non_empty(params.page) {
            Some(v) => u32::try_from(parse_int("page", &v)?.max(1)).unwrap_or(u32::MAX),
            None => defaults.page,
        };
        let limit = match non_empty(params.limit) {
            Some(v) => {
                let clamped = parse_int("limit", &v)?.clamp(1, i64::from(MAX_PAGE_SIZE));
                u32::try_from(clamped).unwrap_or(MAX_PAGE_SIZE)
            }
            None => defaults.limit,
        };
        let min_price = match non_empty(params.min_price) {
            Some(v) => parse_decimal("minPrice", &v)?,
            None => defaults.min_price,
        };
        let max_price = match non_empty(params.max_price) {
            Some(v) => parse_decimal("maxPrice", &v)?,
            None => defaults.max_price,
        };
        let sort_by = match non_empty(params.sort_by) {
            Some(v) => v.parse()?,
            None => defaults.sort_by,
        };
        let sort_order = match non_empty(params.sort_order) {
            Some(v) => v.parse()?,
            None => defaults.sort_order,
        };

        Ok(Self {
            page,
            limit,
            search: non_empty(params.search),
            category: non_empty(params.category),
            min_price,
            max_price,
            sort_by,
            sort_order,
        })
    }
}

/// Pagination block of the listing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub pages: i64,
    pub current_page: u32,
    pub limit: u32,
}

impl Pagination {
    #[must_use]
    pub fn new(total: i64, query: &ShopQuery) -> Self {
        let limit = i64::from(query.limit.max(1));
        Self {
            total,
            pages: (total.max(0) + limit - 1) / limit,
            current_page: query.page,
            limit: query.limit,
        }
    }
}

/// Whether a product created at `created_at` still counts as new at `now`.
#[must_use]
pub fn is_new_within(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    created_at > now - Duration::days(NEW_PRODUCT_WINDOW_DAYS)
}
