//! Shop listing: filtered, sorted, paginated products plus facets.
//!
//! The filter clause is written once and rendered into two statements: a
//! `COUNT` for pagination and the page selection itself. Category facet
//! counts and the global price range are separate aggregates and ignore the
//! active filters. Nothing is cached.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use vegi_shop_core::shop::{Pagination, ShopQuery, is_new_within};
use vegi_shop_core::CategoryId;

use super::products::{IMAGES_SUBQUERY, ProductDetail, RATING_SUBQUERY, REVIEWS_COUNT_SUBQUERY};
use crate::RepositoryError;

/// A listed product: details plus the recomputed `is_new` flag.
pub type ShopProduct = ProductDetail;

/// Products per category, including empty categories.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryFacet {
    pub id: CategoryId,
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceRange {
    #[serde(with = "rust_decimal::serde::float")]
    pub min: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max: Decimal,
}

impl PriceRange {
    /// Range reported when there are no products.
    pub const EMPTY: Self = Self {
        min: Decimal::ZERO,
        max: Decimal::from_parts(1000, 0, 0, false, 0),
    };
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopFilters {
    pub categories: Vec<CategoryFacet>,
    pub price_range: PriceRange,
}

/// Response body of `GET /api/shop`.
#[derive(Debug, Clone, Serialize)]
pub struct ShopListing {
    pub products: Vec<ShopProduct>,
    pub pagination: Pagination,
    pub filters: ShopFilters,
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Append the shared `FROM ... WHERE ...` clause.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ShopQuery) {
    qb.push(" FROM products p LEFT JOIN categories c ON c.id = p.category_id");
    qb.push(" WHERE p.price >= ")
        .push_bind(query.min_price)
        .push(" AND p.price <= ")
        .push_bind(query.max_price);

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(category) = &query.category {
        qb.push(" AND LOWER(c.name) = LOWER(")
            .push_bind(category.clone())
            .push(")");
    }
}

/// `SELECT COUNT(p.id)` over the filtered products.
#[must_use]
pub fn count_query(query: &ShopQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(p.id)");
    push_filters(&mut qb, query);
    qb
}

/// The sorted, paged selection.
#[must_use]
pub fn page_query(query: &ShopQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT p.id, p.name, p.slug, p.description, p.price, p.old_price, p.stock_quantity, \
         p.category_id, p.is_new, p.is_sale, p.nutritional_info, p.created_at, p.updated_at, \
         c.name AS category_name, {IMAGES_SUBQUERY} AS images, \
         {RATING_SUBQUERY} AS rating, {REVIEWS_COUNT_SUBQUERY} AS reviews_count"
    ));
    push_filters(&mut qb, query);

    let direction = query.sort_order.keyword();
    qb.push(" ORDER BY ")
        .push(query.sort_by.column())
        .push(" ")
        .push(direction)
        .push(", p.id ")
        .push(direction);
    qb.push(" LIMIT ")
        .push_bind(i64::from(query.limit))
        .push(" OFFSET ")
        .push_bind(query.offset());
    qb
}

/// Repository for the shop listing.
pub struct ShopRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Run the listing, facet and price range queries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn list(&self, query: &ShopQuery) -> Result<ShopListing, RepositoryError> {
        let total: i64 = count_query(query)
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut products: Vec<ShopProduct> = page_query(query)
            .build_query_as()
            .fetch_all(self.pool)
            .await?;

        let now = Utc::now();
        for product in &mut products {
            let p = &mut product.summary.product;
            p.is_new = is_new_within(p.created_at, now);
        }

        let categories = self.category_facets().await?;
        let price_range = self.price_range().await?;

        Ok(ShopListing {
            products,
            pagination: Pagination::new(total, query),
            filters: ShopFilters {
                categories,
                price_range,
            },
        })
    }

    /// Product counts for every category, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_facets(&self) -> Result<Vec<CategoryFacet>, RepositoryError> {
        let facets = sqlx::query_as::<_, CategoryFacet>(
            r"
            SELECT c.id, c.name, COUNT(p.id) AS count
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            GROUP BY c.id, c.name
            ORDER BY c.name ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(facets)
    }

    /// Lowest and highest price over all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn price_range(&self) -> Result<PriceRange, RepositoryError> {
        let (min, max): (Option<Decimal>, Option<Decimal>) =
            sqlx::query_as("SELECT MIN(price), MAX(price) FROM products")
                .fetch_one(self.pool)
                .await?;
        Ok(PriceRange {
            min: min.unwrap_or(PriceRange::EMPTY.min),
            max: max.unwrap_or(PriceRange::EMPTY.max),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vegi_shop_core::shop::{ShopParams, SortField, SortOrder};

    use super::*;

    fn query(search: Option<&str>, category: Option<&str>) -> ShopQuery {
        ShopQuery {
            search: search.map(str::to_owned),
            category: category.map(str::to_owned),
            ..ShopQuery::default()
        }
    }

    #[test]
    fn test_count_query_without_optional_filters() {
        let qb = count_query(&ShopQuery::default());
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(p.id) FROM products p LEFT JOIN categories c ON c.id = p.category_id \
             WHERE p.price >= $1 AND p.price <= $2"
        );
    }

    #[test]
    fn test_count_query_with_search_and_category() {
        let qb = count_query(&query(Some("kale"), Some("Greens")));
        let sql = qb.sql();
        assert!(sql.ends_with(
            "AND (p.name ILIKE $3 OR p.description ILIKE $4) AND LOWER(c.name) = LOWER($5)"
        ));
    }

    #[test]
    fn test_count_and_page_share_filters() {
        let q = query(Some("apple"), Some("Fruit"));
        let count_sql = count_query(&q).sql().to_owned();
        let page_sql = page_query(&q).sql().to_owned();
        let filters = count_sql.trim_start_matches("SELECT COUNT(p.id)");
        assert!(page_sql.contains(filters));
    }

    #[test]
    fn test_page_query_sort_and_paging() {
        let q = ShopQuery {
            sort_by: SortField::Price,
            sort_order: SortOrder::Asc,
            ..ShopQuery::default()
        };
        let qb = page_query(&q);
        assert!(
            qb.sql()
                .ends_with(" ORDER BY p.price ASC, p.id ASC LIMIT $3 OFFSET $4")
        );
    }

    #[test]
    fn test_page_query_rating_sort_uses_alias() {
        let params = ShopParams {
            sort_by: Some("popularity".to_owned()),
            ..ShopParams::default()
        };
        let q = ShopQuery::try_from(params).unwrap();
        let qb = page_query(&q);
        assert!(qb.sql().contains(" AS rating,"));
        assert!(qb.sql().contains(" ORDER BY rating DESC, p.id DESC"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
        assert_eq!(escape_like("beet"), "beet");
    }

    #[test]
    fn test_price_range_empty_default() {
        assert_eq!(PriceRange::EMPTY.max, Decimal::from(1000));
        let json = serde_json::to_value(PriceRange::EMPTY).unwrap();
        assert_eq!(json["max"], 1000.0);
    }
}
