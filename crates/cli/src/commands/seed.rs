//! Seed the catalog from a YAML file.
//!
//! Categories nest their products, so the file needs no database ids:
//!
//! ```yaml
//! categories:
//!   - name: Leafy Greens
//!     description: Salad leaves and cooking greens
//!     products:
//!       - name: Baby Spinach
//!         price: 3.49
//!         stock_quantity: 40
//!         is_new: true
//!         nutritional_info: { calories: "23", protein: "2.9g" }
//!         images:
//!           - https://images.example.com/spinach.jpg
//! ```
//!
//! Seeding is idempotent: a category whose slug exists is reused, and a
//! product whose slug exists is skipped.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info};

use vegi_shop_core::{CategoryId, NutritionalInfo, Price, Slug};
use vegi_shop_db::{CategoryInput, CategoryRepository, ProductInput, ProductRepository, RepositoryError};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),
}

/// Top level of a seed file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCategory {
    pub name: String,
    /// Defaults to a slug derived from `name`.
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub old_price: Option<Decimal>,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_sale: bool,
    pub nutritional_info: Option<NutritionalInfo>,
    /// Image URLs; the first becomes the primary image.
    #[serde(default)]
    pub images: Vec<String>,
}

/// Counts reported after a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub categories_existing: usize,
    pub products_created: usize,
    pub products_skipped: usize,
}

impl SeedCategory {
    fn slug(&self) -> Result<Slug, String> {
        match self.slug.as_deref() {
            Some(explicit) => Slug::parse(explicit)
                .map_err(|e| format!("category '{}': {e}", self.name)),
            None => Slug::from_name(&self.name)
                .map_err(|_| format!("category '{}': name has no letters or digits", self.name)),
        }
    }

    fn input(&self) -> Result<CategoryInput, String> {
        Ok(CategoryInput {
            name: self.name.trim().to_owned(),
            slug: self.slug()?,
            description: non_blank(self.description.as_deref()),
        })
    }
}

impl SeedProduct {
    fn input(&self, category_id: CategoryId) -> Result<ProductInput, String> {
        let context = |msg: &str| format!("product '{}': {msg}", self.name);

        let slug =
            Slug::from_name(&self.name).map_err(|_| context("name has no letters or digits"))?;
        let price = Price::new(self.price).map_err(|e| context(&e.to_string()))?;
        let old_price = self
            .old_price
            .map(Price::new)
            .transpose()
            .map_err(|e| context(&format!("old_price: {e}")))?;
        if self.stock_quantity < 0 {
            return Err(context("stock_quantity cannot be negative"));
        }
        if self.images.iter().any(|url| url.trim().is_empty()) {
            return Err(context("image URLs cannot be blank"));
        }

        Ok(ProductInput {
            name: self.name.trim().to_owned(),
            slug,
            description: non_blank(self.description.as_deref()),
            price,
            old_price,
            stock_quantity: self.stock_quantity,
            category_id,
            is_new: self.is_new,
            is_sale: self.is_sale,
            nutritional_info: self.nutritional_info.clone().filter(|info| !info.is_empty()),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Check every entry before touching the database. Returns one message per
/// problem.
#[must_use]
pub fn validate(file: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut category_slugs = std::collections::HashSet::new();

    for category in &file.categories {
        match category.input() {
            Ok(input) => {
                if !category_slugs.insert(input.slug.clone()) {
                    errors.push(format!("duplicate category slug '{}'", input.slug.as_str()));
                }
            }
            Err(e) => errors.push(e),
        }
        for product in &category.products {
            // Any id will do, only field validation runs here
            if let Err(e) = product.input(CategoryId::new(0)) {
                errors.push(e);
            }
        }
    }
    errors
}

/// Load a seed file into the catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, or if a
/// database operation fails.
pub async fn catalog(file_path: &Path, clear_existing: bool) -> Result<SeedSummary, SeedError> {
    info!(path = %file_path.display(), "Loading catalog seed file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|source| SeedError::Read {
            path: file_path.display().to_string(),
            source,
        })?;
    let file: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&file);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let pool = connect().await?;

    if clear_existing {
        clear_catalog(&pool).await?;
    }

    let summary = load(&pool, &file).await?;

    info!("Seeding complete!");
    info!("  Categories created: {}", summary.categories_created);
    info!("  Categories already present: {}", summary.categories_existing);
    info!("  Products created: {}", summary.products_created);
    info!("  Products skipped (slug exists): {}", summary.products_skipped);

    Ok(summary)
}

/// Delete every product and category. Product images, cart lines and
/// reviews cascade; order lines keep their snapshot with a null product.
async fn clear_catalog(pool: &PgPool) -> Result<(), SeedError> {
    let mut tx = pool.begin().await?;
    let products = sqlx::query("DELETE FROM products").execute(&mut *tx).await?;
    let categories = sqlx::query("DELETE FROM categories").execute(&mut *tx).await?;
    tx.commit().await?;

    info!(
        products = products.rows_affected(),
        categories = categories.rows_affected(),
        "Cleared existing catalog"
    );
    Ok(())
}

async fn load(pool: &PgPool, file: &SeedFile) -> Result<SeedSummary, SeedError> {
    let categories = CategoryRepository::new(pool);
    let products = ProductRepository::new(pool);
    let mut summary = SeedSummary::default();

    for seed in &file.categories {
        let input = seed.input().map_err(|_| SeedError::Invalid(1))?;
        let category = match categories.get_by_slug(&input.slug).await? {
            Some(existing) => {
                summary.categories_existing += 1;
                existing
            }
            None => {
                summary.categories_created += 1;
                categories.create(&input).await?
            }
        };

        for seed_product in &seed.products {
            let input = seed_product
                .input(category.id)
                .map_err(|_| SeedError::Invalid(1))?;
            if products.slug_exists(&input.slug).await? {
                summary.products_skipped += 1;
                continue;
            }

            let mut tx = pool.begin().await?;
            let product = ProductRepository::insert(&mut tx, &input).await?;
            let urls: Vec<String> = seed_product
                .images
                .iter()
                .map(|url| url.trim().to_owned())
                .collect();
            ProductRepository::replace_images(&mut tx, product.id, &urls).await?;
            tx.commit().await?;

            summary.products_created += 1;
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
categories:
  - name: Leafy Greens
    description: Salad leaves and cooking greens
    products:
      - name: Baby Spinach
        price: 3.49
        stock_quantity: 40
        is_new: true
        nutritional_info: { calories: "23", protein: "2.9g" }
        images:
          - https://images.example.com/spinach.jpg
          - https://images.example.com/spinach-bag.jpg
      - name: Curly Kale
        price: 2.99
        old_price: 3.59
        is_sale: true
  - name: Root Vegetables
    slug: roots
"#;

    fn sample() -> SeedFile {
        serde_yaml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_sample() {
        let file = sample();
        assert_eq!(file.categories.len(), 2);
        let greens = &file.categories[0];
        assert_eq!(greens.products.len(), 2);
        assert_eq!(greens.products[0].images.len(), 2);
        assert_eq!(greens.products[1].old_price, Some(Decimal::new(359, 2)));
        assert_eq!(greens.products[1].stock_quantity, 0);
        assert!(file.categories[1].products.is_empty());
        assert!(validate(&file).is_empty());
    }

    #[test]
    fn test_category_slugs() {
        let file = sample();
        assert_eq!(file.categories[0].slug().unwrap().as_str(), "leafy-greens");
        assert_eq!(file.categories[1].slug().unwrap().as_str(), "roots");
    }

    #[test]
    fn test_product_input() {
        let file = sample();
        let input = file.categories[0].products[0]
            .input(CategoryId::new(7))
            .unwrap();
        assert_eq!(input.slug.as_str(), "baby-spinach");
        assert_eq!(input.price.amount(), Decimal::new(349, 2));
        assert_eq!(input.category_id, CategoryId::new(7));
        assert!(input.is_new);
        assert_eq!(
            input.nutritional_info.unwrap().protein.as_deref(),
            Some("2.9g")
        );
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let file: SeedFile = serde_yaml::from_str(
            r"
categories:
  - name: Fruit
    slug: Fruit Bowl
    products:
      - name: Apple
        price: -1
      - name: Pear
        price: 1.2
        stock_quantity: -4
  - name: fruit
",
        )
        .unwrap();

        let errors = validate(&file);
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors[0].starts_with("category 'Fruit':"));
        assert_eq!(errors[1], "product 'Apple': price cannot be negative");
        assert_eq!(errors[2], "product 'Pear': stock_quantity cannot be negative");
    }

    #[test]
    fn test_duplicate_category_slug() {
        let file: SeedFile =
            serde_yaml::from_str("categories:\n  - name: Herbs\n  - name: herbs\n").unwrap();
        assert_eq!(validate(&file), vec!["duplicate category slug 'herbs'"]);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(serde_yaml::from_str::<SeedFile>("categories:\n  - name: Herbs\n    colour: green\n").is_err());
    }

    #[test]
    fn test_bundled_seed_file_is_valid() {
        let content = include_str!("../../../../data/seed.yaml");
        let file: SeedFile = serde_yaml::from_str(content).unwrap();
        assert!(!file.categories.is_empty());
        assert_eq!(validate(&file), Vec::<String>::new());
    }
}
