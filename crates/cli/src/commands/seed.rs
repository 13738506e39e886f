//! Seed the catalog from a YAML description.
//!
//! Reads products, colors, and sizes from a YAML file and inserts them
//! into the catalog tables. Seeding is idempotent: colors and sizes are
//! upserted, and products that already exist (by name) are skipped.
//!
//! # Usage
//!
//! ```bash
//! tl-cli seed catalog -f catalog.yaml
//! ```
//!
//! # File Format
//!
//! ```yaml
//! colors:
//!   - Slate
//!   - Moss
//! sizes:
//!   - label: "42"
//!     sort_order: 420
//! products:
//!   - name: Cascadia Trail Runner
//!     description: Grippy trail shoe for wet terrain.
//!     price: "129.00"
//!     thumbnail: /img/cascadia.webp
//!     variants:
//!       - color: Slate
//!         size: "42"
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::{error, info};

use treadline_core::{ColorId, ProductId, SizeId};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The catalog file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The catalog file could not be read.
    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not valid YAML.
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The catalog failed validation.
    #[error("{0} validation errors found")]
    Invalid(usize),

    /// A variant names a color or size the file does not declare.
    #[error("Unknown color or size in variant: {0}")]
    UnknownReference(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The parsed catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    colors: Vec<String>,
    sizes: Vec<SizeEntry>,
    products: Vec<ProductEntry>,
}

#[derive(Debug, Deserialize)]
struct SizeEntry {
    label: String,
    sort_order: i32,
}

#[derive(Debug, Deserialize)]
struct ProductEntry {
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: Decimal,
    #[serde(default)]
    thumbnail: Option<String>,
    variants: Vec<VariantEntry>,
}

#[derive(Debug, Deserialize)]
struct VariantEntry {
    color: String,
    size: String,
}

#[derive(Debug, Default)]
struct LoadSummary {
    products_inserted: u64,
    products_skipped: u64,
    variants_inserted: u64,
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file cannot
/// be read or parsed, validation fails, or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .map_err(|_| SeedError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate the YAML before connecting to the database.
    let content = tokio::fs::read_to_string(path).await?;
    let parsed: CatalogFile = serde_yaml::from_str(&content)?;

    info!(products = parsed.products.len(), "Parsed catalog");

    let errors = validate(&parsed);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    info!("Catalog validated successfully");

    let pool = PgPool::connect(&database_url).await?;
    info!("Connected to database");

    // All or nothing: a half-loaded catalog is worse than none.
    let mut tx = pool.begin().await?;
    let summary = load(&mut tx, &parsed).await?;
    tx.commit().await?;

    info!("Seeding complete!");
    info!("  Products inserted: {}", summary.products_inserted);
    info!("  Products skipped (already exist): {}", summary.products_skipped);
    info!("  Variants inserted: {}", summary.variants_inserted);

    Ok(())
}

/// Check the catalog for internal consistency.
fn validate(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut colors = HashSet::new();
    for color in &catalog.colors {
        if color.trim().is_empty() {
            errors.push("color: name must not be empty".to_owned());
        } else if !colors.insert(color.as_str()) {
            errors.push(format!("color {color}: declared more than once"));
        }
    }

    let mut sizes = HashSet::new();
    for size in &catalog.sizes {
        if size.label.trim().is_empty() {
            errors.push("size: label must not be empty".to_owned());
        } else if !sizes.insert(size.label.as_str()) {
            errors.push(format!("size {}: declared more than once", size.label));
        }
    }

    for product in &catalog.products {
        let name = &product.name;
        if name.trim().is_empty() {
            errors.push("product: name must not be empty".to_owned());
        }
        if product.price < Decimal::ZERO {
            errors.push(format!("product {name}: price must not be negative"));
        }
        if product.variants.is_empty() {
            errors.push(format!("product {name}: has no variants"));
        }

        let mut seen = HashSet::new();
        for variant in &product.variants {
            if !colors.contains(variant.color.as_str()) {
                errors.push(format!(
                    "product {name}: variant references undeclared color {}",
                    variant.color
                ));
            }
            if !sizes.contains(variant.size.as_str()) {
                errors.push(format!(
                    "product {name}: variant references undeclared size {}",
                    variant.size
                ));
            }
            if !seen.insert((variant.color.as_str(), variant.size.as_str())) {
                errors.push(format!(
                    "product {name}: duplicate variant {} / {}",
                    variant.color, variant.size
                ));
            }
        }
    }

    errors
}

/// Insert the catalog inside one transaction.
async fn load(
    tx: &mut Transaction<'_, Postgres>,
    catalog: &CatalogFile,
) -> Result<LoadSummary, SeedError> {
    let mut summary = LoadSummary::default();

    for color in &catalog.colors {
        sqlx::query(
            r"
            INSERT INTO storefront.color (name)
            VALUES ($1)
            ON CONFLICT (name) DO NOTHING
            ",
        )
        .bind(color)
        .execute(&mut **tx)
        .await?;
    }

    for size in &catalog.sizes {
        sqlx::query(
            r"
            INSERT INTO storefront.size (label, sort_order)
            VALUES ($1, $2)
            ON CONFLICT (label) DO NOTHING
            ",
        )
        .bind(&size.label)
        .bind(size.sort_order)
        .execute(&mut **tx)
        .await?;
    }

    // Resolve ids after the upserts so pre-existing rows are picked up too.
    let colors: Vec<(ColorId, String)> =
        sqlx::query_as("SELECT id, name FROM storefront.color")
            .fetch_all(&mut **tx)
            .await?;
    let color_ids: HashMap<String, ColorId> =
        colors.into_iter().map(|(id, name)| (name, id)).collect();

    let sizes: Vec<(SizeId, String)> =
        sqlx::query_as("SELECT id, label FROM storefront.size")
            .fetch_all(&mut **tx)
            .await?;
    let size_ids: HashMap<String, SizeId> =
        sizes.into_iter().map(|(id, label)| (label, id)).collect();

    for product in &catalog.products {
        let existing: Option<ProductId> =
            sqlx::query_scalar("SELECT id FROM storefront.product WHERE name = $1")
                .bind(&product.name)
                .fetch_optional(&mut **tx)
                .await?;

        if existing.is_some() {
            summary.products_skipped += 1;
            continue;
        }

        let product_id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.product (name, description, price, thumbnail)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.thumbnail)
        .fetch_one(&mut **tx)
        .await?;

        summary.products_inserted += 1;

        for variant in &product.variants {
            let color_id = color_ids
                .get(&variant.color)
                .copied()
                .ok_or_else(|| SeedError::UnknownReference(variant.color.clone()))?;
            let size_id = size_ids
                .get(&variant.size)
                .copied()
                .ok_or_else(|| SeedError::UnknownReference(variant.size.clone()))?;

            let result = sqlx::query(
                r"
                INSERT INTO storefront.product_variant (product_id, color_id, size_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (product_id, color_id, size_id) DO NOTHING
                ",
            )
            .bind(product_id)
            .bind(color_id)
            .bind(size_id)
            .execute(&mut **tx)
            .await?;

            summary.variants_inserted += result.rows_affected();
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> CatalogFile {
        serde_yaml::from_str(
            r#"
            colors:
              - Slate
              - Moss
            sizes:
              - label: "42"
                sort_order: 420
              - label: "43"
                sort_order: 430
            products:
              - name: Cascadia Trail Runner
                description: Grippy trail shoe for wet terrain.
                price: "129.00"
                thumbnail: /img/cascadia.webp
                variants:
                  - color: Slate
                    size: "42"
                  - color: Moss
                    size: "43"
              - name: Ridgeway Mid
                price: "149.00"
                variants:
                  - color: Moss
                    size: "43"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn sample_catalog_is_valid() {
        let catalog = sample();
        assert_eq!(validate(&catalog), Vec::<String>::new());
        assert_eq!(catalog.products.len(), 2);
        assert_eq!(catalog.products[0].variants.len(), 2);
        assert_eq!(catalog.products[1].description, None);
    }

    #[test]
    fn undeclared_color_is_rejected() {
        let mut catalog = sample();
        catalog.products[0].variants[0].color = "Crimson".to_owned();

        let errors = validate(&catalog);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("undeclared color Crimson"));
    }

    #[test]
    fn duplicate_variant_is_rejected() {
        let mut catalog = sample();
        let dup = VariantEntry {
            color: "Slate".to_owned(),
            size: "42".to_owned(),
        };
        catalog.products[0].variants.push(dup);

        let errors = validate(&catalog);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("duplicate variant"));
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut catalog = sample();
        catalog.products[0].price = Decimal::new(-100, 2);

        let errors = validate(&catalog);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("price must not be negative"));
    }

    #[test]
    fn product_without_variants_is_rejected() {
        let mut catalog = sample();
        catalog.products[1].variants.clear();

        let errors = validate(&catalog);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("has no variants"));
    }
}
