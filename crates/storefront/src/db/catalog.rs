//! Catalog repository implementation for [`PgStore`].

use async_trait::async_trait;

use treadline_core::ProductId;

use super::store::CatalogRepo;
use super::{PgStore, RepositoryError};
use crate::models::{Product, VariantSummary};

#[async_trait]
impl CatalogRepo for PgStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, thumbnail
            FROM storefront.product
            ORDER BY name ASC
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(products)
    }

    async fn list_variants(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<VariantSummary>, RepositoryError> {
        let variants = sqlx::query_as::<_, VariantSummary>(
            r"
            SELECT v.id, c.name AS color, s.label AS size
            FROM storefront.product_variant v
            JOIN storefront.color c ON c.id = v.color_id
            JOIN storefront.size s ON s.id = v.size_id
            WHERE v.product_id = $1
            ORDER BY c.name ASC, s.sort_order ASC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool())
        .await?;

        Ok(variants)
    }
}
