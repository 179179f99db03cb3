//! Read paths: availability, product roll-ups and raw ledger rows.

use tracing::{debug, instrument};

use stockledger_core::{LocationId, ProductId, VariantId};
use stockledger_inventory::{
    InventoryLevel, ProductSummary, VariantAvailability, calculate_atp, summarize_product,
    variant_availability,
};

use super::InventoryService;
use crate::error::LedgerResult;
use crate::store::InventoryStore;

impl<S: InventoryStore> InventoryService<S> {
    /// On-hand minus reserved for a variant, summed over every location.
    #[instrument(skip(self), fields(variant_id = %variant_id), err)]
    pub async fn calculate_atp(&self, variant_id: VariantId) -> LedgerResult<i64> {
        let levels = self.store.levels_for_variant(variant_id).await?;
        Ok(calculate_atp(&levels))
    }

    /// Availability of every variant of a product, smallest pack first.
    ///
    /// Empty when the product is unknown or has no variants.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn variant_availability(
        &self,
        product_id: ProductId,
    ) -> LedgerResult<Vec<VariantAvailability>> {
        let variants = self.store.variants_for_product(product_id).await?;
        let mut out = Vec::with_capacity(variants.len());
        for variant in &variants {
            let levels = self.store.levels_for_variant(variant.id).await?;
            out.push(variant_availability(variant, &levels));
        }
        Ok(out)
    }

    /// Product-wide totals plus per-variant availability.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn product_summary(&self, product_id: ProductId) -> LedgerResult<Option<ProductSummary>> {
        let Some(product) = self.store.product(product_id).await? else {
            debug!("product summary requested for unknown product");
            return Ok(None);
        };
        let variants = self.variant_availability(product_id).await?;
        Ok(Some(summarize_product(&product, variants)))
    }

    pub async fn level(
        &self,
        variant_id: VariantId,
        location_id: LocationId,
    ) -> LedgerResult<Option<InventoryLevel>> {
        Ok(self.store.level(variant_id, location_id).await?)
    }

    pub async fn levels_for_variant(&self, variant_id: VariantId) -> LedgerResult<Vec<InventoryLevel>> {
        Ok(self.store.levels_for_variant(variant_id).await?)
    }
}
