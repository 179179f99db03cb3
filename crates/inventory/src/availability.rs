//! Read-only availability math over ledger rows.
//!
//! Nothing here clamps at zero: a negative ATP (and therefore a negative
//! variant-level `available`) is how backorders are exposed to callers.

use serde::{Deserialize, Serialize};

use stockledger_core::{ProductId, VariantId};

use crate::catalog::{Product, ProductVariant};
use crate::level::InventoryLevel;
use crate::uom;

/// Totals across every location holding one variant.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTotals {
    pub on_hand_base: i64,
    pub reserved_base: i64,
    pub variant_qty: i64,
}

impl LevelTotals {
    pub fn of<'a>(levels: impl IntoIterator<Item = &'a InventoryLevel>) -> Self {
        levels.into_iter().fold(Self::default(), |acc, l| Self {
            on_hand_base: acc.on_hand_base + l.on_hand_base,
            reserved_base: acc.reserved_base + l.reserved_base,
            variant_qty: acc.variant_qty + l.variant_qty,
        })
    }

    pub fn atp(&self) -> i64 {
        self.on_hand_base - self.reserved_base
    }
}

/// Sum of on-hand minus sum of reserved across all given rows.
///
/// Every location counts; callers wanting pick-face-only ATP filter the rows
/// first.
pub fn calculate_atp<'a>(levels: impl IntoIterator<Item = &'a InventoryLevel>) -> i64 {
    LevelTotals::of(levels).atp()
}

/// Variant-level availability as consumed by channel sync and the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAvailability {
    pub variant_id: VariantId,
    pub sku: String,
    pub units_per_variant: u32,
    /// `floor(atp_base / units_per_variant)`; negative under backorder.
    pub available: i64,
    pub on_hand_base: i64,
    pub reserved_base: i64,
    pub atp_base: i64,
    pub physical_variant_qty: i64,
}

/// Availability of one variant from the rows that hold it.
pub fn variant_availability<'a>(
    variant: &ProductVariant,
    levels: impl IntoIterator<Item = &'a InventoryLevel>,
) -> VariantAvailability {
    let totals = LevelTotals::of(levels.into_iter().filter(|l| l.variant_id == variant.id));
    let atp_base = totals.atp();
    VariantAvailability {
        variant_id: variant.id,
        sku: variant.sku.clone(),
        units_per_variant: variant.units_per_variant,
        available: uom::to_variant_units(variant, atp_base),
        on_hand_base: totals.on_hand_base,
        reserved_base: totals.reserved_base,
        atp_base,
        physical_variant_qty: totals.variant_qty,
    }
}

/// Product-wide roll-up across all variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_id: ProductId,
    pub base_sku: String,
    pub name: String,
    pub on_hand_base: i64,
    pub reserved_base: i64,
    pub atp_base: i64,
    pub variants: Vec<VariantAvailability>,
}

pub fn summarize_product(product: &Product, variants: Vec<VariantAvailability>) -> ProductSummary {
    let on_hand_base = variants.iter().map(|v| v.on_hand_base).sum();
    let reserved_base = variants.iter().map(|v| v.reserved_base).sum();
    ProductSummary {
        product_id: product.id,
        base_sku: product.base_sku.clone(),
        name: product.name.clone(),
        on_hand_base,
        reserved_base,
        atp_base: on_hand_base - reserved_base,
        variants,
    }
}
