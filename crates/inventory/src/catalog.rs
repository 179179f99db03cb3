//! Catalog and warehouse configuration records.
//!
//! These are owned by catalog management and warehouse setup; the ledger only
//! reads them.

use serde::{Deserialize, Serialize};

use stockledger_core::{LocationId, ProductId, VariantId, WarehouseId};

/// A base item family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub base_sku: String,
    pub name: String,
}

/// Physical measurements in millimetres. Any of them may be unknown.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width_mm: Option<u64>,
    pub height_mm: Option<u64>,
    pub length_mm: Option<u64>,
}

impl Dimensions {
    pub fn new(width_mm: u64, height_mm: u64, length_mm: u64) -> Self {
        Self {
            width_mm: Some(width_mm),
            height_mm: Some(height_mm),
            length_mm: Some(length_mm),
        }
    }
}

/// A sellable/purchasable pack size of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: String,
    /// Conversion factor to base units (always >= 1).
    pub units_per_variant: u32,
    /// Position in the pack hierarchy; smallest pack first.
    pub hierarchy_level: u32,
    pub dimensions: Dimensions,
    pub barcode: Option<String>,
}

impl ProductVariant {
    /// Build a variant with no dimensions or barcode.
    ///
    /// A zero conversion factor is bumped to 1.
    pub fn new(
        product_id: ProductId,
        sku: impl Into<String>,
        units_per_variant: u32,
        hierarchy_level: u32,
    ) -> Self {
        Self {
            id: VariantId::new(),
            product_id,
            sku: sku.into(),
            units_per_variant: units_per_variant.max(1),
            hierarchy_level,
            dimensions: Dimensions::default(),
            barcode: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }
}

/// Role a location plays in the warehouse.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    /// Forward-pick face.
    Pick,
    /// Bulk/reserve storage feeding pick faces.
    Bulk,
    /// Excess stock beyond the primary pick locations.
    Overflow,
    Receiving,
    Staging,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Pick => "pick",
            LocationType::Bulk => "bulk",
            LocationType::Overflow => "overflow",
            LocationType::Receiving => "receiving",
            LocationType::Staging => "staging",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pick" => Some(LocationType::Pick),
            "bulk" => Some(LocationType::Bulk),
            "overflow" => Some(LocationType::Overflow),
            "receiving" => Some(LocationType::Receiving),
            "staging" => Some(LocationType::Staging),
            _ => None,
        }
    }
}

/// A storage bin/shelf/pallet position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseLocation {
    pub id: LocationId,
    pub code: String,
    pub location_type: LocationType,
    pub warehouse_id: Option<WarehouseId>,
    /// Replenishment source for this location.
    pub parent_location_id: Option<LocationId>,
    /// Explicit capacity; takes precedence over the bin dimensions.
    pub capacity_cubic_mm: Option<u64>,
    pub width_mm: Option<u64>,
    pub height_mm: Option<u64>,
    pub depth_mm: Option<u64>,
    pub min_qty: Option<i64>,
    pub max_qty: Option<i64>,
}

impl WarehouseLocation {
    pub fn new(code: impl Into<String>, location_type: LocationType) -> Self {
        Self {
            id: LocationId::new(),
            code: code.into(),
            location_type,
            warehouse_id: None,
            parent_location_id: None,
            capacity_cubic_mm: None,
            width_mm: None,
            height_mm: None,
            depth_mm: None,
            min_qty: None,
            max_qty: None,
        }
    }

    pub fn in_warehouse(mut self, warehouse_id: WarehouseId) -> Self {
        self.warehouse_id = Some(warehouse_id);
        self
    }

    pub fn with_parent(mut self, parent: LocationId) -> Self {
        self.parent_location_id = Some(parent);
        self
    }

    pub fn with_capacity(mut self, capacity_cubic_mm: u64) -> Self {
        self.capacity_cubic_mm = Some(capacity_cubic_mm);
        self
    }

    pub fn with_bin_dimensions(mut self, width_mm: u64, height_mm: u64, depth_mm: u64) -> Self {
        self.width_mm = Some(width_mm);
        self.height_mm = Some(height_mm);
        self.depth_mm = Some(depth_mm);
        self
    }

    pub fn with_thresholds(mut self, min_qty: Option<i64>, max_qty: Option<i64>) -> Self {
        self.min_qty = min_qty;
        self.max_qty = max_qty;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_conversion_factor_is_at_least_one() {
        let v = ProductVariant::new(ProductId::new(), "SKU-EA", 0, 0);
        assert_eq!(v.units_per_variant, 1);
    }

    #[test]
    fn location_type_string_form_round_trips() {
        for t in [
            LocationType::Pick,
            LocationType::Bulk,
            LocationType::Overflow,
            LocationType::Receiving,
            LocationType::Staging,
        ] {
            assert_eq!(LocationType::parse(t.as_str()), Some(t));
        }
        assert_eq!(LocationType::parse("attic"), None);
    }

    #[test]
    fn location_type_serializes_snake_case() {
        let json = serde_json::to_string(&LocationType::Overflow).unwrap();
        assert_eq!(json, "\"overflow\"");
    }
}
