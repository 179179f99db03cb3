//! Capacity planning math: overflow-bin selection and replenishment thresholds.
//!
//! Pure functions over snapshots; the service layer gathers the inputs.

use serde::{Deserialize, Serialize};

use stockledger_core::{LocationId, VariantId, WarehouseId};

use crate::catalog::{LocationType, ProductVariant, WarehouseLocation};
use crate::level::InventoryLevel;
use crate::uom;

/// Parameters of an overflow-bin search.
#[derive(Debug, Clone, Copy)]
pub struct OverflowQuery<'a> {
    /// Restrict candidates to one warehouse.
    pub warehouse_id: Option<WarehouseId>,
    pub variant: &'a ProductVariant,
    /// Packs the caller wants to put away.
    pub required_units: i64,
    /// Skip bins that cannot take at least this many packs.
    pub min_units_required: Option<i64>,
}

/// The chosen bin and its headroom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowBin {
    pub location_id: LocationId,
    pub code: String,
    pub capacity_cube: u64,
    pub occupied_cube: u64,
    pub remaining_cube: i64,
    /// Whole packs of the requested variant that still fit.
    pub max_units: i64,
    /// Whether `max_units` covers `required_units`.
    pub fits_all: bool,
}

/// Volume taken up by the stock stored in one location.
///
/// Rows whose variant has no known cube contribute nothing, and negative
/// physical counts are treated as empty.
pub fn occupied_cube<'a>(
    contents: impl IntoIterator<Item = (&'a ProductVariant, &'a InventoryLevel)>,
) -> u64 {
    contents
        .into_iter()
        .filter_map(|(variant, level)| {
            let cube = uom::variant_cube(variant)?;
            let qty = u64::try_from(level.variant_qty).ok()?;
            Some(cube.saturating_mul(qty))
        })
        .fold(0u64, |acc, c| acc.saturating_add(c))
}

/// Pick the overflow bin with the most remaining volume.
///
/// Candidates with unknown capacity, an unknown or zero variant cube, no room
/// for a single pack, or fewer than `min_units_required` packs of room are
/// skipped. Ties on `remaining_cube` go to the earliest candidate in
/// `locations` order.
pub fn find_overflow_bin<F>(
    locations: &[WarehouseLocation],
    query: OverflowQuery<'_>,
    mut occupied_at: F,
) -> Option<OverflowBin>
where
    F: FnMut(LocationId) -> u64,
{
    let cube = uom::variant_cube(query.variant).filter(|c| *c > 0)?;
    let cube = i64::try_from(cube).ok()?;

    let mut best: Option<OverflowBin> = None;
    for loc in locations {
        if loc.location_type != LocationType::Overflow {
            continue;
        }
        if query.warehouse_id.is_some() && loc.warehouse_id != query.warehouse_id {
            continue;
        }
        let Some(capacity) = uom::location_capacity(loc) else {
            continue;
        };

        let occupied = occupied_at(loc.id);
        let remaining = i64::try_from(capacity)
            .unwrap_or(i64::MAX)
            .saturating_sub(i64::try_from(occupied).unwrap_or(i64::MAX));
        let max_units = remaining.div_euclid(cube);

        if max_units <= 0 {
            continue;
        }
        if query.min_units_required.is_some_and(|min| max_units < min) {
            continue;
        }

        // Strict comparison keeps the first of equally roomy bins.
        if best.as_ref().is_none_or(|b| remaining > b.remaining_cube) {
            best = Some(OverflowBin {
                location_id: loc.id,
                code: loc.code.clone(),
                capacity_cube: capacity,
                occupied_cube: occupied,
                remaining_cube: remaining,
                max_units,
                fits_all: max_units >= query.required_units,
            });
        }
    }
    best
}

/// A (location, variant) pair whose on-hand stock is below the location minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishmentNeed {
    pub location_id: LocationId,
    pub location_code: String,
    pub variant_id: VariantId,
    pub parent_location_id: Option<LocationId>,
    pub on_hand_base: i64,
    pub min_qty: i64,
    pub max_qty: Option<i64>,
    /// `min_qty - on_hand_base`.
    pub deficit: i64,
    /// Quantity that brings the location back to `max_qty` (or `min_qty`).
    pub suggested_qty: i64,
}

/// Scan thresholded locations for rows below their minimum.
///
/// Only existing rows are considered. Output follows `locations` order, then
/// `levels` order within a location.
pub fn replenishment_needs(
    locations: &[WarehouseLocation],
    levels: &[InventoryLevel],
    variant_id: Option<VariantId>,
) -> Vec<ReplenishmentNeed> {
    let mut needs = Vec::new();
    for loc in locations {
        let Some(min_qty) = loc.min_qty else {
            continue;
        };
        for level in levels.iter().filter(|l| l.location_id == loc.id) {
            if variant_id.is_some_and(|v| v != level.variant_id) {
                continue;
            }
            if level.on_hand_base >= min_qty {
                continue;
            }
            let target = loc.max_qty.unwrap_or(min_qty);
            needs.push(ReplenishmentNeed {
                location_id: loc.id,
                location_code: loc.code.clone(),
                variant_id: level.variant_id,
                parent_location_id: loc.parent_location_id,
                on_hand_base: level.on_hand_base,
                min_qty,
                max_qty: loc.max_qty,
                deficit: min_qty - level.on_hand_base,
                suggested_qty: (target - level.on_hand_base).max(0),
            });
        }
    }
    needs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Dimensions;
    use std::collections::HashMap;
    use stockledger_core::ProductId;

    fn ten_cube_variant() -> ProductVariant {
        // 10 mm^3 per pack
        ProductVariant::new(ProductId::new(), "BOX", 1, 0).with_dimensions(Dimensions::new(1, 2, 5))
    }

    fn overflow(code: &str, capacity: u64) -> WarehouseLocation {
        WarehouseLocation::new(code, LocationType::Overflow).with_capacity(capacity)
    }

    fn query(variant: &ProductVariant) -> OverflowQuery<'_> {
        OverflowQuery {
            warehouse_id: None,
            variant,
            required_units: 1,
            min_units_required: None,
        }
    }

    #[test]
    fn picks_bin_with_greatest_remaining_cube() {
        let v = ten_cube_variant();
        let a = overflow("OF-A", 1_000);
        let b = overflow("OF-B", 2_000);
        let occupied: HashMap<_, _> = [(a.id, 0u64), (b.id, 500u64)].into();
        let locs = vec![a, b.clone()];

        let bin = find_overflow_bin(&locs, query(&v), |id| occupied[&id]).unwrap();
        assert_eq!(bin.location_id, b.id);
        assert_eq!(bin.remaining_cube, 1_500);
        assert_eq!(bin.max_units, 150);
    }

    #[test]
    fn equal_remaining_cube_goes_to_first_candidate() {
        let v = ten_cube_variant();
        let first = overflow("OF-1", 1_000);
        let second = overflow("OF-2", 1_000);
        let locs = vec![first.clone(), second.clone()];

        let bin = find_overflow_bin(&locs, query(&v), |_| 0).unwrap();
        assert_eq!(bin.location_id, first.id);

        let reversed = vec![second.clone(), first];
        let bin = find_overflow_bin(&reversed, query(&v), |_| 0).unwrap();
        assert_eq!(bin.location_id, second.id);
    }

    #[test]
    fn skips_non_overflow_unknown_capacity_and_full_bins() {
        let v = ten_cube_variant();
        let pick = WarehouseLocation::new("P-1", LocationType::Pick).with_capacity(1_000_000);
        let unmeasured = WarehouseLocation::new("OF-X", LocationType::Overflow);
        let full = overflow("OF-FULL", 100);
        let nearly_full = overflow("OF-9", 109);
        let locs = vec![pick, unmeasured, full, nearly_full];

        let result = find_overflow_bin(&locs, query(&v), |_| 100);
        assert_eq!(result, None);
    }

    #[test]
    fn unknown_variant_cube_means_no_bin() {
        let v = ProductVariant::new(ProductId::new(), "LOOSE", 1, 0);
        let locs = vec![overflow("OF-1", 1_000)];
        assert_eq!(find_overflow_bin(&locs, query(&v), |_| 0), None);
    }

    #[test]
    fn minimum_units_filter_excludes_small_bins() {
        let v = ten_cube_variant();
        let small = overflow("OF-S", 50);
        let big = overflow("OF-B", 90);
        let locs = vec![small, big.clone()];
        let q = OverflowQuery {
            min_units_required: Some(6),
            required_units: 20,
            ..query(&v)
        };

        let bin = find_overflow_bin(&locs, q, |_| 0).unwrap();
        assert_eq!(bin.location_id, big.id);
        assert_eq!(bin.max_units, 9);
        assert!(!bin.fits_all);
    }

    #[test]
    fn warehouse_scope_filters_candidates() {
        let v = ten_cube_variant();
        let wh = WarehouseId::new();
        let elsewhere = overflow("OF-E", 10_000).in_warehouse(WarehouseId::new());
        let here = overflow("OF-H", 500).in_warehouse(wh);
        let locs = vec![elsewhere, here.clone()];
        let q = OverflowQuery {
            warehouse_id: Some(wh),
            ..query(&v)
        };

        assert_eq!(find_overflow_bin(&locs, q, |_| 0).unwrap().location_id, here.id);
    }

    #[test]
    fn occupied_cube_counts_only_measurable_positive_stock() {
        let measured = ten_cube_variant();
        let loose = ProductVariant::new(ProductId::new(), "LOOSE", 1, 0);
        let loc = LocationId::new();
        let a = InventoryLevel::empty(measured.id, loc).with_variant_qty(7);
        let b = InventoryLevel::empty(loose.id, loc).with_variant_qty(100);
        let c = InventoryLevel::empty(measured.id, loc).with_variant_qty(-3);

        assert_eq!(occupied_cube([(&measured, &a), (&loose, &b), (&measured, &c)]), 70);
    }

    #[test]
    fn replenishment_scan_reports_rows_below_minimum() {
        let bulk = WarehouseLocation::new("BULK-1", LocationType::Bulk);
        let face = WarehouseLocation::new("PICK-1", LocationType::Pick)
            .with_parent(bulk.id)
            .with_thresholds(Some(10), Some(40));
        let unthresholded = WarehouseLocation::new("PICK-2", LocationType::Pick);

        let low = VariantId::new();
        let fine = VariantId::new();
        let levels = vec![
            InventoryLevel::empty(low, face.id).with_on_hand(4),
            InventoryLevel::empty(fine, face.id).with_on_hand(10),
            InventoryLevel::empty(low, unthresholded.id).with_on_hand(0),
            InventoryLevel::empty(low, bulk.id).with_on_hand(0),
        ];
        let locs = vec![bulk.clone(), face.clone(), unthresholded];

        let needs = replenishment_needs(&locs, &levels, None);
        assert_eq!(needs.len(), 1);
        let need = &needs[0];
        assert_eq!(need.location_id, face.id);
        assert_eq!(need.variant_id, low);
        assert_eq!(need.parent_location_id, Some(bulk.id));
        assert_eq!(need.deficit, 6);
        assert_eq!(need.suggested_qty, 36);

        assert!(replenishment_needs(&locs, &levels, Some(fine)).is_empty());
    }
}
