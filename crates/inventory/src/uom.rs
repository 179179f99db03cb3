//! Unit-of-measure conversion and volumetric math.
//!
//! "Variant units" are sellable packs, "base units" are the atomic pieces
//! inside them. Volumes are cubic millimetres; an unknown volume is `None` and
//! must never be read as zero.

use crate::catalog::{Dimensions, ProductVariant, WarehouseLocation};

/// Convert a count of packs into base units.
pub fn to_base_units(variant: &ProductVariant, qty: i64) -> i64 {
    qty * i64::from(variant.units_per_variant)
}

/// Whole packs that `base_units` can fill, rounding toward negative infinity.
///
/// Negative input stays negative (`-1` base units of a 6-pack is `-1` pack),
/// which is how backorders surface at the variant level.
pub fn to_variant_units(variant: &ProductVariant, base_units: i64) -> i64 {
    base_units.div_euclid(i64::from(variant.units_per_variant.max(1)))
}

/// Cubic volume of a set of dimensions, or `None` when any side is unknown.
pub fn cubic_volume(dims: &Dimensions) -> Option<u64> {
    let w = dims.width_mm?;
    let h = dims.height_mm?;
    let l = dims.length_mm?;
    w.checked_mul(h)?.checked_mul(l)
}

/// Volume of one pack of a variant.
pub fn variant_cube(variant: &ProductVariant) -> Option<u64> {
    cubic_volume(&variant.dimensions)
}

/// Usable capacity of a location: explicit capacity first, then bin
/// dimensions, else unknown.
pub fn location_capacity(location: &WarehouseLocation) -> Option<u64> {
    if let Some(cap) = location.capacity_cubic_mm {
        return Some(cap);
    }
    cubic_volume(&Dimensions {
        width_mm: location.width_mm,
        height_mm: location.height_mm,
        length_mm: location.depth_mm,
    })
}
