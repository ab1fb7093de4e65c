//! Thyroid gland volumes

use super::{finite, max_dimension, DerivedValues, MAX_DIMENSION};
use crate::types::FieldMap;

pub const RIGHT_LOBE_VOLUME: &str = "right_lobe_volume";
pub const LEFT_LOBE_VOLUME: &str = "left_lobe_volume";
pub const TOTAL_VOLUME: &str = "total_volume";

/// Ellipsoid correction factor (π/6)
const ELLIPSOID_FACTOR: f64 = 0.524;

/// Ellipsoid volume in mL from three orthogonal dimensions in mm
pub fn ellipsoid_volume(length_mm: f64, width_mm: f64, depth_mm: f64) -> Option<f64> {
    if length_mm <= 0.0 || width_mm <= 0.0 || depth_mm <= 0.0 {
        return None;
    }
    finite(length_mm * width_mm * depth_mm / 1000.0 * ELLIPSOID_FACTOR)
}

fn lobe_volume(fields: &FieldMap, side: &str) -> Option<f64> {
    let dim = |axis: &str| fields.positive(&format!("{}_lobe_{}", side, axis));
    ellipsoid_volume(dim("length")?, dim("width")?, dim("depth")?)
}

/// Lobe volumes and total gland volume (both lobes required for the total)
pub fn derive_gland(fields: &FieldMap) -> DerivedValues {
    let mut out = DerivedValues::default();
    let right = lobe_volume(fields, "right");
    let left = lobe_volume(fields, "left");
    out.set_quantity(RIGHT_LOBE_VOLUME, right, 1);
    out.set_quantity(LEFT_LOBE_VOLUME, left, 1);
    out.set_quantity(TOTAL_VOLUME, right.zip(left).map(|(r, l)| r + l), 1);
    out
}

pub fn derive_nodule(fields: &FieldMap) -> DerivedValues {
    let mut out = DerivedValues::default();
    out.set_quantity(MAX_DIMENSION, max_dimension(fields), 1);
    out
}
