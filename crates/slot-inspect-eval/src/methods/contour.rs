use super::{clamp01, MethodScore};
use crate::edges::{canny, edge_contours, external_contours};
use slot_inspect_core::{gaussian_blur_5x5, GrayImageView};
use std::f32::consts::PI;

pub const CANNY_LOW: f32 = 50.0;
pub const CANNY_HIGH: f32 = 150.0;

/// `0.4·area_ratio + 0.3·min(count / max_contours, 1) + 0.3·circularity`.
///
/// `area_ratio` is the area enclosed by external contours over the ROI
/// area; circularity `4π·area/perimeter²` is taken from the largest one.
pub fn score(roi: &GrayImageView<'_>, max_contours: usize) -> MethodScore {
    let roi_area = roi.width * roi.height;
    if roi_area == 0 {
        return MethodScore::new(0.0).note("empty region");
    }
    let blurred = gaussian_blur_5x5(roi);
    let edges = canny(&blurred.view(), CANNY_LOW, CANNY_HIGH);
    let contours = external_contours(edge_contours(&edges, roi.width, roi.height));
    if contours.is_empty() {
        return MethodScore::new(0.0).note("no contours found");
    }

    let total_area: usize = contours.iter().map(|c| c.area).sum();
    let area_ratio = clamp01(total_area as f32 / roi_area as f32);
    let count = clamp01(contours.len() as f32 / max_contours.max(1) as f32);
    // sorted by area, largest first
    let largest = &contours[0];
    let p = largest.perimeter() as f32;
    let circularity = clamp01(4.0 * PI * largest.area as f32 / (p * p));

    let s = 0.4 * area_ratio + 0.3 * count + 0.3 * circularity;
    MethodScore::new(s).note(format!(
        "{} contours, area ratio {area_ratio:.3}, circularity {circularity:.3}",
        contours.len()
    ))
}
