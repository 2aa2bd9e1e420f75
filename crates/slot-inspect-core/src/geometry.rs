//! Axis-aligned rectangles and their projection through a homography.

use crate::Homography;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Integer pixel rectangle `(x, y, w, h)`; covers `[x, x + w) × [y, y + h)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    #[inline]
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.w)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`.
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h)
    }

    #[inline]
    pub fn area(&self) -> i64 {
        if self.w <= 0 || self.h <= 0 {
            0
        } else {
            self.w as i64 * self.h as i64
        }
    }

    pub fn center(&self) -> Point2<f32> {
        Point2::new(
            self.x as f32 + 0.5 * self.w as f32,
            self.y as f32 + 0.5 * self.h as f32,
        )
    }

    /// Corners in TL, TR, BR, BL order.
    pub fn corners(&self) -> [Point2<f32>; 4] {
        let (x0, y0) = (self.x as f32, self.y as f32);
        let (x1, y1) = (self.right() as f32, self.bottom() as f32);
        [
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    /// True if the rectangle is non-empty and fully inside a `width × height` image.
    pub fn is_within(&self, width: usize, height: usize) -> bool {
        self.checked_within(width, height).is_some()
    }

    /// `(x, y, w, h)` as `usize` when the rectangle is non-empty and fully inside.
    pub fn checked_within(&self, width: usize, height: usize) -> Option<(usize, usize, usize, usize)> {
        if self.x < 0 || self.y < 0 || self.w <= 0 || self.h <= 0 {
            return None;
        }
        let (x, y, w, h) = (
            self.x as usize,
            self.y as usize,
            self.w as usize,
            self.h as usize,
        );
        (x + w <= width && y + h <= height).then_some((x, y, w, h))
    }

    /// Intersection with `[0, width) × [0, height)`; `None` if empty.
    pub fn clip(&self, width: usize, height: usize) -> Option<Rect> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.right().min(width as i32);
        let y1 = self.bottom().min(height as i32);
        (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Project the four corners of `rect` (TL, TR, BR, BL) through `h`.
pub fn transform_corners(rect: &Rect, h: &Homography) -> [Point2<f32>; 4] {
    rect.corners().map(|p| h.apply(p))
}

/// Bounding box of the projected rectangle, clipped to the image.
///
/// Returns `None` when any corner projects to infinity or the clipped box is
/// empty.
pub fn transform_rect(rect: &Rect, h: &Homography, image_size: (usize, usize)) -> Option<Rect> {
    let corners = transform_corners(rect, h);
    bounding_rect(&corners)?.clip(image_size.0, image_size.1)
}

/// Integer axis-aligned bounding box of a point set (rounded to nearest pixel).
pub fn bounding_rect(points: &[Point2<f32>]) -> Option<Rect> {
    if points.is_empty() || points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return None;
    }
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let limit = i32::MAX as f32 / 4.0;
    let x0 = min_x.round().clamp(-limit, limit) as i32;
    let y0 = min_y.round().clamp(-limit, limit) as i32;
    let x1 = max_x.round().clamp(-limit, limit) as i32;
    let y1 = max_y.round().clamp(-limit, limit) as i32;
    Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
}
