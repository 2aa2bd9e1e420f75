//! Core types and utilities for slot-based assembly inspection.
//!
//! This crate is purely geometric and pixel-level: image buffers and views,
//! resampling, rectangles, homographies (DLT and RANSAC) and the
//! cancellation budget shared by the compute stages. It does not know about
//! features, slots or scoring.

mod budget;
mod filter;
mod geometry;
mod homography;
mod image;
mod logger;
mod ransac;

pub use budget::{Budget, BudgetExceeded, CancelToken};
pub use filter::gaussian_blur_5x5;
pub use geometry::{bounding_rect, transform_corners, transform_rect, Rect};
pub use homography::{estimate_homography, homography_from_4pt, Homography};
pub use image::{
    luma, resize_gray, sample_bilinear, ColorImage, ColorImageView, GrayImage, GrayImageView,
};
pub use ransac::{fit_homography_ransac, RansacFit, RansacParams};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, parse_level};
