//! Feature-based registration of a test image onto a reference image.
//!
//! Pipeline: FAST corners on a scale pyramid, intensity-centroid
//! orientation, steered 256-bit BRIEF descriptors, cross-checked Hamming
//! matching and a seeded RANSAC homography. Reference features are cached
//! by content fingerprint.
//!
//! ```no_run
//! use slot_inspect_core::{Budget, GrayImage};
//! use slot_inspect_features::Registrar;
//!
//! let reference = GrayImage::new(320, 240);
//! let test = GrayImage::new(320, 240);
//! let registrar = Registrar::default();
//! let reg = registrar.align(&reference.view(), &test.view(), &Budget::unlimited());
//! if let Some(h) = reg.homography {
//!     println!("{:?}", h.to_array());
//! }
//! ```

mod cache;
mod descriptor;
mod error;
mod fast;
mod matcher;
mod orb;
mod pyramid;
mod registration;

pub use cache::{fingerprint, CacheStats, FeatureCache};
pub use descriptor::{Descriptor, FeatureSet, Keypoint};
pub use error::{AlignmentError, ImageRole};
pub use fast::{detect_fast, suppress_non_maxima, FastCorner};
pub use matcher::{match_descriptors, FeatureMatch};
pub use orb::{OrbExtractor, OrbParams};
pub use pyramid::{build_pyramid, PyramidLevel};
pub use registration::{Registrar, Registration, RegistrationParams};
