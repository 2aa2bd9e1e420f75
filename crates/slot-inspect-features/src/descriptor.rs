use serde::{Deserialize, Serialize};

/// A detected keypoint in full-resolution pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Orientation in radians, image axes (y down).
    pub angle: f32,
    /// Pyramid level the keypoint was found on.
    pub octave: u8,
    pub response: f32,
}

/// 256-bit binary descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor(pub [u64; 4]);

impl Descriptor {
    #[inline]
    pub fn hamming(&self, other: &Descriptor) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// Keypoints with their descriptors, index-aligned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureSet {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
