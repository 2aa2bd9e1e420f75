//! Reference model: reference image plus validated slots.

use crate::ConfigError;
use slot_inspect_core::{ColorImage, ColorImageView, GrayImage, GrayImageView};
use slot_inspect_eval::{validate_slots, Slot};
use slot_inspect_features::fingerprint;

/// Reference pixels in color and gray, with the gray-buffer fingerprint
/// used as the feature-cache key.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceImage {
    color: ColorImage,
    gray: GrayImage,
    fingerprint: u64,
}

impl ReferenceImage {
    pub fn new(color: ColorImage) -> Self {
        let gray = color.view().to_gray();
        let fingerprint = fingerprint(&gray.view());
        Self {
            color,
            gray,
            fingerprint,
        }
    }

    pub fn from_gray(gray: GrayImage) -> Self {
        let color = ColorImage::from_gray(&gray.view());
        let fingerprint = fingerprint(&gray.view());
        Self {
            color,
            gray,
            fingerprint,
        }
    }

    #[inline]
    pub fn color(&self) -> ColorImageView<'_> {
        self.color.view()
    }

    #[inline]
    pub fn gray(&self) -> GrayImageView<'_> {
        self.gray.view()
    }

    #[inline]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.color.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.color.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.color.is_empty()
    }
}

/// A reference image and the slots inspected against it.
///
/// Slots are validated against the reference bounds once, here.
#[derive(Clone, Debug)]
pub struct InspectionModel {
    reference: ReferenceImage,
    slots: Vec<Slot>,
}

impl InspectionModel {
    pub fn new(reference: ReferenceImage, slots: Vec<Slot>) -> Result<Self, ConfigError> {
        validate_slots(&slots, Some((reference.width(), reference.height())))?;
        Ok(Self { reference, slots })
    }

    #[inline]
    pub fn reference(&self) -> &ReferenceImage {
        &self.reference
    }

    #[inline]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Swap in a new reference; existing slots must still fit.
    pub fn replace_reference(&mut self, reference: ReferenceImage) -> Result<(), ConfigError> {
        validate_slots(&self.slots, Some((reference.width(), reference.height())))?;
        self.reference = reference;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slot_inspect_core::Rect;
    use slot_inspect_eval::SlotError;

    fn gradient(w: usize, h: usize) -> GrayImage {
        GrayImage {
            width: w,
            height: h,
            data: (0..w * h).map(|i| (i % 251) as u8).collect(),
        }
    }

    #[test]
    fn fingerprint_follows_content() {
        let a = ReferenceImage::from_gray(gradient(64, 48));
        let b = ReferenceImage::from_gray(gradient(64, 48));
        let mut g = gradient(64, 48);
        g.data[100] ^= 0xff;
        let c = ReferenceImage::from_gray(g);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.color().width, 64);
    }

    #[test]
    fn model_rejects_slot_outside_reference() {
        let reference = ReferenceImage::from_gray(gradient(64, 48));
        let slots = vec![Slot::new(1, Rect::new(40, 10, 30, 10))];
        let err = InspectionModel::new(reference, slots).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Slot(SlotError::OutsideReference { id: 1, .. })
        ));
    }

    #[test]
    fn replacing_reference_revalidates() {
        let slots = vec![Slot::new(1, Rect::new(40, 10, 20, 10))];
        let mut model =
            InspectionModel::new(ReferenceImage::from_gray(gradient(64, 48)), slots).unwrap();
        assert!(model
            .replace_reference(ReferenceImage::from_gray(gradient(32, 32)))
            .is_err());
        assert_eq!(model.reference().width(), 64);
    }
}
