//! Reference-to-test registration: extract, match, fit a homography.
//!
//! Failures never escape as `Err`; they are carried in [`Registration`] so
//! that slot evaluation can continue in degraded mode.

use crate::cache::{fingerprint, FeatureCache};
use crate::matcher::match_descriptors;
use crate::{AlignmentError, FeatureSet, ImageRole, OrbExtractor, OrbParams};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use slot_inspect_core::{fit_homography_ransac, Budget, GrayImageView, Homography, RansacParams};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

const MIN_CORRESPONDENCES: usize = 4;

/// Registration parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationParams {
    pub orb: OrbParams,
    /// Best matches kept for the robust solver.
    pub max_matches: usize,
    pub ransac: RansacParams,
}

impl Default for RegistrationParams {
    fn default() -> Self {
        Self {
            orb: OrbParams::default(),
            max_matches: 100,
            ransac: RansacParams::default(),
        }
    }
}

/// Outcome of one registration attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    /// Reference → test mapping, `None` on failure.
    pub homography: Option<Homography>,
    pub inliers: usize,
    /// Matches fed to the solver (after truncation).
    pub matches: usize,
    pub reference_features: usize,
    pub test_features: usize,
    pub failure: Option<AlignmentError>,
}

impl Registration {
    fn failed(failure: AlignmentError) -> Self {
        Self {
            homography: None,
            inliers: 0,
            matches: 0,
            reference_features: 0,
            test_features: 0,
            failure: Some(failure),
        }
    }

    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.homography.is_some()
    }

    /// `inliers / matches`, or 0 without matches.
    pub fn inlier_ratio(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.inliers as f64 / self.matches as f64
        }
    }
}

/// Owns the extractor and the reference feature cache.
#[derive(Debug)]
pub struct Registrar {
    params: RegistrationParams,
    extractor: OrbExtractor,
    cache: FeatureCache,
}

impl Registrar {
    pub fn new(params: RegistrationParams, cache_capacity: usize) -> Self {
        Self {
            params,
            extractor: OrbExtractor::new(params.orb),
            cache: FeatureCache::new(cache_capacity),
        }
    }

    #[inline]
    pub fn params(&self) -> &RegistrationParams {
        &self.params
    }

    #[inline]
    pub fn cache(&self) -> &FeatureCache {
        &self.cache
    }

    /// Reference features through the cache, extracting on a miss.
    pub fn reference_features(
        &self,
        key: u64,
        reference: &GrayImageView<'_>,
        budget: &Budget,
    ) -> Result<Arc<FeatureSet>, AlignmentError> {
        self.cache
            .get_or_try_insert(key, || self.extractor.extract(reference, budget))
            .map_err(AlignmentError::from)
    }

    /// Align `test` onto `reference`, fingerprinting the reference first.
    pub fn align(
        &self,
        reference: &GrayImageView<'_>,
        test: &GrayImageView<'_>,
        budget: &Budget,
    ) -> Registration {
        self.align_keyed(fingerprint(reference), reference, test, budget)
    }

    /// Align with a precomputed reference fingerprint.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, reference, test, budget))
    )]
    pub fn align_keyed(
        &self,
        reference_key: u64,
        reference: &GrayImageView<'_>,
        test: &GrayImageView<'_>,
        budget: &Budget,
    ) -> Registration {
        let reg = match self.try_align(reference_key, reference, test, budget) {
            Ok(reg) => reg,
            Err(e) => Registration::failed(e),
        };
        match &reg.failure {
            None => log::debug!(
                "registration: {} inliers of {} matches ({} ref / {} test features)",
                reg.inliers,
                reg.matches,
                reg.reference_features,
                reg.test_features
            ),
            Some(e) => log::warn!("registration failed: {e}"),
        }
        reg
    }

    fn try_align(
        &self,
        reference_key: u64,
        reference: &GrayImageView<'_>,
        test: &GrayImageView<'_>,
        budget: &Budget,
    ) -> Result<Registration, AlignmentError> {
        let ref_set = self.reference_features(reference_key, reference, budget)?;
        if ref_set.len() < MIN_CORRESPONDENCES {
            return Err(AlignmentError::NotEnoughDescriptors {
                image: ImageRole::Reference,
                count: ref_set.len(),
            });
        }
        let test_set = self.extractor.extract(test, budget)?;
        if test_set.len() < MIN_CORRESPONDENCES {
            return Err(AlignmentError::NotEnoughDescriptors {
                image: ImageRole::Test,
                count: test_set.len(),
            });
        }

        self.register_features(&ref_set, &test_set, budget)
    }

    /// Match two extracted sets and fit the homography. Descriptor counts
    /// are not checked here.
    pub fn register_features(
        &self,
        ref_set: &FeatureSet,
        test_set: &FeatureSet,
        budget: &Budget,
    ) -> Result<Registration, AlignmentError> {
        budget.check()?;
        let matches = match_descriptors(
            &ref_set.descriptors,
            &test_set.descriptors,
            self.params.max_matches,
        );
        budget.check()?;

        let mut reg = Registration {
            homography: None,
            inliers: 0,
            matches: matches.len(),
            reference_features: ref_set.len(),
            test_features: test_set.len(),
            failure: None,
        };
        if matches.len() < MIN_CORRESPONDENCES {
            reg.failure = Some(AlignmentError::NotEnoughMatches {
                count: matches.len(),
            });
            return Ok(reg);
        }

        let src: Vec<Point2<f32>> = matches
            .iter()
            .map(|m| {
                let k = &ref_set.keypoints[m.query];
                Point2::new(k.x, k.y)
            })
            .collect();
        let dst: Vec<Point2<f32>> = matches
            .iter()
            .map(|m| {
                let k = &test_set.keypoints[m.train];
                Point2::new(k.x, k.y)
            })
            .collect();

        match fit_homography_ransac(&src, &dst, &self.params.ransac, budget)? {
            Some(fit) => {
                reg.homography = Some(fit.homography);
                reg.inliers = fit.inliers;
            }
            None => reg.failure = Some(AlignmentError::SolverFailed),
        }
        Ok(reg)
    }
}

impl Default for Registrar {
    fn default() -> Self {
        Self::new(RegistrationParams::default(), 4)
    }
}
