use serde::{Deserialize, Serialize};
use slot_inspect_core::RansacParams;
use slot_inspect_eval::{EvalParams, SlotError};
use slot_inspect_features::{OrbParams, RegistrationParams};

/// Rejected configuration or model definition.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid engine config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
    #[error(transparent)]
    Slot(#[from] SlotError),
}

/// Immutable engine configuration, validated by [`crate::Engine::new`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Total ORB keypoint budget per image.
    pub feature_count: usize,
    pub scale_factor: f32,
    pub pyramid_levels: usize,
    pub fast_threshold: u8,
    /// Best matches passed to RANSAC.
    pub max_matches: usize,
    pub ransac: RansacParams,
    pub default_correlation_threshold: f32,
    pub min_pixel_count: usize,
    pub max_contours: usize,
    /// Reference feature sets kept in the cache.
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let orb = OrbParams::default();
        let eval = EvalParams::default();
        Self {
            feature_count: orb.n_features,
            scale_factor: orb.scale_factor,
            pyramid_levels: orb.n_levels,
            fast_threshold: orb.fast_threshold,
            max_matches: 100,
            ransac: RansacParams::default(),
            default_correlation_threshold: eval.default_correlation_threshold,
            min_pixel_count: eval.min_pixel_count,
            max_contours: eval.max_contours,
            cache_capacity: 4,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |ok: bool, field: &'static str, reason: &'static str| {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::Invalid { field, reason })
            }
        };
        check(self.feature_count > 0, "feature_count", "must be positive")?;
        check(
            self.scale_factor.is_finite() && self.scale_factor > 1.0,
            "scale_factor",
            "must be greater than 1",
        )?;
        check(
            (1..=32).contains(&self.pyramid_levels),
            "pyramid_levels",
            "must be in 1..=32",
        )?;
        check(self.max_matches >= 4, "max_matches", "must be at least 4")?;
        let r = &self.ransac;
        check(
            r.reproj_threshold.is_finite() && r.reproj_threshold > 0.0,
            "ransac.reproj_threshold",
            "must be positive",
        )?;
        check(
            r.confidence > 0.0 && r.confidence < 1.0,
            "ransac.confidence",
            "must be in (0, 1)",
        )?;
        check(r.max_iters > 0, "ransac.max_iters", "must be positive")?;
        check(
            (0.0..=1.0).contains(&self.default_correlation_threshold),
            "default_correlation_threshold",
            "must be in [0, 1]",
        )?;
        check(self.min_pixel_count > 0, "min_pixel_count", "must be positive")?;
        check(self.max_contours > 0, "max_contours", "must be positive")?;
        check(self.cache_capacity > 0, "cache_capacity", "must be positive")?;
        Ok(())
    }

    pub fn registration_params(&self) -> RegistrationParams {
        RegistrationParams {
            orb: OrbParams {
                n_features: self.feature_count,
                scale_factor: self.scale_factor,
                n_levels: self.pyramid_levels,
                fast_threshold: self.fast_threshold,
            },
            max_matches: self.max_matches,
            ransac: self.ransac,
        }
    }

    pub fn eval_params(&self) -> EvalParams {
        EvalParams {
            min_pixel_count: self.min_pixel_count,
            default_correlation_threshold: self.default_correlation_threshold,
            max_contours: self.max_contours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let c = EngineConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.feature_count, 5000);
        assert_eq!(c.pyramid_levels, 8);
        assert_eq!(c.max_matches, 100);
        assert_eq!(c.ransac.max_iters, 2000);
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            EngineConfig {
                scale_factor: 1.0,
                ..EngineConfig::default()
            },
            EngineConfig {
                max_matches: 3,
                ..EngineConfig::default()
            },
            EngineConfig {
                default_correlation_threshold: 1.5,
                ..EngineConfig::default()
            },
            EngineConfig {
                ransac: RansacParams {
                    confidence: 1.0,
                    ..RansacParams::default()
                },
                ..EngineConfig::default()
            },
        ];
        for c in bad {
            assert!(matches!(c.validate(), Err(ConfigError::Invalid { .. })), "{c:?}");
        }
    }

    #[test]
    fn partial_json_uses_defaults() {
        let c: EngineConfig =
            serde_json::from_str(r#"{ "feature_count": 800, "ransac": { "seed": 7 } }"#)
                .expect("parse");
        assert_eq!(c.feature_count, 800);
        assert_eq!(c.ransac.seed, 7);
        assert_eq!(c.ransac.max_iters, 2000);
        assert_eq!(c.scale_factor, 1.2);
    }
}
