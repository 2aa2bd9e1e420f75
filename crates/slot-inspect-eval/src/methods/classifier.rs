use super::{clamp01, MethodScore};
use crate::{ClassifierError, Predictor};
use slot_inspect_core::ColorImageView;

/// Confidence for an OK label, its complement otherwise.
pub fn score(
    slot_id: u32,
    predictor: Option<&dyn Predictor>,
    roi: &ColorImageView<'_>,
) -> Result<MethodScore, ClassifierError> {
    let predictor = predictor.ok_or(ClassifierError::NotRegistered { slot_id })?;
    let p = predictor.predict(roi)?;
    if !p.confidence.is_finite() {
        return Err(ClassifierError::NonFiniteConfidence);
    }
    let confidence = clamp01(p.confidence);
    let s = if p.is_ok() { confidence } else { 1.0 - confidence };
    Ok(MethodScore::new(s).note(format!(
        "classifier label {} confidence {confidence:.3}",
        p.label
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Prediction;
    use approx::assert_relative_eq;
    use slot_inspect_core::ColorImage;
    use std::path::Path;

    struct Fixed(Result<Prediction, ClassifierError>);

    impl Predictor for Fixed {
        fn load(&mut self, _path: &Path) -> Result<(), ClassifierError> {
            Ok(())
        }
        fn predict(&self, _roi: &ColorImageView<'_>) -> Result<Prediction, ClassifierError> {
            self.0.clone()
        }
    }

    fn roi() -> ColorImage {
        ColorImage {
            width: 2,
            height: 2,
            data: vec![0; 12],
        }
    }

    #[test]
    fn ok_label_uses_confidence() {
        let p = Fixed(Ok(Prediction {
            label: 1,
            confidence: 0.8,
        }));
        let s = score(4, Some(&p), &roi().view()).expect("score");
        assert_relative_eq!(s.score, 0.8);
    }

    #[test]
    fn defect_label_inverts_confidence() {
        let p = Fixed(Ok(Prediction {
            label: 0,
            confidence: 0.9,
        }));
        let s = score(4, Some(&p), &roi().view()).expect("score");
        assert_relative_eq!(s.score, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn failures_are_reported() {
        assert_eq!(
            score(4, None, &roi().view()),
            Err(ClassifierError::NotRegistered { slot_id: 4 })
        );
        let nan = Fixed(Ok(Prediction {
            label: 1,
            confidence: f32::NAN,
        }));
        assert_eq!(
            score(4, Some(&nan), &roi().view()),
            Err(ClassifierError::NonFiniteConfidence)
        );
    }
}
