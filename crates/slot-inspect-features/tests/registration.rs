use approx::assert_abs_diff_eq;
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slot_inspect_core::{Budget, GrayImage};
use slot_inspect_features::{AlignmentError, ImageRole, OrbParams, Registrar, RegistrationParams};

/// Random overlapping rectangles on a mid-gray background.
fn textured(w: usize, h: usize, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![128u8; w * h];
    for _ in 0..(w * h / 300) {
        let x0 = rng.gen_range(0..w);
        let y0 = rng.gen_range(0..h);
        let bw = rng.gen_range(5..35);
        let bh = rng.gen_range(5..35);
        let v: u8 = rng.gen();
        for y in y0..(y0 + bh).min(h) {
            for x in x0..(x0 + bw).min(w) {
                data[y * w + x] = v;
            }
        }
    }
    GrayImage {
        width: w,
        height: h,
        data,
    }
}

/// `out(x, y) = src(x - dx, y - dy)`, uncovered pixels set to mid-gray.
fn shifted(src: &GrayImage, dx: i64, dy: i64) -> GrayImage {
    let (w, h) = (src.width, src.height);
    let mut data = vec![128u8; w * h];
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let (sx, sy) = (x - dx, y - dy);
            if sx >= 0 && sy >= 0 && sx < w as i64 && sy < h as i64 {
                data[(y as usize) * w + x as usize] = src.data[sy as usize * w + sx as usize];
            }
        }
    }
    GrayImage {
        width: w,
        height: h,
        data,
    }
}

fn registrar() -> Registrar {
    Registrar::new(
        RegistrationParams {
            orb: OrbParams {
                n_features: 800,
                ..OrbParams::default()
            },
            ..RegistrationParams::default()
        },
        4,
    )
}

#[test]
fn identity_registration_has_high_inlier_ratio() {
    let img = textured(320, 240, 11);
    let reg = registrar().align(&img.view(), &img.view(), &Budget::unlimited());
    assert!(reg.failure.is_none(), "{:?}", reg.failure);
    assert!(reg.matches >= 50, "matches {}", reg.matches);
    assert!(reg.inlier_ratio() > 0.9, "ratio {}", reg.inlier_ratio());

    let h = reg.homography.expect("homography");
    let p = h.apply(Point2::new(160.0, 120.0));
    assert_abs_diff_eq!(p.x, 160.0, epsilon = 1.0);
    assert_abs_diff_eq!(p.y, 120.0, epsilon = 1.0);
}

#[test]
fn recovers_translation_within_two_pixels() {
    let reference = textured(320, 240, 5);
    let test = shifted(&reference, 15, 10);
    let reg = registrar().align(&reference.view(), &test.view(), &Budget::unlimited());
    let h = reg.homography.expect("homography");

    for (x, y) in [(60.0, 50.0), (160.0, 120.0), (260.0, 190.0)] {
        let p = h.apply(Point2::new(x, y));
        assert_abs_diff_eq!(p.x, x + 15.0, epsilon = 2.0);
        assert_abs_diff_eq!(p.y, y + 10.0, epsilon = 2.0);
    }
}

#[test]
fn flat_test_image_reports_missing_descriptors() {
    let reference = textured(200, 160, 2);
    let flat = GrayImage {
        width: 200,
        height: 160,
        data: vec![90; 200 * 160],
    };
    let reg = registrar().align(&reference.view(), &flat.view(), &Budget::unlimited());
    assert!(reg.homography.is_none());
    assert_eq!(
        reg.failure,
        Some(AlignmentError::NotEnoughDescriptors {
            image: ImageRole::Test,
            count: 0
        })
    );
}

#[test]
fn reference_features_are_cached() {
    let reference = textured(200, 160, 4);
    let test = shifted(&reference, 3, 2);
    let r = registrar();
    let a = r.align(&reference.view(), &test.view(), &Budget::unlimited());
    let b = r.align(&reference.view(), &test.view(), &Budget::unlimited());
    assert_eq!(a, b);
    let stats = r.cache().stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entries, 1);
}

#[test]
fn cancelled_budget_is_encoded_in_registration() {
    let img = textured(200, 160, 8);
    let budget = Budget::unlimited();
    budget.cancel_token().cancel();
    let r = registrar();
    let reg = r.align(&img.view(), &img.view(), &budget);
    assert!(reg.homography.is_none());
    assert_eq!(reg.failure, Some(AlignmentError::Cancelled));
    assert_eq!(r.cache().stats().entries, 0);
}
