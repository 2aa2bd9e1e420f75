//! FAST-9 segment test corner detector with grid non-maximum suppression.

use slot_inspect_core::GrayImageView;

/// Bresenham circle of radius 3, clockwise from 12 o'clock.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const ARC: usize = 9;

/// A raw corner at integer pixel position in the level it was found on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FastCorner {
    pub x: usize,
    pub y: usize,
    /// Sum of absolute differences over the contiguous arc, minus the threshold.
    pub score: f32,
}

/// Detect FAST-9 corners at least `border` pixels away from the image edge.
pub fn detect_fast(img: &GrayImageView<'_>, threshold: u8, border: usize) -> Vec<FastCorner> {
    let border = border.max(3);
    let (w, h) = (img.width, img.height);
    let mut out = Vec::new();
    if w <= 2 * border || h <= 2 * border {
        return out;
    }

    let offsets: [isize; 16] = CIRCLE.map(|(dx, dy)| dy as isize * w as isize + dx as isize);
    let t = threshold as i16;

    for y in border..h - border {
        for x in border..w - border {
            let idx = y * w + x;
            let c = img.data[idx] as i16;
            let at = |k: usize| img.data[(idx as isize + offsets[k]) as usize] as i16;

            // cardinal pre-test: a 9-arc covers at least two of N/E/S/W
            let card = [at(0), at(4), at(8), at(12)];
            let bright = card.iter().filter(|&&p| p > c + t).count();
            let dark = card.iter().filter(|&&p| p < c - t).count();
            if bright < 2 && dark < 2 {
                continue;
            }

            let mut ring = [0i16; 16];
            for (k, r) in ring.iter_mut().enumerate() {
                *r = at(k);
            }
            if let Some(score) = arc_score(&ring, c, t) {
                out.push(FastCorner { x, y, score });
            }
        }
    }
    out
}

fn arc_score(ring: &[i16; 16], c: i16, t: i16) -> Option<f32> {
    let mut best: Option<f32> = None;
    for sign in [1i16, -1] {
        let mut run = 0usize;
        let mut sum = 0i32;
        let mut best_sum = 0i32;
        let mut found = false;
        for k in 0..32 {
            let d = sign * (ring[k % 16] - c);
            if d > t {
                run += 1;
                sum += d as i32;
                if run >= ARC {
                    found = true;
                    best_sum = best_sum.max(sum);
                }
                if run >= 16 {
                    break;
                }
            } else {
                run = 0;
                sum = 0;
            }
        }
        if found {
            let s = (best_sum - (ARC as i32) * t as i32) as f32;
            best = Some(best.map_or(s, |b: f32| b.max(s)));
        }
    }
    best
}

/// Keep the strongest corner per `cell × cell` block and its 8-neighbourhood.
pub fn suppress_non_maxima(mut corners: Vec<FastCorner>, cell: usize) -> Vec<FastCorner> {
    if corners.is_empty() {
        return corners;
    }
    let cell = cell.max(1);
    corners.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.y.cmp(&b.y))
            .then(a.x.cmp(&b.x))
    });

    let mut taken = std::collections::HashSet::new();
    let mut kept = Vec::with_capacity(corners.len() / 4);
    for c in corners {
        let gx = (c.x / cell) as i64;
        let gy = (c.y / cell) as i64;
        let blocked = (-1..=1).any(|dy| (-1..=1).any(|dx| taken.contains(&(gx + dx, gy + dy))));
        if !blocked {
            taken.insert((gx, gy));
            kept.push(c);
        }
    }
    kept
}
