//! Sobel gradients, Canny edges and 8-connected edge contours.
//!
//! Gradients use the 3×3 Sobel pair with edge clamping and the L1 magnitude
//! `|gx| + |gy|`. Non-maximum suppression compares against the two
//! neighbours along the gradient direction quantized to 0°/45°/90°/135°;
//! hysteresis grows weak edges 8-connected from strong seeds.

use slot_inspect_core::GrayImageView;
use std::collections::VecDeque;

const TAN_22_5_DEG: f32 = 0.414_213_56;

/// Per-pixel Sobel derivatives.
#[derive(Clone, Debug)]
pub struct Gradients {
    pub width: usize,
    pub height: usize,
    pub gx: Vec<i32>,
    pub gy: Vec<i32>,
}

impl Gradients {
    #[inline]
    fn mag(&self, i: usize) -> f32 {
        (self.gx[i].abs() + self.gy[i].abs()) as f32
    }
}

pub fn sobel(img: &GrayImageView<'_>) -> Gradients {
    let (w, h) = (img.width, img.height);
    let mut gx = vec![0i32; w * h];
    let mut gy = vec![0i32; w * h];
    if w > 0 && h > 0 {
        let px = |x: usize, y: usize| img.data[y * w + x] as i32;
        for y in 0..h {
            let ys = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
            for x in 0..w {
                let xs = [x.saturating_sub(1), x, (x + 1).min(w - 1)];
                let dx = (px(xs[2], ys[0]) - px(xs[0], ys[0]))
                    + 2 * (px(xs[2], ys[1]) - px(xs[0], ys[1]))
                    + (px(xs[2], ys[2]) - px(xs[0], ys[2]));
                let dy = (px(xs[0], ys[2]) - px(xs[0], ys[0]))
                    + 2 * (px(xs[1], ys[2]) - px(xs[1], ys[0]))
                    + (px(xs[2], ys[2]) - px(xs[2], ys[0]));
                gx[y * w + x] = dx;
                gy[y * w + x] = dy;
            }
        }
    }
    Gradients {
        width: w,
        height: h,
        gx,
        gy,
    }
}

/// Binary Canny edge map (`true` = edge). The outer one-pixel frame is never
/// marked.
pub fn canny(img: &GrayImageView<'_>, low: f32, high: f32) -> Vec<bool> {
    let (w, h) = (img.width, img.height);
    let mut edges = vec![false; w * h];
    if w < 3 || h < 3 {
        return edges;
    }
    let g = sobel(img);

    // 0 = suppressed, 1 = weak, 2 = strong
    let mut class = vec![0u8; w * h];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let mag = g.mag(i);
            if mag <= low {
                continue;
            }
            let (gx, gy) = (g.gx[i] as f32, g.gy[i] as f32);
            let (ax, ay) = (gx.abs(), gy.abs());
            let same_sign = (gx >= 0.0) == (gy >= 0.0);
            let (n1, n2) = if ay <= ax * TAN_22_5_DEG {
                (i - 1, i + 1)
            } else if ax <= ay * TAN_22_5_DEG {
                (i - w, i + w)
            } else if same_sign {
                (i - w - 1, i + w + 1)
            } else {
                (i - w + 1, i + w - 1)
            };
            // ties broken towards the earlier pixel, one-pixel-wide ridges
            if mag < g.mag(n1) || mag <= g.mag(n2) {
                continue;
            }
            class[i] = if mag > high { 2 } else { 1 };
        }
    }

    let mut queue = VecDeque::new();
    for (i, &c) in class.iter().enumerate() {
        if c == 2 {
            edges[i] = true;
            queue.push_back(i);
        }
    }
    while let Some(i) = queue.pop_front() {
        let (x, y) = (i % w, i / w);
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                let j = ny * w + nx;
                if class[j] == 1 && !edges[j] {
                    edges[j] = true;
                    queue.push_back(j);
                }
            }
        }
    }
    edges
}

/// One 8-connected set of edge pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    /// Row-major pixel indices into the source image.
    pub pixels: Vec<usize>,
    /// Inclusive bounds `(x0, y0, x1, y1)`.
    pub bounds: (usize, usize, usize, usize),
    /// Pixels enclosed by the contour, the contour itself included.
    pub area: usize,
}

impl Contour {
    /// Boundary length approximated by the pixel count.
    #[inline]
    pub fn perimeter(&self) -> usize {
        self.pixels.len()
    }
}

/// Label 8-connected components of `mask` and measure their enclosed area.
pub fn edge_contours(mask: &[bool], width: usize, height: usize) -> Vec<Contour> {
    let mut label = vec![false; mask.len()];
    let mut out = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..mask.len() {
        if !mask[start] || label[start] {
            continue;
        }
        label[start] = true;
        queue.push_back(start);
        let mut pixels = Vec::new();
        let (mut x0, mut y0, mut x1, mut y1) = (usize::MAX, usize::MAX, 0, 0);
        while let Some(i) = queue.pop_front() {
            let (x, y) = (i % width, i / width);
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
            pixels.push(i);
            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    let j = ny * width + nx;
                    if mask[j] && !label[j] {
                        label[j] = true;
                        queue.push_back(j);
                    }
                }
            }
        }
        let bounds = (x0, y0, x1, y1);
        let area = enclosed_area(&pixels, width, bounds);
        out.push(Contour {
            pixels,
            bounds,
            area,
        });
    }
    out
}

/// Area inside the contour: the padded bounding box minus what a 4-connected
/// flood fill from its border reaches without crossing contour pixels.
fn enclosed_area(pixels: &[usize], width: usize, bounds: (usize, usize, usize, usize)) -> usize {
    let (x0, y0, x1, y1) = bounds;
    let bw = x1 - x0 + 3;
    let bh = y1 - y0 + 3;
    let mut wall = vec![false; bw * bh];
    for &i in pixels {
        let (x, y) = (i % width, i / width);
        wall[(y - y0 + 1) * bw + (x - x0 + 1)] = true;
    }

    let mut outside = vec![false; bw * bh];
    let mut queue = VecDeque::from([0usize]);
    outside[0] = true;
    let mut reached = 0usize;
    while let Some(i) = queue.pop_front() {
        reached += 1;
        let (x, y) = (i % bw, i / bw);
        let mut visit = |j: usize| {
            if !wall[j] && !outside[j] {
                outside[j] = true;
                queue.push_back(j);
            }
        };
        if x > 0 {
            visit(i - 1);
        }
        if x + 1 < bw {
            visit(i + 1);
        }
        if y > 0 {
            visit(i - bw);
        }
        if y + 1 < bh {
            visit(i + bw);
        }
    }
    bw * bh - reached
}

/// Keep contours not nested inside a larger one.
pub fn external_contours(mut contours: Vec<Contour>) -> Vec<Contour> {
    contours.sort_by(|a, b| b.area.cmp(&a.area).then(a.pixels[0].cmp(&b.pixels[0])));
    let mut kept: Vec<Contour> = Vec::new();
    for c in contours {
        let (cx0, cy0, cx1, cy1) = c.bounds;
        let nested = kept.iter().any(|k| {
            let (kx0, ky0, kx1, ky1) = k.bounds;
            k.area > k.pixels.len() && kx0 <= cx0 && ky0 <= cy0 && kx1 >= cx1 && ky1 >= cy1
        });
        if !nested {
            kept.push(c);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use slot_inspect_core::GrayImage;

    fn square(w: usize, h: usize, x0: usize, y0: usize, side: usize) -> GrayImage {
        let mut data = vec![20u8; w * h];
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                data[y * w + x] = 230;
            }
        }
        GrayImage {
            width: w,
            height: h,
            data,
        }
    }

    #[test]
    fn sobel_responds_to_vertical_edge() {
        let img = GrayImage {
            width: 6,
            height: 3,
            data: (0..18).map(|i| if i % 6 < 3 { 0 } else { 100 }).collect(),
        };
        let g = sobel(&img.view());
        assert_eq!(g.gx[6 + 2], 400);
        assert_eq!(g.gy[6 + 2], 0);
        assert_eq!(g.gx[6], 0);
    }

    #[test]
    fn canny_on_flat_image_is_empty() {
        let img = GrayImage {
            width: 20,
            height: 20,
            data: vec![80; 400],
        };
        assert!(canny(&img.view(), 50.0, 150.0).iter().all(|&e| !e));
    }

    #[test]
    fn square_gives_one_closed_contour() {
        let img = square(40, 40, 10, 10, 20);
        let edges = canny(&img.view(), 50.0, 150.0);
        let contours = external_contours(edge_contours(&edges, 40, 40));
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        // the ridge sits on one side of the intensity step
        assert!(c.area >= 18 * 18 && c.area <= 22 * 22, "area {}", c.area);
        assert!(c.perimeter() >= 70 && c.perimeter() <= 90, "perimeter {}", c.perimeter());
    }

    #[test]
    fn enclosed_area_of_open_line_is_its_length() {
        let mut mask = vec![false; 100];
        for x in 2..8 {
            mask[5 * 10 + x] = true;
        }
        let contours = edge_contours(&mask, 10, 10);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area, 6);
    }

    #[test]
    fn nested_contour_is_not_external() {
        let mut mask = vec![false; 400];
        let mut ring = |x0: usize, x1: usize| {
            for t in x0..=x1 {
                mask[x0 * 20 + t] = true;
                mask[x1 * 20 + t] = true;
                mask[t * 20 + x0] = true;
                mask[t * 20 + x1] = true;
            }
        };
        ring(2, 17);
        ring(6, 12);
        let all = edge_contours(&mask, 20, 20);
        assert_eq!(all.len(), 2);
        let ext = external_contours(all);
        assert_eq!(ext.len(), 1);
        assert_eq!(ext[0].area, 16 * 16);
    }
}
