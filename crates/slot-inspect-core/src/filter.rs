//! Separable smoothing filters on grayscale buffers.

use crate::{GrayImage, GrayImageView};

const GAUSS5: [u32; 5] = [1, 4, 6, 4, 1];

/// 5×5 binomial (Gaussian σ ≈ 1) blur with edge replication.
pub fn gaussian_blur_5x5(src: &GrayImageView<'_>) -> GrayImage {
    let (w, h) = (src.width, src.height);
    if w == 0 || h == 0 {
        return GrayImage::new(w, h);
    }

    let clamp_x = |x: isize| x.clamp(0, w as isize - 1) as usize;
    let clamp_y = |y: isize| y.clamp(0, h as isize - 1) as usize;

    let mut tmp = vec![0u32; w * h];
    for y in 0..h {
        let row = &src.data[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0u32;
            for (k, &g) in GAUSS5.iter().enumerate() {
                acc += g * row[clamp_x(x as isize + k as isize - 2)] as u32;
            }
            tmp[y * w + x] = acc;
        }
    }

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u32;
            for (k, &g) in GAUSS5.iter().enumerate() {
                acc += g * tmp[clamp_y(y as isize + k as isize - 2) * w + x];
            }
            out[y * w + x] = ((acc + 128) / 256) as u8;
        }
    }

    GrayImage {
        width: w,
        height: h,
        data: out,
    }
}
