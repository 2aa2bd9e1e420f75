use slot_inspect_core::{resize_gray, GrayImage, GrayImageView};

/// One level of a scale pyramid.
#[derive(Clone, Debug)]
pub struct PyramidLevel {
    pub image: GrayImage,
    /// Full-resolution pixels per level pixel along x.
    pub scale_x: f32,
    /// Full-resolution pixels per level pixel along y.
    pub scale_y: f32,
}

/// Build up to `n_levels` levels, each `scale_factor` times smaller than the
/// previous. Stops early once a level would fall below `min_side` pixels.
pub fn build_pyramid(
    img: &GrayImageView<'_>,
    n_levels: usize,
    scale_factor: f32,
    min_side: usize,
) -> Vec<PyramidLevel> {
    let mut levels = Vec::with_capacity(n_levels);
    if img.is_empty() || n_levels == 0 {
        return levels;
    }
    let factor = scale_factor.max(1.0) as f64;

    for i in 0..n_levels {
        let s = factor.powi(i as i32);
        let w = (img.width as f64 / s).round() as usize;
        let h = (img.height as f64 / s).round() as usize;
        if w < min_side || h < min_side {
            break;
        }
        let image = if i == 0 {
            img.to_owned_image()
        } else {
            resize_gray(img, w, h)
        };
        levels.push(PyramidLevel {
            image,
            scale_x: img.width as f32 / w as f32,
            scale_y: img.height as f32 / h as f32,
        });
        if factor <= 1.0 {
            break;
        }
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn level_sizes_follow_scale_factor() {
        let img = GrayImage::new(320, 240);
        let levels = build_pyramid(&img.view(), 8, 1.2, 39);
        assert_eq!(levels[0].image.width, 320);
        assert_eq!(levels[1].image.width, 267);
        assert_eq!(levels[1].image.height, 200);
        assert_relative_eq!(levels[1].scale_y, 1.2, epsilon = 1e-6);
        for l in &levels {
            assert!(l.image.width >= 39 && l.image.height >= 39);
        }
        assert_eq!(levels.len(), 8);
    }

    #[test]
    fn stops_at_min_side() {
        let img = GrayImage::new(60, 50);
        let levels = build_pyramid(&img.view(), 8, 1.2, 39);
        // 60x50, 50x42, then 42x35 is too small
        assert_eq!(levels.len(), 2);
    }
}
