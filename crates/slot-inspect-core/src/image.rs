use crate::Rect;

/// Borrowed 8-bit grayscale image, row-major, `data.len() == width * height`.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

/// Owned 8-bit grayscale image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Borrowed interleaved RGB image, `data.len() == 3 * width * height`.
#[derive(Clone, Copy, Debug)]
pub struct ColorImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

/// Owned interleaved RGB image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl<'a> GrayImageView<'a> {
    /// Wrap a raw buffer, returning `None` on a size mismatch.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        (width.checked_mul(height)? == data.len()).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Copy out the pixels covered by `rect`; `None` unless `rect` lies fully inside.
    pub fn crop(&self, rect: Rect) -> Option<GrayImage> {
        let (x0, y0, w, h) = rect.checked_within(self.width, self.height)?;
        let mut data = Vec::with_capacity(w * h);
        for y in y0..y0 + h {
            let row = y * self.width;
            data.extend_from_slice(&self.data[row + x0..row + x0 + w]);
        }
        Some(GrayImage {
            width: w,
            height: h,
            data,
        })
    }

    pub fn to_owned_image(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl<'a> ColorImageView<'a> {
    /// Wrap a raw RGB buffer, returning `None` on a size mismatch.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        (width.checked_mul(height)?.checked_mul(3)? == data.len()).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        let i = 3 * (y * self.width + x);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// ITU-R BT.601 luma, rounded to nearest.
    pub fn to_gray(&self) -> GrayImage {
        let data = self
            .data
            .chunks_exact(3)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect();
        GrayImage {
            width: self.width,
            height: self.height,
            data,
        }
    }

    pub fn crop(&self, rect: Rect) -> Option<ColorImage> {
        let (x0, y0, w, h) = rect.checked_within(self.width, self.height)?;
        let mut data = Vec::with_capacity(3 * w * h);
        for y in y0..y0 + h {
            let row = 3 * (y * self.width + x0);
            data.extend_from_slice(&self.data[row..row + 3 * w]);
        }
        Some(ColorImage {
            width: w,
            height: h,
            data,
        })
    }
}

impl ColorImage {
    #[inline]
    pub fn view(&self) -> ColorImageView<'_> {
        ColorImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Replicate a grayscale image into all three channels.
    pub fn from_gray(gray: &GrayImageView<'_>) -> Self {
        let mut data = Vec::with_capacity(3 * gray.data.len());
        for &v in gray.data {
            data.extend_from_slice(&[v, v, v]);
        }
        Self {
            width: gray.width,
            height: gray.height,
            data,
        }
    }
}

#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

#[inline]
fn get_gray_clamped(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    let x = x.clamp(0, src.width as i32 - 1) as usize;
    let y = y.clamp(0, src.height as i32 - 1) as usize;
    src.data[y * src.width + x]
}

/// Bilinear sample; pixels outside the image read as 0.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray(src, x0, y0) as f32;
    let p10 = get_gray(src, x0 + 1, y0) as f32;
    let p01 = get_gray(src, x0, y0 + 1) as f32;
    let p11 = get_gray(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

/// Bilinear sample with edge replication instead of zero padding.
#[inline]
fn sample_bilinear_clamped(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray_clamped(src, x0, y0) as f32;
    let p10 = get_gray_clamped(src, x0 + 1, y0) as f32;
    let p01 = get_gray_clamped(src, x0, y0 + 1) as f32;
    let p11 = get_gray_clamped(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

/// Resize with pixel-center aligned bilinear interpolation.
///
/// Downscaling by more than 2x averages over the source footprint first so
/// that pyramid levels do not alias.
pub fn resize_gray(src: &GrayImageView<'_>, out_w: usize, out_h: usize) -> GrayImage {
    if out_w == 0 || out_h == 0 || src.is_empty() {
        return GrayImage::new(out_w, out_h);
    }
    if out_w == src.width && out_h == src.height {
        return src.to_owned_image();
    }

    let sx = src.width as f32 / out_w as f32;
    let sy = src.height as f32 / out_h as f32;
    let mut out = vec![0u8; out_w * out_h];

    if sx > 2.0 || sy > 2.0 {
        for y in 0..out_h {
            let y0 = (y as f32 * sy).floor() as usize;
            let y1 = (((y + 1) as f32 * sy).ceil() as usize).clamp(y0 + 1, src.height);
            for x in 0..out_w {
                let x0 = (x as f32 * sx).floor() as usize;
                let x1 = (((x + 1) as f32 * sx).ceil() as usize).clamp(x0 + 1, src.width);
                let mut acc = 0u32;
                for yy in y0..y1 {
                    let row = yy * src.width;
                    acc += src.data[row + x0..row + x1]
                        .iter()
                        .map(|&v| v as u32)
                        .sum::<u32>();
                }
                let n = ((y1 - y0) * (x1 - x0)) as u32;
                out[y * out_w + x] = ((acc + n / 2) / n) as u8;
            }
        }
    } else {
        for y in 0..out_h {
            let fy = (y as f32 + 0.5) * sy - 0.5;
            for x in 0..out_w {
                let fx = (x as f32 + 0.5) * sx - 0.5;
                let v = sample_bilinear_clamped(src, fx, fy);
                out[y * out_w + x] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    GrayImage {
        width: out_w,
        height: out_h,
        data: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(w: usize, h: usize) -> GrayImage {
        let data = (0..w * h).map(|i| ((i % w) * 10 + (i / w)) as u8).collect();
        GrayImage {
            width: w,
            height: h,
            data,
        }
    }

    #[test]
    fn crop_copies_requested_window() {
        let img = ramp(8, 6);
        let c = img.view().crop(Rect::new(2, 1, 3, 2)).expect("inside");
        assert_eq!(c.width, 3);
        assert_eq!(c.height, 2);
        assert_eq!(c.data, vec![21, 31, 41, 22, 32, 42]);
    }

    #[test]
    fn crop_rejects_out_of_bounds() {
        let img = ramp(8, 6);
        assert!(img.view().crop(Rect::new(6, 0, 3, 2)).is_none());
        assert!(img.view().crop(Rect::new(-1, 0, 3, 2)).is_none());
        assert!(img.view().crop(Rect::new(0, 0, 0, 2)).is_none());
    }

    #[test]
    fn luma_of_pure_channels() {
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
    }

    #[test]
    fn resize_identity_is_copy() {
        let img = ramp(5, 4);
        assert_eq!(resize_gray(&img.view(), 5, 4), img);
    }

    #[test]
    fn resize_constant_stays_constant() {
        let img = GrayImage {
            width: 40,
            height: 30,
            data: vec![77; 1200],
        };
        for (w, h) in [(13, 9), (33, 25), (80, 60), (4, 3)] {
            let r = resize_gray(&img.view(), w, h);
            assert!(r.data.iter().all(|&v| v == 77), "{w}x{h}");
        }
    }

    #[test]
    fn view_new_checks_length() {
        let buf = [0u8; 12];
        assert!(GrayImageView::new(4, 3, &buf).is_some());
        assert!(GrayImageView::new(4, 4, &buf).is_none());
        assert!(ColorImageView::new(2, 2, &buf).is_some());
        assert!(ColorImageView::new(3, 2, &buf).is_none());
    }
}
