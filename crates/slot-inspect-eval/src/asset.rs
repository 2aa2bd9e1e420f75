//! Template assets and their decoding through the `image` crate.

use crate::AssetError;
use image::ImageReader;
use serde::{Deserialize, Serialize};
use slot_inspect_core::ColorImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Where a slot's reference template comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateAsset {
    /// Image file on disk, read on every evaluation.
    Path(PathBuf),
    /// Encoded image bytes (PNG, JPEG, ...).
    Encoded(Vec<u8>),
    /// Already decoded RGB pixels. Not serialized.
    #[serde(skip)]
    Pixels(ColorImage),
}

impl TemplateAsset {
    /// Decode into an RGB buffer.
    pub fn load(&self) -> Result<ColorImage, AssetError> {
        let img = match self {
            TemplateAsset::Path(path) => load_path(path)?,
            TemplateAsset::Encoded(bytes) => {
                let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
                    .with_guessed_format()
                    .map_err(|e| AssetError::Decode(e.to_string()))?;
                from_dynamic(reader.decode().map_err(|e| AssetError::Decode(e.to_string()))?)
            }
            TemplateAsset::Pixels(img) => {
                let expected = 3 * img.width * img.height;
                if img.data.len() != expected {
                    return Err(AssetError::InvalidPixels {
                        expected,
                        got: img.data.len(),
                    });
                }
                img.clone()
            }
        };
        if img.is_empty() {
            return Err(AssetError::Empty);
        }
        Ok(img)
    }

    /// Resolve a relative `Path` asset against `base`.
    pub fn resolve_relative(&mut self, base: &Path) {
        if let TemplateAsset::Path(p) = self {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }
}

fn load_path(path: &Path) -> Result<ColorImage, AssetError> {
    if !path.exists() {
        return Err(AssetError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let reader = ImageReader::open(path).map_err(|e| AssetError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let decoded = reader
        .decode()
        .map_err(|e| AssetError::Decode(format!("{}: {e}", path.display())))?;
    Ok(from_dynamic(decoded))
}

fn from_dynamic(img: image::DynamicImage) -> ColorImage {
    let rgb = img.to_rgb8();
    ColorImage {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
        data: rgb.into_raw(),
    }
}
