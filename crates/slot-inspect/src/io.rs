//! JSON model, config and report files, plus `image` crate helpers.

use crate::{ConfigError, EngineConfig, InspectionModel, InspectionReport, ReferenceImage};
use image::ImageReader;
use serde::{Deserialize, Serialize};
use slot_inspect_core::{ColorImage, ColorImageView, GrayImageView};
use slot_inspect_eval::Slot;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to read image {path}: {message}")]
    Image { path: PathBuf, message: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// On-disk model definition: a reference image path and its slots.
///
/// Relative paths (reference image and slot templates) are resolved against
/// the directory of the model file by [`ModelConfig::load_json`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub reference_image: PathBuf,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl ModelConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&raw)?;
        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }
        Ok(config)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn resolve_relative(&mut self, base: &Path) {
        if self.reference_image.is_relative() {
            self.reference_image = base.join(&self.reference_image);
        }
        for slot in &mut self.slots {
            if let Some(template) = slot.template.as_mut() {
                template.resolve_relative(base);
            }
        }
    }

    /// Read the reference image and validate the slots against it.
    pub fn load_model(&self) -> Result<InspectionModel, IoError> {
        let reference = ReferenceImage::new(load_color_image(&self.reference_image)?);
        Ok(InspectionModel::new(reference, self.slots.clone())?)
    }
}

impl EngineConfig {
    /// Load and validate a JSON config; missing fields take defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl InspectionReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Decode any supported image file into an RGB buffer.
pub fn load_color_image(path: impl AsRef<Path>) -> Result<ColorImage, IoError> {
    let path = path.as_ref();
    let image_err = |message: String| IoError::Image {
        path: path.to_path_buf(),
        message,
    };
    let decoded = ImageReader::open(path)
        .map_err(|e| image_err(e.to_string()))?
        .decode()
        .map_err(|e| image_err(e.to_string()))?;
    Ok(from_rgb(&decoded.to_rgb8()))
}

pub fn from_rgb(img: &::image::RgbImage) -> ColorImage {
    ColorImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    }
}

/// Borrow an `image::RgbImage` as a [`ColorImageView`].
pub fn color_view(img: &::image::RgbImage) -> ColorImageView<'_> {
    ColorImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Borrow an `image::GrayImage` as a [`GrayImageView`].
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slot_inspect_core::Rect;
    use slot_inspect_eval::TemplateAsset;

    #[test]
    fn model_paths_resolve_against_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{
            "reference_image": "ref.png",
            "slots": [
                { "id": 1, "rect": { "x": 0, "y": 0, "w": 10, "h": 10 },
                  "template": { "path": "templates/one.png" } }
            ]
        }"#;
        let path = dir.path().join("model.json");
        fs::write(&path, json).unwrap();

        let cfg = ModelConfig::load_json(&path).unwrap();
        assert_eq!(cfg.reference_image, dir.path().join("ref.png"));
        assert_eq!(
            cfg.slots[0].template,
            Some(TemplateAsset::Path(dir.path().join("templates/one.png")))
        );
        assert_eq!(cfg.slots[0].rect, Rect::new(0, 0, 10, 10));
    }

    #[test]
    fn missing_reference_image_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ModelConfig {
            reference_image: dir.path().join("absent.png"),
            slots: Vec::new(),
        };
        assert!(matches!(cfg.load_model(), Err(IoError::Image { .. })));
    }

    #[test]
    fn color_image_round_trips_through_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        let img = ::image::RgbImage::from_fn(8, 4, |x, y| ::image::Rgb([x as u8, y as u8, 7]));
        img.save(&path).unwrap();

        let loaded = load_color_image(&path).unwrap();
        assert_eq!((loaded.width, loaded.height), (8, 4));
        assert_eq!(loaded.view().rgb(3, 2), [3, 2, 7]);
        assert_eq!(color_view(&img).rgb(3, 2), [3, 2, 7]);
    }

    #[test]
    fn invalid_config_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{ "scale_factor": 0.5 }"#).unwrap();
        assert!(matches!(
            EngineConfig::load_json(&path),
            Err(IoError::Config(ConfigError::Invalid {
                field: "scale_factor",
                ..
            }))
        ));
    }
}
