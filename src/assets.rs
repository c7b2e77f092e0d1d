use image::DynamicImage;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::DashboardError;
use crate::product::Product;

lazy_static! {
    // A bare file name; anything with separators could escape the image directory
    static ref IMAGE_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\- ]*$").unwrap();
}

/// Whether a product image can be shown
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageStatus {
    Available { path: String },
    Missing { path: String, message: String },
}

/// Locates product images under a directory (`images/<image_name>`)
#[derive(Clone, Debug)]
pub struct AssetStore {
    images_dir: PathBuf,
}

impl AssetStore {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        AssetStore {
            images_dir: images_dir.into(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Path where the image of `image_name` is expected
    pub fn path_for(&self, image_name: &str) -> PathBuf {
        self.images_dir.join(image_name)
    }

    /// Resolves a product image to an existing file
    ///
    /// # Errors
    /// * `DashboardError::AssetNotFound` naming the attempted path when the
    ///   file is missing or the name is not a plain file name
    pub fn resolve(&self, product: &Product) -> Result<PathBuf, DashboardError> {
        let path = self.path_for(&product.image_name);
        if IMAGE_NAME_REGEX.is_match(&product.image_name) && path.is_file() {
            Ok(path)
        } else {
            Err(DashboardError::AssetNotFound { path })
        }
    }

    pub fn status(&self, product: &Product) -> ImageStatus {
        match self.resolve(product) {
            Ok(path) => ImageStatus::Available {
                path: path.display().to_string(),
            },
            Err(e) => ImageStatus::Missing {
                path: self.path_for(&product.image_name).display().to_string(),
                message: e.to_string(),
            },
        }
    }

    /// Opens and decodes the product image
    ///
    /// The format is sniffed from the file content, so a PNG saved as
    /// `.jpg` still decodes.
    pub fn open(&self, product: &Product) -> Result<DynamicImage, DashboardError> {
        let path = self.resolve(product)?;
        let reader = image::io::Reader::open(path)?.with_guessed_format()?;
        Ok(reader.decode()?)
    }
}
