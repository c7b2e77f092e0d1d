#![allow(dead_code)]

use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use fashion_explorer::{Catalog, Product};

/// The three records used across the end-to-end scenarios
pub const THREE_RECORDS: &str = "\
product_id,category,price,rating,image_name
1,Tops,150,4.0,1.jpg
2,Tops,50,4.5,2.jpg
3,Shoes,300,2.0,3.jpg
";

pub fn three_record_catalog() -> Catalog {
    Catalog::parse(THREE_RECORDS).expect("fixture catalog parses")
}

pub fn catalog_of(products: Vec<Product>) -> Catalog {
    Catalog::from_products(products).expect("fixture products are valid")
}

/// A catalog file plus an `images/` directory on disk
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Writes `catalog_csv` and a small PNG for every listed image name
    pub fn new(catalog_csv: &str, images: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join("fashion.csv"), catalog_csv).expect("write catalog");
        fs::create_dir(dir.path().join("images")).expect("create images dir");
        for name in images {
            write_image(&dir.path().join("images").join(name));
        }
        Fixture { dir }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.path().join("fashion.csv")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.dir.path().join("images")
    }
}

pub fn write_image(path: &Path) {
    let image = RgbImage::from_fn(8, 6, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 120]));
    image.save(path).expect("write fixture image");
}
