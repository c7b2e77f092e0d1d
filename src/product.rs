use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a catalog product
///
/// The source data may use integers or strings for ids. The textual form is
/// kept so that the free-text search can match against it directly.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        ProductId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        ProductId(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        ProductId(id)
    }
}

impl From<u32> for ProductId {
    fn from(id: u32) -> Self {
        ProductId(id.to_string())
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        ProductId(id.to_string())
    }
}

/// A single row of the product catalog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub category: String,
    pub price: f64,
    pub rating: f64,
    pub image_name: String,
}

impl Product {
    pub fn new(
        product_id: impl Into<ProductId>,
        category: impl Into<String>,
        price: f64,
        rating: f64,
        image_name: impl Into<String>,
    ) -> Self {
        Product {
            product_id: product_id.into(),
            category: category.into(),
            price,
            rating,
            image_name: image_name.into(),
        }
    }
}

/// Lowest and highest rating a product may carry
pub const RATING_BOUNDS: (f64, f64) = (0.0, 5.0);
