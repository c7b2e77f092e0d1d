use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::product::{Product, ProductId};

/// Minimum rating selected before the user touches the sidebar
pub const DEFAULT_MIN_RATING: f64 = 3.0;

/// Price range selected before the user touches the sidebar
pub const DEFAULT_PRICE_RANGE: (f64, f64) = (100.0, 1000.0);

/// Inclusive price interval, always ordered so that `low <= high`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    low: f64,
    high: f64,
}

impl PriceRange {
    /// Creates a range; swapped bounds are put back in order
    pub fn new(low: f64, high: f64) -> Self {
        if low <= high {
            PriceRange { low, high }
        } else {
            PriceRange { low: high, high: low }
        }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn contains(&self, price: f64) -> bool {
        self.low <= price && price <= self.high
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        PriceRange::new(DEFAULT_PRICE_RANGE.0, DEFAULT_PRICE_RANGE.1)
    }
}

/// Sidebar filter state
///
/// All predicates are combined with logical AND. An empty category
/// selection matches no product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub categories: BTreeSet<String>,
    pub min_rating: f64,
    pub price_range: PriceRange,
    pub search_text: Option<String>,
}

impl FilterSpec {
    /// Filter state shown before any sidebar interaction
    ///
    /// Only the first category of the catalog is selected, matching what the
    /// category picker pre-selects.
    pub fn defaults_for(catalog: &Catalog) -> Self {
        FilterSpec {
            categories: catalog.categories().into_iter().take(1).collect(),
            min_rating: DEFAULT_MIN_RATING,
            price_range: PriceRange::default(),
            search_text: None,
        }
    }

    /// Whether a single product passes every predicate
    pub fn matches(&self, product: &Product) -> bool {
        self.categories.contains(&product.category)
            && product.rating >= self.min_rating
            && self.price_range.contains(product.price)
            && self.matches_search(product)
    }

    /// Search text, if a non-empty one was given
    pub fn search(&self) -> Option<&str> {
        self.search_text.as_deref().filter(|s| !s.is_empty())
    }

    // Case-sensitive on the id, case-insensitive on the category
    fn matches_search(&self, product: &Product) -> bool {
        match self.search() {
            None => true,
            Some(needle) => {
                product.product_id.as_str().contains(needle)
                    || product
                        .category
                        .to_lowercase()
                        .contains(&needle.to_lowercase())
            }
        }
    }
}

/// Products of the catalog that pass a [`FilterSpec`], in catalog order
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilteredView {
    records: Vec<Product>,
}

impl FilteredView {
    pub fn new(records: Vec<Product>) -> Self {
        FilteredView { records }
    }

    pub fn records(&self) -> &[Product] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.records.iter().find(|p| &p.product_id == id)
    }

    pub fn ids(&self) -> Vec<ProductId> {
        self.records.iter().map(|p| p.product_id.clone()).collect()
    }
}

/// Applies the sidebar filters to the whole catalog
///
/// # Arguments
/// * `catalog` - The session catalog
/// * `spec` - Sidebar filter state
///
/// # Returns
/// * `FilteredView` - Matching products in catalog order (possibly empty)
pub fn filter(catalog: &Catalog, spec: &FilterSpec) -> FilteredView {
    FilteredView {
        records: catalog.iter().filter(|p| spec.matches(p)).cloned().collect(),
    }
}
