use serde::Serialize;
use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::product::{Product, ProductId};

/// Products the user marked as interesting during this session
///
/// Grows by add-if-absent and is discarded with the session; there is no
/// remove operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Wishlist {
    items: BTreeSet<ProductId>,
}

impl Wishlist {
    pub fn new() -> Self {
        Wishlist::default()
    }

    /// Adds an id, returning `true` only if it was not present yet
    pub fn add(&mut self, id: impl Into<ProductId>) -> bool {
        self.items.insert(id.into())
    }

    pub fn members(&self) -> &BTreeSet<ProductId> {
        &self.items
    }

    pub fn is_member(&self, id: &ProductId) -> bool {
        self.items.contains(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Catalog records on the wishlist, in catalog order
    pub fn products(&self, catalog: &Catalog) -> Vec<Product> {
        catalog
            .iter()
            .filter(|p| self.is_member(&p.product_id))
            .cloned()
            .collect()
    }
}
