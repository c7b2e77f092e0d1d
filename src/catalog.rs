use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::DashboardError;
use crate::product::{Product, ProductId, RATING_BOUNDS};

/// Columns every catalog file must provide (in any order)
pub const CATALOG_COLUMNS: [&str; 5] = ["product_id", "category", "price", "rating", "image_name"];

/// The full product dataset of a session
///
/// Loaded once when the session starts and never modified afterwards.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Load a catalog from a CSV file
    ///
    /// # Arguments
    /// * `filepath` - Path to the CSV file to load
    ///
    /// # Returns
    /// * `Result<Catalog, DashboardError>` - The loaded catalog or an error
    ///
    /// # Examples
    /// ```no_run
    /// use fashion_explorer::catalog::Catalog;
    ///
    /// match Catalog::from_csv("fashion.csv") {
    ///     Ok(catalog) => println!("Loaded {} products", catalog.len()),
    ///     Err(e) => eprintln!("Error loading catalog: {}", e),
    /// }
    /// ```
    pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Catalog, DashboardError> {
        let text = fs::read_to_string(filepath)?;
        Catalog::parse(&text)
    }

    /// Parse CSV text with a header row into a catalog
    ///
    /// Columns are located by name, extra columns are ignored and blank lines
    /// are skipped. Line numbers in errors are 1-based with the header on line 1.
    pub fn parse(text: &str) -> Result<Catalog, DashboardError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.trim().is_empty());

        let (header_line, header) = lines
            .next()
            .ok_or_else(|| DashboardError::catalog(1, "CSV file is empty"))?;
        let header: Vec<String> = parse_csv_row(header)
            .into_iter()
            .map(|name| name.trim().to_string())
            .collect();

        let mut positions = [0usize; 5];
        for (slot, column) in positions.iter_mut().zip(CATALOG_COLUMNS) {
            *slot = header
                .iter()
                .position(|name| name == column)
                .ok_or_else(|| {
                    DashboardError::catalog(header_line, format!("missing column '{}'", column))
                })?;
        }
        let [id_col, category_col, price_col, rating_col, image_col] = positions;

        let mut products = Vec::new();
        let mut seen = HashSet::new();
        for (line_no, line) in lines {
            let fields = parse_csv_row(line);
            let field = |col: usize| -> Result<&str, DashboardError> {
                fields.get(col).map(|f| f.trim()).ok_or_else(|| {
                    DashboardError::catalog(line_no, format!("expected {} fields", header.len()))
                })
            };

            let product = Product {
                product_id: ProductId::new(field(id_col)?),
                category: field(category_col)?.to_string(),
                price: parse_number(field(price_col)?, "price", line_no)?,
                rating: parse_number(field(rating_col)?, "rating", line_no)?,
                image_name: field(image_col)?.to_string(),
            };
            validate_product(&product, line_no)?;

            if !seen.insert(product.product_id.clone()) {
                return Err(DashboardError::catalog(
                    line_no,
                    format!("duplicate product_id '{}'", product.product_id),
                ));
            }
            products.push(product);
        }

        Ok(Catalog { products })
    }

    /// Build a catalog from records already in memory
    ///
    /// Applies the same checks as [`Catalog::parse`]; the "line" reported in
    /// errors is the 1-based record position.
    pub fn from_products(products: Vec<Product>) -> Result<Catalog, DashboardError> {
        let mut seen = HashSet::new();
        for (i, product) in products.iter().enumerate() {
            validate_product(product, i + 1)?;
            if !seen.insert(&product.product_id) {
                return Err(DashboardError::catalog(
                    i + 1,
                    format!("duplicate product_id '{}'", product.product_id),
                ));
            }
        }
        Ok(Catalog { products })
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.product_id == id)
    }

    /// Distinct categories in order of first appearance
    pub fn categories(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.products
            .iter()
            .filter(|p| seen.insert(p.category.as_str()))
            .map(|p| p.category.clone())
            .collect()
    }

    /// Whole-number bounds for the price slider, `None` for an empty catalog
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        let mut prices = self.products.iter().map(|p| p.price);
        let first = prices.next()?;
        let (min, max) = prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some((min.floor(), max.ceil()))
    }
}

fn parse_number(value: &str, column: &str, line: usize) -> Result<f64, DashboardError> {
    let number: f64 = value.parse().map_err(|_| {
        DashboardError::catalog(line, format!("{} '{}' is not a number", column, value))
    })?;
    if !number.is_finite() {
        return Err(DashboardError::catalog(line, format!("{} must be finite", column)));
    }
    Ok(number)
}

fn validate_product(product: &Product, line: usize) -> Result<(), DashboardError> {
    if product.product_id.as_str().is_empty() {
        return Err(DashboardError::catalog(line, "product_id is empty"));
    }
    if !product.price.is_finite() || product.price < 0.0 {
        return Err(DashboardError::catalog(line, "price must be a non-negative number"));
    }
    let (lo, hi) = RATING_BOUNDS;
    if !(lo..=hi).contains(&product.rating) {
        return Err(DashboardError::catalog(
            line,
            format!("rating {} outside {}..={}", product.rating, lo, hi),
        ));
    }
    Ok(())
}

// Parse a CSV row into a vector of strings
pub(crate) fn parse_csv_row(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Escaped quote inside a quoted field
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                result.push(std::mem::take(&mut current_field));
            }
            _ => current_field.push(c),
        }
    }

    result.push(current_field);
    result
}
