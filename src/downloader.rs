use crate::catalog::CATALOG_COLUMNS;
use crate::error::DashboardError;
use crate::product::Product;

/// File name offered for the CSV download
pub const CSV_FILENAME: &str = "filtered_data.csv";

/// File name offered for the XLSX download
pub const XLSX_FILENAME: &str = "filtered_data.xlsx";

/// Convert products to CSV format
///
/// Uses the catalog column layout so the export can be loaded back as a
/// catalog. Fields containing commas, quotes or newlines are quoted.
///
/// # Arguments
/// * `products` - Rows to export, usually a filtered view
///
/// # Returns
/// * `String` - CSV content with a header row
///
/// # Examples
/// ```
/// use fashion_explorer::downloader::to_csv;
/// use fashion_explorer::product::Product;
///
/// let csv = to_csv(&[Product::new(1u32, "Tops", 150.0, 4.0, "1.jpg")]);
/// assert_eq!(csv, "product_id,category,price,rating,image_name\n1,Tops,150,4,1.jpg\n");
/// ```
pub fn to_csv(products: &[Product]) -> String {
    let mut csv_content = CATALOG_COLUMNS.join(",");
    csv_content.push('\n');

    for product in products {
        let fields = [
            escape_field(product.product_id.as_str()),
            escape_field(&product.category),
            product.price.to_string(),
            product.rating.to_string(),
            escape_field(&product.image_name),
        ];
        csv_content.push_str(&fields.join(","));
        csv_content.push('\n');
    }

    csv_content
}

fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Convert products to XLSX format
///
/// One worksheet with the catalog header row; prices and ratings are written
/// as numbers.
///
/// # Returns
/// * `Result<Vec<u8>, DashboardError>` - XLSX file content as bytes or an error
pub fn to_xlsx(products: &[Product]) -> Result<Vec<u8>, DashboardError> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    let export_err = |e: rust_xlsxwriter::XlsxError| DashboardError::Export(e.to_string());

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    for (c, column) in CATALOG_COLUMNS.iter().enumerate() {
        worksheet
            .write_string(0, c as u16, *column)
            .map_err(export_err)?;
    }

    for (r, product) in products.iter().enumerate() {
        let row = (r + 1) as u32;
        worksheet
            .write_string(row, 0, product.product_id.as_str())
            .map_err(export_err)?;
        worksheet
            .write_string(row, 1, product.category.as_str())
            .map_err(export_err)?;
        worksheet
            .write_number(row, 2, product.price)
            .map_err(export_err)?;
        worksheet
            .write_number(row, 3, product.rating)
            .map_err(export_err)?;
        worksheet
            .write_string(row, 4, product.image_name.as_str())
            .map_err(export_err)?;
    }

    workbook.push_worksheet(worksheet);
    workbook.save_to_buffer().map_err(export_err)
}
