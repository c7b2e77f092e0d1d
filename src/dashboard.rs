use serde::{Deserialize, Serialize};

use crate::assets::{AssetStore, ImageStatus};
use crate::catalog::Catalog;
use crate::error::DashboardError;
use crate::filter::{self, FilterSpec, FilteredView, PriceRange};
use crate::effects::Effect;
use crate::graph::{self, Chart, ChartKind, GraphOptions};
use crate::product::{Product, ProductId};
use crate::summary::{self, Summary};
use crate::wishlist::Wishlist;

/// Everything a single user interaction asks the dashboard to show
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardRequest {
    pub filter: FilterSpec,
    pub selected: Option<ProductId>,
    pub effect: Effect,
    pub chart: ChartKind,
}

impl DashboardRequest {
    /// The initial request: default filters, first product, no effect, price histogram
    pub fn initial(catalog: &Catalog) -> Self {
        DashboardRequest {
            filter: FilterSpec::defaults_for(catalog),
            selected: None,
            effect: Effect::None,
            chart: ChartKind::default(),
        }
    }
}

/// Wire form of a [`DashboardRequest`] (query string / form fields)
///
/// Categories arrive as repeated `category` keys. Without the `applied`
/// marker the sidebar has never been submitted and the default filters apply.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub applied: Option<String>,
    #[serde(default, rename = "category")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub price_low: Option<f64>,
    #[serde(default)]
    pub price_high: Option<f64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub chart: Option<String>,
}

impl DashboardQuery {
    pub fn to_request(&self, catalog: &Catalog) -> DashboardRequest {
        let defaults = FilterSpec::defaults_for(catalog);
        let filter = if self.applied.is_some() {
            FilterSpec {
                categories: self.categories.iter().cloned().collect(),
                min_rating: self.min_rating.unwrap_or(defaults.min_rating),
                price_range: PriceRange::new(
                    self.price_low.unwrap_or(defaults.price_range.low()),
                    self.price_high.unwrap_or(defaults.price_range.high()),
                ),
                search_text: self.search.clone().filter(|s| !s.is_empty()),
            }
        } else {
            defaults
        };

        DashboardRequest {
            filter,
            selected: self
                .product
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(ProductId::from),
            effect: self.effect.as_deref().map(Effect::from_label).unwrap_or_default(),
            chart: self.chart.as_deref().map(ChartKind::from_label).unwrap_or_default(),
        }
    }
}

/// Everything derived for one rendering of the dashboard
#[derive(Clone, Debug, Serialize)]
pub struct DashboardView {
    pub request: DashboardRequest,
    pub categories: Vec<String>,
    pub price_bounds: Option<(f64, f64)>,
    pub filtered: FilteredView,
    pub summary: Summary,
    pub selected: Option<Product>,
    pub image: Option<ImageStatus>,
    pub chart: Chart,
    pub wishlist: Vec<Product>,
}

/// Runs the filter → summary → chart → image → wishlist pipeline
///
/// Pure apart from checking whether the selected product's image exists.
///
/// # Arguments
/// * `catalog` - The session catalog
/// * `wishlist` - The session wishlist
/// * `assets` - Where product images live
/// * `request` - What the user asked for
/// * `options` - Chart canvas size
///
/// # Returns
/// * `Result<DashboardView, DashboardError>` - Only chart rendering can fail;
///   empty results and missing images are part of the view.
pub fn build_view(
    catalog: &Catalog,
    wishlist: &Wishlist,
    assets: &AssetStore,
    request: &DashboardRequest,
    options: &GraphOptions,
) -> Result<DashboardView, DashboardError> {
    let filtered = filter::filter(catalog, &request.filter);
    let summary = summary::summarize(&filtered);
    let chart = graph::render_chart(&filtered, request.chart, options)?;

    let selected = select_product(&filtered, request.selected.as_ref()).cloned();
    let image = selected.as_ref().map(|product| {
        let status = assets.status(product);
        if let ImageStatus::Missing { message, .. } = &status {
            log::warn!("{}", message);
        }
        status
    });

    Ok(DashboardView {
        request: request.clone(),
        categories: catalog.categories(),
        price_bounds: catalog.price_bounds(),
        filtered,
        summary,
        selected,
        image,
        chart,
        wishlist: wishlist.products(catalog),
    })
}

/// The requested product if it survived the filters, otherwise the first one
pub fn select_product<'a>(
    view: &'a FilteredView,
    requested: Option<&ProductId>,
) -> Option<&'a Product> {
    requested
        .and_then(|id| view.get(id))
        .or_else(|| view.records().first())
}
