use clap::Parser;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use fashion_explorer::filter::{self, DEFAULT_MIN_RATING, DEFAULT_PRICE_RANGE};
use fashion_explorer::{
    AssetStore, Catalog, ChartKind, Effect, FilterSpec, GraphOptions, PriceRange, ProductId,
    dashboard, downloader, effects, graph, summarize,
};

#[derive(Parser, Debug)]
#[command(name = "explorer-cli")]
#[command(about = "Filter a fashion catalog from the command line", long_about = None)]
struct Cli {
    /// Catalog CSV file
    #[arg(default_value = "fashion.csv")]
    catalog: PathBuf,

    /// Category to include (repeatable; defaults to the first category)
    #[arg(short, long = "category")]
    categories: Vec<String>,

    /// Minimum rating
    #[arg(long, default_value_t = DEFAULT_MIN_RATING)]
    min_rating: f64,

    #[arg(long, default_value_t = DEFAULT_PRICE_RANGE.0)]
    price_low: f64,

    #[arg(long, default_value_t = DEFAULT_PRICE_RANGE.1)]
    price_high: f64,

    /// Substring of a product id or category
    #[arg(short, long)]
    search: Option<String>,

    /// Write the filtered products to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Chart type, by its dashboard label
    #[arg(long, default_value = "Bar Graph (Price)")]
    chart: String,

    /// Write the chart to this SVG file
    #[arg(long)]
    chart_out: Option<PathBuf>,

    /// Product whose image is processed (defaults to the first match)
    #[arg(short, long)]
    product: Option<String>,

    /// Effect, by its dashboard label
    #[arg(short, long, default_value = "None")]
    effect: String,

    /// Directory holding the product images
    #[arg(long, default_value = "images")]
    images_dir: PathBuf,

    /// Write the effect-applied image to this PNG file
    #[arg(long)]
    image_out: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let catalog = Catalog::from_csv(&cli.catalog)?;
    log::info!("Loaded {} products from {}", catalog.len(), cli.catalog.display());

    let categories: BTreeSet<String> = if cli.categories.is_empty() {
        FilterSpec::defaults_for(&catalog).categories
    } else {
        cli.categories.iter().cloned().collect()
    };
    let spec = FilterSpec {
        categories,
        min_rating: cli.min_rating,
        price_range: PriceRange::new(cli.price_low, cli.price_high),
        search_text: cli.search.clone().filter(|s| !s.is_empty()),
    };

    let view = filter::filter(&catalog, &spec);
    if view.is_empty() {
        println!("No products available in selected categories.");
    } else {
        println!("{:<12} {:<16} {:>10} {:>7}  image", "product_id", "category", "price", "rating");
        for product in view.iter() {
            println!(
                "{:<12} {:<16} {:>10} {:>7}  {}",
                product.product_id, product.category, product.price, product.rating, product.image_name
            );
        }
    }

    let summary = summarize(&view);
    println!();
    println!("Average Price:  {}", summary.price_label());
    println!("Average Rating: {}", summary.rating_label());

    if let Some(path) = &cli.export {
        fs::write(path, downloader::to_csv(view.records()))?;
        println!("Wrote {} rows to {}", view.len(), path.display());
    }

    if let Some(path) = &cli.chart_out {
        let kind = ChartKind::from_label(&cli.chart);
        let chart = graph::render_chart(&view, kind, &GraphOptions::default())?;
        fs::write(path, chart.svg)?;
        println!("Wrote {} to {}", kind.label(), path.display());
    }

    if let Some(path) = &cli.image_out {
        let requested = cli.product.as_deref().map(ProductId::from);
        let Some(product) = dashboard::select_product(&view, requested.as_ref()) else {
            return Err("no product to process: the filtered view is empty".into());
        };

        let effect = Effect::from_label(&cli.effect);
        let image = AssetStore::new(&cli.images_dir).open(product)?;
        fs::write(path, effects::encode_png(&effects::apply_effect(&image, effect))?)?;
        println!("Wrote product {} ({}) to {}", product.product_id, effect.label(), path.display());
    }

    Ok(())
}
