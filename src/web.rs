use fashion_explorer::{AppConfig, app};

/// Main entry point for the web dashboard
///
/// Reads the configuration (defaults, optional `explorer.*` file, then
/// `EXPLORER__*` environment variables) and serves the dashboard until
/// the process is stopped.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    log::info!(
        "Catalog: {}, images: {}",
        config.data.catalog_path,
        config.data.images_dir
    );

    app::run(config).await
}
