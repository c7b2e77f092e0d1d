/*!
# Fashion Data Explorer

A browser-based dashboard for exploring a fashion product catalog, built in Rust.

## Overview

After logging in with a static username/password pair, a user browses the
product catalog through sidebar filters, inspects product images with simple
effects, looks at summary statistics and charts of the filtered products, and
keeps a wishlist for the duration of the session.

## Architecture

Every interaction is an explicit request. The dashboard is recomputed from
that request, the session catalog and the session wishlist:

```text
login ──> catalog ──> filter ──> summary
                         │──────> chart
                         │──────> selected product ──> image effect
                         └──────> download (CSV / XLSX)
wishlist ──> catalog rows on the wishlist
```

### Core (always built)
- Catalog Store - Loads the flat CSV catalog once per session
- Filter Engine - Category / rating / price / search predicates, AND-ed
- Summary Aggregator - Average price and rating, "no data" when empty
- Image Effect Applier - Grayscale, rotate, blur, sharpen, edge enhance, brightness
- Chart Selector - Price histogram, rating boxplot, price/rating scatter, category pie (SVG)
- Wishlist Store - Session-scoped add-only set of product ids
- Session/Auth Gate - Static credential check and login state

### Web layer (`web` feature)
- axum router with cookie sessions
- handlebars pages for the login form and the dashboard

## Modules

- **product**: Product record and identifier
- **catalog**: CSV loading and catalog queries
- **filter**: Filter state and filter engine
- **summary**: Summary statistics
- **assets**: Product image lookup
- **effects**: Image effects
- **graph**: Chart data and rendering
- **wishlist**: Session wishlist
- **login**: Credentials and session state machine
- **downloader**: CSV and XLSX export
- **dashboard**: Request → view pipeline
- **config**: Application configuration
- **error**: Error taxonomy
- **app**: Routing and middleware

## REST API Endpoints

- `/login`, `/logout` - Session management
- `/dashboard` - Dashboard page for the current filters
- `/api/view` - Dashboard data as JSON
- `/chart` - Selected chart as SVG
- `/image/{id}` - Product image with an effect applied
- `/wishlist` - Add a product to the wishlist
- `/download/csv`, `/download/xlsx` - Export the filtered products
*/

pub mod assets;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod downloader;
pub mod effects;
pub mod error;
pub mod filter;
pub mod graph;
pub mod login;
pub mod product;
pub mod summary;
pub mod wishlist;

#[cfg(feature = "web")]
pub mod app;

pub use assets::{AssetStore, ImageStatus};
pub use catalog::Catalog;
pub use crate::config::AppConfig;
pub use dashboard::{DashboardQuery, DashboardRequest, DashboardView, build_view};
pub use effects::{Effect, apply_effect};
pub use error::DashboardError;
pub use filter::{FilterSpec, FilteredView, PriceRange};
pub use graph::{Chart, ChartKind, GraphOptions, render_chart};
pub use login::{AuthState, Credentials, Session};
pub use product::{Product, ProductId};
pub use summary::{Summary, summarize};
pub use wishlist::Wishlist;
