use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::DashboardError;
use crate::filter::FilteredView;

/// Available chart types supported by the dashboard
///
/// Exactly one is shown at a time; the labels are the ones offered by the
/// chart picker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum ChartKind {
    /// Histogram of prices with a smoothed density overlay
    #[default]
    PriceHistogram,

    /// Box-and-whisker plot of ratings
    RatingBoxplot,

    /// Price against rating, one colour per category
    PriceRatingScatter,

    /// Share of products per category
    CategoryPie,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::PriceHistogram,
        ChartKind::RatingBoxplot,
        ChartKind::PriceRatingScatter,
        ChartKind::CategoryPie,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::PriceHistogram => "Bar Graph (Price)",
            ChartKind::RatingBoxplot => "Boxplot (Rating)",
            ChartKind::PriceRatingScatter => "Scatter Plot (Price vs Rating)",
            ChartKind::CategoryPie => "Pie Chart (Category Distribution)",
        }
    }

    /// Unknown labels select the default chart
    pub fn from_label(label: &str) -> ChartKind {
        ChartKind::ALL
            .into_iter()
            .find(|k| k.label() == label)
            .unwrap_or_default()
    }
}

impl From<String> for ChartKind {
    fn from(label: String) -> Self {
        ChartKind::from_label(&label)
    }
}

impl Serialize for ChartKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Configuration options for chart generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphOptions {
    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for GraphOptions {
    /// 640x480 pixel canvas
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// A rendered chart
#[derive(Clone, Debug, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub svg: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Five-number summary plus outliers, whiskers at 1.5 IQR
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScatterGroup {
    pub category: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PieSlice {
    pub category: String,
    pub count: usize,
    pub fraction: f64,
}

/// Numbers behind a chart, before any drawing happens
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ChartData {
    Histogram {
        bins: Vec<HistogramBin>,
        density: Vec<(f64, f64)>,
    },
    Boxplot(Option<BoxStats>),
    Scatter(Vec<ScatterGroup>),
    Pie(Vec<PieSlice>),
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Histogram { bins, .. } => bins.is_empty(),
            ChartData::Boxplot(stats) => stats.is_none(),
            ChartData::Scatter(groups) => groups.is_empty(),
            ChartData::Pie(slices) => slices.is_empty(),
        }
    }
}

// seaborn "Set2"
const SET2: [RGBColor; 8] = [
    RGBColor(102, 194, 165),
    RGBColor(252, 141, 98),
    RGBColor(141, 160, 203),
    RGBColor(231, 138, 195),
    RGBColor(166, 216, 84),
    RGBColor(255, 217, 47),
    RGBColor(229, 196, 148),
    RGBColor(179, 179, 179),
];

// matplotlib "tab10"
const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const SKY_BLUE_DARK: RGBColor = RGBColor(70, 130, 180);
const BOX_ORANGE: RGBColor = RGBColor(255, 165, 0);

const DENSITY_POINTS: usize = 200;

type DrawResult = Result<(), Box<dyn std::error::Error>>;
type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Renders the selected chart for a filtered view as SVG
///
/// # Arguments
/// * `view` - Products to visualise
/// * `kind` - Which of the four charts to draw
/// * `options` - Canvas size
///
/// # Returns
/// * `Result<Chart, DashboardError>` - The SVG document or a rendering error
///
/// An empty view renders a "No data" placeholder instead of failing.
///
/// # Examples
/// ```
/// use fashion_explorer::filter::FilteredView;
/// use fashion_explorer::graph::{render_chart, ChartKind, GraphOptions};
///
/// let chart = render_chart(&FilteredView::default(), ChartKind::CategoryPie, &GraphOptions::default()).unwrap();
/// assert!(chart.svg.contains("No data"));
/// ```
pub fn render_chart(
    view: &FilteredView,
    kind: ChartKind,
    options: &GraphOptions,
) -> Result<Chart, DashboardError> {
    let data = prepare_chart(view, kind);
    let mut svg = String::new();
    draw_chart(&mut svg, kind, &data, options)
        .map_err(|e| DashboardError::Chart(e.to_string()))?;
    Ok(Chart { kind, svg })
}

/// Computes the numbers a chart is drawn from
pub fn prepare_chart(view: &FilteredView, kind: ChartKind) -> ChartData {
    match kind {
        ChartKind::PriceHistogram => {
            let prices: Vec<f64> = view.iter().map(|p| p.price).collect();
            let bins = histogram_bins(&prices);
            let density = density_curve(&prices, &bins);
            ChartData::Histogram { bins, density }
        }
        ChartKind::RatingBoxplot => {
            let ratings: Vec<f64> = view.iter().map(|p| p.rating).collect();
            ChartData::Boxplot(box_stats(&ratings))
        }
        ChartKind::PriceRatingScatter => ChartData::Scatter(scatter_groups(view)),
        ChartKind::CategoryPie => ChartData::Pie(category_shares(view)),
    }
}

/// Equal-width bins, Sturges' rule for the bin count
///
/// All-equal values land in a single bin one unit wide centred on the value.
pub fn histogram_bins(values: &[f64]) -> Vec<HistogramBin> {
    let Some((min, max)) = min_max(values) else {
        return Vec::new();
    };
    if min == max {
        return vec![HistogramBin {
            start: min - 0.5,
            end: max + 0.5,
            count: values.len(),
        }];
    }

    let bin_count = (values.len() as f64).log2().ceil() as usize + 1;
    let width = (max - min) / bin_count as f64;
    let mut counts = vec![0usize; bin_count];
    for &v in values {
        let index = (((v - min) / width) as usize).min(bin_count - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bin_count { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

/// Gaussian kernel density over the histogram span, scaled to bin counts
///
/// Scott's rule bandwidth. Empty when there is no spread to estimate.
pub fn density_curve(values: &[f64], bins: &[HistogramBin]) -> Vec<(f64, f64)> {
    let n = values.len();
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Vec::new();
    };
    if n < 2 {
        return Vec::new();
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return Vec::new();
    }

    let bandwidth = std_dev * (n as f64).powf(-0.2);
    let bin_width = first.end - first.start;
    let (lo, hi) = (first.start, last.end);
    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * bandwidth * n as f64);

    (0..=DENSITY_POINTS)
        .map(|i| {
            let x = lo + (hi - lo) * i as f64 / DENSITY_POINTS as f64;
            let density: f64 = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm;
            (x, density * n as f64 * bin_width)
        })
        .collect()
}

/// Quartiles by linear interpolation, `None` for no values
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = quantile(&sorted, 0.25)?;
    let median = quantile(&sorted, 0.5)?;
    let q3 = quantile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let inside = || sorted.iter().copied().filter(|v| (low_fence..=high_fence).contains(v));
    let lower_whisker = inside().next().unwrap_or(q1);
    let upper_whisker = inside().last().unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| !(low_fence..=high_fence).contains(v))
        .collect();

    Some(BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}

/// Linear-interpolated quantile of sorted values
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64))
}

/// (price, rating) points grouped by category, first-appearance order
pub fn scatter_groups(view: &FilteredView) -> Vec<ScatterGroup> {
    let mut groups: Vec<ScatterGroup> = Vec::new();
    for product in view.iter() {
        let point = (product.price, product.rating);
        match groups.iter_mut().find(|g| g.category == product.category) {
            Some(group) => group.points.push(point),
            None => groups.push(ScatterGroup {
                category: product.category.clone(),
                points: vec![point],
            }),
        }
    }
    groups
}

/// Products per category, largest first; ties keep first-appearance order
pub fn category_shares(view: &FilteredView) -> Vec<PieSlice> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for product in view.iter() {
        match counts.iter_mut().find(|(c, _)| *c == product.category) {
            Some((_, n)) => *n += 1,
            None => counts.push((product.category.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total = view.len() as f64;
    counts
        .into_iter()
        .map(|(category, count)| PieSlice {
            category,
            count,
            fraction: count as f64 / total,
        })
        .collect()
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

// Axis range with some breathing room; never zero-width
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let values: Vec<f64> = values.collect();
    match min_max(&values) {
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
        Some((v, _)) => (v - 1.0, v + 1.0),
        None => (0.0, 1.0),
    }
}

fn draw_chart(
    svg: &mut String,
    kind: ChartKind,
    data: &ChartData,
    options: &GraphOptions,
) -> DrawResult {
    let root = SVGBackend::with_string(svg, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    match data {
        _ if data.is_empty() => draw_placeholder(&root, kind)?,
        ChartData::Histogram { bins, density } => draw_histogram(&root, kind, bins, density)?,
        ChartData::Boxplot(Some(stats)) => draw_boxplot(&root, kind, stats)?,
        ChartData::Scatter(groups) => draw_scatter(&root, kind, groups)?,
        ChartData::Pie(slices) => draw_pie(&root, kind, slices)?,
        ChartData::Boxplot(None) => draw_placeholder(&root, kind)?,
    }

    root.present()?;
    Ok(())
}

fn draw_placeholder(root: &Area, kind: ChartKind) -> DrawResult {
    let area = root.titled(kind.label(), ("sans-serif", 24))?;
    let (width, height) = area.dim_in_pixel();
    let style = TextStyle::from(("sans-serif", 20).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new("No data", (width as i32 / 2, height as i32 / 2), style))?;
    Ok(())
}

fn draw_histogram(
    root: &Area,
    kind: ChartKind,
    bins: &[HistogramBin],
    density: &[(f64, f64)],
) -> DrawResult {
    let x_min = bins.first().map_or(0.0, |b| b.start);
    let x_max = bins.last().map_or(1.0, |b| b.end);
    let peak = bins
        .iter()
        .map(|b| b.count as f64)
        .chain(density.iter().map(|&(_, y)| y))
        .fold(1.0, f64::max);

    let mut chart = ChartBuilder::on(root)
        .caption(kind.label(), ("sans-serif", 24).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, 0f64..peak * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Price")
        .y_desc("Count")
        .draw()?;

    chart.draw_series(bins.iter().map(|b| {
        Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], SKY_BLUE.mix(0.7).filled())
    }))?;
    chart.draw_series(bins.iter().map(|b| {
        Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], SKY_BLUE_DARK.stroke_width(1))
    }))?;

    if !density.is_empty() {
        chart.draw_series(LineSeries::new(
            density.iter().copied(),
            SKY_BLUE_DARK.stroke_width(2),
        ))?;
    }

    Ok(())
}

fn draw_boxplot(root: &Area, kind: ChartKind, stats: &BoxStats) -> DrawResult {
    let (x_min, x_max) = padded_range(
        [stats.lower_whisker, stats.upper_whisker]
            .into_iter()
            .chain(stats.outliers.iter().copied()),
    );

    let mut chart = ChartBuilder::on(root)
        .caption(kind.label(), ("sans-serif", 24).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(20)
        .build_cartesian_2d(x_min..x_max, 0f64..1f64)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(0)
        .x_desc("Rating")
        .draw()?;

    let (top, mid, bottom) = (0.7, 0.5, 0.3);
    chart.draw_series(std::iter::once(Rectangle::new(
        [(stats.q1, bottom), (stats.q3, top)],
        BOX_ORANGE.mix(0.8).filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(stats.q1, bottom), (stats.q3, top)],
        BLACK.stroke_width(1),
    )))?;

    let lines = vec![
        vec![(stats.median, bottom), (stats.median, top)],
        vec![(stats.lower_whisker, mid), (stats.q1, mid)],
        vec![(stats.q3, mid), (stats.upper_whisker, mid)],
        vec![(stats.lower_whisker, 0.4), (stats.lower_whisker, 0.6)],
        vec![(stats.upper_whisker, 0.4), (stats.upper_whisker, 0.6)],
    ];
    chart.draw_series(
        lines
            .into_iter()
            .map(|points| PathElement::new(points, BLACK.stroke_width(2))),
    )?;

    chart.draw_series(
        stats
            .outliers
            .iter()
            .map(|&v| Circle::new((v, mid), 4, BLACK.stroke_width(1))),
    )?;

    Ok(())
}

fn draw_scatter(root: &Area, kind: ChartKind, groups: &[ScatterGroup]) -> DrawResult {
    let points = || groups.iter().flat_map(|g| g.points.iter().copied());
    let (x_min, x_max) = padded_range(points().map(|(x, _)| x));
    let (y_min, y_max) = padded_range(points().map(|(_, y)| y));

    let mut chart = ChartBuilder::on(root)
        .caption(kind.label(), ("sans-serif", 24).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Price")
        .y_desc("Rating")
        .draw()?;

    for (i, group) in groups.iter().enumerate() {
        let color = SET2[i % SET2.len()];
        chart
            .draw_series(
                group
                    .points
                    .iter()
                    .map(move |&(x, y)| Circle::new((x, y), 6, color.filled())),
            )?
            .label(group.category.clone())
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_pie(root: &Area, kind: ChartKind, slices: &[PieSlice]) -> DrawResult {
    let area = root.titled(kind.label(), ("sans-serif", 24))?;
    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = width.min(height) as f64 * 0.35;
    let label_style =
        TextStyle::from(("sans-serif", 14).into_font()).pos(Pos::new(HPos::Center, VPos::Center));

    // Wedges start at 3 o'clock and run counter-clockwise
    let mut start = 0.0f64;
    for (i, slice) in slices.iter().enumerate() {
        let sweep = slice.fraction * 360.0;
        let steps = (sweep.ceil() as usize).max(1);
        let mut outline = vec![center];
        outline.extend((0..=steps).map(|s| {
            polar(center, radius, start + sweep * s as f64 / steps as f64)
        }));
        area.draw(&Polygon::new(outline, TAB10[i % TAB10.len()].filled()))?;

        let middle = start + sweep / 2.0;
        area.draw(&Text::new(
            format!("{:.1}%", slice.fraction * 100.0),
            polar(center, radius * 0.6, middle),
            label_style.clone(),
        ))?;
        area.draw(&Text::new(
            slice.category.clone(),
            polar(center, radius * 1.15, middle),
            label_style.clone(),
        ))?;

        start += sweep;
    }

    Ok(())
}

fn polar(center: (i32, i32), radius: f64, degrees: f64) -> (i32, i32) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    (
        center.0 + (radius * cos).round() as i32,
        center.1 - (radius * sin).round() as i32,
    )
}
