use crate::render::RenderError;
use common::model::dataset::{Dataset, DatasetKind};
use common::model::sentiment::Sentiment;
use image::RgbImage;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::sync::OnceLock;

/// Font family name the chart labels are drawn with.
const CHART_FONT: &str = "sans-serif";
static CHART_FONT_BYTES: &[u8] = include_bytes!("../../fonts/DejaVuSans-Regular.ttf");

/// Colours for series that are not sentiment classes (engagement metrics).
pub const PALETTE: [RGBColor; 5] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(148, 103, 189),
    RGBColor(23, 190, 207),
    RGBColor(188, 189, 34),
];

pub fn sentiment_color(sentiment: Sentiment) -> RGBColor {
    match sentiment {
        Sentiment::Positive => RGBColor(46, 160, 67),
        Sentiment::Neutral => RGBColor(140, 150, 165),
        Sentiment::Negative => RGBColor(214, 39, 40),
    }
}

/// Sentiment colour when `name` is a sentiment label, palette colour otherwise.
pub fn series_color(name: &str, index: usize) -> RGBColor {
    Sentiment::ALL
        .iter()
        .find(|s| s.label() == name)
        .map(|s| sentiment_color(*s))
        .unwrap_or(PALETTE[index % PALETTE.len()])
}

/// Share of a category slot covered by its cluster of bars.
const CLUSTER_FILL: f64 = 0.8;
/// Upper bound for category labels on the x axis; longer axes label every
/// n-th category.
const MAX_X_LABELS: usize = 12;
const MAX_LABEL_CHARS: usize = 16;

/// Draws `dataset` as a clustered bar chart: one cluster per category, one
/// bar per series, category names under the x axis and counts on the y axis.
/// A sentiment-totals dataset colours each bar by its class.
pub fn bar_chart(dataset: &Dataset, width: u32, height: u32) -> Result<RgbImage, RenderError> {
    register_chart_font()?;

    let categories = dataset.categories.len();
    let series = dataset.series.len().max(1);
    let y_top = (dataset.max_value() as f64 * 1.1).max(1.0);
    let font_px = (height / 36).clamp(11, 20);

    let mut buffer = vec![255u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(font_px)
            .x_label_area_size(font_px * 3)
            .y_label_area_size(font_px * 4)
            .build_cartesian_2d(-0.5f64..(categories.max(1) as f64 - 0.5), 0f64..y_top)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(categories.clamp(1, MAX_X_LABELS))
            .x_label_formatter(&|x| category_label(&dataset.categories, *x))
            .y_labels(6)
            .y_label_formatter(&|y| format!("{:.0}", y))
            .label_style((CHART_FONT, f64::from(font_px)))
            .draw()
            .map_err(chart_error)?;

        let bar_w = CLUSTER_FILL / series as f64;
        let bars = dataset.series.iter().enumerate().flat_map(|(s_idx, s)| {
            s.values
                .iter()
                .enumerate()
                .take(categories)
                .filter(|(_, value)| **value > 0)
                .map(move |(category, value)| {
                    let color = if dataset.kind == DatasetKind::SentimentTotals {
                        Sentiment::ALL
                            .get(category)
                            .map(|c| sentiment_color(*c))
                            .unwrap_or(PALETTE[0])
                    } else {
                        series_color(&s.name, s_idx)
                    };
                    let x0 = category as f64 - CLUSTER_FILL / 2.0 + s_idx as f64 * bar_w;
                    Rectangle::new([(x0, 0.0), (x0 + bar_w, *value as f64)], color.filled())
                })
        });
        chart.draw_series(bars).map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }

    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| RenderError::Chart("chart buffer does not match its size".to_string()))
}

/// Axis label for a key point: the category name when the point sits on a
/// category, nothing in between.
fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    match categories.get(idx as usize) {
        Some(name) if name.chars().count() > MAX_LABEL_CHARS => {
            let short: String = name.chars().take(MAX_LABEL_CHARS - 1).collect();
            format!("{}…", short)
        }
        Some(name) => name.clone(),
        None => String::new(),
    }
}

fn register_chart_font() -> Result<(), RenderError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let registered = *REGISTERED
        .get_or_init(|| register_font(CHART_FONT, FontStyle::Normal, CHART_FONT_BYTES).is_ok());
    if registered {
        Ok(())
    } else {
        Err(RenderError::Chart("bundled chart font could not be loaded".to_string()))
    }
}

fn chart_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Chart(e.to_string())
}
