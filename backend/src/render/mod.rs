//! Presentation Renderer: turns a [`ReportBundle`] plus the uploaded images
//! into a downloadable deck.
//!
//! The renderer only decides how things look. Which slides exist, in which
//! order, and what numbers they carry is fixed by the bundle. The default
//! implementation, [`PdfDeckRenderer`], produces a landscape PDF with one
//! page per slide; the HTTP layer only sees the [`PresentationRenderer`]
//! trait so other formats can be plugged in.

pub mod chart;
pub mod pdf_deck;
pub mod raster;

use crate::config::AppConfig;
use common::model::dataset::ReportBundle;
use std::path::PathBuf;
use thiserror::Error;

pub use pdf_deck::PdfDeckRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF rendering failed: {0}")]
    Pdf(#[from] genpdf::error::Error),

    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("chart drawing failed: {0}")]
    Chart(String),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error("I/O error while rendering: {0}")]
    Io(#[from] std::io::Error),
}

/// A highlighted social post: a screenshot and, optionally, where it lives.
#[derive(Debug, Clone, Default)]
pub struct HighlightedPost {
    pub image: Vec<u8>,
    pub link: Option<String>,
}

/// Raw image uploads used for decoration. Every field may be empty.
#[derive(Debug, Clone, Default)]
pub struct RenderAssets {
    pub company_logo: Option<Vec<u8>>,
    /// Logos of the monitoring agencies shown on the cover.
    pub agency_logos: Vec<Vec<u8>>,
    pub competitor_logos: Vec<Vec<u8>>,
    pub positive_posts: Vec<HighlightedPost>,
    pub negative_posts: Vec<HighlightedPost>,
}

/// Look of a rendered deck.
#[derive(Debug, Clone)]
pub struct DeckStyle {
    pub title: String,
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub slide_width_mm: f64,
    pub slide_height_mm: f64,
    pub margin_mm: f64,
    pub title_font_size: u8,
    pub body_font_size: u8,
    pub table_font_size: u8,
    pub chart_width_px: u32,
    pub chart_height_px: u32,
    /// Category tables longer than this are replaced by a one-line summary.
    pub max_table_rows: usize,
}

impl Default for DeckStyle {
    fn default() -> Self {
        // 16:9 widescreen, 10in x 5.625in
        Self {
            title: "Media Monitoring Report".to_string(),
            fonts_dir: PathBuf::from("./fonts"),
            font_family: "DejaVuSans".to_string(),
            slide_width_mm: 254.0,
            slide_height_mm: 142.9,
            margin_mm: 10.0,
            title_font_size: 20,
            body_font_size: 11,
            table_font_size: 8,
            chart_width_px: 960,
            chart_height_px: 540,
            max_table_rows: 12,
        }
    }
}

impl DeckStyle {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            title: config.deck_title.clone(),
            fonts_dir: config.fonts_dir.clone(),
            font_family: config.font_family.clone(),
            chart_width_px: config.chart_width_px,
            chart_height_px: config.chart_height_px,
            ..Self::default()
        }
    }
}

pub trait PresentationRenderer: Send + Sync {
    /// MIME type of the rendered document.
    fn content_type(&self) -> &'static str;

    /// File name offered to the client for download.
    fn file_name(&self) -> &'static str;

    fn render(&self, bundle: ReportBundle, assets: &RenderAssets) -> Result<Vec<u8>, RenderError>;
}
