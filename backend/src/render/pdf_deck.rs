use crate::render::chart::{bar_chart, series_color};
use crate::render::raster::{dpi_for, embed_rgb, embed_upload};
use crate::render::{DeckStyle, HighlightedPost, PresentationRenderer, RenderAssets, RenderError};
use common::model::dataset::{Dataset, DatasetKind, ReportBundle};
use genpdf::elements::{
    Break, FrameCellDecorator, Image as PdfImage, LinearLayout, PageBreak, Paragraph, TableLayout,
};
use genpdf::style::{Color, Style, StyledString};
use genpdf::{Alignment, Document, Element, Size};
use log::{debug, warn};
use plotters::style::RGBColor;
use tempfile::NamedTempFile;

/// Share of the content width given to the chart; the table gets the rest.
const CHART_COLUMNS: usize = 3;
const TABLE_COLUMNS: usize = 2;

/// Renders a report as a landscape PDF, one page per slide.
pub struct PdfDeckRenderer {
    style: DeckStyle,
}

impl PdfDeckRenderer {
    pub fn new(style: DeckStyle) -> Self {
        Self { style }
    }

    fn configure_document(&self, bundle: &ReportBundle) -> Result<Document, RenderError> {
        let fonts = genpdf::fonts::from_files(&self.style.fonts_dir, &self.style.font_family, None)?;
        let mut doc = Document::new(fonts);
        doc.set_title(format!("{} - {}", self.style.title, bundle.company_name));
        doc.set_paper_size(Size::new(self.style.slide_width_mm, self.style.slide_height_mm));
        doc.set_font_size(self.style.body_font_size);
        doc.set_line_spacing(1.1);

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(self.style.margin_mm);
        let footer_size = self.style.table_font_size;
        decorator.set_header(move |page| {
            Paragraph::new(StyledString::new(
                page.to_string(),
                Style::new().with_font_size(footer_size),
            ))
            .aligned(Alignment::Right)
        });
        doc.set_page_decorator(decorator);
        Ok(doc)
    }
}

impl PresentationRenderer for PdfDeckRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn file_name(&self) -> &'static str {
        "report.pdf"
    }

    fn render(&self, bundle: ReportBundle, assets: &RenderAssets) -> Result<Vec<u8>, RenderError> {
        let doc = self.configure_document(&bundle)?;
        let mut deck = DeckBuilder {
            style: &self.style,
            doc,
            temp_files: Vec::new(),
            slides: 0,
        };

        deck.cover(&bundle, assets)?;
        for dataset in &bundle.datasets {
            deck.dataset_slide(dataset)?;
        }
        if bundle.has_competitors && !assets.competitor_logos.is_empty() {
            deck.logo_slide("Competitors", &assets.competitor_logos)?;
        }
        deck.posts_slide("Positive highlights", &assets.positive_posts)?;
        deck.posts_slide("Negative highlights", &assets.negative_posts)?;

        debug!("Rendering {} slides for '{}'", deck.slides, bundle.company_name);
        deck.finish()
    }
}

/// Accumulates slides into one document. Temp files backing embedded images
/// are kept until the document is rendered.
struct DeckBuilder<'s> {
    style: &'s DeckStyle,
    doc: Document,
    temp_files: Vec<NamedTempFile>,
    slides: usize,
}

impl DeckBuilder<'_> {
    fn content_width_mm(&self) -> f64 {
        self.style.slide_width_mm - 2.0 * self.style.margin_mm
    }

    fn content_height_mm(&self) -> f64 {
        self.style.slide_height_mm - 2.0 * self.style.margin_mm
    }

    fn title_style(&self) -> Style {
        Style::new().bold().with_font_size(self.style.title_font_size)
    }

    fn new_slide(&mut self, title: &str) {
        if self.slides > 0 {
            self.doc.push(PageBreak::new());
        }
        self.slides += 1;
        self.doc.push(Paragraph::new(StyledString::new(title, self.title_style())));
        self.doc.push(Break::new(0.5));
    }

    /// Decodes and embeds an upload. Unreadable images are logged and left out.
    fn upload(&mut self, bytes: &[u8], max_w_mm: f64, max_h_mm: f64) -> Result<Option<PdfImage>, RenderError> {
        match embed_upload(bytes, max_w_mm, max_h_mm, &mut self.temp_files) {
            Ok(img) => Ok(Some(img.with_alignment(Alignment::Center))),
            Err(RenderError::Image(e)) => {
                warn!("Skipping unreadable image upload: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn image_row(&mut self, images: &[Vec<u8>], max_h_mm: f64) -> Result<(), RenderError> {
        if images.is_empty() {
            return Ok(());
        }
        let cell_w = self.content_width_mm() / images.len() as f64;
        let mut table = TableLayout::new(vec![1; images.len()]);
        let mut row = table.row();
        for bytes in images {
            match self.upload(bytes, cell_w * 0.9, max_h_mm)? {
                Some(img) => row.push_element(img),
                None => row.push_element(Paragraph::new("")),
            }
        }
        row.push()?;
        self.doc.push(table);
        Ok(())
    }

    fn cover(&mut self, bundle: &ReportBundle, assets: &RenderAssets) -> Result<(), RenderError> {
        self.slides += 1;
        if let Some(logo) = &assets.company_logo {
            if let Some(img) = self.upload(logo, self.content_width_mm() / 3.0, 35.0)? {
                self.doc.push(img);
            }
        }
        self.doc.push(Break::new(1.0));
        self.doc.push(
            Paragraph::new(StyledString::new(self.style.title.clone(), self.title_style()))
                .aligned(Alignment::Center),
        );
        self.doc.push(
            Paragraph::new(StyledString::new(
                bundle.company_name.clone(),
                Style::new().bold().with_font_size(self.style.body_font_size + 4),
            ))
            .aligned(Alignment::Center),
        );
        self.doc
            .push(Paragraph::new(period_line(bundle)).aligned(Alignment::Center));
        self.doc.push(Break::new(1.5));
        self.image_row(&assets.agency_logos, 20.0)
    }

    fn dataset_slide(&mut self, dataset: &Dataset) -> Result<(), RenderError> {
        self.new_slide(&dataset.label);
        if dataset.is_empty() {
            self.doc
                .push(Paragraph::new("No data for the selected period.").aligned(Alignment::Center));
            return Ok(());
        }

        let chart_w_mm = self.content_width_mm() * CHART_COLUMNS as f64
            / (CHART_COLUMNS + TABLE_COLUMNS) as f64
            - 2.0;
        let chart = bar_chart(dataset, self.style.chart_width_px, self.style.chart_height_px)?;
        let chart = embed_rgb(&chart, dpi_for(self.style.chart_width_px, chart_w_mm), &mut self.temp_files)?;

        let mut side = LinearLayout::vertical();
        side.push(legend(dataset));
        side.push(Break::new(0.5));
        if dataset.categories.len() <= self.style.max_table_rows {
            side.push(self.data_table(dataset)?);
        } else {
            side.push(Paragraph::new(summary_line(dataset)));
        }

        let mut layout = TableLayout::new(vec![CHART_COLUMNS, TABLE_COLUMNS]);
        layout.row().element(chart).element(side.padded(2)).push()?;
        self.doc.push(layout);
        Ok(())
    }

    fn data_table(&self, dataset: &Dataset) -> Result<TableLayout, RenderError> {
        let small = Style::new().with_font_size(self.style.table_font_size);
        let mut weights = vec![2];
        weights.extend(std::iter::repeat(1).take(dataset.series.len()));
        let mut table = TableLayout::new(weights);
        table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

        let mut header = table.row();
        header.push_element(Paragraph::new(StyledString::new("", small)));
        for (idx, series) in dataset.series.iter().enumerate() {
            let color = series_color(&series.name, idx);
            header.push_element(Paragraph::new(StyledString::new(
                series.name.clone(),
                small.bold().with_color(pdf_color(color)),
            )));
        }
        header.push()?;

        for (idx, category) in dataset.categories.iter().enumerate() {
            let mut row = table.row();
            row.push_element(Paragraph::new(StyledString::new(category.clone(), small)));
            for series in &dataset.series {
                let value = series.values.get(idx).copied().unwrap_or(0);
                row.push_element(
                    Paragraph::new(StyledString::new(value.to_string(), small)).aligned(Alignment::Right),
                );
            }
            row.push()?;
        }
        Ok(table)
    }

    fn logo_slide(&mut self, title: &str, logos: &[Vec<u8>]) -> Result<(), RenderError> {
        self.new_slide(title);
        let max_h = self.content_height_mm() / 3.0;
        self.image_row(logos, max_h)
    }

    fn posts_slide(&mut self, title: &str, posts: &[HighlightedPost]) -> Result<(), RenderError> {
        if posts.is_empty() {
            return Ok(());
        }
        self.new_slide(title);
        let cell_w = self.content_width_mm() / posts.len() as f64;
        let max_h = self.content_height_mm() - 30.0;
        let link_style = Style::new()
            .italic()
            .with_font_size(self.style.table_font_size)
            .with_color(Color::Rgb(31, 119, 180));

        let mut table = TableLayout::new(vec![1; posts.len()]);
        let mut row = table.row();
        for post in posts {
            let mut cell = LinearLayout::vertical();
            if let Some(img) = self.upload(&post.image, cell_w * 0.9, max_h)? {
                cell.push(img);
            }
            if let Some(link) = &post.link {
                cell.push(Paragraph::new(StyledString::new(link.clone(), link_style)).aligned(Alignment::Center));
            }
            row.push_element(cell.padded(1));
        }
        row.push()?;
        self.doc.push(table);
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, RenderError> {
        let mut out = Vec::new();
        self.doc.render(&mut out)?;
        drop(self.temp_files);
        Ok(out)
    }
}

fn period_line(bundle: &ReportBundle) -> String {
    format!(
        "{} to {}",
        bundle.start_date.format("%d/%m/%Y"),
        bundle.end_date.format("%d/%m/%Y")
    )
}

fn legend(dataset: &Dataset) -> Paragraph {
    let mut p = Paragraph::new("");
    for (idx, series) in dataset.series.iter().enumerate() {
        let color = series_color(&series.name, idx);
        if idx > 0 {
            p.push("   ");
        }
        p.push(StyledString::new(
            series.name.clone(),
            Style::new().bold().with_color(pdf_color(color)),
        ));
    }
    p
}

fn pdf_color(color: RGBColor) -> Color {
    Color::Rgb(color.0, color.1, color.2)
}

/// One-line totals for datasets with too many categories for a table.
fn summary_line(dataset: &Dataset) -> String {
    let totals: Vec<String> = dataset
        .series
        .iter()
        .map(|s| format!("{}: {}", s.name, s.values.iter().sum::<u64>()))
        .collect();
    let unit = match dataset.kind {
        DatasetKind::CountByDateBySentiment => "days",
        _ => "entries",
    };
    format!("{} {}. {}", dataset.categories.len(), unit, totals.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::model::dataset::Series;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::path::PathBuf;

    fn bundled_fonts() -> DeckStyle {
        DeckStyle {
            fonts_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/fonts")),
            ..DeckStyle::default()
        }
    }

    fn png(w: u32, h: u32, color: [u8; 3]) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(color)))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn dataset(topic: &str, kind: DatasetKind, categories: Vec<String>, series: Vec<Series>) -> Dataset {
        Dataset {
            topic: topic.to_string(),
            label: topic.replace('_', " "),
            kind,
            categories,
            series,
        }
    }

    fn bundle() -> ReportBundle {
        ReportBundle {
            company_name: "Acme".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            has_competitors: false,
            datasets: vec![],
        }
    }

    #[test]
    fn period_is_printed_day_first() {
        assert_eq!(period_line(&bundle()), "01/01/2024 to 31/01/2024");
    }

    #[test]
    fn summary_sums_each_series() {
        let dataset = Dataset {
            topic: "news_trend".to_string(),
            label: "News mentions per day".to_string(),
            kind: DatasetKind::CountByDateBySentiment,
            categories: vec!["2024-01-01".to_string(), "2024-01-02".to_string()],
            series: vec![Series::new("Positive", vec![1, 2]), Series::new("Negative", vec![0, 4])],
        };
        assert_eq!(summary_line(&dataset), "2 days. Positive: 3, Negative: 4");
    }

    #[test]
    fn renders_a_full_deck() {
        let days: Vec<String> = (1..=20).map(|d| format!("2024-01-{:02}", d)).collect();
        let mut report = bundle();
        report.has_competitors = true;
        report.datasets = vec![
            dataset(
                "overall_sentiment",
                DatasetKind::SentimentTotals,
                vec!["Positive".into(), "Neutral".into(), "Negative".into()],
                vec![Series::new("Mentions", vec![12, 5, 3])],
            ),
            dataset(
                "competitor_comparison",
                DatasetKind::CountByCategory,
                vec!["Acme".into(), "Rival".into()],
                vec![
                    Series::new("Positive", vec![9, 4]),
                    Series::new("Neutral", vec![2, 1]),
                    Series::new("Negative", vec![1, 6]),
                ],
            ),
            dataset(
                "news_trend",
                DatasetKind::CountByDateBySentiment,
                days.clone(),
                vec![Series::new("Positive", (0..20).collect())],
            ),
            dataset("social_trend", DatasetKind::CountByDateBySentiment, vec![], vec![]),
            dataset(
                "engagement_official_facebook",
                DatasetKind::EngagementTotals,
                vec!["Acme".into()],
                vec![Series::new("Posts", vec![2]), Series::new("Views", vec![150])],
            ),
        ];
        let assets = RenderAssets {
            company_logo: Some(png(300, 120, [20, 40, 200])),
            agency_logos: vec![png(80, 40, [0, 0, 0]), b"not an image".to_vec()],
            competitor_logos: vec![png(60, 60, [200, 0, 0]), png(120, 40, [0, 200, 0])],
            positive_posts: vec![HighlightedPost {
                image: png(400, 300, [240, 240, 240]),
                link: Some("https://example.com/post/1".to_string()),
            }],
            negative_posts: vec![
                HighlightedPost {
                    image: png(300, 400, [10, 10, 10]),
                    link: None,
                },
                HighlightedPost {
                    image: vec![0, 1, 2, 3],
                    link: Some("https://example.com/post/2".to_string()),
                },
            ],
        };

        let pdf = PdfDeckRenderer::new(bundled_fonts()).render(report, &assets).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn deck_without_assets_still_renders() {
        let mut report = bundle();
        report.datasets = vec![dataset(
            "overall_sentiment",
            DatasetKind::SentimentTotals,
            vec!["Positive".into(), "Neutral".into(), "Negative".into()],
            vec![Series::new("Mentions", vec![0, 0, 0])],
        )];
        let pdf = PdfDeckRenderer::new(bundled_fonts())
            .render(report, &RenderAssets::default())
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn missing_fonts_fail_the_render() {
        let style = DeckStyle {
            fonts_dir: std::env::temp_dir().join("no-such-font-dir"),
            ..DeckStyle::default()
        };
        let renderer = PdfDeckRenderer::new(style);
        let err = renderer.render(bundle(), &RenderAssets::default()).unwrap_err();
        assert!(matches!(err, RenderError::Pdf(_)));
        assert_eq!(renderer.content_type(), "application/pdf");
        assert_eq!(renderer.file_name(), "report.pdf");
    }
}
