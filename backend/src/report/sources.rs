use crate::error::ReportError;
use crate::sources::Workbook;

/// Workbook holding the mention sheets. Required for every report.
pub const COMBINED_SOURCES: &str = "combined_sources";

pub const NEWS_SHEET: &str = "News";

/// Optional social sheets of [`COMBINED_SOURCES`], in slide order.
pub const SOCIAL_SHEETS: [&str; 4] = ["Facebook", "Instagram", "Linkedin", "Twitter"];

/// Optional engagement workbooks, in slide order.
pub const ENGAGEMENT_SOURCES: [&str; 3] = ["official_facebook", "official_instagram", "facebook_reachs"];

/// Uploaded workbooks keyed by their source name (the file stem).
#[derive(Debug, Default)]
pub struct SourceSet {
    workbooks: Vec<Workbook>,
}

impl SourceSet {
    pub fn new(workbooks: Vec<Workbook>) -> Self {
        Self { workbooks }
    }

    /// Exact name first, then a case-insensitive match.
    pub fn get(&self, source: &str) -> Option<&Workbook> {
        self.workbooks
            .iter()
            .find(|w| w.source == source)
            .or_else(|| self.workbooks.iter().find(|w| w.source.eq_ignore_ascii_case(source)))
    }

    pub fn require(&self, source: &str) -> Result<&Workbook, ReportError> {
        self.get(source)
            .ok_or_else(|| ReportError::MissingDataSource(source.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.workbooks.iter().map(|w| w.source.as_str())
    }
}
