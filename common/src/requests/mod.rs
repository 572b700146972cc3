use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Scalar parameters of a report request, sent as form fields next to the
/// uploaded workbooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportParameters {
    pub company_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Switches the report between single-company and competitor comparison.
    #[serde(default)]
    pub has_competitors: bool,
}

impl ReportParameters {
    /// Inclusive on both ends.
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}
