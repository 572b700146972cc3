use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Shape of a slide dataset, which also tells the renderer how to chart it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Categories are entities or sources, one series per sentiment class.
    CountByCategory,
    /// Categories are `YYYY-MM-DD` days, one series per sentiment class.
    CountByDateBySentiment,
    /// Categories are the three sentiment classes, a single series.
    SentimentTotals,
    /// Categories are entities, one series per engagement metric.
    EngagementTotals,
}

/// A named numeric series aligned with the categories of its dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<u64>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<u64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Data behind one slide: a topic key, a human label, the category axis and
/// the series drawn over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub topic: String,
    pub label: String,
    pub kind: DatasetKind,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl Dataset {
    pub fn series(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }

    /// Value of `series` at `category`, if both exist.
    pub fn value(&self, series: &str, category: &str) -> Option<u64> {
        let idx = self.categories.iter().position(|c| c == category)?;
        self.series(series)?.values.get(idx).copied()
    }

    /// True when there is nothing to chart: no categories or only zeros.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() || self.series.iter().all(|s| s.values.iter().all(|v| *v == 0))
    }

    pub fn max_value(&self) -> u64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Everything the renderer needs to know about the data of one report.
///
/// The bundle is built once per request and handed to the renderer by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBundle {
    pub company_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub has_competitors: bool,
    pub datasets: Vec<Dataset>,
}

impl ReportBundle {
    pub fn dataset(&self, topic: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.topic == topic)
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(|d| d.topic.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset {
            topic: "sentiment_by_source".to_string(),
            label: "Sentiment by source".to_string(),
            kind: DatasetKind::CountByCategory,
            categories: vec!["News".to_string(), "Facebook".to_string()],
            series: vec![
                Series::new("Positive", vec![4, 0]),
                Series::new("Negative", vec![1, 2]),
            ],
        }
    }

    #[test]
    fn looks_up_values_by_series_and_category() {
        let dataset = sample();
        assert_eq!(dataset.value("Negative", "Facebook"), Some(2));
        assert_eq!(dataset.value("Neutral", "Facebook"), None);
        assert_eq!(dataset.max_value(), 4);
        assert!(!dataset.is_empty());
    }

    #[test]
    fn zero_series_count_as_empty() {
        let mut dataset = sample();
        for series in &mut dataset.series {
            series.values = vec![0, 0];
        }
        assert!(dataset.is_empty());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&DatasetKind::CountByDateBySentiment).unwrap();
        assert_eq!(json, "\"count_by_date_by_sentiment\"");
    }
}
