use crate::aggregate::engagement::{engagement_by_entity, engagement_summary};
use crate::aggregate::sentiment::{
    aggregate, sentiment_totals, EntityField, Grouping, MentionFilter, SentimentAggregate,
};
use crate::error::ReportError;
use crate::report::sources::{
    SourceSet, COMBINED_SOURCES, ENGAGEMENT_SOURCES, NEWS_SHEET, SOCIAL_SHEETS,
};
use crate::sources::records::{engagement_from_sheet, mentions_from_sheet};
use crate::sources::{Mention, Sheet};
use common::model::dataset::{Dataset, DatasetKind, ReportBundle, Series};
use common::model::engagement::EngagementSummary;
use common::model::sentiment::{GroupedTally, Sentiment, SentimentTally};
use common::requests::ReportParameters;
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct AssemblerOptions {
    /// Authors kept on each `top_authors_*` slide.
    pub top_authors: usize,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self { top_authors: 10 }
    }
}

/// Mentions of one sheet of the combined sources workbook.
struct MentionSource {
    name: &'static str,
    mentions: Vec<Mention>,
}

/// Knows which datasets a report needs and in which shape. Styling is left
/// entirely to the renderer.
pub struct ReportDatasetAssembler<'a> {
    params: &'a ReportParameters,
    options: AssemblerOptions,
}

impl<'a> ReportDatasetAssembler<'a> {
    pub fn new(params: &'a ReportParameters, options: AssemblerOptions) -> Self {
        Self { params, options }
    }

    fn company_filter(&self) -> MentionFilter<'a> {
        MentionFilter::all()
            .company(&self.params.company_name)
            .between(self.params.start_date, self.params.end_date)
    }

    fn market_filter(&self) -> MentionFilter<'a> {
        MentionFilter::all().between(self.params.start_date, self.params.end_date)
    }

    pub fn assemble(&self, sources: &SourceSet) -> Result<ReportBundle, ReportError> {
        debug!(
            "Assembling from sources [{}]",
            sources.names().collect::<Vec<_>>().join(", ")
        );
        let combined = sources.require(COMBINED_SOURCES)?;
        let news = MentionSource {
            name: NEWS_SHEET,
            mentions: load_mentions(combined.require_sheet(NEWS_SHEET)?)?,
        };
        let mut social = Vec::new();
        for name in SOCIAL_SHEETS {
            match combined.sheet(name) {
                Some(sheet) => social.push(MentionSource {
                    name,
                    mentions: load_mentions(sheet)?,
                }),
                None => debug!("No '{}' sheet in {}", name, COMBINED_SOURCES),
            }
        }

        let mut datasets = Vec::new();
        let all_sources: Vec<&MentionSource> = std::iter::once(&news).chain(social.iter()).collect();
        let company = self.company_filter();

        let everything = || all_sources.iter().flat_map(|s| s.mentions.iter());

        datasets.push(sentiment_dataset(
            "overall_sentiment",
            format!("Overall sentiment for {}", self.params.company_name),
            aggregate(everything(), &company, Grouping::None),
        ));

        let mut by_source = GroupedTally::new();
        for source in &all_sources {
            by_source.push(source.name.to_string(), sentiment_totals(&source.mentions, &company));
        }
        datasets.push(grouped_dataset(
            "sentiment_by_source",
            "Sentiment by source".to_string(),
            DatasetKind::CountByCategory,
            &by_source,
            |name| name.clone(),
        ));

        datasets.push(sentiment_dataset(
            "news_trend",
            "News mentions per day".to_string(),
            aggregate(&news.mentions, &company, Grouping::ByDay),
        ));

        if !social.is_empty() {
            datasets.push(sentiment_dataset(
                "social_trend",
                "Social media mentions per day".to_string(),
                aggregate(
                    social.iter().flat_map(|s| s.mentions.iter()),
                    &company,
                    Grouping::ByDay,
                ),
            ));
        }

        for source in &all_sources {
            let mut authors = aggregate(
                &source.mentions,
                &company,
                Grouping::ByEntity(EntityField::Author),
            );
            authors.truncate(self.options.top_authors);
            datasets.push(sentiment_dataset(
                &format!("top_authors_{}", source.name.to_lowercase()),
                format!("Top {} authors", source.name),
                authors,
            ));
        }

        if self.params.has_competitors {
            let market = self.market_filter();
            let by_company = Grouping::ByEntity(EntityField::Company);
            datasets.push(sentiment_dataset(
                "competitor_comparison",
                "Sentiment by company, all sources".to_string(),
                aggregate(everything(), &market, by_company),
            ));
            datasets.push(sentiment_dataset(
                "competitor_news_share",
                "Sentiment by company, news".to_string(),
                aggregate(&news.mentions, &market, by_company),
            ));
        }

        for source in ENGAGEMENT_SOURCES {
            let Some(workbook) = sources.get(source) else {
                debug!("Engagement source '{}' not uploaded", source);
                continue;
            };
            let Some(sheet) = workbook.first_sheet() else {
                warn!("Engagement source '{}' has no sheets, skipping", source);
                continue;
            };
            let records = engagement_from_sheet(sheet)?;
            let rows = if self.params.has_competitors {
                engagement_by_entity(&records)
            } else {
                vec![(
                    self.params.company_name.clone(),
                    engagement_summary(&records, Some(&self.params.company_name)),
                )]
            };
            datasets.push(engagement_dataset(
                &format!("engagement_{}", source),
                format!("Engagement on {}", source.replace('_', " ")),
                &rows,
            ));
        }

        info!(
            "Assembled {} datasets for '{}' ({} to {})",
            datasets.len(),
            self.params.company_name,
            self.params.start_date,
            self.params.end_date
        );

        Ok(ReportBundle {
            company_name: self.params.company_name.clone(),
            start_date: self.params.start_date,
            end_date: self.params.end_date,
            has_competitors: self.params.has_competitors,
            datasets,
        })
    }
}

fn load_mentions(sheet: &Sheet) -> Result<Vec<Mention>, ReportError> {
    let (mentions, report) = mentions_from_sheet(sheet)?;
    if report.skipped_rows > 0 {
        warn!(
            "Sheet '{}': skipped {} of {} rows without a company, date or sentiment",
            sheet.name, report.skipped_rows, report.total_rows
        );
    }
    Ok(mentions)
}

fn sentiment_series<'t, I>(tallies: I) -> Vec<Series>
where
    I: Iterator<Item = &'t SentimentTally> + Clone,
{
    Sentiment::ALL
        .iter()
        .map(|sentiment| {
            Series::new(
                sentiment.label(),
                tallies.clone().map(|t| t.get(*sentiment)).collect(),
            )
        })
        .collect()
}

fn totals_dataset(topic: &str, label: String, tally: &SentimentTally) -> Dataset {
    Dataset {
        topic: topic.to_string(),
        label,
        kind: DatasetKind::SentimentTotals,
        categories: Sentiment::ALL.iter().map(|s| s.label().to_string()).collect(),
        series: vec![Series::new(
            "Mentions",
            Sentiment::ALL.iter().map(|s| tally.get(*s)).collect(),
        )],
    }
}

/// Shapes an aggregate into its dataset kind: totals, a day series or a
/// ranked category list.
fn sentiment_dataset(topic: &str, label: String, result: SentimentAggregate) -> Dataset {
    debug!("Dataset '{}': {} mentions", topic, result.totals().total());
    match result {
        SentimentAggregate::Totals(tally) => totals_dataset(topic, label, &tally),
        SentimentAggregate::ByDay(grouped) => grouped_dataset(
            topic,
            label,
            DatasetKind::CountByDateBySentiment,
            &grouped,
            |day| day.format("%Y-%m-%d").to_string(),
        ),
        SentimentAggregate::ByEntity(grouped) => grouped_dataset(
            topic,
            label,
            DatasetKind::CountByCategory,
            &grouped,
            |name| name.clone(),
        ),
    }
}

fn grouped_dataset<K, F>(
    topic: &str,
    label: String,
    kind: DatasetKind,
    grouped: &GroupedTally<K>,
    category: F,
) -> Dataset
where
    F: Fn(&K) -> String,
{
    debug!("Dataset '{}': {} categories", topic, grouped.len());
    Dataset {
        topic: topic.to_string(),
        label,
        kind,
        categories: grouped.keys().map(category).collect(),
        series: sentiment_series(grouped.groups().iter().map(|g| &g.tally)),
    }
}

fn engagement_dataset(topic: &str, label: String, rows: &[(String, EngagementSummary)]) -> Dataset {
    Dataset {
        topic: topic.to_string(),
        label,
        kind: DatasetKind::EngagementTotals,
        categories: rows.iter().map(|(name, _)| name.clone()).collect(),
        series: EngagementSummary::METRICS
            .iter()
            .enumerate()
            .map(|(idx, metric)| {
                Series::new(*metric, rows.iter().map(|(_, s)| s.values()[idx]).collect())
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::workbook::{Cell, Workbook};
    use chrono::NaiveDate;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn mention_sheet(name: &str, rows: &[(&str, &str, f64, &str)]) -> Sheet {
        Sheet {
            name: name.to_string(),
            headers: ["Company", "Date", "Sentiment", "Author"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows: rows
                .iter()
                .map(|(c, d, s, a)| vec![text(c), text(d), Cell::Number(*s), text(a)])
                .collect(),
        }
    }

    fn engagement_sheet(rows: &[(&str, f64, f64, f64, f64)]) -> Sheet {
        Sheet {
            name: "Sheet1".to_string(),
            headers: ["author_name", "comment_count", "like_count", "share_count", "view_count"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows: rows
                .iter()
                .map(|(a, c, l, s, v)| {
                    vec![
                        text(a),
                        Cell::Number(*c),
                        Cell::Number(*l),
                        Cell::Number(*s),
                        Cell::Number(*v),
                    ]
                })
                .collect(),
        }
    }

    fn params(has_competitors: bool) -> ReportParameters {
        ReportParameters {
            company_name: "Acme".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            has_competitors,
        }
    }

    fn sources() -> SourceSet {
        let combined = Workbook::new(
            COMBINED_SOURCES,
            vec![
                mention_sheet(
                    "News",
                    &[
                        ("Acme", "2024-01-01", 1.0, "Daily"),
                        ("Acme", "2024-01-03", -1.0, "Herald"),
                        ("Acme", "2024-01-03", 1.0, "Daily"),
                        ("Rival", "2024-01-02", 0.0, "Daily"),
                        ("Rival", "2024-01-02", 1.0, "Daily"),
                        ("Rival", "2024-01-02", 1.0, "Daily"),
                        ("Rival", "2024-01-02", 1.0, "Daily"),
                        ("Acme", "2023-12-31", 1.0, "Daily"),
                    ],
                ),
                mention_sheet("Facebook", &[("Acme", "2024-01-05", 0.0, "Acme Page")]),
            ],
        );
        let facebook = Workbook::new(
            "official_facebook",
            vec![engagement_sheet(&[
                ("Acme", 5.0, 10.0, 1.0, 100.0),
                ("Acme", 3.0, 2.0, 0.0, 50.0),
                ("Rival", 1.0, 1.0, 1.0, 1.0),
            ])],
        );
        SourceSet::new(vec![combined, facebook])
    }

    #[test]
    fn single_company_report_layout() {
        let params = params(false);
        let bundle = ReportDatasetAssembler::new(&params, AssemblerOptions::default())
            .assemble(&sources())
            .unwrap();

        let topics: Vec<&str> = bundle.topics().collect();
        assert_eq!(
            topics,
            vec![
                "overall_sentiment",
                "sentiment_by_source",
                "news_trend",
                "social_trend",
                "top_authors_news",
                "top_authors_facebook",
                "engagement_official_facebook",
            ]
        );

        let overall = bundle.dataset("overall_sentiment").unwrap();
        assert_eq!(overall.categories, vec!["Positive", "Neutral", "Negative"]);
        assert_eq!(overall.series[0].values, vec![2, 1, 1]);

        let by_source = bundle.dataset("sentiment_by_source").unwrap();
        assert_eq!(by_source.categories, vec!["News", "Facebook"]);
        assert_eq!(by_source.value("Positive", "News"), Some(2));
        assert_eq!(by_source.value("Neutral", "Facebook"), Some(1));

        let trend = bundle.dataset("news_trend").unwrap();
        assert_eq!(trend.categories, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(trend.series("Negative").unwrap().values, vec![0, 0, 1]);

        let authors = bundle.dataset("top_authors_news").unwrap();
        assert_eq!(authors.categories, vec!["Daily", "Herald"]);

        let engagement = bundle.dataset("engagement_official_facebook").unwrap();
        assert_eq!(engagement.categories, vec!["Acme"]);
        let values: Vec<u64> = engagement.series.iter().map(|s| s.values[0]).collect();
        assert_eq!(values, vec![2, 8, 12, 1, 150]);
    }

    #[test]
    fn competitor_mode_adds_comparisons() {
        let params = params(true);
        let bundle = ReportDatasetAssembler::new(&params, AssemblerOptions::default())
            .assemble(&sources())
            .unwrap();

        let comparison = bundle.dataset("competitor_comparison").unwrap();
        assert_eq!(comparison.categories, vec!["Acme", "Rival"]);
        let news_share = bundle.dataset("competitor_news_share").unwrap();
        assert_eq!(news_share.categories, vec!["Rival", "Acme"]);

        let engagement = bundle.dataset("engagement_official_facebook").unwrap();
        assert_eq!(engagement.categories, vec!["Acme", "Rival"]);
    }

    #[test]
    fn top_authors_are_truncated() {
        let params = params(false);
        let options = AssemblerOptions { top_authors: 1 };
        let bundle = ReportDatasetAssembler::new(&params, options)
            .assemble(&sources())
            .unwrap();
        assert_eq!(bundle.dataset("top_authors_news").unwrap().categories, vec!["Daily"]);
    }

    #[test]
    fn missing_combined_sources_is_reported() {
        let params = params(false);
        let err = ReportDatasetAssembler::new(&params, AssemblerOptions::default())
            .assemble(&SourceSet::new(vec![]))
            .unwrap_err();
        assert!(matches!(err, ReportError::MissingDataSource(ref s) if s == COMBINED_SOURCES));
    }

    #[test]
    fn missing_news_sheet_is_reported() {
        let params = params(false);
        let combined = Workbook::new(
            COMBINED_SOURCES,
            vec![mention_sheet("Facebook", &[("Acme", "2024-01-05", 0.0, "x")])],
        );
        let err = ReportDatasetAssembler::new(&params, AssemblerOptions::default())
            .assemble(&SourceSet::new(vec![combined]))
            .unwrap_err();
        assert!(matches!(err, ReportError::MissingSheet { ref sheet, .. } if sheet == NEWS_SHEET));
    }

    #[test]
    fn company_without_mentions_gets_zero_datasets() {
        let mut params = params(false);
        params.company_name = "Nobody".to_string();
        let bundle = ReportDatasetAssembler::new(&params, AssemblerOptions::default())
            .assemble(&sources())
            .unwrap();

        let overall = bundle.dataset("overall_sentiment").unwrap();
        assert_eq!(overall.series[0].values, vec![0, 0, 0]);
        assert!(bundle.dataset("news_trend").unwrap().categories.is_empty());
        let engagement = bundle.dataset("engagement_official_facebook").unwrap();
        assert!(engagement.is_empty());
    }
}
