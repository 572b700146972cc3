use crate::aggregate::{ranking, same_entity};
use crate::sources::Mention;
use chrono::NaiveDate;
use common::model::sentiment::{GroupedTally, SentimentTally};
use std::collections::{BTreeMap, HashMap};

/// Which name a `by_entity` grouping keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityField {
    Company,
    Author,
}

impl EntityField {
    fn of(self, mention: &Mention) -> &str {
        match self {
            EntityField::Company => &mention.company,
            EntityField::Author => &mention.author,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    None,
    ByDay,
    ByEntity(EntityField),
}

/// Row selection applied before any counting: an optional company and an
/// optional inclusive day range.
#[derive(Debug, Clone, Copy, Default)]
pub struct MentionFilter<'a> {
    pub company: Option<&'a str>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl<'a> MentionFilter<'a> {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn company(mut self, company: &'a str) -> Self {
        self.company = Some(company);
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn matches(&self, mention: &Mention) -> bool {
        if let Some(company) = self.company {
            if !same_entity(&mention.company, company) {
                return false;
            }
        }
        if self.from.is_some_and(|from| mention.day < from) {
            return false;
        }
        if self.to.is_some_and(|to| mention.day > to) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentimentAggregate {
    Totals(SentimentTally),
    ByDay(GroupedTally<NaiveDate>),
    ByEntity(GroupedTally<String>),
}

impl SentimentAggregate {
    pub fn totals(&self) -> SentimentTally {
        match self {
            SentimentAggregate::Totals(tally) => *tally,
            SentimentAggregate::ByDay(grouped) => grouped.totals(),
            SentimentAggregate::ByEntity(grouped) => grouped.totals(),
        }
    }

    /// Keeps the first `len` groups. Totals have a single value and are left
    /// untouched.
    pub fn truncate(&mut self, len: usize) {
        match self {
            SentimentAggregate::Totals(_) => {}
            SentimentAggregate::ByDay(grouped) => grouped.truncate(len),
            SentimentAggregate::ByEntity(grouped) => grouped.truncate(len),
        }
    }
}

/// Single entry point over the three groupings.
pub fn aggregate<'m, I>(mentions: I, filter: &MentionFilter, grouping: Grouping) -> SentimentAggregate
where
    I: IntoIterator<Item = &'m Mention>,
{
    match grouping {
        Grouping::None => SentimentAggregate::Totals(sentiment_totals(mentions, filter)),
        Grouping::ByDay => SentimentAggregate::ByDay(sentiment_by_day(mentions, filter)),
        Grouping::ByEntity(field) => {
            SentimentAggregate::ByEntity(sentiment_by_entity(mentions, filter, field))
        }
    }
}

/// Tally over every matching mention; all-zero when nothing matches.
pub fn sentiment_totals<'m, I>(mentions: I, filter: &MentionFilter) -> SentimentTally
where
    I: IntoIterator<Item = &'m Mention>,
{
    mentions
        .into_iter()
        .filter(|m| filter.matches(m))
        .map(|m| m.sentiment)
        .collect()
}

/// Tallies per calendar day, ascending. Every day between the first and the
/// last observed day is present; days without mentions are all-zero.
pub fn sentiment_by_day<'m, I>(mentions: I, filter: &MentionFilter) -> GroupedTally<NaiveDate>
where
    I: IntoIterator<Item = &'m Mention>,
{
    let mut by_day: BTreeMap<NaiveDate, SentimentTally> = BTreeMap::new();
    for mention in mentions.into_iter().filter(|m| filter.matches(m)) {
        by_day.entry(mention.day).or_default().record(mention.sentiment);
    }

    let mut grouped = GroupedTally::new();
    let (Some(&first), Some(&last)) = (by_day.keys().next(), by_day.keys().next_back()) else {
        return grouped;
    };
    for day in first.iter_days().take_while(|day| *day <= last) {
        grouped.push(day, by_day.get(&day).copied().unwrap_or_default());
    }
    grouped
}

/// Tallies per entity, ranked by descending volume.
///
/// Names are grouped case-insensitively; each group keeps the spelling of its
/// first occurrence.
pub fn sentiment_by_entity<'m, I>(
    mentions: I,
    filter: &MentionFilter,
    field: EntityField,
) -> GroupedTally<String>
where
    I: IntoIterator<Item = &'m Mention>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, SentimentTally)> = Vec::new();

    for mention in mentions.into_iter().filter(|m| filter.matches(m)) {
        let name = field.of(mention).trim();
        let slot = *index.entry(name.to_lowercase()).or_insert_with(|| {
            groups.push((name.to_string(), SentimentTally::default()));
            groups.len() - 1
        });
        groups[slot].1.record(mention.sentiment);
    }

    let mut grouped = GroupedTally::new();
    for (name, tally) in groups {
        grouped.push(name, tally);
    }
    ranking::rank(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::sentiment::Sentiment;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn mention(company: &str, on: &str, code: i64, author: &str) -> Mention {
        Mention {
            company: company.to_string(),
            day: day(on),
            author: author.to_string(),
            sentiment: Sentiment::from_code(code).unwrap(),
            link: None,
        }
    }

    fn scenario() -> Vec<Mention> {
        vec![
            mention("A", "2024-01-01", 1, "site-1"),
            mention("A", "2024-01-01", -1, "site-2"),
            mention("B", "2024-01-02", 0, "site-1"),
        ]
    }

    #[test]
    fn by_day_for_one_company() {
        let rows = scenario();
        let grouped = sentiment_by_day(&rows, &MentionFilter::all().company("A"));

        assert_eq!(grouped.len(), 1);
        assert_eq!(
            grouped.get(&day("2024-01-01")),
            Some(&SentimentTally {
                positive: 1,
                neutral: 0,
                negative: 1
            })
        );
    }

    #[test]
    fn by_day_fills_gaps_in_the_observed_range() {
        let rows = vec![
            mention("A", "2024-01-01", 1, "x"),
            mention("A", "2024-01-04", 0, "x"),
        ];
        let grouped = sentiment_by_day(&rows, &MentionFilter::all());
        let keys: Vec<NaiveDate> = grouped.keys().copied().collect();
        assert_eq!(
            keys,
            vec![day("2024-01-01"), day("2024-01-02"), day("2024-01-03"), day("2024-01-04")]
        );
        assert_eq!(grouped.get(&day("2024-01-02")), Some(&SentimentTally::default()));
        assert_eq!(grouped.totals().total(), 2);
    }

    #[test]
    fn by_entity_ranks_most_active_first() {
        let mut rows = Vec::new();
        for _ in 0..2 {
            rows.push(mention("B", "2024-01-01", 0, "x"));
        }
        for code in [1, 1, -1, 0, 1] {
            rows.push(mention("A", "2024-01-02", code, "x"));
        }

        let grouped = sentiment_by_entity(&rows, &MentionFilter::all(), EntityField::Company);
        let keys: Vec<&String> = grouped.keys().collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(grouped.get(&"A".to_string()).map(|t| t.total()), Some(5));
    }

    #[test]
    fn by_entity_merges_case_variants() {
        let rows = vec![
            mention("Acme", "2024-01-01", 1, "x"),
            mention(" ACME ", "2024-01-01", -1, "x"),
        ];
        let grouped = sentiment_by_entity(&rows, &MentionFilter::all(), EntityField::Company);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.groups()[0].key, "Acme");
    }

    #[test]
    fn unknown_company_yields_zero_tally() {
        let rows = scenario();
        let filter = MentionFilter::all().company("Nobody");
        assert_eq!(sentiment_totals(&rows, &filter), SentimentTally::default());
        assert!(sentiment_by_day(&rows, &filter).is_empty());
        assert_eq!(
            aggregate(&rows, &filter, Grouping::ByEntity(EntityField::Author)).totals(),
            SentimentTally::default()
        );
    }

    #[test]
    fn truncating_keeps_the_top_entities() {
        let rows = vec![
            mention("A", "2024-01-01", 1, "p"),
            mention("B", "2024-01-01", 1, "q"),
            mention("B", "2024-01-02", 0, "q"),
        ];
        let mut result = aggregate(&rows, &MentionFilter::all(), Grouping::ByEntity(EntityField::Company));
        result.truncate(1);
        let SentimentAggregate::ByEntity(grouped) = result else {
            panic!("expected an entity grouping");
        };
        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["B"]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let rows = scenario();
        let filter = MentionFilter::all().between(day("2024-01-02"), day("2024-01-02"));
        assert_eq!(sentiment_totals(&rows, &filter).total(), 1);
    }

    #[test]
    fn every_grouping_sums_to_the_filtered_row_count() {
        let rows = vec![
            mention("A", "2024-01-01", 1, "p"),
            mention("A", "2024-01-03", -1, "q"),
            mention("B", "2024-01-02", 0, "p"),
            mention("a", "2024-01-05", 0, "r"),
            mention("C", "2024-01-05", 1, "q"),
        ];
        let filters = [
            MentionFilter::all(),
            MentionFilter::all().company("a"),
            MentionFilter::all().between(day("2024-01-02"), day("2024-01-04")),
        ];
        let groupings = [
            Grouping::None,
            Grouping::ByDay,
            Grouping::ByEntity(EntityField::Company),
            Grouping::ByEntity(EntityField::Author),
        ];

        for filter in &filters {
            let expected = rows.iter().filter(|m| filter.matches(m)).count() as u64;
            for grouping in groupings {
                let result = aggregate(&rows, filter, grouping);
                assert_eq!(result.totals().total(), expected, "{:?} / {:?}", filter, grouping);
            }
        }
    }

    #[test]
    fn every_observed_key_is_kept() {
        let rows = vec![
            mention("A", "2024-01-01", 1, "p"),
            mention("B", "2024-01-03", -1, "q"),
            mention("C", "2024-01-02", 0, "r"),
        ];
        let by_company = sentiment_by_entity(&rows, &MentionFilter::all(), EntityField::Company);
        for name in ["A", "B", "C"] {
            assert!(by_company.get(&name.to_string()).is_some(), "missing {}", name);
        }
        let by_day = sentiment_by_day(&rows, &MentionFilter::all());
        for m in &rows {
            assert!(by_day.get(&m.day).is_some());
        }
    }
}
