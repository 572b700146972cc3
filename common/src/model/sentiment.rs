use serde::{Deserialize, Serialize};

/// Sentiment class of a single mention.
///
/// The monitoring exports encode it as `1` / `0` / `-1`; some sheets carry the
/// label instead, so both forms are accepted by [`Sentiment::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Chart order used for every series built from a tally.
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn code(self) -> i8 {
        match self {
            Sentiment::Positive => 1,
            Sentiment::Neutral => 0,
            Sentiment::Negative => -1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Sentiment::Positive),
            0 => Some(Sentiment::Neutral),
            -1 => Some(Sentiment::Negative),
            _ => None,
        }
    }

    /// Parses either a numeric code (`"1"`, `"-1"`, `"0.0"`) or a label
    /// (`"Positive"`, `"negative"`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(value) = raw.parse::<f64>() {
            if value.fract() != 0.0 {
                return None;
            }
            return Self::from_code(value as i64);
        }
        match raw.to_ascii_lowercase().as_str() {
            "positive" | "pos" => Some(Sentiment::Positive),
            "neutral" | "neu" => Some(Sentiment::Neutral),
            "negative" | "neg" => Some(Sentiment::Negative),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }
}

/// Count of mentions per sentiment class.
///
/// Every class is a field, so a tally can never be missing a key: classes that
/// were not observed simply stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentTally {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

impl SentimentTally {
    pub fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive = self.positive.saturating_add(1),
            Sentiment::Neutral => self.neutral = self.neutral.saturating_add(1),
            Sentiment::Negative => self.negative = self.negative.saturating_add(1),
        }
    }

    pub fn get(&self, sentiment: Sentiment) -> u64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }

    pub fn total(&self) -> u64 {
        self.positive
            .saturating_add(self.neutral)
            .saturating_add(self.negative)
    }

    pub fn merge(&mut self, other: &SentimentTally) {
        self.positive = self.positive.saturating_add(other.positive);
        self.neutral = self.neutral.saturating_add(other.neutral);
        self.negative = self.negative.saturating_add(other.negative);
    }
}

impl FromIterator<Sentiment> for SentimentTally {
    fn from_iter<I: IntoIterator<Item = Sentiment>>(iter: I) -> Self {
        let mut tally = SentimentTally::default();
        for sentiment in iter {
            tally.record(sentiment);
        }
        tally
    }
}

/// One key of a [`GroupedTally`] together with its counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyGroup<K> {
    pub key: K,
    pub tally: SentimentTally,
}

/// Sentiment tallies keyed by day or by entity name, in chart order.
///
/// The order of the groups is meaningful: day groupings are chronological and
/// entity groupings are ranked by volume before they reach a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedTally<K> {
    groups: Vec<TallyGroup<K>>,
}

impl<K> Default for GroupedTally<K> {
    fn default() -> Self {
        Self { groups: Vec::new() }
    }
}

impl<K> GroupedTally<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: K, tally: SentimentTally) {
        self.groups.push(TallyGroup { key, tally });
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[TallyGroup<K>] {
        &self.groups
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn into_groups(self) -> Vec<TallyGroup<K>> {
        self.groups
    }

    /// Sum of every group. All-zero for an empty grouping.
    pub fn totals(&self) -> SentimentTally {
        let mut totals = SentimentTally::default();
        for group in &self.groups {
            totals.merge(&group.tally);
        }
        totals
    }

    pub fn truncate(&mut self, len: usize) {
        self.groups.truncate(len);
    }
}

impl<K: PartialEq> GroupedTally<K> {
    pub fn get(&self, key: &K) -> Option<&SentimentTally> {
        self.groups.iter().find(|g| &g.key == key).map(|g| &g.tally)
    }
}

impl<K> From<Vec<TallyGroup<K>>> for GroupedTally<K> {
    fn from(groups: Vec<TallyGroup<K>>) -> Self {
        Self { groups }
    }
}
