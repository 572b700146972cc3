use crate::aggregate::{ranking, same_entity};
use crate::sources::EngagementRecord;
use common::model::engagement::EngagementSummary;
use std::collections::HashMap;

/// Posts and metric sums over the records of `entity` (all records when
/// `None`). Empty input gives an all-zero summary.
pub fn engagement_summary<'r, I>(records: I, entity: Option<&str>) -> EngagementSummary
where
    I: IntoIterator<Item = &'r EngagementRecord>,
{
    let mut summary = EngagementSummary::default();
    for record in records
        .into_iter()
        .filter(|r| entity.map_or(true, |wanted| same_entity(&r.author_name, wanted)))
    {
        summary.add_post(
            record.comment_count,
            record.like_count,
            record.share_count,
            record.view_count,
        );
    }
    summary
}

/// One summary per author, ranked by post count (ties keep first-seen order).
pub fn engagement_by_entity<'r, I>(records: I) -> Vec<(String, EngagementSummary)>
where
    I: IntoIterator<Item = &'r EngagementRecord>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<(String, EngagementSummary)> = Vec::new();

    for record in records {
        let name = record.author_name.trim();
        let slot = *index.entry(name.to_lowercase()).or_insert_with(|| {
            rows.push((name.to_string(), EngagementSummary::default()));
            rows.len() - 1
        });
        rows[slot].1.add_post(
            record.comment_count,
            record.like_count,
            record.share_count,
            record.view_count,
        );
    }

    ranking::rank_by(rows, |(_, summary)| summary.posts)
}
