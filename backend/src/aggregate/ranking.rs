use common::model::sentiment::{GroupedTally, SentimentTally};
use std::collections::HashMap;
use std::hash::Hash;

/// Keys ordered by descending total volume. Ties keep first-seen order, so the
/// result is deterministic for a given input.
pub fn ranked_keys<K: Clone>(grouped: &GroupedTally<K>) -> Vec<K> {
    let mut order: Vec<(u64, &K)> = grouped
        .groups()
        .iter()
        .map(|g| (g.tally.total(), &g.key))
        .collect();
    order.sort_by(|a, b| b.0.cmp(&a.0));
    order.into_iter().map(|(_, key)| key.clone()).collect()
}

/// Reorders the groups themselves by [`ranked_keys`] order. Keys are expected
/// to be unique, as every grouping in this crate produces them.
pub fn rank<K>(grouped: GroupedTally<K>) -> GroupedTally<K>
where
    K: Clone + Eq + Hash,
{
    let order = ranked_keys(&grouped);
    let mut tallies: HashMap<K, SentimentTally> = grouped
        .into_groups()
        .into_iter()
        .map(|g| (g.key, g.tally))
        .collect();

    let mut ranked = GroupedTally::new();
    for key in order {
        if let Some(tally) = tallies.remove(&key) {
            ranked.push(key, tally);
        }
    }
    ranked
}

/// Same ordering rule for arbitrary `(key, value)` rows with a volume measure.
pub fn rank_by<T, F>(mut rows: Vec<T>, volume: F) -> Vec<T>
where
    F: Fn(&T) -> u64,
{
    rows.sort_by(|a, b| volume(b).cmp(&volume(a)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(positive: u64, neutral: u64, negative: u64) -> SentimentTally {
        SentimentTally {
            positive,
            neutral,
            negative,
        }
    }

    #[test]
    fn orders_by_descending_total() {
        let mut grouped = GroupedTally::new();
        grouped.push("B".to_string(), tally(1, 1, 0));
        grouped.push("A".to_string(), tally(3, 1, 1));
        grouped.push("C".to_string(), tally(0, 0, 4));

        assert_eq!(ranked_keys(&grouped), vec!["A", "C", "B"]);
        let ranked = rank(grouped);
        assert_eq!(ranked.keys().cloned().collect::<Vec<_>>(), vec!["A", "C", "B"]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let mut grouped = GroupedTally::new();
        grouped.push("first", tally(1, 0, 0));
        grouped.push("second", tally(0, 1, 0));
        grouped.push("third", tally(0, 0, 1));

        let once = ranked_keys(&grouped);
        assert_eq!(once, vec!["first", "second", "third"]);
        assert_eq!(ranked_keys(&grouped), once);
    }

    #[test]
    fn ranks_arbitrary_rows() {
        let rows = vec![("x", 1), ("y", 5), ("z", 1)];
        let ranked = rank_by(rows, |(_, v)| *v);
        assert_eq!(ranked, vec![("y", 5), ("x", 1), ("z", 1)]);
    }
}
