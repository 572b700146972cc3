use serde::{Deserialize, Serialize};

/// Engagement totals for one entity over its posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementSummary {
    pub posts: u64,
    pub comments: u64,
    pub likes: u64,
    pub shares: u64,
    pub views: u64,
}

impl EngagementSummary {
    /// Series names, aligned with [`EngagementSummary::values`].
    pub const METRICS: [&'static str; 5] = ["Posts", "Comments", "Likes", "Shares", "Views"];

    pub fn values(&self) -> [u64; 5] {
        [self.posts, self.comments, self.likes, self.shares, self.views]
    }

    /// Counts one more post. Sums saturate at `u64::MAX`.
    pub fn add_post(&mut self, comments: u64, likes: u64, shares: u64, views: u64) {
        self.posts = self.posts.saturating_add(1);
        self.comments = self.comments.saturating_add(comments);
        self.likes = self.likes.saturating_add(likes);
        self.shares = self.shares.saturating_add(shares);
        self.views = self.views.saturating_add(views);
    }
}
