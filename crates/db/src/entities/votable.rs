//! Votable targets and their denormalized vote stats.
//!
//! Votes attach to either a story or a comment. Rather than a polymorphic
//! foreign key, the target is the sum type [`Votable`]; the `vote` table
//! stores its tag in `votable_type`.

use serde::{Deserialize, Serialize};

use super::vote::VotableKind;

/// Weight applied to each downvote when computing [`VotableStats::vote_score`].
pub const DOWNVOTE_PENALTY_WEIGHT: f64 = 1.1;

/// A story or comment that can receive votes.
///
/// Serializes as `{"type": "story", "id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Votable {
    /// A story, by story id.
    Story(String),
    /// A comment, by comment id.
    Comment(String),
}

impl Votable {
    /// Build a votable from its persisted tag and id.
    #[must_use]
    pub fn new(kind: VotableKind, id: impl Into<String>) -> Self {
        match kind {
            VotableKind::Story => Self::Story(id.into()),
            VotableKind::Comment => Self::Comment(id.into()),
        }
    }

    /// The persisted tag.
    #[must_use]
    pub const fn kind(&self) -> VotableKind {
        match self {
            Self::Story(_) => VotableKind::Story,
            Self::Comment(_) => VotableKind::Comment,
        }
    }

    /// The target's id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Story(id) | Self::Comment(id) => id,
        }
    }
}

impl std::fmt::Display for Votable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Story(id) => write!(f, "story:{id}"),
            Self::Comment(id) => write!(f, "comment:{id}"),
        }
    }
}

/// Denormalized vote statistics stored on every story and comment row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotableStats {
    /// Number of Up votes.
    pub upvote_count: i64,
    /// Number of Down votes.
    pub downvote_count: i64,
    /// `upvote_count + downvote_count`.
    pub vote_count: i64,
    /// `upvote_count - downvote_count * DOWNVOTE_PENALTY_WEIGHT`.
    pub vote_score: f64,
}

impl VotableStats {
    /// Derive all four fields from the Up and Down counts.
    #[must_use]
    pub fn from_counts(upvote_count: i64, downvote_count: i64) -> Self {
        Self {
            upvote_count,
            downvote_count,
            vote_count: upvote_count + downvote_count,
            vote_score: (downvote_count as f64).mul_add(
                -DOWNVOTE_PENALTY_WEIGHT,
                upvote_count as f64,
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_from_counts_zero() {
        let stats = VotableStats::from_counts(0, 0);
        assert_eq!(stats, VotableStats::default());
        assert_eq!(stats.vote_score, 0.0);
    }

    #[test]
    fn test_from_counts_mixed() {
        let stats = VotableStats::from_counts(5, 2);
        assert_eq!(stats.upvote_count, 5);
        assert_eq!(stats.downvote_count, 2);
        assert_eq!(stats.vote_count, 7);
        assert_close(stats.vote_score, 2.8);
    }

    #[test]
    fn test_from_counts_single_upvote() {
        let stats = VotableStats::from_counts(1, 0);
        assert_eq!(stats.vote_count, 1);
        assert_close(stats.vote_score, 1.0);
    }

    #[test]
    fn test_from_counts_only_downvotes() {
        let stats = VotableStats::from_counts(0, 3);
        assert_eq!(stats.vote_count, 3);
        assert_close(stats.vote_score, -3.3);
    }

    #[test]
    fn test_vote_count_is_sum_for_many_inputs() {
        for up in 0..20 {
            for down in 0..20 {
                let stats = VotableStats::from_counts(up, down);
                assert_eq!(stats.vote_count, stats.upvote_count + stats.downvote_count);
                assert_close(stats.vote_score, up as f64 - down as f64 * 1.1);
            }
        }
    }

    #[test]
    fn test_votable_kind_and_id() {
        let story = Votable::Story("s1".to_string());
        let comment = Votable::new(VotableKind::Comment, "c1");

        assert_eq!(story.kind(), VotableKind::Story);
        assert_eq!(story.id(), "s1");
        assert_eq!(comment, Votable::Comment("c1".to_string()));
        assert_eq!(comment.to_string(), "comment:c1");
    }

    #[test]
    fn test_serialized_shapes() {
        let story = serde_json::to_value(Votable::Story("s1".to_string())).unwrap();
        assert_eq!(story, serde_json::json!({"type": "story", "id": "s1"}));

        let stats = serde_json::to_value(VotableStats::from_counts(2, 0)).unwrap();
        assert_eq!(
            stats,
            serde_json::json!({
                "upvoteCount": 2,
                "downvoteCount": 0,
                "voteCount": 2,
                "voteScore": 2.0,
            })
        );
    }
}
