//! Vote aggregation.
//!
//! Keeps the denormalized [`VotableStats`] of a story or comment equal to the
//! aggregate of its current vote rows. The stats are rederived from fresh
//! counts on every call, never incremented in place.

use async_trait::async_trait;
use sea_orm::ConnectionTrait;
use storyhub_common::{AppError, AppResult};
use storyhub_db::{
    entities::{Votable, VotableStats, VoteDirection},
    repositories::{CommentRepository, StoryRepository, VoteRepository},
};

/// Storage capability the aggregator needs: count a votable's votes by
/// direction, and write its four stat fields at once.
#[async_trait]
pub trait VoteStatsStore: Send + Sync {
    /// Count votes of one direction on a votable.
    async fn count_votes(&self, votable: &Votable, direction: VoteDirection) -> AppResult<u64>;

    /// Persist all four stat fields in a single write.
    async fn apply_stats(&self, votable: &Votable, stats: &VotableStats) -> AppResult<()>;
}

/// [`VoteStatsStore`] over a sea-orm connection or transaction.
pub struct ConnectionStatsStore<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ConnectionStatsStore<'a, C> {
    /// Wrap a connection or an open transaction.
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C: ConnectionTrait> VoteStatsStore for ConnectionStatsStore<'_, C> {
    async fn count_votes(&self, votable: &Votable, direction: VoteDirection) -> AppResult<u64> {
        VoteRepository::count_by_direction_in(self.conn, votable, direction).await
    }

    async fn apply_stats(&self, votable: &Votable, stats: &VotableStats) -> AppResult<()> {
        let rows = match votable {
            Votable::Story(id) => StoryRepository::apply_stats_in(self.conn, id, stats).await?,
            Votable::Comment(id) => {
                CommentRepository::apply_stats_in(self.conn, id, stats).await?
            }
        };

        if rows == 0 {
            return Err(match votable {
                Votable::Story(id) => AppError::StoryNotFound(id.clone()),
                Votable::Comment(id) => AppError::CommentNotFound(id.clone()),
            });
        }
        Ok(())
    }
}

/// Recomputes vote stats for stories and comments.
///
/// One policy for both kinds: `score = up - down * DOWNVOTE_PENALTY_WEIGHT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoteAggregator;

impl VoteAggregator {
    /// Create a new vote aggregator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Make `votable`'s stats match its current vote rows.
    ///
    /// Issues two counts and one write. Errors from either are returned as-is
    /// and nothing is written unless both counts succeeded. Returns the stats
    /// that were written.
    pub async fn recalculate<S>(&self, store: &S, votable: &Votable) -> AppResult<VotableStats>
    where
        S: VoteStatsStore + ?Sized,
    {
        let upvotes = store.count_votes(votable, VoteDirection::Up).await?;
        let downvotes = store.count_votes(votable, VoteDirection::Down).await?;

        let stats = VotableStats::from_counts(to_i64(upvotes)?, to_i64(downvotes)?);
        store.apply_stats(votable, &stats).await?;

        tracing::debug!(
            votable = %votable,
            upvotes = stats.upvote_count,
            downvotes = stats.downvote_count,
            score = stats.vote_score,
            "Recalculated vote stats"
        );

        Ok(stats)
    }
}

fn to_i64(count: u64) -> AppResult<i64> {
    i64::try_from(count).map_err(|_| AppError::Internal(format!("vote count {count} overflows")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory store: vote rows keyed by (voter, votable).
    #[derive(Default)]
    struct MemoryStore {
        votes: Mutex<HashMap<(String, Votable), VoteDirection>>,
        stats: Mutex<HashMap<Votable, VotableStats>>,
        writes: Mutex<usize>,
        fail_counts: bool,
        fail_writes: bool,
    }

    impl MemoryStore {
        fn with_votes(votable: &Votable, up: usize, down: usize) -> Self {
            let store = Self::default();
            {
                let mut votes = store.votes.lock().unwrap();
                for i in 0..up {
                    votes.insert((format!("up{i}"), votable.clone()), VoteDirection::Up);
                }
                for i in 0..down {
                    votes.insert((format!("down{i}"), votable.clone()), VoteDirection::Down);
                }
            }
            store
        }

        fn stats_of(&self, votable: &Votable) -> Option<VotableStats> {
            self.stats.lock().unwrap().get(votable).copied()
        }
    }

    #[async_trait]
    impl VoteStatsStore for MemoryStore {
        async fn count_votes(
            &self,
            votable: &Votable,
            direction: VoteDirection,
        ) -> AppResult<u64> {
            if self.fail_counts {
                return Err(AppError::Database("count failed".to_string()));
            }
            let votes = self.votes.lock().unwrap();
            Ok(votes
                .iter()
                .filter(|((_, v), d)| v == votable && **d == direction)
                .count() as u64)
        }

        async fn apply_stats(&self, votable: &Votable, stats: &VotableStats) -> AppResult<()> {
            if self.fail_writes {
                return Err(AppError::Database("write failed".to_string()));
            }
            *self.writes.lock().unwrap() += 1;
            self.stats.lock().unwrap().insert(votable.clone(), *stats);
            Ok(())
        }
    }

    fn story(id: &str) -> Votable {
        Votable::Story(id.to_string())
    }

    fn comment(id: &str) -> Votable {
        Votable::Comment(id.to_string())
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[tokio::test]
    async fn test_mixed_votes() {
        let target = comment("c1");
        let store = MemoryStore::with_votes(&target, 5, 2);

        let stats = VoteAggregator::new()
            .recalculate(&store, &target)
            .await
            .unwrap();

        assert_eq!(stats.upvote_count, 5);
        assert_eq!(stats.downvote_count, 2);
        assert_eq!(stats.vote_count, 7);
        assert_close(stats.vote_score, 2.8);
        assert_eq!(store.stats_of(&target), Some(stats));
    }

    #[tokio::test]
    async fn test_zero_votes() {
        let target = story("s1");
        let store = MemoryStore::default();

        let stats = VoteAggregator::new()
            .recalculate(&store, &target)
            .await
            .unwrap();

        assert_eq!(stats, VotableStats::default());
        assert_eq!(*store.writes.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_single_upvote() {
        let target = story("s1");
        let store = MemoryStore::with_votes(&target, 1, 0);

        let stats = VoteAggregator::new()
            .recalculate(&store, &target)
            .await
            .unwrap();

        assert_eq!(stats.vote_count, 1);
        assert_close(stats.vote_score, 1.0);
    }

    #[tokio::test]
    async fn test_only_downvotes() {
        let target = comment("c1");
        let store = MemoryStore::with_votes(&target, 0, 3);

        let stats = VoteAggregator::new()
            .recalculate(&store, &target)
            .await
            .unwrap();

        assert_eq!(stats.downvote_count, 3);
        assert_eq!(stats.vote_count, 3);
        assert_close(stats.vote_score, -3.3);
    }

    #[tokio::test]
    async fn test_story_and_comment_share_formula() {
        let s = story("x");
        let c = comment("x");
        let store = MemoryStore::with_votes(&s, 4, 4);
        {
            let mut votes = store.votes.lock().unwrap();
            for i in 0..4 {
                votes.insert((format!("cu{i}"), c.clone()), VoteDirection::Up);
                votes.insert((format!("cd{i}"), c.clone()), VoteDirection::Down);
            }
        }

        let aggregator = VoteAggregator::new();
        let story_stats = aggregator.recalculate(&store, &s).await.unwrap();
        let comment_stats = aggregator.recalculate(&store, &c).await.unwrap();

        assert_eq!(story_stats, comment_stats);
        assert_close(story_stats.vote_score, -0.4);
    }

    #[tokio::test]
    async fn test_idempotent() {
        let target = story("s1");
        let store = MemoryStore::with_votes(&target, 3, 1);
        let aggregator = VoteAggregator::new();

        let first = aggregator.recalculate(&store, &target).await.unwrap();
        let second = aggregator.recalculate(&store, &target).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(*store.writes.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reflects_removed_vote() {
        let target = story("s1");
        let store = MemoryStore::with_votes(&target, 2, 0);
        let aggregator = VoteAggregator::new();
        aggregator.recalculate(&store, &target).await.unwrap();

        store
            .votes
            .lock()
            .unwrap()
            .remove(&("up0".to_string(), target.clone()));
        let stats = aggregator.recalculate(&store, &target).await.unwrap();

        assert_eq!(stats.upvote_count, 1);
        assert_eq!(stats.vote_count, 1);
    }

    #[tokio::test]
    async fn test_count_failure_writes_nothing() {
        let target = story("s1");
        let store = MemoryStore {
            fail_counts: true,
            ..MemoryStore::default()
        };

        let result = VoteAggregator::new().recalculate(&store, &target).await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(*store.writes.lock().unwrap(), 0);
        assert!(store.stats_of(&target).is_none());
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let target = comment("c1");
        let store = MemoryStore {
            fail_writes: true,
            ..MemoryStore::with_votes(&target, 1, 1)
        };

        let result = VoteAggregator::new().recalculate(&store, &target).await;

        match result {
            Err(AppError::Database(msg)) => assert_eq!(msg, "write failed"),
            _ => panic!("Expected Database error"),
        }
        assert!(store.stats_of(&target).is_none());
    }

    #[tokio::test]
    async fn test_connection_store_issues_two_counts_and_one_update() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(5)) }],
                [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(2)) }],
            ])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let stats = VoteAggregator::new()
            .recalculate(&ConnectionStatsStore::new(&db), &story("s1"))
            .await
            .unwrap();

        assert_eq!(stats.vote_count, 7);
        assert_close(stats.vote_score, 2.8);

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 3);
        assert!(format!("{:?}", log[0]).contains("COUNT"));
        assert!(format!("{:?}", log[1]).contains("COUNT"));
        assert!(format!("{:?}", log[2]).contains("UPDATE"));
    }

    #[tokio::test]
    async fn test_connection_store_missing_comment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(0)) }],
                [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(0)) }],
            ])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = VoteAggregator::new()
            .recalculate(&ConnectionStatsStore::new(&db), &comment("gone"))
            .await;

        match result {
            Err(AppError::CommentNotFound(id)) => assert_eq!(id, "gone"),
            _ => panic!("Expected CommentNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_connection_store_count_error_skips_update() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(1)) },
            ]])
            .append_query_errors([DbErr::Custom("timeout".to_string())])
            .into_connection();

        let result = VoteAggregator::new()
            .recalculate(&ConnectionStatsStore::new(&db), &story("s1"))
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        let log = db.into_transaction_log();
        assert!(log.iter().all(|t| !format!("{t:?}").contains("UPDATE")));
    }
}
