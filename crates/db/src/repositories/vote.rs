//! Vote repository.

use std::sync::Arc;

use crate::entities::{Vote, vote};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
};
use updown_common::{AppError, AppResult, get_metrics};

/// Distinct (type, id) projection for scoped votable listings.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct VotablePair {
    pub votable_type: String,
    pub votable_id: String,
}

/// Whether a database error is a unique-constraint violation.
///
/// Checks the driver-reported kind first and falls back to message
/// matching so mocked errors translate the same way.
fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    let msg = err.to_string();
    msg.contains("duplicate key") || msg.contains("UNIQUE constraint")
}

/// Count the round-trip and translate driver errors.
fn track<T>(result: Result<T, DbErr>) -> AppResult<T> {
    get_metrics().record_db_query(result.is_err());
    result.map_err(|e| AppError::Database(e.to_string()))
}

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a vote by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<vote::Model>> {
        track(Vote::find_by_id(id).one(self.db.as_ref()).await)
    }

    /// Find the vote for a (voter, votable) pair, regardless of direction.
    pub async fn find_by_pair(
        &self,
        votable_type: &str,
        votable_id: &str,
        voter_type: &str,
        voter_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        track(
            Vote::find()
                .filter(vote::Column::VotableType.eq(votable_type))
                .filter(vote::Column::VotableId.eq(votable_id))
                .filter(vote::Column::VoterType.eq(voter_type))
                .filter(vote::Column::VoterId.eq(voter_id))
                .one(self.db.as_ref())
                .await,
        )
    }

    /// Whether another row already holds this pair (advisory pre-flight;
    /// the unique index remains authoritative).
    pub async fn pair_taken_by_other(
        &self,
        votable_type: &str,
        votable_id: &str,
        voter_type: &str,
        voter_id: &str,
        exclude_id: Option<&str>,
    ) -> AppResult<bool> {
        let mut query = Vote::find()
            .filter(vote::Column::VotableType.eq(votable_type))
            .filter(vote::Column::VotableId.eq(votable_id))
            .filter(vote::Column::VoterType.eq(voter_type))
            .filter(vote::Column::VoterId.eq(voter_id));

        if let Some(id) = exclude_id {
            query = query.filter(vote::Column::Id.ne(id));
        }

        Ok(track(query.one(self.db.as_ref()).await)?.is_some())
    }

    /// Insert a new vote.
    ///
    /// A unique-index violation surfaces as [`AppError::Conflict`] so the
    /// caller can retry the write as an update of the winning row.
    pub async fn create(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        let result = model.insert(self.db.as_ref()).await;
        get_metrics().record_db_query(result.is_err());
        result.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("vote already exists for this voter and votable".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Overwrite an existing vote in place.
    pub async fn update(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        track(model.update(self.db.as_ref()).await)
    }

    /// Delete the vote for a pair. Returns whether a row was removed.
    pub async fn delete_by_pair(
        &self,
        votable_type: &str,
        votable_id: &str,
        voter_type: &str,
        voter_id: &str,
    ) -> AppResult<bool> {
        let result = track(
            Vote::delete_many()
                .filter(vote::Column::VotableType.eq(votable_type))
                .filter(vote::Column::VotableId.eq(votable_id))
                .filter(vote::Column::VoterType.eq(voter_type))
                .filter(vote::Column::VoterId.eq(voter_id))
                .exec(self.db.as_ref())
                .await,
        )?;

        Ok(result.rows_affected > 0)
    }

    /// Get votes on a votable (paginated), optionally filtered by
    /// direction and comment presence.
    pub async fn find_by_votable(
        &self,
        votable_type: &str,
        votable_id: &str,
        direction: Option<bool>,
        has_comment: Option<bool>,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<vote::Model>> {
        let mut query = Vote::find()
            .filter(vote::Column::VotableType.eq(votable_type))
            .filter(vote::Column::VotableId.eq(votable_id))
            .order_by_desc(vote::Column::Id);

        if let Some(dir) = direction {
            query = query.filter(vote::Column::Direction.eq(dir));
        }
        match has_comment {
            Some(true) => {
                query = query
                    .filter(vote::Column::Comment.is_not_null())
                    .filter(vote::Column::Comment.ne(""));
            }
            Some(false) => {
                query = query.filter(
                    Condition::any()
                        .add(vote::Column::Comment.is_null())
                        .add(vote::Column::Comment.eq("")),
                );
            }
            None => {}
        }
        if let Some(id) = until_id {
            query = query.filter(vote::Column::Id.lt(id));
        }

        track(query.limit(limit).all(self.db.as_ref()).await)
    }

    /// Get votes cast by a voter (paginated).
    pub async fn find_by_voter(
        &self,
        voter_type: &str,
        voter_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<vote::Model>> {
        let mut query = Vote::find()
            .filter(vote::Column::VoterType.eq(voter_type))
            .filter(vote::Column::VoterId.eq(voter_id))
            .order_by_desc(vote::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(vote::Column::Id.lt(id));
        }

        track(query.limit(limit).all(self.db.as_ref()).await)
    }

    /// Count votes on a votable, optionally in one direction.
    pub async fn count_by_votable(
        &self,
        votable_type: &str,
        votable_id: &str,
        direction: Option<bool>,
    ) -> AppResult<u64> {
        let mut query = Vote::find()
            .filter(vote::Column::VotableType.eq(votable_type))
            .filter(vote::Column::VotableId.eq(votable_id));

        if let Some(dir) = direction {
            query = query.filter(vote::Column::Direction.eq(dir));
        }

        track(query.count(self.db.as_ref()).await)
    }

    /// Count votes on a votable that carry a non-empty comment.
    pub async fn count_with_comments(
        &self,
        votable_type: &str,
        votable_id: &str,
    ) -> AppResult<u64> {
        track(
            Vote::find()
                .filter(vote::Column::VotableType.eq(votable_type))
                .filter(vote::Column::VotableId.eq(votable_id))
                .filter(vote::Column::Comment.is_not_null())
                .filter(vote::Column::Comment.ne(""))
                .count(self.db.as_ref())
                .await,
        )
    }

    /// Signed score for a votable: up count minus down count.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn score_for(&self, votable_type: &str, votable_id: &str) -> AppResult<i64> {
        let up = self
            .count_by_votable(votable_type, votable_id, Some(true))
            .await?;
        let down = self
            .count_by_votable(votable_type, votable_id, Some(false))
            .await?;
        Ok(up as i64 - down as i64)
    }

    /// Count votes cast by a voter.
    pub async fn count_by_voter(&self, voter_type: &str, voter_id: &str) -> AppResult<u64> {
        track(
            Vote::find()
                .filter(vote::Column::VoterType.eq(voter_type))
                .filter(vote::Column::VoterId.eq(voter_id))
                .count(self.db.as_ref())
                .await,
        )
    }

    /// Distinct votables of one kind having at least one qualifying vote.
    ///
    /// The DISTINCT projection guarantees each votable appears exactly once
    /// however many votes it holds.
    pub async fn scoped_votables(
        &self,
        votable_type: &str,
        direction: Option<bool>,
        with_comments: bool,
    ) -> AppResult<Vec<VotablePair>> {
        let mut query = Vote::find()
            .select_only()
            .column(vote::Column::VotableType)
            .column(vote::Column::VotableId)
            .distinct()
            .filter(vote::Column::VotableType.eq(votable_type));

        if let Some(dir) = direction {
            query = query.filter(vote::Column::Direction.eq(dir));
        }
        if with_comments {
            query = query
                .filter(vote::Column::Comment.is_not_null())
                .filter(vote::Column::Comment.ne(""));
        }

        track(query.into_model::<VotablePair>().all(self.db.as_ref()).await)
    }

    /// Distinct votables a voter has voted on, optionally one kind only.
    pub async fn votables_voted_by(
        &self,
        voter_type: &str,
        voter_id: &str,
        votable_type: Option<&str>,
    ) -> AppResult<Vec<VotablePair>> {
        let mut query = Vote::find()
            .select_only()
            .column(vote::Column::VotableType)
            .column(vote::Column::VotableId)
            .distinct()
            .filter(vote::Column::VoterType.eq(voter_type))
            .filter(vote::Column::VoterId.eq(voter_id));

        if let Some(kind) = votable_type {
            query = query.filter(vote::Column::VotableType.eq(kind));
        }

        track(query.into_model::<VotablePair>().all(self.db.as_ref()).await)
    }

    /// Delete all votes attached to a destroyed votable. Returns the number
    /// of rows removed.
    pub async fn delete_for_votable(
        &self,
        votable_type: &str,
        votable_id: &str,
    ) -> AppResult<u64> {
        let result = track(
            Vote::delete_many()
                .filter(vote::Column::VotableType.eq(votable_type))
                .filter(vote::Column::VotableId.eq(votable_id))
                .exec(self.db.as_ref())
                .await,
        )?;

        Ok(result.rows_affected)
    }

    /// Delete all votes cast by a destroyed voter. Returns the number of
    /// rows removed.
    pub async fn delete_for_voter(&self, voter_type: &str, voter_id: &str) -> AppResult<u64> {
        let result = track(
            Vote::delete_many()
                .filter(vote::Column::VoterType.eq(voter_type))
                .filter(vote::Column::VoterId.eq(voter_id))
                .exec(self.db.as_ref())
                .await,
        )?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use serde_json::json;

    fn create_test_vote(id: &str, votable_id: &str, voter_id: &str, direction: bool) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            votable_type: "post".to_string(),
            votable_id: votable_id.to_string(),
            voter_type: "user".to_string(),
            voter_id: voter_id.to_string(),
            direction,
            comment: None,
            feedback_tags: json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
        btreemap! { "num_items" => Value::BigInt(Some(n)) }
    }

    #[test]
    fn test_is_unique_violation_message_fallback() {
        let err = DbErr::Custom(
            "duplicate key value violates unique constraint \"idx_vote_pair\"".to_string(),
        );
        assert!(is_unique_violation(&err));

        let err = DbErr::Custom("connection reset".to_string());
        assert!(!is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let vote = create_test_vote("v1", "p1", "u1", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote.clone()]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find_by_id("v1").await.unwrap();

        assert!(result.is_some());
        let found = result.unwrap();
        assert_eq!(found.id, "v1");
        assert!(found.direction);
    }

    #[tokio::test]
    async fn test_find_by_pair_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<vote::Model>::new()])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find_by_pair("post", "p1", "user", "u1").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_pair_found() {
        let vote = create_test_vote("v1", "p1", "u1", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find_by_pair("post", "p1", "user", "u1").await.unwrap();

        assert!(result.is_some());
        assert!(!result.unwrap().direction);
    }

    #[tokio::test]
    async fn test_create_unique_violation_maps_to_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom(
                    "duplicate key value violates unique constraint \"idx_vote_pair\""
                        .to_string(),
                )])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let vote = create_test_vote("v1", "p1", "u1", true);
        let active: vote::ActiveModel = vote.into();
        let result = repo.create(active.reset_all()).await;

        match result {
            Err(AppError::Conflict(_)) => {}
            other => panic!("Expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_by_pair_deleted() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let deleted = repo
            .delete_by_pair("post", "p1", "user", "u1")
            .await
            .unwrap();

        assert!(deleted);
    }

    #[tokio::test]
    async fn test_delete_by_pair_nothing_to_delete() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let deleted = repo
            .delete_by_pair("post", "p1", "user", "u1")
            .await
            .unwrap();

        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_count_by_votable() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row(3)]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let count = repo.count_by_votable("post", "p1", None).await.unwrap();

        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_score_positive_and_negative() {
        // 1 up, 3 down -> -2
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row(1)], vec![count_row(3)]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let score = repo.score_for("post", "p1").await.unwrap();
        assert_eq!(score, -2);

        // 4 up, 1 down -> 3
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row(4)], vec![count_row(1)]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let score = repo.score_for("post", "p1").await.unwrap();
        assert_eq!(score, 3);
    }

    #[tokio::test]
    async fn test_find_by_votable() {
        let v1 = create_test_vote("v1", "p1", "u1", true);
        let v2 = create_test_vote("v2", "p1", "u2", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[v1, v2]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo
            .find_by_votable("post", "p1", None, None, 10, None)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_voter() {
        let v1 = create_test_vote("v1", "p1", "u1", true);
        let v2 = create_test_vote("v2", "p2", "u1", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[v1, v2]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find_by_voter("user", "u1", 10, None).await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_scoped_votables_distinct_pairs() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    btreemap! {
                        "votable_type" => Value::from("post"),
                        "votable_id" => Value::from("p1"),
                    },
                    btreemap! {
                        "votable_type" => Value::from("post"),
                        "votable_id" => Value::from("p2"),
                    },
                ]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.scoped_votables("post", None, false).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].votable_id, "p1");
        assert_eq!(result[1].votable_id, "p2");
    }

    #[tokio::test]
    async fn test_delete_for_votable_returns_removed_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 5,
                }])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let removed = repo.delete_for_votable("post", "p1").await.unwrap();

        assert_eq!(removed, 5);
    }

    #[tokio::test]
    async fn test_pair_taken_by_other_excludes_own_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<vote::Model>::new()])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let taken = repo
            .pair_taken_by_other("post", "p1", "user", "u1", Some("v1"))
            .await
            .unwrap();

        assert!(!taken);
    }
}
