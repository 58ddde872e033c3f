//! Vote service: the upsert engine and aggregation queries.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde::Serialize;
use serde_json::json;
use updown_common::{AppError, AppResult, IdGenerator, get_metrics};
use updown_db::{entities::vote, repositories::VoteRepository};

use crate::capability::EntityRef;
use crate::catalog::FeedbackCatalog;
use crate::directory::EntityDirectory;
use crate::validation::{ValidationError, ValidationErrors};

/// Result of a vote write.
#[derive(Debug, Clone)]
pub enum VoteOutcome {
    /// The vote was persisted (created or overwritten in place).
    Saved(vote::Model),

    /// Validation failed. The candidate reflects the rejected values for
    /// inspection; storage is untouched.
    Rejected {
        /// The unpersisted candidate carrying the rejected values.
        candidate: vote::Model,
        /// What failed, in check order.
        errors: ValidationErrors,
    },

    /// A counterparty lacks the voting capability (unregistered kind or
    /// no persisted identity). The false sentinel, not an error.
    Incapable,
}

impl VoteOutcome {
    /// Whether the write was persisted.
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    /// Whether a counterparty lacked the voting capability.
    #[must_use]
    pub const fn is_incapable(&self) -> bool {
        matches!(self, Self::Incapable)
    }

    /// The persisted vote, if any.
    #[must_use]
    pub fn saved(self) -> Option<vote::Model> {
        match self {
            Self::Saved(model) => Some(model),
            _ => None,
        }
    }
}

/// Aggregate counts for one votable, recomputed from the live row set.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCounts {
    pub total: u64,
    pub up: u64,
    pub down: u64,
    pub score: i64,
    pub with_comments: u64,
}

/// One voter's standing on one votable, plus the aggregate counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatus {
    pub voted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub feedback_tags: Vec<String>,
    pub counts: VoteCounts,
}

/// Filters for listing votes on a votable.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoteFilter {
    /// `Some(true)` = up votes only, `Some(false)` = down votes only.
    pub direction: Option<bool>,
    /// `Some(true)` = only votes with a non-empty comment,
    /// `Some(false)` = only votes without one.
    pub has_comment: Option<bool>,
}

/// Collection-level scopes over votables of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotableScope {
    /// At least one vote, either direction.
    WithVotes,
    /// At least one up vote.
    WithUpVotes,
    /// At least one down vote.
    WithDownVotes,
    /// At least one vote carrying a non-empty comment.
    WithComments,
}

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    vote_repo: VoteRepository,
    directory: Arc<dyn EntityDirectory>,
    catalog: FeedbackCatalog,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service generating ULID primary keys.
    #[must_use]
    pub fn new(
        vote_repo: VoteRepository,
        directory: Arc<dyn EntityDirectory>,
        catalog: FeedbackCatalog,
    ) -> Self {
        Self {
            vote_repo,
            directory,
            catalog,
            id_gen: IdGenerator::default(),
        }
    }

    /// Use a specific primary-key generator (configured format).
    #[must_use]
    pub fn with_id_generator(mut self, id_gen: IdGenerator) -> Self {
        self.id_gen = id_gen;
        self
    }

    /// The feedback catalog handle.
    #[must_use]
    pub const fn catalog(&self) -> &FeedbackCatalog {
        &self.catalog
    }

    /// Cast or overwrite an up vote.
    pub async fn vote_up(
        &self,
        votable: &EntityRef,
        voter: &EntityRef,
        comment: Option<String>,
        feedback_tags: Vec<String>,
    ) -> AppResult<VoteOutcome> {
        self.vote_for(votable, voter, true, comment, feedback_tags)
            .await
    }

    /// Cast or overwrite a down vote.
    pub async fn vote_down(
        &self,
        votable: &EntityRef,
        voter: &EntityRef,
        comment: Option<String>,
        feedback_tags: Vec<String>,
    ) -> AppResult<VoteOutcome> {
        self.vote_for(votable, voter, false, comment, feedback_tags)
            .await
    }

    /// Cast or overwrite a vote: find-or-create keyed on the
    /// (voter, votable) pair, last writer wins.
    ///
    /// An insert losing the first-vote race against a concurrent caller is
    /// retried as an update of the winning row, so neither writer's intent
    /// is dropped. Only if the winning row vanishes before the retry does
    /// the conflict surface.
    pub async fn vote_for(
        &self,
        votable: &EntityRef,
        voter: &EntityRef,
        direction: bool,
        comment: Option<String>,
        feedback_tags: Vec<String>,
    ) -> AppResult<VoteOutcome> {
        require_complete(votable, "votable")?;
        require_complete(voter, "voter")?;

        if !self.directory.is_votable_kind(&votable.kind)
            || !self.directory.is_voter_kind(&voter.kind)
        {
            return Ok(VoteOutcome::Incapable);
        }

        if !self.directory.exists(votable).await? {
            return Err(AppError::NotFound(format!("votable {votable} does not exist")));
        }
        if !self.directory.exists(voter).await? {
            return Err(AppError::NotFound(format!("voter {voter} does not exist")));
        }

        // Tag membership is checked against the live catalog; a rejected
        // write never reaches storage.
        let mut errors = ValidationErrors::new();
        let invalid = self.catalog.invalid_entries(&feedback_tags);
        if !invalid.is_empty() {
            errors.push(ValidationError::Inclusion {
                field: "feedback_tags",
                invalid,
            });
        }

        let existing = self
            .vote_repo
            .find_by_pair(&votable.kind, &votable.id, &voter.kind, &voter.id)
            .await?;

        match existing {
            Some(row) => {
                if errors.is_empty() {
                    let updated = self
                        .overwrite(row, direction, comment, feedback_tags)
                        .await?;
                    Ok(VoteOutcome::Saved(updated))
                } else {
                    get_metrics().record_vote_rejected();
                    let mut candidate = row;
                    candidate.direction = direction;
                    candidate.comment = comment;
                    candidate.feedback_tags = json!(feedback_tags);
                    Ok(VoteOutcome::Rejected { candidate, errors })
                }
            }
            None => {
                let candidate = vote::Model {
                    id: self.id_gen.generate(),
                    votable_type: votable.kind.clone(),
                    votable_id: votable.id.clone(),
                    voter_type: voter.kind.clone(),
                    voter_id: voter.id.clone(),
                    direction,
                    comment,
                    feedback_tags: json!(feedback_tags),
                    created_at: Utc::now().into(),
                    updated_at: None,
                };

                if !errors.is_empty() {
                    get_metrics().record_vote_rejected();
                    return Ok(VoteOutcome::Rejected { candidate, errors });
                }

                self.insert_or_retry(candidate, votable, voter).await
            }
        }
    }

    /// Insert a first-time vote, falling back to an update when a
    /// concurrent caller won the insert race.
    async fn insert_or_retry(
        &self,
        candidate: vote::Model,
        votable: &EntityRef,
        voter: &EntityRef,
    ) -> AppResult<VoteOutcome> {
        let direction = candidate.direction;
        let comment = candidate.comment.clone();
        let feedback_tags = candidate.tag_list();

        let active: vote::ActiveModel = candidate.into();
        match self.vote_repo.create(active.reset_all()).await {
            Ok(created) => {
                get_metrics().record_vote_write(true);
                tracing::debug!(votable = %votable, voter = %voter, "Vote cast");
                Ok(VoteOutcome::Saved(created))
            }
            Err(AppError::Conflict(_)) => {
                get_metrics().record_conflict_retried();
                tracing::debug!(
                    votable = %votable,
                    voter = %voter,
                    "Lost first-vote race; applying as update"
                );

                let winner = self
                    .vote_repo
                    .find_by_pair(&votable.kind, &votable.id, &voter.kind, &voter.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Conflict(
                            "concurrent vote disappeared before retry".to_string(),
                        )
                    })?;

                let updated = self.overwrite(winner, direction, comment, feedback_tags).await?;
                Ok(VoteOutcome::Saved(updated))
            }
            Err(e) => Err(e),
        }
    }

    /// Overwrite an existing row in place and bump `updated_at`.
    async fn overwrite(
        &self,
        existing: vote::Model,
        direction: bool,
        comment: Option<String>,
        feedback_tags: Vec<String>,
    ) -> AppResult<vote::Model> {
        let mut active: vote::ActiveModel = existing.into();
        active.direction = Set(direction);
        active.comment = Set(comment);
        active.feedback_tags = Set(json!(feedback_tags));
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.vote_repo.update(active).await?;
        get_metrics().record_vote_write(false);
        Ok(updated)
    }

    /// Validate a candidate without writing. All independent failures are
    /// reported together; the advisory uniqueness check is skipped when a
    /// reference is absent (nothing meaningful to compare). Direction is
    /// a `bool` here, so the boolean-valued check holds by construction
    /// and lives at the API boundary where direction is parsed.
    pub async fn validate(&self, candidate: &vote::Model) -> AppResult<ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let votable_present = !candidate.votable_type.is_empty() && !candidate.votable_id.is_empty();
        if !votable_present {
            errors.push(ValidationError::Presence { field: "votable" });
        }
        let voter_present = !candidate.voter_type.is_empty() && !candidate.voter_id.is_empty();
        if !voter_present {
            errors.push(ValidationError::Presence { field: "voter" });
        }

        let invalid = self.catalog.invalid_entries(&candidate.tag_list());
        if !invalid.is_empty() {
            errors.push(ValidationError::Inclusion {
                field: "feedback_tags",
                invalid,
            });
        }

        if votable_present && voter_present {
            let taken = self
                .vote_repo
                .pair_taken_by_other(
                    &candidate.votable_type,
                    &candidate.votable_id,
                    &candidate.voter_type,
                    &candidate.voter_id,
                    Some(&candidate.id),
                )
                .await?;
            if taken {
                errors.push(ValidationError::Uniqueness { field: "voter" });
            }
        }

        Ok(errors)
    }

    /// Remove the vote for a pair. Returns whether a row was removed.
    pub async fn remove_vote(&self, votable: &EntityRef, voter: &EntityRef) -> AppResult<bool> {
        require_complete(votable, "votable")?;
        require_complete(voter, "voter")?;

        let removed = self
            .vote_repo
            .delete_by_pair(&votable.kind, &votable.id, &voter.kind, &voter.id)
            .await?;

        if removed {
            get_metrics().record_vote_removed();
            tracing::debug!(votable = %votable, voter = %voter, "Vote removed");
        }
        Ok(removed)
    }

    /// The vote a voter holds on a votable, if any.
    pub async fn vote_by(
        &self,
        votable: &EntityRef,
        voter: &EntityRef,
    ) -> AppResult<Option<vote::Model>> {
        require_complete(votable, "votable")?;
        require_complete(voter, "voter")?;

        self.vote_repo
            .find_by_pair(&votable.kind, &votable.id, &voter.kind, &voter.id)
            .await
    }

    /// Whether a voter has voted on a votable, either direction.
    pub async fn voted_by(&self, votable: &EntityRef, voter: &EntityRef) -> AppResult<bool> {
        Ok(self.vote_by(votable, voter).await?.is_some())
    }

    /// Whether a voter holds an up vote on a votable.
    pub async fn up_voted_by(&self, votable: &EntityRef, voter: &EntityRef) -> AppResult<bool> {
        Ok(self
            .vote_by(votable, voter)
            .await?
            .is_some_and(|v| v.direction))
    }

    /// Whether a voter holds a down vote on a votable.
    pub async fn down_voted_by(&self, votable: &EntityRef, voter: &EntityRef) -> AppResult<bool> {
        Ok(self
            .vote_by(votable, voter)
            .await?
            .is_some_and(|v| !v.direction))
    }

    /// Count all votes on a votable.
    pub async fn votes_count(&self, votable: &EntityRef) -> AppResult<u64> {
        self.vote_repo
            .count_by_votable(&votable.kind, &votable.id, None)
            .await
    }

    /// Count up votes on a votable.
    pub async fn up_votes_count(&self, votable: &EntityRef) -> AppResult<u64> {
        self.vote_repo
            .count_by_votable(&votable.kind, &votable.id, Some(true))
            .await
    }

    /// Count down votes on a votable.
    pub async fn down_votes_count(&self, votable: &EntityRef) -> AppResult<u64> {
        self.vote_repo
            .count_by_votable(&votable.kind, &votable.id, Some(false))
            .await
    }

    /// Signed score for a votable: up count minus down count.
    pub async fn votes_score(&self, votable: &EntityRef) -> AppResult<i64> {
        self.vote_repo.score_for(&votable.kind, &votable.id).await
    }

    /// Votes on a votable carrying a non-empty comment.
    pub async fn votes_with_comments(
        &self,
        votable: &EntityRef,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<vote::Model>> {
        self.vote_repo
            .find_by_votable(&votable.kind, &votable.id, None, Some(true), limit, until_id)
            .await
    }

    /// Votes on a votable, filtered and paginated.
    pub async fn list_votes(
        &self,
        votable: &EntityRef,
        filter: VoteFilter,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<vote::Model>> {
        self.vote_repo
            .find_by_votable(
                &votable.kind,
                &votable.id,
                filter.direction,
                filter.has_comment,
                limit,
                until_id,
            )
            .await
    }

    /// Aggregate counts for a votable, recomputed from the live rows.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn counts(&self, votable: &EntityRef) -> AppResult<VoteCounts> {
        let up = self.up_votes_count(votable).await?;
        let down = self.down_votes_count(votable).await?;
        let with_comments = self
            .vote_repo
            .count_with_comments(&votable.kind, &votable.id)
            .await?;

        Ok(VoteCounts {
            total: up + down,
            up,
            down,
            score: up as i64 - down as i64,
            with_comments,
        })
    }

    /// One voter's standing on a votable, plus aggregate counts.
    pub async fn status(&self, votable: &EntityRef, voter: &EntityRef) -> AppResult<VoteStatus> {
        let vote = self.vote_by(votable, voter).await?;
        let counts = self.counts(votable).await?;

        Ok(match vote {
            Some(v) => VoteStatus {
                voted: true,
                direction: Some(v.direction_label()),
                comment: v.comment.clone(),
                feedback_tags: v.tag_list(),
                counts,
            },
            None => VoteStatus {
                voted: false,
                direction: None,
                comment: None,
                feedback_tags: Vec::new(),
                counts,
            },
        })
    }

    /// Distinct votables of one kind matching a scope, each exactly once.
    pub async fn scoped_votables(
        &self,
        kind: &str,
        scope: VotableScope,
    ) -> AppResult<Vec<EntityRef>> {
        let (direction, with_comments) = match scope {
            VotableScope::WithVotes => (None, false),
            VotableScope::WithUpVotes => (Some(true), false),
            VotableScope::WithDownVotes => (Some(false), false),
            VotableScope::WithComments => (None, true),
        };

        let pairs = self
            .vote_repo
            .scoped_votables(kind, direction, with_comments)
            .await?;

        Ok(pairs
            .into_iter()
            .map(|p| EntityRef::new(p.votable_type, p.votable_id))
            .collect())
    }

    /// Count votes cast by a voter.
    pub async fn votes_cast_count(&self, voter: &EntityRef) -> AppResult<u64> {
        self.vote_repo.count_by_voter(&voter.kind, &voter.id).await
    }

    /// Votes cast by a voter, paginated.
    pub async fn votes_by_voter(
        &self,
        voter: &EntityRef,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<vote::Model>> {
        self.vote_repo
            .find_by_voter(&voter.kind, &voter.id, limit, until_id)
            .await
    }

    /// Distinct votables a voter has voted on, optionally one kind only.
    pub async fn votables_voted(
        &self,
        voter: &EntityRef,
        kind: Option<&str>,
    ) -> AppResult<Vec<EntityRef>> {
        let pairs = self
            .vote_repo
            .votables_voted_by(&voter.kind, &voter.id, kind)
            .await?;

        Ok(pairs
            .into_iter()
            .map(|p| EntityRef::new(p.votable_type, p.votable_id))
            .collect())
    }

    /// Cascade-delete all votes on a destroyed votable.
    pub async fn purge_votable(&self, votable: &EntityRef) -> AppResult<u64> {
        require_complete(votable, "votable")?;

        let removed = self
            .vote_repo
            .delete_for_votable(&votable.kind, &votable.id)
            .await?;
        tracing::info!(votable = %votable, removed, "Purged votes for destroyed votable");
        Ok(removed)
    }

    /// Cascade-delete all votes cast by a destroyed voter.
    pub async fn purge_voter(&self, voter: &EntityRef) -> AppResult<u64> {
        require_complete(voter, "voter")?;

        let removed = self
            .vote_repo
            .delete_for_voter(&voter.kind, &voter.id)
            .await?;
        tracing::info!(voter = %voter, removed, "Purged votes for destroyed voter");
        Ok(removed)
    }
}

/// An absent reference is a caller bug, never a validation failure or a
/// false return.
fn require_complete(entity: &EntityRef, field: &str) -> AppResult<()> {
    if entity.is_complete() {
        Ok(())
    } else {
        Err(AppError::InvalidArgument(format!(
            "{field} reference must carry a kind and a persisted id"
        )))
    }
}
