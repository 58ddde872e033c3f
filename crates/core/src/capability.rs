//! Voting capability traits for host entity types.
//!
//! The `Votable` and `Voter` traits are the embedding surface: any host
//! type that can name its kind and persisted id gains the full voting
//! vocabulary through provided methods delegating to [`VoteService`].
//!
//! Two failure shapes are deliberately distinct:
//! - a `None` counterparty is a caller bug and raises
//!   [`AppError::InvalidArgument`] (the caller forgot to look the entity
//!   up);
//! - an entity without persisted identity is a legitimate runtime
//!   condition and yields the [`VoteOutcome::Incapable`] sentinel (or
//!   `false`/`None` on query methods), never an error.
//!
//! Passing a type that implements neither trait is rejected at compile
//! time, which is the third leg of the same distinction.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use updown_common::{AppError, AppResult};
use updown_db::entities::vote;

use crate::services::vote::{VoteOutcome, VoteService};

/// A polymorphic reference: entity kind plus persisted id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity kind (e.g., "post", "user").
    pub kind: String,
    /// Persisted identifier within that kind.
    pub id: String,
}

impl EntityRef {
    /// Create a reference.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Whether both parts are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.kind.is_empty() && !self.id.is_empty()
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

fn required<'a, T: ?Sized>(counterparty: Option<&'a T>, field: &str) -> AppResult<&'a T> {
    counterparty
        .ok_or_else(|| AppError::InvalidArgument(format!("{field} reference is required")))
}

/// An entity type that can receive votes.
#[async_trait]
pub trait Votable: Send + Sync {
    /// The polymorphic kind tag for this type.
    fn votable_kind(&self) -> &str;

    /// The persisted id, or `None` for an unsaved instance.
    fn votable_id(&self) -> Option<String>;

    /// The full reference, or `None` while unsaved.
    fn votable_ref(&self) -> Option<EntityRef> {
        self.votable_id()
            .map(|id| EntityRef::new(self.votable_kind(), id))
    }

    /// Cast or overwrite an up vote by `voter` on this votable.
    async fn vote_up(
        &self,
        votes: &VoteService,
        voter: Option<&dyn Voter>,
        comment: Option<String>,
        feedback_tags: Vec<String>,
    ) -> AppResult<VoteOutcome> {
        self.cast(votes, voter, true, comment, feedback_tags).await
    }

    /// Cast or overwrite a down vote by `voter` on this votable.
    async fn vote_down(
        &self,
        votes: &VoteService,
        voter: Option<&dyn Voter>,
        comment: Option<String>,
        feedback_tags: Vec<String>,
    ) -> AppResult<VoteOutcome> {
        self.cast(votes, voter, false, comment, feedback_tags).await
    }

    /// Cast or overwrite a vote in the given direction.
    async fn cast(
        &self,
        votes: &VoteService,
        voter: Option<&dyn Voter>,
        direction: bool,
        comment: Option<String>,
        feedback_tags: Vec<String>,
    ) -> AppResult<VoteOutcome> {
        let voter = required(voter, "voter")?;
        let Some(voter_ref) = voter.voter_ref() else {
            return Ok(VoteOutcome::Incapable);
        };
        let Some(votable_ref) = self.votable_ref() else {
            return Ok(VoteOutcome::Incapable);
        };
        votes
            .vote_for(&votable_ref, &voter_ref, direction, comment, feedback_tags)
            .await
    }

    /// Remove `voter`'s vote. Returns whether a row was removed.
    async fn remove_vote(
        &self,
        votes: &VoteService,
        voter: Option<&dyn Voter>,
    ) -> AppResult<bool> {
        let voter = required(voter, "voter")?;
        let (Some(votable_ref), Some(voter_ref)) = (self.votable_ref(), voter.voter_ref()) else {
            return Ok(false);
        };
        votes.remove_vote(&votable_ref, &voter_ref).await
    }

    /// The vote `voter` holds on this votable, if any.
    async fn vote_by(
        &self,
        votes: &VoteService,
        voter: Option<&dyn Voter>,
    ) -> AppResult<Option<vote::Model>> {
        let voter = required(voter, "voter")?;
        let (Some(votable_ref), Some(voter_ref)) = (self.votable_ref(), voter.voter_ref()) else {
            return Ok(None);
        };
        votes.vote_by(&votable_ref, &voter_ref).await
    }

    /// Whether `voter` has voted on this votable, either direction.
    async fn voted_by(&self, votes: &VoteService, voter: Option<&dyn Voter>) -> AppResult<bool> {
        Ok(self.vote_by(votes, voter).await?.is_some())
    }

    /// Whether `voter` holds an up vote on this votable.
    async fn up_voted_by(
        &self,
        votes: &VoteService,
        voter: Option<&dyn Voter>,
    ) -> AppResult<bool> {
        Ok(self
            .vote_by(votes, voter)
            .await?
            .is_some_and(|v| v.direction))
    }

    /// Whether `voter` holds a down vote on this votable.
    async fn down_voted_by(
        &self,
        votes: &VoteService,
        voter: Option<&dyn Voter>,
    ) -> AppResult<bool> {
        Ok(self
            .vote_by(votes, voter)
            .await?
            .is_some_and(|v| !v.direction))
    }

    /// Count all votes on this votable.
    async fn votes_count(&self, votes: &VoteService) -> AppResult<u64> {
        match self.votable_ref() {
            Some(votable_ref) => votes.votes_count(&votable_ref).await,
            None => Ok(0),
        }
    }

    /// Count up votes on this votable.
    async fn up_votes_count(&self, votes: &VoteService) -> AppResult<u64> {
        match self.votable_ref() {
            Some(votable_ref) => votes.up_votes_count(&votable_ref).await,
            None => Ok(0),
        }
    }

    /// Count down votes on this votable.
    async fn down_votes_count(&self, votes: &VoteService) -> AppResult<u64> {
        match self.votable_ref() {
            Some(votable_ref) => votes.down_votes_count(&votable_ref).await,
            None => Ok(0),
        }
    }

    /// Signed score: up count minus down count.
    async fn votes_score(&self, votes: &VoteService) -> AppResult<i64> {
        match self.votable_ref() {
            Some(votable_ref) => votes.votes_score(&votable_ref).await,
            None => Ok(0),
        }
    }

    /// Votes on this votable carrying a non-empty comment.
    async fn votes_with_comments(
        &self,
        votes: &VoteService,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<vote::Model>> {
        match self.votable_ref() {
            Some(votable_ref) => votes.votes_with_comments(&votable_ref, limit, until_id).await,
            None => Ok(Vec::new()),
        }
    }
}

/// An entity type that can cast votes.
#[async_trait]
pub trait Voter: Send + Sync {
    /// The polymorphic kind tag for this type.
    fn voter_kind(&self) -> &str;

    /// The persisted id, or `None` for an unsaved instance.
    fn voter_id(&self) -> Option<String>;

    /// The full reference, or `None` while unsaved.
    fn voter_ref(&self) -> Option<EntityRef> {
        self.voter_id()
            .map(|id| EntityRef::new(self.voter_kind(), id))
    }

    /// Cast or overwrite an up vote on `votable`.
    async fn vote_up_for(
        &self,
        votes: &VoteService,
        votable: Option<&dyn Votable>,
        comment: Option<String>,
        feedback_tags: Vec<String>,
    ) -> AppResult<VoteOutcome> {
        self.cast_for(votes, votable, true, comment, feedback_tags)
            .await
    }

    /// Cast or overwrite a down vote on `votable`.
    async fn vote_down_for(
        &self,
        votes: &VoteService,
        votable: Option<&dyn Votable>,
        comment: Option<String>,
        feedback_tags: Vec<String>,
    ) -> AppResult<VoteOutcome> {
        self.cast_for(votes, votable, false, comment, feedback_tags)
            .await
    }

    /// Cast or overwrite a vote on `votable` in the given direction.
    async fn cast_for(
        &self,
        votes: &VoteService,
        votable: Option<&dyn Votable>,
        direction: bool,
        comment: Option<String>,
        feedback_tags: Vec<String>,
    ) -> AppResult<VoteOutcome> {
        let votable = required(votable, "votable")?;
        let Some(votable_ref) = votable.votable_ref() else {
            return Ok(VoteOutcome::Incapable);
        };
        let Some(voter_ref) = self.voter_ref() else {
            return Ok(VoteOutcome::Incapable);
        };
        votes
            .vote_for(&votable_ref, &voter_ref, direction, comment, feedback_tags)
            .await
    }

    /// Remove this voter's vote on `votable`. Returns whether a row was
    /// removed.
    async fn remove_vote_for(
        &self,
        votes: &VoteService,
        votable: Option<&dyn Votable>,
    ) -> AppResult<bool> {
        let votable = required(votable, "votable")?;
        let (Some(votable_ref), Some(voter_ref)) = (votable.votable_ref(), self.voter_ref())
        else {
            return Ok(false);
        };
        votes.remove_vote(&votable_ref, &voter_ref).await
    }

    /// The vote this voter holds on `votable`, if any.
    async fn vote_on(
        &self,
        votes: &VoteService,
        votable: Option<&dyn Votable>,
    ) -> AppResult<Option<vote::Model>> {
        let votable = required(votable, "votable")?;
        let (Some(votable_ref), Some(voter_ref)) = (votable.votable_ref(), self.voter_ref())
        else {
            return Ok(None);
        };
        votes.vote_by(&votable_ref, &voter_ref).await
    }

    /// Whether this voter has voted on `votable`, either direction.
    async fn voted_for(
        &self,
        votes: &VoteService,
        votable: Option<&dyn Votable>,
    ) -> AppResult<bool> {
        Ok(self.vote_on(votes, votable).await?.is_some())
    }

    /// Whether this voter holds an up vote on `votable`.
    async fn up_voted_for(
        &self,
        votes: &VoteService,
        votable: Option<&dyn Votable>,
    ) -> AppResult<bool> {
        Ok(self
            .vote_on(votes, votable)
            .await?
            .is_some_and(|v| v.direction))
    }

    /// Whether this voter holds a down vote on `votable`.
    async fn down_voted_for(
        &self,
        votes: &VoteService,
        votable: Option<&dyn Votable>,
    ) -> AppResult<bool> {
        Ok(self
            .vote_on(votes, votable)
            .await?
            .is_some_and(|v| !v.direction))
    }

    /// Count votes cast by this voter.
    async fn votes_cast_count(&self, votes: &VoteService) -> AppResult<u64> {
        match self.voter_ref() {
            Some(voter_ref) => votes.votes_cast_count(&voter_ref).await,
            None => Ok(0),
        }
    }

    /// Distinct votables this voter has voted on, optionally one kind only.
    async fn votables_voted(
        &self,
        votes: &VoteService,
        kind: Option<&str>,
    ) -> AppResult<Vec<EntityRef>> {
        match self.voter_ref() {
            Some(voter_ref) => votes.votables_voted(&voter_ref, kind).await,
            None => Ok(Vec::new()),
        }
    }
}
