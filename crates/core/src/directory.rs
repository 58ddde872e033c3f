//! Polymorphic entity resolution.

use async_trait::async_trait;
use updown_common::AppResult;
use updown_common::config::VotingConfig;

use crate::capability::EntityRef;

/// Resolves polymorphic references against the host application's storage.
///
/// The engine consults this before every write: a reference whose kind
/// lacks the relevant capability yields the false sentinel, while a
/// capable reference that does not resolve surfaces as `NotFound`.
/// Embedding applications implement this against their own tables.
#[async_trait]
pub trait EntityDirectory: Send + Sync {
    /// Whether the referenced entity currently exists.
    async fn exists(&self, entity: &EntityRef) -> AppResult<bool>;

    /// Whether this kind can receive votes.
    fn is_votable_kind(&self, kind: &str) -> bool;

    /// Whether this kind can cast votes.
    fn is_voter_kind(&self, kind: &str) -> bool;
}

/// Configuration-driven directory for standalone deployments.
///
/// Registered kinds are treated as resolvable; a standalone vote service
/// has no host tables to consult, so per-id existence is the embedding
/// application's concern.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    votable_kinds: Vec<String>,
    voter_kinds: Vec<String>,
}

impl KindRegistry {
    /// Create a registry from explicit kind lists.
    #[must_use]
    pub const fn new(votable_kinds: Vec<String>, voter_kinds: Vec<String>) -> Self {
        Self {
            votable_kinds,
            voter_kinds,
        }
    }

    /// Create a registry from the voting configuration section.
    #[must_use]
    pub fn from_config(config: &VotingConfig) -> Self {
        Self::new(config.votable_kinds.clone(), config.voter_kinds.clone())
    }
}

#[async_trait]
impl EntityDirectory for KindRegistry {
    async fn exists(&self, entity: &EntityRef) -> AppResult<bool> {
        Ok(self.is_votable_kind(&entity.kind) || self.is_voter_kind(&entity.kind))
    }

    fn is_votable_kind(&self, kind: &str) -> bool {
        self.votable_kinds.iter().any(|k| k == kind)
    }

    fn is_voter_kind(&self, kind: &str) -> bool {
        self.voter_kinds.iter().any(|k| k == kind)
    }
}
