//! Feedback tag catalog.

use std::sync::{Arc, RwLock};

/// The set of feedback tags a vote may carry, shared behind a handle.
///
/// The catalog is administrative configuration, mutable at runtime.
/// Every validation reads the live value through the handle, so a
/// `set_tags` call takes effect for the next write immediately.
/// Changing the catalog never revalidates stored rows; tags already on
/// disk are opaque strings from that point on.
#[derive(Debug, Clone, Default)]
pub struct FeedbackCatalog {
    tags: Arc<RwLock<Vec<String>>>,
}

impl FeedbackCatalog {
    /// Create a catalog seeded with the given tags.
    #[must_use]
    pub fn new(tags: Vec<String>) -> Self {
        Self {
            tags: Arc::new(RwLock::new(tags)),
        }
    }

    /// The currently allowed tags, in configured order.
    ///
    /// An empty list means the feedback-tag feature is disabled: votes
    /// without tags pass, votes carrying tags fail inclusion.
    #[must_use]
    pub fn current_tags(&self) -> Vec<String> {
        self.tags
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Replace the allowed set. Takes effect for all subsequent
    /// validations through any clone of this handle.
    pub fn set_tags(&self, tags: Vec<String>) {
        *self
            .tags
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = tags;
    }

    /// Whether the feedback-tag feature is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self
            .tags
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_empty()
    }

    /// The entries of `tags` not in the current allowed set.
    #[must_use]
    pub fn invalid_entries(&self, tags: &[String]) -> Vec<String> {
        let allowed = self
            .tags
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tags.iter()
            .filter(|t| !allowed.contains(t))
            .cloned()
            .collect()
    }
}
