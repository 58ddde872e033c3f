//! Business logic services.

pub mod vote;

pub use vote::{VotableScope, VoteCounts, VoteFilter, VoteOutcome, VoteService, VoteStatus};
