//! Database repositories.

pub mod vote;

pub use vote::{VotablePair, VoteRepository};
