//! Core business logic for updown-rs.
//!
//! The engine behind the API: the feedback catalog, vote validation, the
//! find-or-create upsert keyed on the (voter, votable) pair, aggregate
//! queries, and the capability traits host entity types implement.

pub mod capability;
pub mod catalog;
pub mod directory;
pub mod services;
pub mod validation;

pub use capability::{EntityRef, Votable, Voter};
pub use catalog::FeedbackCatalog;
pub use directory::{EntityDirectory, KindRegistry};
pub use services::*;
pub use validation::{ValidationError, ValidationErrors};
