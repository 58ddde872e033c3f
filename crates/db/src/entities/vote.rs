//! Vote entity (one voter's directional vote on one votable).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Kind of the entity receiving the vote (e.g., "post", "comment")
    pub votable_type: String,

    /// Identifier of the entity receiving the vote
    pub votable_id: String,

    /// Kind of the entity casting the vote (e.g., "user")
    pub voter_type: String,

    /// Identifier of the entity casting the vote
    pub voter_id: String,

    /// `true` = up, `false` = down. Absence of a row is the neutral state.
    pub direction: bool,

    /// Free-text comment. NULL and empty string are stored distinctly;
    /// neither counts as a comment for filtering.
    pub comment: Option<String>,

    /// JSON array of feedback tag strings, stored by value
    pub feedback_tags: Json,

    pub created_at: DateTimeWithTimeZone,

    /// NULL until the row is first overwritten in place
    pub updated_at: Option<DateTimeWithTimeZone>,
}

// The voted-on entities live in host application schemas, referenced
// polymorphically by (type, id). No foreign keys on this side.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Feedback tags as a string list. Malformed stored values decode as empty.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_value(self.feedback_tags.clone()).unwrap_or_default()
    }

    /// Whether this vote carries a meaningful comment.
    #[must_use]
    pub fn has_comment(&self) -> bool {
        self.comment.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Direction as an API label.
    #[must_use]
    pub const fn direction_label(&self) -> &'static str {
        if self.direction { "up" } else { "down" }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn model(comment: Option<&str>, tags: serde_json::Value) -> Model {
        Model {
            id: "v1".to_string(),
            votable_type: "post".to_string(),
            votable_id: "p1".to_string(),
            voter_type: "user".to_string(),
            voter_id: "u1".to_string(),
            direction: true,
            comment: comment.map(ToString::to_string),
            feedback_tags: tags,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_tag_list() {
        let vote = model(None, json!(["like", "funny"]));
        assert_eq!(vote.tag_list(), vec!["like", "funny"]);
    }

    #[test]
    fn test_tag_list_empty() {
        let vote = model(None, json!([]));
        assert!(vote.tag_list().is_empty());
    }

    #[test]
    fn test_tag_list_malformed() {
        let vote = model(None, json!({"not": "a list"}));
        assert!(vote.tag_list().is_empty());
    }

    #[test]
    fn test_has_comment() {
        assert!(model(Some("ok"), json!([])).has_comment());
        assert!(!model(Some(""), json!([])).has_comment());
        assert!(!model(None, json!([])).has_comment());
    }

    #[test]
    fn test_direction_label() {
        let mut vote = model(None, json!([]));
        assert_eq!(vote.direction_label(), "up");
        vote.direction = false;
        assert_eq!(vote.direction_label(), "down");
    }
}
