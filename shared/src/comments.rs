//! Reader comments: input validation and vote counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Comment, ContentError, ContentResult};

/// Longest accepted comment body, in characters.
pub const MAX_COMMENT_CHARS: usize = 5_000;
/// Longest accepted display name, in characters.
pub const MAX_NAME_CHARS: usize = 80;

/// Direction of a reader vote on a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    /// Raises `likes`.
    Like,
    /// Raises `dislikes`.
    Dislike,
}

impl VoteKind {
    /// Name of the counter field this vote increments.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Like => "likes",
            Self::Dislike => "dislikes",
        }
    }

    /// Current value of the matching counter.
    pub fn count(&self, comment: &Comment) -> u32 {
        match self {
            Self::Like => comment.likes,
            Self::Dislike => comment.dislikes,
        }
    }
}

/// Reader input before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComment {
    /// Display name.
    pub name: String,
    /// Comment text.
    pub content: String,
}

impl NewComment {
    /// Trims both fields and builds a comment with a fresh id, or reports the
    /// first missing field.
    pub fn validate(self, now: DateTime<Utc>) -> ContentResult<Comment> {
        let name = self.name.trim();
        let content = self.content.trim();
        if name.is_empty() {
            return Err(ContentError::Validation("name is required".to_string()));
        }
        if content.is_empty() {
            return Err(ContentError::Validation("comment text is required".to_string()));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(ContentError::Validation(format!(
                "name must be at most {MAX_NAME_CHARS} characters"
            )));
        }
        if content.chars().count() > MAX_COMMENT_CHARS {
            return Err(ContentError::Validation(format!(
                "comment must be at most {MAX_COMMENT_CHARS} characters"
            )));
        }
        Ok(Comment {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            content: content.to_string(),
            date: now,
            likes: 0,
            dislikes: 0,
        })
    }
}

/// Copy of `comment` with the chosen counter raised by one.
pub fn apply_vote(comment: &Comment, kind: VoteKind) -> Comment {
    let mut next = comment.clone();
    match kind {
        VoteKind::Like => next.likes = next.likes.saturating_add(1),
        VoteKind::Dislike => next.dislikes = next.dislikes.saturating_add(1),
    }
    next
}
