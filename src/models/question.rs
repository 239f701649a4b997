use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A forum question. The slug is derived from the title on creation and is
/// immutable and unique afterwards. Moderation state lives directly on the
/// row: `hidden`, the hiding actor and the justification.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub slug: String,
    pub user_id: Uuid,
    pub correct_answer_id: Option<Uuid>,
    pub course_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub hidden: bool,
    pub hidden_by: Option<Uuid>,
    pub hidden_justification: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Whether this question should read as hidden for the given viewer.
    /// Moderators and the question's author keep (flagged) access.
    pub fn hidden_to_user(&self, viewer_id: Uuid, viewer_is_moderator: bool) -> bool {
        hidden_to_user(self.hidden, self.user_id, viewer_id, viewer_is_moderator)
    }
}

/// Per-viewer visibility projection shared by questions and answers.
pub fn hidden_to_user(
    hidden: bool,
    author_id: Uuid,
    viewer_id: Uuid,
    viewer_is_moderator: bool,
) -> bool {
    hidden && !viewer_is_moderator && viewer_id != author_id
}
