use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Answer {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub user_id: Uuid,
    pub hidden: bool,
    pub hidden_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Answer {
    pub fn hidden_to_user(&self, viewer_id: Uuid, viewer_is_moderator: bool) -> bool {
        super::question::hidden_to_user(self.hidden, self.user_id, viewer_id, viewer_is_moderator)
    }
}
