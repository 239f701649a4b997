use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row per view event. Views are counted as occurrences, not unique
/// viewers, so repeated visits by the same user all land here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionVisualization {
    pub id: Uuid,
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}
