use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Presence of a row means "alert this user when the question gets a new
/// answer". There is no unsubscribe operation in the current API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionSubscription {
    pub id: Uuid,
    pub question_id: Uuid,
    pub user_id: Uuid,
}

/// Subscriber row joined with user data, as read by the alert trigger.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscriber {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}
