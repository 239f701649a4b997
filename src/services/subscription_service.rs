use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::subscription::{QuestionSubscription, Subscriber};

/// Notification registry: who wants to hear about new answers to a question.
#[derive(Clone)]
pub struct SubscriptionService {
    pool: PgPool,
}

impl SubscriptionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent: subscribing twice keeps a single row and returns it.
    pub async fn subscribe(&self, user_id: Uuid, question_id: Uuid) -> Result<QuestionSubscription> {
        let exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM questions WHERE id = $1")
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound("Question not found".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO question_subscriptions (id, question_id, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (question_id, user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(question_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let subscription = sqlx::query_as::<_, QuestionSubscription>(
            "SELECT id, question_id, user_id FROM question_subscriptions WHERE question_id = $1 AND user_id = $2",
        )
        .bind(question_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(subscription)
    }

    pub async fn list_subscribers(&self, question_id: Uuid) -> Result<Vec<Subscriber>> {
        let subscribers = sqlx::query_as::<_, Subscriber>(
            r#"
            SELECT s.user_id, u.username, u.email
            FROM question_subscriptions s
            JOIN users u ON u.id = s.user_id
            WHERE s.question_id = $1
            ORDER BY u.username ASC
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscribers)
    }
}
