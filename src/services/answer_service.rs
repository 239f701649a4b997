use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::answer::Answer;
use crate::services::alert_service::{compose_answer_alert, AlertDispatcher};
use crate::services::subscription_service::SubscriptionService;

/// Persists answers and triggers the new-answer alert fan-out. The answer
/// INSERT is the authoritative effect; alert delivery is best-effort and a
/// failed dispatch never rolls the answer back.
#[derive(Clone)]
pub struct AnswerService {
    pool: PgPool,
    subscriptions: SubscriptionService,
    dispatcher: Arc<dyn AlertDispatcher>,
    base_url: String,
}

/// Answer row joined with author name, vote aggregates and the viewer's own
/// current vote value.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AnswerWithMeta {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub user_id: Uuid,
    pub hidden: bool,
    pub hidden_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub username: String,
    pub votes: i64,
    pub likes: i64,
    pub unlikes: i64,
    pub current_user_vote: i32,
}

#[derive(Debug, Clone, FromRow)]
struct AlertContext {
    title: String,
    slug: String,
    course_id: Uuid,
    professor_id: Uuid,
}

impl AnswerService {
    pub fn new(pool: PgPool, dispatcher: Arc<dyn AlertDispatcher>, base_url: String) -> Self {
        let subscriptions = SubscriptionService::new(pool.clone());
        Self {
            pool,
            subscriptions,
            dispatcher,
            base_url,
        }
    }

    pub async fn create(&self, question_id: Uuid, user_id: Uuid, text: &str) -> Result<Answer> {
        let context = sqlx::query_as::<_, AlertContext>(
            r#"
            SELECT q.title, q.slug, q.course_id, c.professor_id
            FROM questions q
            JOIN courses c ON c.id = q.course_id
            WHERE q.id = $1
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;

        let answer = sqlx::query_as::<_, Answer>(
            r#"
            INSERT INTO answers (id, question_id, text, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, question_id, text, user_id, hidden, hidden_by, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(question_id)
        .bind(text)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        // The answer is durable at this point; everything below is
        // fire-and-forget notification work.
        self.send_alerts(question_id, user_id, &context).await;

        Ok(answer)
    }

    async fn send_alerts(&self, question_id: Uuid, author_id: Uuid, context: &AlertContext) {
        let subscribers = match self.subscriptions.list_subscribers(question_id).await {
            Ok(subscribers) => subscribers,
            Err(err) => {
                warn!(%question_id, error = %err, "could not load question subscribers");
                return;
            }
        };

        let Some(alert) = compose_answer_alert(
            &context.title,
            &context.slug,
            context.course_id,
            context.professor_id,
            &self.base_url,
            &subscribers,
            author_id,
        ) else {
            return;
        };

        match self.dispatcher.send(&alert).await {
            Ok(report) => {
                info!(%question_id, recipients = report.recipients, "new-answer alert dispatched");
            }
            Err(err) => {
                warn!(%question_id, error = %err, "new-answer alert dispatch failed");
            }
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Answer> {
        let answer = sqlx::query_as::<_, Answer>(
            r#"
            SELECT id, question_id, text, user_id, hidden, hidden_by, created_at
            FROM answers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        answer.ok_or_else(|| Error::NotFound("Answer not found".to_string()))
    }

    pub async fn list_for_question(
        &self,
        question_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Vec<AnswerWithMeta>> {
        let answers = sqlx::query_as::<_, AnswerWithMeta>(
            r#"
            SELECT
                a.id, a.question_id, a.text, a.user_id, a.hidden, a.hidden_by,
                a.created_at,
                u.username,
                COALESCE(v.votes, 0)::BIGINT AS votes,
                COALESCE(v.likes, 0) AS likes,
                COALESCE(v.unlikes, 0) AS unlikes,
                COALESCE(cv.value, 0) AS current_user_vote
            FROM answers a
            JOIN users u ON u.id = a.user_id
            LEFT JOIN (
                SELECT answer_id,
                       SUM(value) AS votes,
                       COUNT(*) FILTER (WHERE value > 0) AS likes,
                       COUNT(*) FILTER (WHERE value < 0) AS unlikes
                FROM answer_votes
                GROUP BY answer_id
            ) v ON v.answer_id = a.id
            LEFT JOIN answer_votes cv ON cv.answer_id = a.id AND cv.user_id = $2
            WHERE a.question_id = $1
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(question_id)
        .bind(viewer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }
}
