use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Hide/unhide lifecycle for forum content. Both states are reversible;
/// hiding a question records the actor and a mandatory justification,
/// unhiding clears all three fields.
#[derive(Clone)]
pub struct ModerationService {
    pool: PgPool,
}

impl ModerationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn hide_question(
        &self,
        question_id: Uuid,
        actor_id: Uuid,
        justification: &str,
    ) -> Result<()> {
        if justification.trim().is_empty() {
            return Err(Error::MissingJustification);
        }
        let result = sqlx::query(
            r#"
            UPDATE questions
            SET hidden = TRUE, hidden_by = $2, hidden_justification = $3
            WHERE id = $1
            "#,
        )
        .bind(question_id)
        .bind(actor_id)
        .bind(justification.trim())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Question not found".to_string()));
        }
        Ok(())
    }

    pub async fn unhide_question(&self, question_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE questions
            SET hidden = FALSE, hidden_by = NULL, hidden_justification = NULL
            WHERE id = $1
            "#,
        )
        .bind(question_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Question not found".to_string()));
        }
        Ok(())
    }

    /// Answers carry no justification column; only the actor is recorded.
    pub async fn hide_answer(&self, answer_id: Uuid, actor_id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE answers SET hidden = TRUE, hidden_by = $2 WHERE id = $1")
            .bind(answer_id)
            .bind(actor_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Answer not found".to_string()));
        }
        Ok(())
    }

    pub async fn unhide_answer(&self, answer_id: Uuid) -> Result<()> {
        let result =
            sqlx::query("UPDATE answers SET hidden = FALSE, hidden_by = NULL WHERE id = $1")
                .bind(answer_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Answer not found".to_string()));
        }
        Ok(())
    }
}
