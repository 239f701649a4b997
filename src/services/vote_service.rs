use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::vote::{validate_vote_value, AnswerVote, QuestionVote, VoteTarget};

#[derive(Clone)]
pub struct VoteService {
    pool: PgPool,
}

#[derive(Debug, Clone)]
pub enum VoteRecord {
    Question(QuestionVote),
    Answer(AnswerVote),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VoteTotals {
    /// Sum of all vote values; missing votes count as 0.
    pub votes: i64,
    pub likes: i64,
    pub unlikes: i64,
}

impl VoteService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts the caller's vote on the target. (user, target) is a natural
    /// key backed by a composite unique index, so repeated casts update the
    /// existing row in place and refresh its timestamp.
    pub async fn cast(&self, user_id: Uuid, target: VoteTarget, value: i32) -> Result<VoteRecord> {
        validate_vote_value(value)?;
        self.ensure_target_exists(target).await?;

        match target {
            VoteTarget::Question(question_id) => {
                let vote = sqlx::query_as::<_, QuestionVote>(
                    r#"
                    INSERT INTO question_votes (id, question_id, user_id, value)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (question_id, user_id)
                    DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
                    RETURNING id, question_id, user_id, value, updated_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(question_id)
                .bind(user_id)
                .bind(value)
                .fetch_one(&self.pool)
                .await?;
                Ok(VoteRecord::Question(vote))
            }
            VoteTarget::Answer(answer_id) => {
                let vote = sqlx::query_as::<_, AnswerVote>(
                    r#"
                    INSERT INTO answer_votes (id, answer_id, user_id, value)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (answer_id, user_id)
                    DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
                    RETURNING id, answer_id, user_id, value, updated_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(answer_id)
                .bind(user_id)
                .bind(value)
                .fetch_one(&self.pool)
                .await?;
                Ok(VoteRecord::Answer(vote))
            }
        }
    }

    /// Aggregate score and like/unlike buckets for a target in one query.
    /// Zero-valued votes land in neither bucket.
    pub async fn totals(&self, target: VoteTarget) -> Result<VoteTotals> {
        let (table, column) = vote_table(target);
        let query = format!(
            r#"
            SELECT
                COALESCE(SUM(value), 0)::BIGINT,
                COUNT(*) FILTER (WHERE value > 0),
                COUNT(*) FILTER (WHERE value < 0)
            FROM {table}
            WHERE {column} = $1
            "#
        );
        let (votes, likes, unlikes) = sqlx::query_as::<_, (i64, i64, i64)>(&query)
            .bind(target.id())
            .fetch_one(&self.pool)
            .await?;
        Ok(VoteTotals {
            votes,
            likes,
            unlikes,
        })
    }

    /// The caller's own vote value on the target, 0 when they have not voted.
    /// Unlike the original serializer this does not materialize a zero row.
    pub async fn current_value(&self, user_id: Uuid, target: VoteTarget) -> Result<i32> {
        let (table, column) = vote_table(target);
        let query = format!("SELECT value FROM {table} WHERE {column} = $1 AND user_id = $2");
        let value = sqlx::query_scalar::<_, i32>(&query)
            .bind(target.id())
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.unwrap_or(0))
    }

    async fn ensure_target_exists(&self, target: VoteTarget) -> Result<()> {
        let (query, kind) = match target {
            VoteTarget::Question(_) => ("SELECT 1 FROM questions WHERE id = $1", "Question"),
            VoteTarget::Answer(_) => ("SELECT 1 FROM answers WHERE id = $1", "Answer"),
        };
        let found = sqlx::query_scalar::<_, i32>(query)
            .bind(target.id())
            .fetch_optional(&self.pool)
            .await?;
        match found {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(format!("{} not found", kind))),
        }
    }
}

fn vote_table(target: VoteTarget) -> (&'static str, &'static str) {
    match target {
        VoteTarget::Question(_) => ("question_votes", "question_id"),
        VoteTarget::Answer(_) => ("answer_votes", "answer_id"),
    }
}
