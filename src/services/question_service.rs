use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::dto::forum_dto::{CreateQuestionPayload, QuestionListQuery, UpdateQuestionPayload};
use crate::error::{Error, Result};
use crate::models::course::Course;
use crate::models::question::Question;
use crate::models::visualization::QuestionVisualization;
use crate::utils::slug::{next_free_slug, slugify};

#[derive(Clone)]
pub struct QuestionService {
    pool: PgPool,
}

/// Question row joined with author name and vote/view aggregates.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuestionWithMeta {
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
    pub username: String,
    pub votes: i64,
    pub likes: i64,
    pub unlikes: i64,
    pub visualizations: i64,
}

pub struct QuestionList {
    pub items: Vec<QuestionWithMeta>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

const QUESTION_WITH_META: &str = r#"
    SELECT
        q.id, q.title, q.text, q.slug, q.user_id, q.correct_answer_id,
        q.course_id, q.lesson_id, q.hidden, q.hidden_by, q.hidden_justification,
        q.created_at,
        u.username,
        COALESCE(v.votes, 0)::BIGINT AS votes,
        COALESCE(v.likes, 0) AS likes,
        COALESCE(v.unlikes, 0) AS unlikes,
        COALESCE(w.visualizations, 0) AS visualizations
    FROM questions q
    JOIN users u ON u.id = q.user_id
    LEFT JOIN (
        SELECT question_id,
               SUM(value) AS votes,
               COUNT(*) FILTER (WHERE value > 0) AS likes,
               COUNT(*) FILTER (WHERE value < 0) AS unlikes
        FROM question_votes
        GROUP BY question_id
    ) v ON v.question_id = q.id
    LEFT JOIN (
        SELECT question_id, COUNT(*) AS visualizations
        FROM question_visualizations
        GROUP BY question_id
    ) w ON w.question_id = q.id
"#;

impl QuestionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, payload: CreateQuestionPayload) -> Result<Question> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT id, name, slug, professor_id, created_at FROM courses WHERE id = $1",
        )
        .bind(payload.course_id)
        .fetch_optional(&self.pool)
        .await?;
        if course.is_none() {
            return Err(Error::NotFound("Course not found".to_string()));
        }

        // Two concurrent creates with the same title can both pick the same
        // free slug; the loser of that race retries with a fresh candidate.
        for _ in 0..3 {
            let slug = self.unique_slug(&payload.title).await?;

            let inserted = sqlx::query_as::<_, Question>(
                r#"
                INSERT INTO questions (id, title, text, slug, user_id, course_id, lesson_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, title, text, slug, user_id, correct_answer_id, course_id,
                          lesson_id, hidden, hidden_by, hidden_justification, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&payload.title)
            .bind(&payload.text)
            .bind(&slug)
            .bind(user_id)
            .bind(payload.course_id)
            .bind(payload.lesson_id)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok(question) => return Ok(question),
                Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(Error::Internal(
            "Could not allocate a unique slug".to_string(),
        ))
    }

    /// Title and text only; the slug stays what the first save derived.
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        payload: UpdateQuestionPayload,
    ) -> Result<Question> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id {
            return Err(Error::Forbidden(
                "Only the author can edit a question".to_string(),
            ));
        }

        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
            SET title = COALESCE($2, title),
                text = COALESCE($3, text)
            WHERE id = $1
            RETURNING id, title, text, slug, user_id, correct_answer_id, course_id,
                      lesson_id, hidden, hidden_by, hidden_justification, created_at
            "#,
        )
        .bind(id)
        .bind(payload.title)
        .bind(payload.text)
        .fetch_one(&self.pool)
        .await?;

        Ok(question)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, title, text, slug, user_id, correct_answer_id, course_id,
                   lesson_id, hidden, hidden_by, hidden_justification, created_at
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        question.ok_or_else(|| Error::NotFound("Question not found".to_string()))
    }

    pub async fn get_with_meta(&self, id: Uuid) -> Result<QuestionWithMeta> {
        let query = format!("{QUESTION_WITH_META} WHERE q.id = $1");
        let question = sqlx::query_as::<_, QuestionWithMeta>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        question.ok_or_else(|| Error::NotFound("Question not found".to_string()))
    }

    /// Paginated course feed. Hidden questions stay listed for moderators
    /// and their own author; everyone else never sees them.
    pub async fn list(
        &self,
        query: QuestionListQuery,
        viewer_id: Uuid,
        viewer_is_moderator: bool,
    ) -> Result<QuestionList> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut filter = String::from("WHERE (NOT q.hidden OR $1 OR q.user_id = $2)");
        if query.course_id.is_some() {
            filter.push_str(" AND q.course_id = $3");
        }

        let items_query = format!(
            "{QUESTION_WITH_META} {filter} ORDER BY q.created_at DESC LIMIT ${} OFFSET ${}",
            if query.course_id.is_some() { 4 } else { 3 },
            if query.course_id.is_some() { 5 } else { 4 },
        );
        let total_query = format!("SELECT COUNT(*) FROM questions q {filter}");

        let mut items_statement = sqlx::query_as::<_, QuestionWithMeta>(&items_query)
            .bind(viewer_is_moderator)
            .bind(viewer_id);
        let mut total_statement = sqlx::query_scalar::<_, i64>(&total_query)
            .bind(viewer_is_moderator)
            .bind(viewer_id);
        if let Some(course_id) = query.course_id {
            items_statement = items_statement.bind(course_id);
            total_statement = total_statement.bind(course_id);
        }
        items_statement = items_statement.bind(per_page).bind(offset);

        let items = items_statement.fetch_all(&self.pool).await?;
        let total = total_statement.fetch_one(&self.pool).await?;
        let total_pages = ((total as f64) / (per_page as f64)).ceil() as i64;

        Ok(QuestionList {
            items,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    /// Appends one visualization row per call. Views are events, not unique
    /// viewers; two views by the same user count twice.
    pub async fn record_view(
        &self,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<QuestionVisualization> {
        let view = sqlx::query_as::<_, QuestionVisualization>(
            r#"
            INSERT INTO question_visualizations (id, question_id, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, question_id, user_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(question_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(view)
    }

    /// At most one correct answer per question; a new designation replaces
    /// the previous one. The answer must belong to the question.
    pub async fn designate_correct_answer(
        &self,
        question_id: Uuid,
        answer_id: Uuid,
    ) -> Result<Question> {
        self.get_by_id(question_id).await?;

        let owning_question =
            sqlx::query_scalar::<_, Uuid>("SELECT question_id FROM answers WHERE id = $1")
                .bind(answer_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| Error::NotFound("Answer not found".to_string()))?;

        if owning_question != question_id {
            return Err(Error::AnswerMismatch);
        }

        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
            SET correct_answer_id = $2
            WHERE id = $1
            RETURNING id, title, text, slug, user_id, correct_answer_id, course_id,
                      lesson_id, hidden, hidden_by, hidden_justification, created_at
            "#,
        )
        .bind(question_id)
        .bind(answer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(question)
    }

    async fn unique_slug(&self, title: &str) -> Result<String> {
        let base = slugify(title);
        if base.is_empty() {
            return Err(Error::BadRequest(
                "Title must contain at least one alphanumeric character".to_string(),
            ));
        }

        let taken = sqlx::query_scalar::<_, String>(
            "SELECT slug FROM questions WHERE slug = $1 OR slug LIKE $1 || '-%'",
        )
        .bind(&base)
        .fetch_all(&self.pool)
        .await?;

        Ok(next_free_slug(&base, &taken))
    }
}
