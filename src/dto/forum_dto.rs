use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::hidden_to_user;
use crate::models::subscription::QuestionSubscription;
use crate::models::vote::{AnswerVote, QuestionVote};
use crate::services::answer_service::AnswerWithMeta;
use crate::services::question_service::{QuestionList, QuestionWithMeta};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuestionPayload {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub text: String,
    pub course_id: Uuid,
    pub lesson_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateQuestionPayload {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAnswerPayload {
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignateCorrectAnswerPayload {
    pub answer_id: Uuid,
}

/// Write path for votes: the server fills user and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastVotePayload {
    pub value: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HideQuestionPayload {
    #[validate(length(min = 1))]
    pub justification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QuestionListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub course_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub id: Uuid,
    pub question: Uuid,
    pub text: String,
    pub votes: i64,
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub current_user_vote: i32,
    pub likes: i64,
    pub unlikes: i64,
    pub hidden: bool,
    pub hidden_by: Option<Uuid>,
    pub user_id: Uuid,
}

impl From<AnswerWithMeta> for AnswerResponse {
    fn from(value: AnswerWithMeta) -> Self {
        Self {
            id: value.id,
            question: value.question_id,
            text: value.text,
            votes: value.votes,
            timestamp: value.created_at,
            username: value.username,
            current_user_vote: value.current_user_vote,
            likes: value.likes,
            unlikes: value.unlikes,
            hidden: value.hidden,
            hidden_by: value.hidden_by,
            user_id: value.user_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub title: String,
    pub course: Uuid,
    pub answers: Vec<AnswerResponse>,
    pub text: String,
    pub slug: String,
    pub user_id: Uuid,
    pub votes: i64,
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub hidden: bool,
    pub likes: i64,
    pub unlikes: i64,
    pub hidden_by: Option<Uuid>,
    pub hidden_to_user: bool,
    pub moderator: bool,
    pub hidden_justification: Option<String>,
    pub visualizations: i64,
}

impl QuestionResponse {
    pub fn from_parts(
        question: QuestionWithMeta,
        answers: Vec<AnswerWithMeta>,
        viewer_id: Uuid,
        viewer_is_moderator: bool,
    ) -> Self {
        Self {
            id: question.id,
            title: question.title,
            course: question.course_id,
            answers: answers.into_iter().map(Into::into).collect(),
            text: question.text,
            slug: question.slug,
            user_id: question.user_id,
            votes: question.votes,
            timestamp: question.created_at,
            username: question.username,
            hidden: question.hidden,
            likes: question.likes,
            unlikes: question.unlikes,
            hidden_by: question.hidden_by,
            hidden_to_user: hidden_to_user(
                question.hidden,
                question.user_id,
                viewer_id,
                viewer_is_moderator,
            ),
            moderator: viewer_is_moderator,
            hidden_justification: question.hidden_justification,
            visualizations: question.visualizations,
        }
    }
}

/// List rows drop the nested answers, everything else matches the detail
/// shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: Uuid,
    pub title: String,
    pub course: Uuid,
    pub text: String,
    pub slug: String,
    pub user_id: Uuid,
    pub votes: i64,
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub hidden: bool,
    pub likes: i64,
    pub unlikes: i64,
    pub hidden_by: Option<Uuid>,
    pub hidden_to_user: bool,
    pub moderator: bool,
    pub hidden_justification: Option<String>,
    pub visualizations: i64,
}

impl QuestionSummary {
    pub fn from_meta(
        question: QuestionWithMeta,
        viewer_id: Uuid,
        viewer_is_moderator: bool,
    ) -> Self {
        Self {
            id: question.id,
            title: question.title,
            course: question.course_id,
            text: question.text,
            slug: question.slug,
            user_id: question.user_id,
            votes: question.votes,
            timestamp: question.created_at,
            username: question.username,
            hidden: question.hidden,
            likes: question.likes,
            unlikes: question.unlikes,
            hidden_by: question.hidden_by,
            hidden_to_user: hidden_to_user(
                question.hidden,
                question.user_id,
                viewer_id,
                viewer_is_moderator,
            ),
            moderator: viewer_is_moderator,
            hidden_justification: question.hidden_justification,
            visualizations: question.visualizations,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionListResponse {
    pub items: Vec<QuestionSummary>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl QuestionListResponse {
    pub fn from_list(list: QuestionList, viewer_id: Uuid, viewer_is_moderator: bool) -> Self {
        Self {
            items: list
                .items
                .into_iter()
                .map(|q| QuestionSummary::from_meta(q, viewer_id, viewer_is_moderator))
                .collect(),
            total: list.total,
            page: list.page,
            per_page: list.per_page,
            total_pages: list.total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionVoteResponse {
    pub question: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user: Uuid,
    pub value: i32,
}

impl From<QuestionVote> for QuestionVoteResponse {
    fn from(value: QuestionVote) -> Self {
        Self {
            question: value.question_id,
            timestamp: value.updated_at,
            user: value.user_id,
            value: value.value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerVoteResponse {
    pub id: Uuid,
    pub answer: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user: Uuid,
    pub value: i32,
}

impl From<AnswerVote> for AnswerVoteResponse {
    fn from(value: AnswerVote) -> Self {
        Self {
            id: value.id,
            answer: value.answer_id,
            timestamp: value.updated_at,
            user: value.user_id,
            value: value.value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub question: Uuid,
}

impl From<QuestionSubscription> for SubscriptionResponse {
    fn from(value: QuestionSubscription) -> Self {
        Self {
            id: value.id,
            user: value.user_id,
            question: value.question_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberResponse {
    pub user_id: Uuid,
    pub username: String,
}
