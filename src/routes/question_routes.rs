use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::forum_dto::{
        AnswerResponse, CastVotePayload, CreateAnswerPayload, CreateQuestionPayload,
        DesignateCorrectAnswerPayload, HideQuestionPayload, QuestionListQuery, QuestionListResponse,
        QuestionResponse, QuestionSummary, QuestionVoteResponse, SubscriberResponse,
        SubscriptionResponse, UpdateQuestionPayload,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    models::vote::VoteTarget,
    services::vote_service::VoteRecord,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/forum/questions",
    responses(
        (status = 201, description = "Question created"),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let question = state
        .question_service
        .create(claims.user_id(), payload)
        .await?;
    let meta = state.question_service.get_with_meta(question.id).await?;
    let response =
        QuestionResponse::from_parts(meta, Vec::new(), claims.user_id(), claims.moderator);
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/forum/questions",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("course_id" = Option<Uuid>, Query, description = "Filter by course")
    ),
    responses(
        (status = 200, description = "Paginated question feed")
    )
)]
#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<QuestionListQuery>,
) -> Result<impl IntoResponse> {
    let list = state
        .question_service
        .list(query, claims.user_id(), claims.moderator)
        .await?;
    Ok(Json(QuestionListResponse::from_list(
        list,
        claims.user_id(),
        claims.moderator,
    )))
}

#[utoipa::path(
    get,
    path = "/api/forum/questions/{id}",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Question with answers and aggregates"),
        (status = 404, description = "Question not found")
    )
)]
#[axum::debug_handler]
pub async fn get_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let meta = state.question_service.get_with_meta(id).await?;
    // Every retrieval is a view event; reloading the page counts again.
    state
        .question_service
        .record_view(id, claims.user_id())
        .await?;
    let answers = state
        .answer_service
        .list_for_question(id, claims.user_id())
        .await?;
    Ok(Json(QuestionResponse::from_parts(
        meta,
        answers,
        claims.user_id(),
        claims.moderator,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/forum/questions/{id}",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Question updated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Question not found")
    )
)]
#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state
        .question_service
        .update(id, claims.user_id(), payload)
        .await?;
    let meta = state.question_service.get_with_meta(id).await?;
    let answers = state
        .answer_service
        .list_for_question(id, claims.user_id())
        .await?;
    Ok(Json(QuestionResponse::from_parts(
        meta,
        answers,
        claims.user_id(),
        claims.moderator,
    )))
}

#[utoipa::path(
    post,
    path = "/api/forum/questions/{id}/answers",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses(
        (status = 201, description = "Answer created; subscriber alert dispatched best-effort"),
        (status = 404, description = "Question not found")
    )
)]
#[axum::debug_handler]
pub async fn create_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateAnswerPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let answer = state
        .answer_service
        .create(id, claims.user_id(), &payload.text)
        .await?;
    let response = AnswerResponse {
        id: answer.id,
        question: answer.question_id,
        text: answer.text,
        votes: 0,
        timestamp: answer.created_at,
        username: claims.username.clone(),
        current_user_vote: 0,
        likes: 0,
        unlikes: 0,
        hidden: answer.hidden,
        hidden_by: answer.hidden_by,
        user_id: answer.user_id,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/forum/questions/{id}/correct-answer",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Correct answer designated"),
        (status = 403, description = "Not the author"),
        (status = 409, description = "Answer belongs to another question")
    )
)]
#[axum::debug_handler]
pub async fn designate_correct_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DesignateCorrectAnswerPayload>,
) -> Result<impl IntoResponse> {
    let question = state.question_service.get_by_id(id).await?;
    if question.user_id != claims.user_id() && !claims.moderator {
        return Err(Error::Forbidden(
            "Only the author can pick the correct answer".to_string(),
        ));
    }
    state
        .question_service
        .designate_correct_answer(id, payload.answer_id)
        .await?;
    let meta = state.question_service.get_with_meta(id).await?;
    Ok(Json(QuestionSummary::from_meta(
        meta,
        claims.user_id(),
        claims.moderator,
    )))
}

#[utoipa::path(
    post,
    path = "/api/forum/questions/{id}/votes",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Vote recorded (upsert per user)"),
        (status = 400, description = "Invalid vote value"),
        (status = 404, description = "Question not found")
    )
)]
#[axum::debug_handler]
pub async fn cast_question_vote(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CastVotePayload>,
) -> Result<impl IntoResponse> {
    let record = state
        .vote_service
        .cast(claims.user_id(), VoteTarget::Question(id), payload.value)
        .await?;
    match record {
        VoteRecord::Question(vote) => Ok(Json(QuestionVoteResponse::from(vote))),
        VoteRecord::Answer(_) => Err(Error::Internal("unexpected vote record kind".to_string())),
    }
}

#[utoipa::path(
    post,
    path = "/api/forum/questions/{id}/subscription",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses(
        (status = 201, description = "Subscribed (idempotent)"),
        (status = 404, description = "Question not found")
    )
)]
#[axum::debug_handler]
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let subscription = state
        .subscription_service
        .subscribe(claims.user_id(), id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::from(subscription)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/forum/questions/{id}/subscriptions",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Subscribers of the question")
    )
)]
#[axum::debug_handler]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let subscribers = state.subscription_service.list_subscribers(id).await?;
    let items: Vec<SubscriberResponse> = subscribers
        .into_iter()
        .map(|s| SubscriberResponse {
            user_id: s.user_id,
            username: s.username,
        })
        .collect();
    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/api/forum/questions/{id}/hide",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses(
        (status = 204, description = "Question hidden"),
        (status = 400, description = "Missing justification"),
        (status = 403, description = "Moderator capability required")
    )
)]
#[axum::debug_handler]
pub async fn hide_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HideQuestionPayload>,
) -> Result<impl IntoResponse> {
    require_moderator(&claims)?;
    state
        .moderation_service
        .hide_question(id, claims.user_id(), &payload.justification)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/forum/questions/{id}/unhide",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses(
        (status = 204, description = "Question visible again"),
        (status = 403, description = "Moderator capability required")
    )
)]
#[axum::debug_handler]
pub async fn unhide_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_moderator(&claims)?;
    state.moderation_service.unhide_question(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn require_moderator(claims: &Claims) -> Result<()> {
    if claims.moderator {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "Moderator capability required".to_string(),
        ))
    }
}
