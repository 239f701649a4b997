use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::forum_dto::{AnswerVoteResponse, CastVotePayload},
    error::{Error, Result},
    middleware::auth::Claims,
    models::vote::VoteTarget,
    routes::question_routes::require_moderator,
    services::vote_service::VoteRecord,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/forum/answers/{id}/votes",
    params(("id" = Uuid, Path, description = "Answer ID")),
    responses(
        (status = 200, description = "Vote recorded (upsert per user)"),
        (status = 400, description = "Invalid vote value"),
        (status = 404, description = "Answer not found")
    )
)]
#[axum::debug_handler]
pub async fn cast_answer_vote(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CastVotePayload>,
) -> Result<impl IntoResponse> {
    let record = state
        .vote_service
        .cast(claims.user_id(), VoteTarget::Answer(id), payload.value)
        .await?;
    match record {
        VoteRecord::Answer(vote) => Ok(Json(AnswerVoteResponse::from(vote))),
        VoteRecord::Question(_) => Err(Error::Internal("unexpected vote record kind".to_string())),
    }
}

#[utoipa::path(
    post,
    path = "/api/forum/answers/{id}/hide",
    params(("id" = Uuid, Path, description = "Answer ID")),
    responses(
        (status = 204, description = "Answer hidden"),
        (status = 403, description = "Moderator capability required")
    )
)]
#[axum::debug_handler]
pub async fn hide_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_moderator(&claims)?;
    state
        .moderation_service
        .hide_answer(id, claims.user_id())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/forum/answers/{id}/unhide",
    params(("id" = Uuid, Path, description = "Answer ID")),
    responses(
        (status = 204, description = "Answer visible again"),
        (status = 403, description = "Moderator capability required")
    )
)]
#[axum::debug_handler]
pub async fn unhide_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    require_moderator(&claims)?;
    state.moderation_service.unhide_answer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
