use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::course::CourseResponse;
use crate::schemas::quiz::AttemptResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/enrollments", get(list_enrollments))
        .route("/quiz-attempts/:quiz_id", get(list_quiz_attempts))
}

async fn list_enrollments(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let enrollments = repositories::enrollments::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to list enrollments"))?;

    Ok(Json(enrollments.into_iter().map(CourseResponse::from_enrolled).collect()))
}

async fn list_quiz_attempts(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AttemptResponse>>, ApiError> {
    let attempts = repositories::quiz_attempts::list_for_user_quiz(state.db(), &user.id, &quiz_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to list attempts"))?;

    Ok(Json(attempts.into_iter().map(AttemptResponse::from_db).collect()))
}
