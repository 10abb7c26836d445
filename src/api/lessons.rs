use axum::{extract::State, routing::post, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::lesson::{ProgressUpdateRequest, ProgressUpdateResponse};
use crate::services::progress;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/progress", post(update_progress))
}

/// Upsert the caller's watch state for one lesson and recompute the
/// enrollment's completion percentage. Both writes commit together so a
/// concurrent reader never sees new lesson state with a stale percentage.
async fn update_progress(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ProgressUpdateRequest>,
) -> Result<Json<ProgressUpdateResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::store(e, "Failed to start transaction"))?;

    let lesson = repositories::lessons::find_active_by_id(&mut *tx, &payload.lesson_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to fetch lesson"))?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    let enrollment = repositories::enrollments::find_active_for_user_course(
        &mut *tx,
        &user.id,
        &lesson.course_id,
    )
    .await
    .map_err(|e| ApiError::store(e, "Failed to fetch enrollment"))?;

    if enrollment.is_none() {
        return Err(ApiError::Forbidden("Not enrolled in this course"));
    }

    repositories::lesson_progress::upsert(
        &mut *tx,
        repositories::lesson_progress::RecordProgress {
            user_id: &user.id,
            lesson_id: &lesson.id,
            watched_duration_seconds: payload.watched_duration_seconds,
            is_completed: payload.is_completed,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::store(e, "Failed to record progress"))?;

    let (completed, total) = repositories::lesson_progress::count_course_lessons(
        &mut *tx,
        &user.id,
        &lesson.course_id,
    )
    .await
    .map_err(|e| ApiError::store(e, "Failed to count lesson progress"))?;

    let progress_percentage = progress::completion_percentage(completed, total);

    repositories::lesson_progress::set_enrollment_progress(
        &mut *tx,
        &user.id,
        &lesson.course_id,
        progress_percentage,
    )
    .await
    .map_err(|e| ApiError::store(e, "Failed to update enrollment progress"))?;

    tx.commit().await.map_err(|e| ApiError::store(e, "Failed to commit transaction"))?;

    Ok(Json(ProgressUpdateResponse {
        message: "Progress updated successfully".to_string(),
        progress_percentage,
    }))
}
