use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::{require_enrollment, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::CourseLevel;
use crate::repositories;
use crate::repositories::courses::{CourseFilters, CourseSort};
use crate::schemas::course::{CourseResponse, EnrollRequest, EnrollResponse};
use crate::schemas::lesson::LessonResponse;
use crate::schemas::quiz::QuizResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses))
        .route("/featured", get(list_featured_courses))
        .route("/popular", get(list_popular_courses))
        .route("/enroll", post(enroll_course))
        .route("/:course_id", get(get_course_detail))
        .route("/:course_id/lessons", get(list_course_lessons))
        .route("/:course_id/quizzes", get(list_course_quizzes))
}

#[derive(Debug, Deserialize)]
struct ListCoursesQuery {
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    level: Option<CourseLevel>,
    #[serde(default)]
    is_free: Option<bool>,
    #[serde(default)]
    min_rating: Option<f64>,
    #[serde(default)]
    sort_by: CourseSort,
}

async fn list_courses(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ListCoursesQuery>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list_for_user(
        state.db(),
        &user.id,
        CourseFilters {
            category_id: query.category_id,
            search: query.search,
            level: query.level,
            is_free: query.is_free,
            min_rating: query.min_rating,
            sort: query.sort_by,
        },
    )
    .await
    .map_err(|e| ApiError::store(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_view).collect()))
}

async fn list_featured_courses(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list_featured_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to list featured courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_view).collect()))
}

async fn list_popular_courses(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list_popular_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to list popular courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_view).collect()))
}

async fn get_course_detail(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = repositories::courses::find_for_user(state.db(), &user.id, &course_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    Ok(Json(CourseResponse::from_view(course)))
}

async fn enroll_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<EnrollResponse>), ApiError> {
    let course = repositories::courses::find_active_by_id(state.db(), &payload.course_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let created =
        repositories::enrollments::enroll(state.db(), &user.id, &course.id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::store(e, "Failed to enroll"))?;

    if !created {
        return Err(ApiError::Conflict("Already enrolled in this course".to_string()));
    }

    tracing::info!(user_id = %user.id, course_id = %course.id, "User enrolled in course");

    Ok((
        StatusCode::CREATED,
        Json(EnrollResponse {
            message: "Successfully enrolled in course".to_string(),
            course_id: course.id,
        }),
    ))
}

async fn list_course_lessons(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<LessonResponse>>, ApiError> {
    require_enrollment(&state, &user, &course_id).await?;

    let lessons =
        repositories::lessons::list_for_course_with_progress(state.db(), &user.id, &course_id)
            .await
            .map_err(|e| ApiError::store(e, "Failed to list lessons"))?;

    Ok(Json(lessons.into_iter().map(LessonResponse::from_view).collect()))
}

async fn list_course_quizzes(
    Path(course_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuizResponse>>, ApiError> {
    let quizzes =
        repositories::quizzes::list_by_course_with_stats(state.db(), &user.id, &course_id)
            .await
            .map_err(|e| ApiError::store(e, "Failed to list quizzes"))?;

    Ok(Json(quizzes.into_iter().map(QuizResponse::from_view).collect()))
}

#[cfg(test)]
mod tests;
