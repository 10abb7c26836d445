use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::quiz::{QuestionResponse, QuizResultResponse, SubmitQuizRequest};
use crate::services::grading::GradeTally;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/submit", post(submit_quiz))
        .route("/:quiz_id/questions", get(list_quiz_questions))
}

async fn list_quiz_questions(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let has_access = repositories::enrollments::has_active_for_quiz(state.db(), &user.id, &quiz_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to check quiz access"))?;

    if !has_access {
        return Err(ApiError::Forbidden("Access denied"));
    }

    let questions = repositories::quizzes::list_questions_with_options(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to list questions"))?;

    Ok(Json(questions.into_iter().map(QuestionResponse::from_view).collect()))
}

/// Grade a submission and persist the attempt. The whole attempt is one
/// transaction serialized per (user, quiz), so two racing submissions cannot
/// both pass the attempts-cap check, and a failure after the attempt row is
/// created leaves nothing behind.
async fn submit_quiz(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<Json<QuizResultResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::store(e, "Failed to start transaction"))?;

    repositories::quiz_attempts::acquire_user_quiz_lock(&mut *tx, &user.id, &payload.quiz_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to acquire submission lock"))?;

    let quiz = repositories::quizzes::find_active_by_id(&mut *tx, &payload.quiz_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let attempts =
        repositories::quiz_attempts::count_for_user_quiz(&mut *tx, &user.id, &quiz.id)
            .await
            .map_err(|e| ApiError::store(e, "Failed to count attempts"))?;

    if attempts >= quiz.attempts_allowed as i64 {
        return Err(ApiError::Conflict("Maximum attempts reached".to_string()));
    }

    let attempt_id = Uuid::new_v4().to_string();
    repositories::quiz_attempts::create(
        &mut *tx,
        repositories::quiz_attempts::CreateAttempt {
            id: &attempt_id,
            user_id: &user.id,
            quiz_id: &quiz.id,
            attempt_number: (attempts + 1) as i32,
            total_questions: quiz.total_questions,
            time_taken_seconds: payload.time_taken_seconds,
            started_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::store(e, "Failed to create attempt"))?;

    let mut tally = GradeTally::new();

    for answer in &payload.answers {
        // Entries referencing questions outside this quiz are skipped
        let question = repositories::quiz_attempts::find_quiz_question(
            &mut *tx,
            &quiz.id,
            &answer.question_id,
        )
        .await
        .map_err(|e| ApiError::store(e, "Failed to fetch question"))?;

        let Some(question) = question else {
            continue;
        };

        let is_correct = match answer.selected_option_id.as_deref() {
            Some(option_id) => repositories::quiz_attempts::option_is_correct(
                &mut *tx,
                &question.id,
                option_id,
            )
            .await
            .map_err(|e| ApiError::store(e, "Failed to fetch answer option"))?
            .unwrap_or(false),
            // Free-text answers are recorded but never graded
            None => false,
        };

        let points_earned = tally.record(question.points, is_correct);

        repositories::quiz_attempts::insert_answer(
            &mut *tx,
            repositories::quiz_attempts::CreateAnswer {
                id: &Uuid::new_v4().to_string(),
                attempt_id: &attempt_id,
                question_id: &question.id,
                selected_option_id: answer.selected_option_id.as_deref(),
                answer_text: answer.answer_text.as_deref(),
                is_correct,
                points_earned,
            },
        )
        .await
        .map_err(|e| ApiError::store(e, "Failed to record answer"))?;
    }

    let summary = tally.summary(quiz.passing_score_percentage);

    repositories::quiz_attempts::finalize(
        &mut *tx,
        &attempt_id,
        summary.score_percentage,
        summary.correct_answers,
        summary.is_passed,
        now,
    )
    .await
    .map_err(|e| ApiError::store(e, "Failed to finalize attempt"))?;

    tx.commit().await.map_err(|e| ApiError::store(e, "Failed to commit transaction"))?;

    tracing::info!(
        user_id = %user.id,
        quiz_id = %quiz.id,
        attempt_number = attempts + 1,
        score = summary.score_percentage,
        "Quiz attempt completed"
    );

    Ok(Json(QuizResultResponse {
        attempt_id,
        score_percentage: summary.score_percentage,
        correct_answers: summary.correct_answers,
        total_questions: quiz.total_questions,
        is_passed: summary.is_passed,
        passing_score: quiz.passing_score_percentage,
    }))
}

#[cfg(test)]
mod tests;
