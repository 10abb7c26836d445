use sqlx::PgPool;

use crate::db::models::{Question, QuizAttempt};

const COLUMNS: &str = "\
    id, user_id, quiz_id, attempt_number, total_questions, score_percentage, \
    correct_answers, time_taken_seconds, started_at, completed_at, is_passed";

/// Serialize the attempt-cap check against other submissions for the same
/// (user, quiz). The lock is released when the surrounding transaction ends.
pub(crate) async fn acquire_user_quiz_lock(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    quiz_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(format!("quiz_attempts:{quiz_id}:{user_id}"))
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn count_for_user_quiz(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    quiz_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE user_id = $1 AND quiz_id = $2")
        .bind(user_id)
        .bind(quiz_id)
        .fetch_one(executor)
        .await
}

pub(crate) struct CreateAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) quiz_id: &'a str,
    pub(crate) attempt_number: i32,
    pub(crate) total_questions: i32,
    pub(crate) time_taken_seconds: i32,
    pub(crate) started_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAttempt<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO quiz_attempts (
            id, user_id, quiz_id, attempt_number, total_questions,
            time_taken_seconds, started_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7)",
    )
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.quiz_id)
    .bind(params.attempt_number)
    .bind(params.total_questions)
    .bind(params.time_taken_seconds)
    .bind(params.started_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Look up a submitted question id within the quiz being graded. Foreign or
/// inactive ids resolve to `None` and the entry is skipped.
pub(crate) async fn find_quiz_question(
    executor: impl sqlx::PgExecutor<'_>,
    quiz_id: &str,
    question_id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        "SELECT id, quiz_id, question_text, question_type, points, order_index, is_active
         FROM questions
         WHERE id = $1 AND quiz_id = $2 AND is_active = TRUE",
    )
    .bind(question_id)
    .bind(quiz_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn option_is_correct(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: &str,
    option_id: &str,
) -> Result<Option<bool>, sqlx::Error> {
    sqlx::query_scalar("SELECT is_correct FROM answer_options WHERE id = $1 AND question_id = $2")
        .bind(option_id)
        .bind(question_id)
        .fetch_optional(executor)
        .await
}

pub(crate) struct CreateAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) attempt_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_option_id: Option<&'a str>,
    pub(crate) answer_text: Option<&'a str>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
}

pub(crate) async fn insert_answer(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAnswer<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO quiz_answers (
            id, attempt_id, question_id, selected_option_id, answer_text,
            is_correct, points_earned
        ) VALUES ($1,$2,$3,$4,$5,$6,$7)",
    )
    .bind(params.id)
    .bind(params.attempt_id)
    .bind(params.question_id)
    .bind(params.selected_option_id)
    .bind(params.answer_text)
    .bind(params.is_correct)
    .bind(params.points_earned)
    .execute(executor)
    .await?;
    Ok(())
}

/// Seal the attempt; a finalized attempt is never updated again.
pub(crate) async fn finalize(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: &str,
    score_percentage: f64,
    correct_answers: i32,
    is_passed: bool,
    completed_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE quiz_attempts
         SET score_percentage = $1, correct_answers = $2, is_passed = $3, completed_at = $4
         WHERE id = $5",
    )
    .bind(score_percentage)
    .bind(correct_answers)
    .bind(is_passed)
    .bind(completed_at)
    .bind(attempt_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_for_user_quiz(
    pool: &PgPool,
    user_id: &str,
    quiz_id: &str,
) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts
         WHERE user_id = $1 AND quiz_id = $2
         ORDER BY attempt_number DESC"
    ))
    .bind(user_id)
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}
