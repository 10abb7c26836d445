use std::collections::HashMap;

use sqlx::PgPool;

use crate::db::models::{Question, Quiz};
use crate::db::types::QuestionType;

const COLUMNS: &str = "\
    id, course_id, lesson_id, title, description, total_questions, \
    time_limit_minutes, passing_score_percentage, attempts_allowed, \
    is_active, created_at";

/// A quiz joined with one user's attempt aggregates.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct QuizStatsView {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) lesson_id: Option<String>,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) total_questions: i32,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) passing_score_percentage: f64,
    pub(crate) attempts_allowed: i32,
    pub(crate) user_attempts: i64,
    pub(crate) best_score: Option<f64>,
    pub(crate) best_passed: bool,
}

/// An answer option as exposed to quiz takers. The correctness bit stays in
/// the store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PublicOption {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) option_text: String,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone)]
pub(crate) struct QuestionView {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) question_type: QuestionType,
    pub(crate) points: i32,
    pub(crate) order_index: i32,
    pub(crate) options: Vec<PublicOption>,
}

pub(crate) async fn list_by_course_with_stats(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<Vec<QuizStatsView>, sqlx::Error> {
    sqlx::query_as::<_, QuizStatsView>(
        "SELECT q.id, q.course_id, q.lesson_id, q.title, q.description,
                q.total_questions, q.time_limit_minutes, q.passing_score_percentage,
                q.attempts_allowed,
                COALESCE(stats.user_attempts, 0) AS user_attempts,
                stats.best_score,
                COALESCE(stats.best_passed, FALSE) AS best_passed
         FROM quizzes q
         LEFT JOIN (
             SELECT quiz_id,
                    COUNT(*) AS user_attempts,
                    MAX(score_percentage) AS best_score,
                    BOOL_OR(is_passed) AS best_passed
             FROM quiz_attempts
             WHERE user_id = $1
             GROUP BY quiz_id
         ) stats ON stats.quiz_id = q.id
         WHERE q.course_id = $2 AND q.is_active = TRUE
         ORDER BY q.created_at",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_active_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {COLUMNS} FROM quizzes WHERE id = $1 AND is_active = TRUE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_questions_with_options(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<QuestionView>, sqlx::Error> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, quiz_id, question_text, question_type, points, order_index, is_active
         FROM questions
         WHERE quiz_id = $1 AND is_active = TRUE
         ORDER BY order_index",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    let question_ids = questions.iter().map(|question| question.id.clone()).collect::<Vec<_>>();

    let option_rows = if question_ids.is_empty() {
        Vec::new()
    } else {
        sqlx::query_as::<_, PublicOption>(
            "SELECT id, question_id, option_text, order_index
             FROM answer_options
             WHERE question_id = ANY($1)
             ORDER BY order_index",
        )
        .bind(&question_ids)
        .fetch_all(pool)
        .await?
    };

    let mut options_by_question: HashMap<String, Vec<PublicOption>> = HashMap::new();
    for option in option_rows {
        options_by_question.entry(option.question_id.clone()).or_default().push(option);
    }

    let mut output = Vec::with_capacity(questions.len());
    for question in questions {
        output.push(QuestionView {
            options: options_by_question.remove(&question.id).unwrap_or_default(),
            id: question.id,
            question_text: question.question_text,
            question_type: question.question_type,
            points: question.points,
            order_index: question.order_index,
        });
    }

    Ok(output)
}
