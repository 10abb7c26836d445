use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::QuizAttempt;
use crate::db::types::QuestionType;
use crate::repositories::quizzes::{PublicOption, QuestionView, QuizStatsView};

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
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
    pub(crate) is_passed: bool,
}

impl QuizResponse {
    pub(crate) fn from_view(view: QuizStatsView) -> Self {
        Self {
            id: view.id,
            course_id: view.course_id,
            lesson_id: view.lesson_id,
            title: view.title,
            description: view.description,
            total_questions: view.total_questions,
            time_limit_minutes: view.time_limit_minutes,
            passing_score_percentage: view.passing_score_percentage,
            attempts_allowed: view.attempts_allowed,
            user_attempts: view.user_attempts,
            best_score: view.best_score,
            is_passed: view.best_passed,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerOptionResponse {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) order_index: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) question_type: QuestionType,
    pub(crate) points: i32,
    pub(crate) order_index: i32,
    pub(crate) options: Vec<AnswerOptionResponse>,
}

impl QuestionResponse {
    pub(crate) fn from_view(view: QuestionView) -> Self {
        Self {
            id: view.id,
            question_text: view.question_text,
            question_type: view.question_type,
            points: view.points,
            order_index: view.order_index,
            options: view.options.into_iter().map(AnswerOptionResponse::from_option).collect(),
        }
    }
}

impl AnswerOptionResponse {
    fn from_option(option: PublicOption) -> Self {
        Self { id: option.id, text: option.option_text, order_index: option.order_index }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerSubmission {
    pub(crate) question_id: String,
    #[serde(default)]
    pub(crate) selected_option_id: Option<String>,
    #[serde(default)]
    pub(crate) answer_text: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmitQuizRequest {
    pub(crate) quiz_id: String,
    pub(crate) answers: Vec<AnswerSubmission>,
    #[validate(range(min = 0, message = "time_taken_seconds must be non-negative"))]
    pub(crate) time_taken_seconds: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResultResponse {
    pub(crate) attempt_id: String,
    pub(crate) score_percentage: f64,
    pub(crate) correct_answers: i32,
    pub(crate) total_questions: i32,
    pub(crate) is_passed: bool,
    pub(crate) passing_score: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) attempt_number: i32,
    pub(crate) score_percentage: f64,
    pub(crate) correct_answers: i32,
    pub(crate) total_questions: i32,
    pub(crate) time_taken_seconds: i32,
    pub(crate) started_at: String,
    pub(crate) completed_at: Option<String>,
    pub(crate) is_passed: bool,
}

impl AttemptResponse {
    pub(crate) fn from_db(attempt: QuizAttempt) -> Self {
        Self {
            id: attempt.id,
            attempt_number: attempt.attempt_number,
            score_percentage: attempt.score_percentage.unwrap_or(0.0),
            correct_answers: attempt.correct_answers,
            total_questions: attempt.total_questions,
            time_taken_seconds: attempt.time_taken_seconds,
            started_at: format_primitive(attempt.started_at),
            completed_at: attempt.completed_at.map(format_primitive),
            is_passed: attempt.is_passed,
        }
    }
}
