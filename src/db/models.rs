use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{CourseLevel, QuestionType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) external_uid: String,
    pub(crate) email: String,
    pub(crate) display_name: Option<String>,
    pub(crate) profile_image_url: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Category {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) icon_url: Option<String>,
    pub(crate) color: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) category_id: Option<String>,
    pub(crate) instructor_name: Option<String>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) level: Option<CourseLevel>,
    pub(crate) price: f64,
    pub(crate) is_free: bool,
    pub(crate) rating: f64,
    pub(crate) total_ratings: i32,
    pub(crate) total_enrollments: i64,
    pub(crate) course_url: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Lesson {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) video_url: Option<String>,
    pub(crate) duration_seconds: Option<i32>,
    pub(crate) order_index: i32,
    pub(crate) is_preview: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) progress_percentage: f64,
    pub(crate) enrolled_at: PrimitiveDateTime,
    pub(crate) is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct LessonProgress {
    pub(crate) user_id: String,
    pub(crate) lesson_id: String,
    pub(crate) watched_duration_seconds: i32,
    pub(crate) is_completed: bool,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) last_watched_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Quiz {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) lesson_id: Option<String>,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) total_questions: i32,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) passing_score_percentage: f64,
    pub(crate) attempts_allowed: i32,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) question_text: String,
    pub(crate) question_type: QuestionType,
    pub(crate) points: i32,
    pub(crate) order_index: i32,
    pub(crate) is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AnswerOption {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) option_text: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizAttempt {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) quiz_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) total_questions: i32,
    pub(crate) score_percentage: Option<f64>,
    pub(crate) correct_answers: i32,
    pub(crate) time_taken_seconds: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) completed_at: Option<PrimitiveDateTime>,
    pub(crate) is_passed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizAnswer {
    pub(crate) id: String,
    pub(crate) attempt_id: String,
    pub(crate) question_id: String,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) answer_text: Option<String>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
}
