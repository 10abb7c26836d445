use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::repositories::lessons::LessonWatchView;

#[derive(Debug, Serialize)]
pub(crate) struct LessonResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) video_url: Option<String>,
    pub(crate) duration_seconds: Option<i32>,
    pub(crate) order_index: i32,
    pub(crate) is_preview: bool,
    pub(crate) is_watched: bool,
    pub(crate) watched_duration_seconds: i32,
}

impl LessonResponse {
    pub(crate) fn from_view(view: LessonWatchView) -> Self {
        Self {
            id: view.id,
            course_id: view.course_id,
            title: view.title,
            description: view.description,
            video_url: view.video_url,
            duration_seconds: view.duration_seconds,
            order_index: view.order_index,
            is_preview: view.is_preview,
            is_watched: view.is_watched,
            watched_duration_seconds: view.watched_duration_seconds,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProgressUpdateRequest {
    pub(crate) lesson_id: String,
    #[validate(range(min = 0, message = "watched_duration_seconds must be non-negative"))]
    pub(crate) watched_duration_seconds: i32,
    #[serde(default)]
    pub(crate) is_completed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressUpdateResponse {
    pub(crate) message: String,
    pub(crate) progress_percentage: f64,
}
