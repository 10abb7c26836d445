use sqlx::PgPool;

use crate::db::models::Lesson;

const COLUMNS: &str = "\
    id, course_id, title, description, video_url, duration_seconds, \
    order_index, is_preview, is_active, created_at";

/// A lesson joined with one user's watch state.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct LessonWatchView {
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

pub(crate) async fn list_for_course_with_progress(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<Vec<LessonWatchView>, sqlx::Error> {
    sqlx::query_as::<_, LessonWatchView>(
        "SELECT l.id, l.course_id, l.title, l.description, l.video_url,
                l.duration_seconds, l.order_index, l.is_preview,
                COALESCE(lp.is_completed, FALSE) AS is_watched,
                COALESCE(lp.watched_duration_seconds, 0) AS watched_duration_seconds
         FROM lessons l
         LEFT JOIN lesson_progress lp ON lp.lesson_id = l.id AND lp.user_id = $1
         WHERE l.course_id = $2 AND l.is_active = TRUE
         ORDER BY l.order_index",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_active_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Lesson>, sqlx::Error> {
    sqlx::query_as::<_, Lesson>(&format!(
        "SELECT {COLUMNS} FROM lessons WHERE id = $1 AND is_active = TRUE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}
