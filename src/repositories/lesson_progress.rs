use sqlx::PgPool;

use crate::db::models::LessonProgress;

pub(crate) struct RecordProgress<'a> {
    pub(crate) user_id: &'a str,
    pub(crate) lesson_id: &'a str,
    pub(crate) watched_duration_seconds: i32,
    pub(crate) is_completed: bool,
    pub(crate) now: time::PrimitiveDateTime,
}

/// Last write wins per (user, lesson): an existing row is overwritten
/// unconditionally, including a shorter reported duration.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    params: RecordProgress<'_>,
) -> Result<(), sqlx::Error> {
    let completed_at = params.is_completed.then_some(params.now);

    sqlx::query(
        "INSERT INTO lesson_progress (
            user_id, lesson_id, watched_duration_seconds, is_completed,
            completed_at, last_watched_at
        ) VALUES ($1,$2,$3,$4,$5,$6)
        ON CONFLICT (user_id, lesson_id) DO UPDATE SET
            watched_duration_seconds = EXCLUDED.watched_duration_seconds,
            is_completed = EXCLUDED.is_completed,
            completed_at = EXCLUDED.completed_at,
            last_watched_at = EXCLUDED.last_watched_at",
    )
    .bind(params.user_id)
    .bind(params.lesson_id)
    .bind(params.watched_duration_seconds)
    .bind(params.is_completed)
    .bind(completed_at)
    .bind(params.now)
    .execute(executor)
    .await?;

    Ok(())
}

/// Completed and active lesson counts for one (user, course), read in a
/// single statement so the recompute never sees a torn snapshot.
pub(crate) async fn count_course_lessons(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*) FILTER (WHERE COALESCE(lp.is_completed, FALSE)) AS completed,
                COUNT(*) AS total
         FROM lessons l
         LEFT JOIN lesson_progress lp ON lp.lesson_id = l.id AND lp.user_id = $1
         WHERE l.course_id = $2 AND l.is_active = TRUE",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn set_enrollment_progress(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
    progress_percentage: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE enrollments SET progress_percentage = $1
         WHERE user_id = $2 AND course_id = $3 AND is_active = TRUE",
    )
    .bind(progress_percentage)
    .bind(user_id)
    .bind(course_id)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn find_for_user_lesson(
    pool: &PgPool,
    user_id: &str,
    lesson_id: &str,
) -> Result<Option<LessonProgress>, sqlx::Error> {
    sqlx::query_as::<_, LessonProgress>(
        "SELECT user_id, lesson_id, watched_duration_seconds, is_completed,
                completed_at, last_watched_at
         FROM lesson_progress
         WHERE user_id = $1 AND lesson_id = $2",
    )
    .bind(user_id)
    .bind(lesson_id)
    .fetch_optional(pool)
    .await
}
