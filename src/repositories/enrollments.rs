use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::Enrollment;
use crate::db::types::CourseLevel;

const COLUMNS: &str = "id, user_id, course_id, progress_percentage, enrolled_at, is_active";

/// An active enrollment joined with its course for "my courses" listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct EnrolledCourseView {
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) category_id: Option<String>,
    pub(crate) category_name: Option<String>,
    pub(crate) instructor_name: Option<String>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) level: Option<CourseLevel>,
    pub(crate) price: f64,
    pub(crate) is_free: bool,
    pub(crate) rating: f64,
    pub(crate) total_ratings: i32,
    pub(crate) total_enrollments: i64,
    pub(crate) course_url: Option<String>,
    pub(crate) progress_percentage: f64,
    pub(crate) enrolled_at: time::PrimitiveDateTime,
}

/// Create an enrollment and bump the course's enrollment counter in one
/// transaction. Returns `false` when an active enrollment already exists;
/// uniqueness is enforced by the partial unique index, so two racing calls
/// cannot both insert.
pub(crate) async fn enroll(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO enrollments (id, user_id, course_id, progress_percentage, enrolled_at, is_active)
         VALUES ($1,$2,$3,0,$4,TRUE)
         ON CONFLICT (user_id, course_id) WHERE is_active DO NOTHING",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(course_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("UPDATE courses SET total_enrollments = total_enrollments + 1 WHERE id = $1")
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<EnrolledCourseView>, sqlx::Error> {
    sqlx::query_as::<_, EnrolledCourseView>(
        "SELECT c.id AS course_id, c.title, c.description, c.thumbnail_url, c.category_id,
                cat.name AS category_name, c.instructor_name, c.duration_minutes,
                c.level, c.price, c.is_free, c.rating, c.total_ratings,
                c.total_enrollments, c.course_url,
                e.progress_percentage, e.enrolled_at
         FROM enrollments e
         JOIN courses c ON c.id = e.course_id
         LEFT JOIN categories cat ON cat.id = c.category_id
         WHERE e.user_id = $1 AND e.is_active = TRUE AND c.is_active = TRUE
         ORDER BY e.enrolled_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_active_for_user_course(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    course_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments
         WHERE user_id = $1 AND course_id = $2 AND is_active = TRUE"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn has_active_for_quiz(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    quiz_id: &str,
) -> Result<bool, sqlx::Error> {
    let found: Option<String> = sqlx::query_scalar(
        "SELECT e.id
         FROM enrollments e
         JOIN quizzes q ON q.course_id = e.course_id
         WHERE q.id = $1 AND e.user_id = $2 AND e.is_active = TRUE",
    )
    .bind(quiz_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(found.is_some())
}
