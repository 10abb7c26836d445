use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Course;
use crate::db::types::CourseLevel;

const COLUMNS: &str = "\
    id, title, description, thumbnail_url, category_id, instructor_name, \
    duration_minutes, level, price, is_free, rating, total_ratings, \
    total_enrollments, course_url, is_active, created_at, updated_at";

/// A course as seen by one caller: catalog fields joined with the caller's
/// active enrollment state.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct CourseView {
    pub(crate) id: String,
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
    pub(crate) is_enrolled: bool,
    pub(crate) progress_percentage: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum CourseSort {
    #[default]
    Newest,
    Popular,
    Rating,
}

#[derive(Debug, Default)]
pub(crate) struct CourseFilters {
    pub(crate) category_id: Option<String>,
    pub(crate) search: Option<String>,
    pub(crate) level: Option<CourseLevel>,
    pub(crate) is_free: Option<bool>,
    pub(crate) min_rating: Option<f64>,
    pub(crate) sort: CourseSort,
}

const VIEW_SELECT: &str = "\
    SELECT c.id, c.title, c.description, c.thumbnail_url, c.category_id, \
           cat.name AS category_name, c.instructor_name, c.duration_minutes, \
           c.level, c.price, c.is_free, c.rating, c.total_ratings, \
           c.total_enrollments, c.course_url, \
           (e.id IS NOT NULL) AS is_enrolled, \
           COALESCE(e.progress_percentage, 0) AS progress_percentage \
    FROM courses c \
    LEFT JOIN categories cat ON cat.id = c.category_id \
    LEFT JOIN enrollments e ON e.course_id = c.id AND e.is_active AND e.user_id = ";

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
    filters: CourseFilters,
) -> Result<Vec<CourseView>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(VIEW_SELECT);
    builder.push_bind(user_id);
    builder.push(" WHERE c.is_active = TRUE");

    if let Some(category_id) = &filters.category_id {
        builder.push(" AND c.category_id = ");
        builder.push_bind(category_id.clone());
    }

    if let Some(search) = &filters.search {
        let pattern = format!("%{search}%");
        builder.push(" AND (c.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR c.description ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR c.instructor_name ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(level) = filters.level {
        builder.push(" AND c.level = ");
        builder.push_bind(level);
    }

    if let Some(is_free) = filters.is_free {
        builder.push(" AND c.is_free = ");
        builder.push_bind(is_free);
    }

    if let Some(min_rating) = filters.min_rating {
        builder.push(" AND c.rating >= ");
        builder.push_bind(min_rating);
    }

    builder.push(match filters.sort {
        CourseSort::Popular => " ORDER BY c.total_enrollments DESC",
        CourseSort::Rating => " ORDER BY c.rating DESC, c.total_ratings DESC",
        CourseSort::Newest => " ORDER BY c.created_at DESC",
    });

    builder.build_query_as::<CourseView>().fetch_all(pool).await
}

pub(crate) async fn list_featured_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<CourseView>, sqlx::Error> {
    sqlx::query_as::<_, CourseView>(&format!(
        "{VIEW_SELECT}$1 \
         WHERE c.is_active = TRUE AND c.rating >= 4.5 AND c.total_enrollments > 100000 \
         ORDER BY c.rating DESC, c.total_enrollments DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_popular_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<CourseView>, sqlx::Error> {
    sqlx::query_as::<_, CourseView>(&format!(
        "{VIEW_SELECT}$1 \
         WHERE c.is_active = TRUE AND c.total_enrollments > 150000 \
         ORDER BY c.total_enrollments DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_for_user(
    pool: &PgPool,
    user_id: &str,
    course_id: &str,
) -> Result<Option<CourseView>, sqlx::Error> {
    sqlx::query_as::<_, CourseView>(&format!(
        "{VIEW_SELECT}$1 WHERE c.id = $2 AND c.is_active = TRUE"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_active_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE id = $1 AND is_active = TRUE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}
