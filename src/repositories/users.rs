use sqlx::PgPool;

use crate::db::models::User;

const COLUMNS: &str = "\
    id, external_uid, email, display_name, profile_image_url, created_at, updated_at";

pub(crate) struct UpsertUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) external_uid: &'a str,
    pub(crate) email: &'a str,
    pub(crate) display_name: Option<&'a str>,
    pub(crate) now: time::PrimitiveDateTime,
}

/// Resolve the local user row for a verified external identity, creating it
/// on first sight. Single conditional write so concurrent first requests for
/// the same identity cannot race a check-then-insert.
pub(crate) async fn upsert_from_identity(
    pool: &PgPool,
    params: UpsertUser<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, external_uid, email, display_name, profile_image_url, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,NULL,$5,$5)
        ON CONFLICT (external_uid) DO UPDATE SET external_uid = EXCLUDED.external_uid
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.external_uid)
    .bind(params.email)
    .bind(params.display_name)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn update_display_name(
    pool: &PgPool,
    id: &str,
    display_name: Option<&str>,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET
            display_name = COALESCE($1, display_name),
            updated_at = $2
         WHERE id = $3",
    )
    .bind(display_name)
    .bind(updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}
