use sqlx::PgPool;

use crate::db::models::Category;

const COLUMNS: &str = "id, name, description, icon_url, color, is_active, created_at";

pub(crate) async fn list_active(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "SELECT {COLUMNS} FROM categories WHERE is_active = TRUE ORDER BY name"
    ))
    .fetch_all(pool)
    .await
}
