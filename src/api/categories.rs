use axum::{extract::State, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::category::CategoryResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = repositories::categories::list_active(state.db())
        .await
        .map_err(|e| ApiError::store(e, "Failed to list categories"))?;

    Ok(Json(categories.into_iter().map(CategoryResponse::from_db).collect()))
}
