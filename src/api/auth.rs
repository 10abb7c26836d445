use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::user::{ProfileUpdate, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

async fn get_profile(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

async fn update_profile(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    if let Some(display_name) = &payload.display_name {
        if display_name.trim().is_empty() {
            return Err(ApiError::BadRequest("display_name must not be empty".to_string()));
        }
    }

    repositories::users::update_display_name(
        state.db(),
        &user.id,
        payload.display_name.as_deref().map(str::trim),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::store(e, "Failed to update profile"))?;

    let updated = repositories::users::fetch_one_by_id(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to fetch updated profile"))?;

    Ok(Json(UserResponse::from_db(updated)))
}
