use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::core::time::primitive_now_utc;
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::repositories;

/// The authenticated caller. Verifying the bearer credential happens before
/// any store access; the local user row is provisioned lazily via a single
/// upsert keyed on the external identity.
pub(crate) struct CurrentUser(pub(crate) User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_identity_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let fallback_email = format!("{}@unknown.com", claims.sub);
        let email = claims.email.as_deref().unwrap_or(&fallback_email);
        let display_name = claims.name.as_deref().unwrap_or("Unknown User");

        let user = repositories::users::upsert_from_identity(
            app_state.db(),
            repositories::users::UpsertUser {
                id: &Uuid::new_v4().to_string(),
                external_uid: &claims.sub,
                email,
                display_name: Some(display_name),
                now: primitive_now_utc(),
            },
        )
        .await
        .map_err(|e| ApiError::store(e, "Failed to resolve user"))?;

        Ok(CurrentUser(user))
    }
}

pub(crate) async fn require_enrollment(
    state: &AppState,
    user: &User,
    course_id: &str,
) -> Result<(), ApiError> {
    let enrollment = repositories::enrollments::find_active_for_user_course(
        state.db(),
        &user.id,
        course_id,
    )
    .await
    .map_err(|e| ApiError::store(e, "Failed to fetch enrollment"))?;

    if enrollment.is_none() {
        return Err(ApiError::Forbidden("Not enrolled in this course"));
    }

    Ok(())
}
