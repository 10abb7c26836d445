use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) external_uid: String,
    pub(crate) email: String,
    pub(crate) display_name: Option<String>,
    pub(crate) profile_image_url: Option<String>,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: crate::db::models::User) -> Self {
        Self {
            id: user.id,
            external_uid: user.external_uid,
            email: user.email,
            display_name: user.display_name,
            profile_image_url: user.profile_image_url,
            created_at: format_primitive(user.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileUpdate {
    #[serde(default)]
    pub(crate) display_name: Option<String>,
}
