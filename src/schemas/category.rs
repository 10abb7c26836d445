use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct CategoryResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) icon_url: Option<String>,
    pub(crate) color: Option<String>,
}

impl CategoryResponse {
    pub(crate) fn from_db(category: crate::db::models::Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            icon_url: category.icon_url,
            color: category.color,
        }
    }
}
