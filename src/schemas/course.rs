use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::types::CourseLevel;
use crate::repositories::courses::CourseView;
use crate::repositories::enrollments::EnrolledCourseView;

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) enrolled_at: Option<String>,
}

impl CourseResponse {
    pub(crate) fn from_view(view: CourseView) -> Self {
        Self {
            id: view.id,
            title: view.title,
            description: view.description,
            thumbnail_url: view.thumbnail_url,
            category_id: view.category_id,
            category_name: view.category_name,
            instructor_name: view.instructor_name,
            duration_minutes: view.duration_minutes,
            level: view.level,
            price: view.price,
            is_free: view.is_free,
            rating: view.rating,
            total_ratings: view.total_ratings,
            total_enrollments: view.total_enrollments,
            course_url: view.course_url,
            is_enrolled: view.is_enrolled,
            progress_percentage: view.progress_percentage,
            enrolled_at: None,
        }
    }

    pub(crate) fn from_enrolled(view: EnrolledCourseView) -> Self {
        Self {
            id: view.course_id,
            title: view.title,
            description: view.description,
            thumbnail_url: view.thumbnail_url,
            category_id: view.category_id,
            category_name: view.category_name,
            instructor_name: view.instructor_name,
            duration_minutes: view.duration_minutes,
            level: view.level,
            price: view.price,
            is_free: view.is_free,
            rating: view.rating,
            total_ratings: view.total_ratings,
            total_enrollments: view.total_enrollments,
            course_url: view.course_url,
            is_enrolled: true,
            progress_percentage: view.progress_percentage,
            enrolled_at: Some(format_primitive(view.enrolled_at)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollRequest {
    pub(crate) course_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollResponse {
    pub(crate) message: String,
    pub(crate) course_id: String,
}
