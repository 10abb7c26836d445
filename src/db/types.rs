use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "courselevel", rename_all = "lowercase")]
pub(crate) enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questiontype", rename_all = "snake_case")]
pub(crate) enum QuestionType {
    SingleChoice,
    TrueFalse,
    FreeText,
}
