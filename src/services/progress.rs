use crate::services::grading::round2;

/// Completion ratio of a user's lessons within one course, as a percentage.
/// A course with no active lessons reports zero.
pub(crate) fn completion_percentage(completed_lessons: i64, active_lessons: i64) -> f64 {
    if active_lessons <= 0 {
        return 0.0;
    }
    round2(completed_lessons as f64 / active_lessons as f64 * 100.0)
}
