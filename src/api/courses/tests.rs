use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::repositories;
use crate::test_support;

#[tokio::test]
async fn enroll_creates_enrollment_and_increments_counter() {
    let ctx = test_support::setup_test_context().await;

    let course = test_support::insert_course(ctx.state.db(), "Rust Basics", None).await;
    let token = test_support::bearer_token("learner-enroll-1", ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/courses/enroll",
            Some(&token),
            Some(json!({ "course_id": course.id })),
        ))
        .await
        .expect("enroll");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["course_id"], json!(course.id));

    let updated = repositories::courses::find_active_by_id(ctx.state.db(), &course.id)
        .await
        .expect("find course")
        .expect("course exists");
    assert_eq!(updated.total_enrollments, 1);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("course detail");
    let detail = test_support::read_json(response).await;
    assert_eq!(detail["is_enrolled"], json!(true));
    assert_eq!(detail["progress_percentage"], json!(0.0));
}

#[tokio::test]
async fn enrolling_twice_conflicts_and_counts_once() {
    let ctx = test_support::setup_test_context().await;

    let course = test_support::insert_course(ctx.state.db(), "Rust Twice", None).await;
    let token = test_support::bearer_token("learner-enroll-2", ctx.state.settings());

    let first = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/courses/enroll",
            Some(&token),
            Some(json!({ "course_id": course.id })),
        ))
        .await
        .expect("first enroll");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/courses/enroll",
            Some(&token),
            Some(json!({ "course_id": course.id })),
        ))
        .await
        .expect("second enroll");
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let enrollment_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE course_id = $1")
            .bind(&course.id)
            .fetch_one(ctx.state.db())
            .await
            .expect("count enrollments");
    assert_eq!(enrollment_count, 1);

    let updated = repositories::courses::find_active_by_id(ctx.state.db(), &course.id)
        .await
        .expect("find course")
        .expect("course exists");
    assert_eq!(updated.total_enrollments, 1);
}

#[tokio::test]
async fn enrolling_in_unknown_course_is_not_found() {
    let ctx = test_support::setup_test_context().await;

    let token = test_support::bearer_token("learner-enroll-3", ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/courses/enroll",
            Some(&token),
            Some(json!({ "course_id": "missing-course" })),
        ))
        .await
        .expect("enroll missing");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lessons_require_active_enrollment() {
    let ctx = test_support::setup_test_context().await;

    let course = test_support::insert_course(ctx.state.db(), "Locked Course", None).await;
    test_support::insert_lesson(ctx.state.db(), &course.id, "Intro", 1).await;

    let token = test_support::bearer_token("learner-lessons-1", ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}/lessons", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("list lessons");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn my_enrollments_are_newest_first() {
    let ctx = test_support::setup_test_context().await;

    let first = test_support::insert_course(ctx.state.db(), "First Course", None).await;
    let second = test_support::insert_course(ctx.state.db(), "Second Course", None).await;
    let token = test_support::bearer_token("learner-list-1", ctx.state.settings());

    for course_id in [&first.id, &second.id] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/courses/enroll",
                Some(&token),
                Some(json!({ "course_id": course_id })),
            ))
            .await
            .expect("enroll");
        assert_eq!(response.status(), StatusCode::CREATED);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/user/enrollments",
            Some(&token),
            None,
        ))
        .await
        .expect("list enrollments");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let listed = body.as_array().expect("array");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], json!(second.id));
    assert_eq!(listed[1]["id"], json!(first.id));
    assert_eq!(listed[0]["is_enrolled"], json!(true));
}

#[tokio::test]
async fn requests_without_credentials_are_unauthorized() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/courses", None, None))
        .await
        .expect("list courses");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
