use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::core::time::primitive_now_utc;
use crate::db::models::{AnswerOption, Course, Question, Quiz};
use crate::repositories;
use crate::test_support;

struct QuizFixture {
    course: Course,
    quiz: Quiz,
    question_ten: Question,
    ten_correct: AnswerOption,
    ten_wrong: AnswerOption,
    question_twenty: Question,
    twenty_correct: AnswerOption,
    twenty_wrong: AnswerOption,
}

/// Two questions worth 10 and 20 points, passing threshold 60%.
async fn setup_quiz(ctx: &test_support::TestContext, attempts_allowed: i32) -> QuizFixture {
    let course = test_support::insert_course(ctx.state.db(), "Quiz Course", None).await;
    let quiz =
        test_support::insert_quiz(ctx.state.db(), &course.id, "Checkpoint", 2, 60.0, attempts_allowed)
            .await;

    let question_ten =
        test_support::insert_question(ctx.state.db(), &quiz.id, "Worth ten", 10, 1).await;
    let ten_correct =
        test_support::insert_option(ctx.state.db(), &question_ten.id, "Right", true, 1).await;
    let ten_wrong =
        test_support::insert_option(ctx.state.db(), &question_ten.id, "Wrong", false, 2).await;

    let question_twenty =
        test_support::insert_question(ctx.state.db(), &quiz.id, "Worth twenty", 20, 2).await;
    let twenty_correct =
        test_support::insert_option(ctx.state.db(), &question_twenty.id, "Right", true, 1).await;
    let twenty_wrong =
        test_support::insert_option(ctx.state.db(), &question_twenty.id, "Wrong", false, 2).await;

    QuizFixture {
        course,
        quiz,
        question_ten,
        ten_correct,
        ten_wrong,
        question_twenty,
        twenty_correct,
        twenty_wrong,
    }
}

async fn enroll(ctx: &test_support::TestContext, external_uid: &str, course_id: &str) -> String {
    let user = test_support::insert_user(ctx.state.db(), external_uid, "Quiz Taker").await;
    let created =
        repositories::enrollments::enroll(ctx.state.db(), &user.id, course_id, primitive_now_utc())
            .await
            .expect("enroll");
    assert!(created);
    user.id
}

#[tokio::test]
async fn partial_credit_passes_above_threshold() {
    let ctx = test_support::setup_test_context().await;
    let fixture = setup_quiz(&ctx, 3).await;
    enroll(&ctx, "quiz-taker-1", &fixture.course.id).await;
    let token = test_support::bearer_token("quiz-taker-1", ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes/submit",
            Some(&token),
            Some(json!({
                "quiz_id": fixture.quiz.id,
                "time_taken_seconds": 90,
                "answers": [
                    {
                        "question_id": fixture.question_ten.id,
                        "selected_option_id": fixture.ten_wrong.id
                    },
                    {
                        "question_id": fixture.question_twenty.id,
                        "selected_option_id": fixture.twenty_correct.id
                    }
                ]
            })),
        ))
        .await
        .expect("submit");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["score_percentage"], json!(66.67));
    assert_eq!(body["correct_answers"], json!(1));
    assert_eq!(body["total_questions"], json!(2));
    assert_eq!(body["is_passed"], json!(true));
    assert_eq!(body["passing_score"], json!(60.0));
}

#[tokio::test]
async fn no_correct_answers_scores_zero_and_fails() {
    let ctx = test_support::setup_test_context().await;
    let fixture = setup_quiz(&ctx, 3).await;
    enroll(&ctx, "quiz-taker-2", &fixture.course.id).await;
    let token = test_support::bearer_token("quiz-taker-2", ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes/submit",
            Some(&token),
            Some(json!({
                "quiz_id": fixture.quiz.id,
                "time_taken_seconds": 45,
                "answers": [
                    { "question_id": fixture.question_ten.id },
                    {
                        "question_id": fixture.question_twenty.id,
                        "selected_option_id": fixture.twenty_wrong.id
                    }
                ]
            })),
        ))
        .await
        .expect("submit");

    let body = test_support::read_json(response).await;
    assert_eq!(body["score_percentage"], json!(0.0));
    assert_eq!(body["correct_answers"], json!(0));
    assert_eq!(body["is_passed"], json!(false));
}

#[tokio::test]
async fn attempts_beyond_the_cap_conflict() {
    let ctx = test_support::setup_test_context().await;
    let fixture = setup_quiz(&ctx, 2).await;
    enroll(&ctx, "quiz-taker-3", &fixture.course.id).await;
    let token = test_support::bearer_token("quiz-taker-3", ctx.state.settings());

    let payload = json!({
        "quiz_id": fixture.quiz.id,
        "time_taken_seconds": 30,
        "answers": [{
            "question_id": fixture.question_ten.id,
            "selected_option_id": fixture.ten_correct.id
        }]
    });

    for _ in 0..2 {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/quizzes/submit",
                Some(&token),
                Some(payload.clone()),
            ))
            .await
            .expect("submit");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes/submit",
            Some(&token),
            Some(payload),
        ))
        .await
        .expect("third submit");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/user/quiz-attempts/{}", fixture.quiz.id),
            Some(&token),
            None,
        ))
        .await
        .expect("list attempts");
    let attempts = test_support::read_json(response).await;
    let attempts = attempts.as_array().expect("array");
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0]["attempt_number"], json!(2));
    assert_eq!(attempts[1]["attempt_number"], json!(1));
    assert!(attempts[0]["completed_at"].is_string());
}

#[tokio::test]
async fn concurrent_submissions_never_exceed_cap() {
    let ctx = test_support::setup_test_context().await;
    let fixture = setup_quiz(&ctx, 2).await;
    enroll(&ctx, "quiz-taker-4", &fixture.course.id).await;
    let token = test_support::bearer_token("quiz-taker-4", ctx.state.settings());

    let payload = json!({
        "quiz_id": fixture.quiz.id,
        "time_taken_seconds": 10,
        "answers": [{
            "question_id": fixture.question_ten.id,
            "selected_option_id": fixture.ten_correct.id
        }]
    });

    let mut handles = Vec::new();
    for _ in 0..5 {
        let app = ctx.app.clone();
        let token = token.clone();
        let payload = payload.clone();
        handles.push(tokio::spawn(async move {
            let response = app
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/quizzes/submit",
                    Some(&token),
                    Some(payload),
                ))
                .await
                .expect("submit");
            response.status()
        }));
    }

    let mut accepted = 0;
    let mut rejected = 0;
    for handle in handles {
        let status = handle.await.expect("join");
        if status == StatusCode::OK {
            accepted += 1;
        } else if status == StatusCode::CONFLICT {
            rejected += 1;
        } else {
            panic!("unexpected status: {status}");
        }
    }
    assert_eq!(accepted, 2);
    assert_eq!(rejected, 3);

    let persisted: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = $1")
            .bind(&fixture.quiz.id)
            .fetch_one(ctx.state.db())
            .await
            .expect("count attempts");
    assert_eq!(persisted, 2);
}

#[tokio::test]
async fn questions_require_active_enrollment() {
    let ctx = test_support::setup_test_context().await;
    let fixture = setup_quiz(&ctx, 3).await;

    let token = test_support::bearer_token("quiz-taker-5", ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/quizzes/{}/questions", fixture.quiz.id),
            Some(&token),
            None,
        ))
        .await
        .expect("list questions");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn question_listing_hides_the_correct_bit() {
    let ctx = test_support::setup_test_context().await;
    let fixture = setup_quiz(&ctx, 3).await;
    enroll(&ctx, "quiz-taker-6", &fixture.course.id).await;
    let token = test_support::bearer_token("quiz-taker-6", ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/quizzes/{}/questions", fixture.quiz.id),
            Some(&token),
            None,
        ))
        .await
        .expect("list questions");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let questions = body.as_array().expect("array");
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["id"], json!(fixture.question_ten.id));

    for question in questions {
        let options = question["options"].as_array().expect("options");
        assert!(!options.is_empty());
        for option in options {
            assert!(option.get("is_correct").is_none(), "correctness leaked: {option}");
            assert!(option["text"].is_string());
        }
    }
}

#[tokio::test]
async fn submitting_to_unknown_quiz_is_not_found() {
    let ctx = test_support::setup_test_context().await;

    let token = test_support::bearer_token("quiz-taker-7", ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes/submit",
            Some(&token),
            Some(json!({
                "quiz_id": "missing-quiz",
                "time_taken_seconds": 5,
                "answers": []
            })),
        ))
        .await
        .expect("submit");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn entries_for_foreign_questions_are_skipped() {
    let ctx = test_support::setup_test_context().await;
    let fixture = setup_quiz(&ctx, 3).await;

    let other_course = test_support::insert_course(ctx.state.db(), "Other Course", None).await;
    let other_quiz =
        test_support::insert_quiz(ctx.state.db(), &other_course.id, "Other", 1, 50.0, 3).await;
    let foreign_question =
        test_support::insert_question(ctx.state.db(), &other_quiz.id, "Foreign", 50, 1).await;

    enroll(&ctx, "quiz-taker-8", &fixture.course.id).await;
    let token = test_support::bearer_token("quiz-taker-8", ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes/submit",
            Some(&token),
            Some(json!({
                "quiz_id": fixture.quiz.id,
                "time_taken_seconds": 20,
                "answers": [
                    {
                        "question_id": fixture.question_ten.id,
                        "selected_option_id": fixture.ten_correct.id
                    },
                    { "question_id": foreign_question.id }
                ]
            })),
        ))
        .await
        .expect("submit");

    let body = test_support::read_json(response).await;
    // the foreign entry contributes nothing to the denominator
    assert_eq!(body["score_percentage"], json!(100.0));
    assert_eq!(body["correct_answers"], json!(1));

    let recorded: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM quiz_answers WHERE attempt_id = $1",
    )
    .bind(body["attempt_id"].as_str().expect("attempt id"))
    .fetch_one(ctx.state.db())
    .await
    .expect("count answers");
    assert_eq!(recorded, 1);
}

#[tokio::test]
async fn free_text_answers_are_recorded_but_never_graded() {
    let ctx = test_support::setup_test_context().await;
    let fixture = setup_quiz(&ctx, 3).await;
    enroll(&ctx, "quiz-taker-9", &fixture.course.id).await;
    let token = test_support::bearer_token("quiz-taker-9", ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes/submit",
            Some(&token),
            Some(json!({
                "quiz_id": fixture.quiz.id,
                "time_taken_seconds": 15,
                "answers": [{
                    "question_id": fixture.question_ten.id,
                    "answer_text": "a thoughtful essay"
                }]
            })),
        ))
        .await
        .expect("submit");

    let body = test_support::read_json(response).await;
    assert_eq!(body["score_percentage"], json!(0.0));
    assert_eq!(body["correct_answers"], json!(0));

    let (answer_text, is_correct): (Option<String>, bool) = sqlx::query_as(
        "SELECT answer_text, is_correct FROM quiz_answers WHERE attempt_id = $1",
    )
    .bind(body["attempt_id"].as_str().expect("attempt id"))
    .fetch_one(ctx.state.db())
    .await
    .expect("answer row");
    assert_eq!(answer_text.as_deref(), Some("a thoughtful essay"));
    assert!(!is_correct);
}

#[tokio::test]
async fn quiz_listing_aggregates_user_attempts() {
    let ctx = test_support::setup_test_context().await;
    let fixture = setup_quiz(&ctx, 3).await;
    enroll(&ctx, "quiz-taker-10", &fixture.course.id).await;
    let token = test_support::bearer_token("quiz-taker-10", ctx.state.settings());

    let listing = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}/quizzes", fixture.course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("list quizzes");
    let body = test_support::read_json(listing).await;
    assert_eq!(body[0]["user_attempts"], json!(0));
    assert_eq!(body[0]["best_score"], json!(null));
    assert_eq!(body[0]["is_passed"], json!(false));

    let submit = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/quizzes/submit",
            Some(&token),
            Some(json!({
                "quiz_id": fixture.quiz.id,
                "time_taken_seconds": 25,
                "answers": [
                    {
                        "question_id": fixture.question_ten.id,
                        "selected_option_id": fixture.ten_correct.id
                    },
                    {
                        "question_id": fixture.question_twenty.id,
                        "selected_option_id": fixture.twenty_correct.id
                    }
                ]
            })),
        ))
        .await
        .expect("submit");
    assert_eq!(submit.status(), StatusCode::OK);

    let listing = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}/quizzes", fixture.course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("list quizzes again");
    let body = test_support::read_json(listing).await;
    assert_eq!(body[0]["user_attempts"], json!(1));
    assert_eq!(body[0]["best_score"], json!(100.0));
    assert_eq!(body[0]["is_passed"], json!(true));
}
