mod common;

use axum::http::StatusCode;
use common::{
    TestUser, create_test_class, create_test_subject, create_test_user, send, setup_test_app,
    token_for,
};
use schoolhub::schoolhub_auth::UserRole;
use serde_json::{Value, json};
use sqlx::PgPool;

async fn create_exam(app: &axum::Router, teacher: &TestUser, pool: &PgPool, max_marks: f64) -> String {
    let class_id = create_test_class(pool, teacher.id, 30).await;
    let subject_id = create_test_subject(pool, class_id, teacher.id, "MATH").await;

    let (status, body) = send(
        app,
        "POST",
        "/api/exams",
        Some(&token_for(teacher)),
        Some(json!({
            "title": "Midterm",
            "class_id": class_id,
            "subject_id": subject_id,
            "exam_date": "2024-06-01T09:00:00Z",
            "max_marks": max_marks,
            "duration": 90,
            "exam_type": "MIDTERM"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn grade(
    app: &axum::Router,
    teacher: &TestUser,
    exam_id: &str,
    student: &TestUser,
    marks: f64,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/grades",
        Some(&token_for(teacher)),
        Some(json!({ "exam_id": exam_id, "student_id": student.id, "marks": marks })),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_letter_grade_is_derived(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let top = create_test_user(&pool, UserRole::Student).await;
    let middling = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone());
    let exam_id = create_exam(&app, &teacher, &pool, 100.0).await;

    let (status, body) = grade(&app, &teacher, &exam_id, &top, 95.0).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["grade"], "A+");
    assert_eq!(body["graded_by"], teacher.id.to_string());

    let (status, body) = grade(&app, &teacher, &exam_id, &middling, 52.0).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["grade"], "C-");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_marks_above_maximum_are_rejected(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone());
    let exam_id = create_exam(&app, &teacher, &pool, 50.0).await;

    let (status, body) = grade(&app, &teacher, &exam_id, &student, 51.0).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Marks cannot exceed the exam maximum of 50");

    let stored: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM grades WHERE exam_id = $1 AND student_id = $2")
            .bind(uuid::Uuid::parse_str(&exam_id).unwrap())
            .bind(student.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_second_grade_for_same_exam_is_rejected(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone());
    let exam_id = create_exam(&app, &teacher, &pool, 100.0).await;

    grade(&app, &teacher, &exam_id, &student, 70.0).await;
    let (status, body) = grade(&app, &teacher, &exam_id, &student, 80.0).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Grade already exists for this student in this exam");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_students_cannot_grade(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone());
    let exam_id = create_exam(&app, &teacher, &pool, 100.0).await;

    let (status, _) = grade(&app, &student, &exam_id, &student, 100.0).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_updating_marks_rederives_letter(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone());
    let exam_id = create_exam(&app, &teacher, &pool, 100.0).await;

    let (_, created) = grade(&app, &teacher, &exam_id, &student, 40.0).await;
    assert_eq!(created["grade"], "F");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/grades/{}", created["id"].as_str().unwrap()),
        Some(&token_for(&teacher)),
        Some(json!({ "marks": 86.0 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["grade"], "A");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_report_totals(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool.clone());
    let exam_id = create_exam(&app, &teacher, &pool, 100.0).await;
    grade(&app, &teacher, &exam_id, &student, 75.0).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/grades/students/{}/report", student.id),
        Some(&token_for(&student)),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_marks"], 75.0);
    assert_eq!(body["total_max_marks"], 100.0);
    assert_eq!(body["overall_grade"], "B+");
    assert_eq!(body["grades"].as_array().unwrap().len(), 1);
}
