mod common;

use axum::http::StatusCode;
use common::{create_test_class, create_test_user, send, setup_test_app, token_for};
use schoolhub::schoolhub_auth::UserRole;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_mark_attendance_twice_conflicts(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let class_id = create_test_class(&pool, teacher.id, 30).await;
    let app = setup_test_app(pool);
    let token = token_for(&teacher);
    let payload = json!({
        "date": "2024-03-04",
        "class_id": class_id,
        "student_id": student.id,
        "status": "PRESENT"
    });

    let (status, body) = send(&app, "POST", "/api/attendance", Some(&token), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["marked_by"], teacher.id.to_string());

    let (status, body) = send(&app, "POST", "/api/attendance", Some(&token), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Attendance already marked for this student on this date"
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bulk_mark_overwrites_and_summarizes(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let s1 = create_test_user(&pool, UserRole::Student).await;
    let s2 = create_test_user(&pool, UserRole::Student).await;
    let class_id = create_test_class(&pool, teacher.id, 30).await;
    let app = setup_test_app(pool);
    let token = token_for(&teacher);

    let (status, body) = send(
        &app,
        "POST",
        "/api/attendance/bulk",
        Some(&token),
        Some(json!({
            "class_id": class_id,
            "date": "2024-03-04",
            "records": [
                { "student_id": s1.id, "status": "ABSENT" },
                { "student_id": s2.id, "status": "PRESENT" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    send(
        &app,
        "POST",
        "/api/attendance/bulk",
        Some(&token),
        Some(json!({
            "class_id": class_id,
            "date": "2024-03-04",
            "records": [{ "student_id": s1.id, "status": "LATE" }]
        })),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/attendance",
        Some(&token),
        Some(json!({
            "date": "2024-03-05",
            "class_id": class_id,
            "student_id": s1.id,
            "status": "ABSENT"
        })),
    )
    .await;

    let (status, summary) = send(
        &app,
        "GET",
        &format!("/api/attendance/students/{}/summary", s1.id),
        Some(&token_for(&s1)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["late"], 1);
    assert_eq!(summary["absent"], 1);
    assert_eq!(summary["attendance_rate"], 50.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bulk_mark_rejects_repeated_student(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let class_id = create_test_class(&pool, teacher.id, 30).await;
    let app = setup_test_app(pool.clone());

    let (status, _) = send(
        &app,
        "POST",
        "/api/attendance/bulk",
        Some(&token_for(&teacher)),
        Some(json!({
            "class_id": class_id,
            "date": "2024-03-04",
            "records": [
                { "student_id": student.id, "status": "PRESENT" },
                { "student_id": student.id, "status": "ABSENT" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_parents_cannot_mark_attendance(pool: PgPool) {
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let parent = create_test_user(&pool, UserRole::Parent).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    let class_id = create_test_class(&pool, teacher.id, 30).await;
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        "POST",
        "/api/attendance",
        Some(&token_for(&parent)),
        Some(json!({
            "date": "2024-03-04",
            "class_id": class_id,
            "student_id": student.id,
            "status": "PRESENT"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
