mod common;

use axum::http::StatusCode;
use educa_models::Role;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "./migrations")]
async fn test_enrollment_duplicate_and_reactivation(pool: PgPool) {
    let (_, manager) = common::create_user(&pool, Role::Manager).await;
    let (student_id, _) = common::create_user(&pool, Role::Student).await;
    let class_id = common::create_class(&pool, None).await;
    let app = common::app(pool);

    let enroll = || {
        common::json_request(
            "POST",
            "/api/enrollments",
            Some(&manager),
            json!({ "student_id": student_id, "class_id": class_id }),
        )
    };

    let response = app.clone().oneshot(enroll()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let enrollment = common::body_json(response).await;
    let enrollment_id = enrollment["id"].as_str().unwrap().to_string();
    assert_eq!(enrollment["status"], "ATIVA");

    let response = app.clone().oneshot(enroll()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "PATCH",
            &format!("/api/enrollments/{enrollment_id}"),
            Some(&manager),
            json!({ "status": "CANCELADA" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["status"], "CANCELADA");

    // Enrolling again reuses the cancelled row.
    let response = app.clone().oneshot(enroll()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let reactivated = common::body_json(response).await;
    assert_eq!(reactivated["id"], enrollment_id.as_str());
    assert_eq!(reactivated["status"], "ATIVA");

    let response = app
        .oneshot(common::get(
            &format!("/api/enrollments?student_id={student_id}"),
            &manager,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_enrollment_requires_student_role(pool: PgPool) {
    let (_, admin) = common::create_user(&pool, Role::Administrator).await;
    let (teacher_id, _) = common::create_user(&pool, Role::Teacher).await;
    let class_id = common::create_class(&pool, None).await;

    let response = common::app(pool)
        .oneshot(common::json_request(
            "POST",
            "/api/enrollments",
            Some(&admin),
            json!({ "student_id": teacher_id, "class_id": class_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_admin_cannot_delete_own_account(pool: PgPool) {
    let (admin_id, admin) = common::create_user(&pool, Role::Administrator).await;
    let (other_id, _) = common::create_user(&pool, Role::Teacher).await;
    let app = common::app(pool);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "DELETE",
            &format!("/api/users/{admin_id}"),
            Some(&admin),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "DELETE",
            &format!("/api/users/{other_id}"),
            Some(&admin),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(common::get(&format!("/api/users/{admin_id}"), &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_guardian_link_roles_and_idempotency(pool: PgPool) {
    let (_, manager) = common::create_user(&pool, Role::Manager).await;
    let (guardian_id, _) = common::create_user(&pool, Role::Guardian).await;
    let (student_id, _) = common::create_user(&pool, Role::Student).await;
    let (teacher_id, _) = common::create_user(&pool, Role::Teacher).await;
    let app = common::app(pool);

    let link = |guardian: uuid::Uuid, student: uuid::Uuid| {
        common::json_request(
            "POST",
            &format!("/api/users/{guardian}/students"),
            Some(&manager),
            json!({ "student_id": student }),
        )
    };

    // Target is not a student.
    let response = app.clone().oneshot(link(guardian_id, teacher_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Owner is not a guardian.
    let response = app.clone().oneshot(link(teacher_id, student_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for _ in 0..2 {
        let response = app.clone().oneshot(link(guardian_id, student_id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(common::body_json(response).await["id"], student_id.to_string());
    }

    let response = app
        .oneshot(common::get(
            &format!("/api/users/{guardian_id}/students"),
            &manager,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await.as_array().map(Vec::len), Some(1));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_max_score_cannot_drop_below_awarded_score(pool: PgPool) {
    let (teacher_id, teacher) = common::create_user(&pool, Role::Teacher).await;
    let (student_id, student) = common::create_user(&pool, Role::Student).await;
    let class_id = common::create_class(&pool, Some(teacher_id)).await;
    common::enroll(&pool, student_id, class_id).await;
    let task_id = common::create_task(&pool, class_id, 7).await;
    let app = common::app(pool);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/submissions",
            Some(&student),
            json!({ "task_id": task_id, "content": "Resposta" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let submission_id = common::body_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            &format!("/api/submissions/{submission_id}/grade"),
            Some(&teacher),
            json!({ "score": 8.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let task_uri = format!("/api/tasks/{task_id}");
    let response = app
        .clone()
        .oneshot(common::json_request(
            "PATCH",
            &task_uri,
            Some(&teacher),
            json!({ "max_score": 5.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(common::json_request(
            "PATCH",
            &task_uri,
            Some(&teacher),
            json!({ "max_score": 8.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["max_score"], 8.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reply_must_stay_in_its_topic(pool: PgPool) {
    let (teacher_id, teacher) = common::create_user(&pool, Role::Teacher).await;
    let class_id = common::create_class(&pool, Some(teacher_id)).await;
    let app = common::app(pool);

    let mut topic_ids = Vec::new();
    for title in ["Prova", "Trabalho"] {
        let response = app
            .clone()
            .oneshot(common::json_request(
                "POST",
                "/api/forum/topics",
                Some(&teacher),
                json!({ "class_id": class_id, "title": title, "body": "Avisos" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = common::body_json(response).await["id"]
            .as_str()
            .unwrap()
            .to_string();
        topic_ids.push(id);
    }

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            &format!("/api/forum/topics/{}/messages", topic_ids[0]),
            Some(&teacher),
            json!({ "content": "A prova é na sexta." }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let message_id = common::body_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            &format!("/api/forum/topics/{}/messages", topic_ids[1]),
            Some(&teacher),
            json!({ "content": "Resposta no lugar errado", "parent_id": message_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(common::json_request(
            "POST",
            &format!("/api/forum/topics/{}/messages", topic_ids[0]),
            Some(&teacher),
            json!({ "content": "Conteúdo: capítulos 1 a 3.", "parent_id": message_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_huge_page_returns_empty_list(pool: PgPool) {
    let (_, admin) = common::create_user(&pool, Role::Administrator).await;
    common::create_class(&pool, None).await;
    let app = common::app(pool);

    for query in ["page=9223372036854775807&limit=100", "offset=9223372036854775807"] {
        let response = app
            .clone()
            .oneshot(common::get(&format!("/api/classes?{query}"), &admin))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{query}");
        let body = common::body_json(response).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
        assert_eq!(body["meta"]["has_more"], false);
        assert_eq!(body["meta"]["total"], 1);
    }
}
