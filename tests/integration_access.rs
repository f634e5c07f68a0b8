mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use educa_models::Role;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let response = common::offline_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = common::body_json(response).await;
    assert_eq!(body["database"], "down");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let response = common::offline_app()
        .oneshot(
            Request::get("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["info"]["title"], "Educa+ API");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = common::offline_app();

    for uri in [
        "/api/users",
        "/api/classes",
        "/api/enrollments",
        "/api/tasks",
        "/api/submissions",
        "/api/forum/topics",
        "/api/achievements",
        "/api/dashboard/student",
    ] {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_staff_only_routes_reject_other_roles() {
    let app = common::offline_app();

    for role in [Role::Teacher, Role::Student, Role::Guardian] {
        for uri in ["/api/users", "/api/enrollments"] {
            let response = app
                .clone()
                .oneshot(common::get(uri, &common::token(role)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{role} {uri}");
        }
    }
}

#[tokio::test]
async fn test_task_submission_list_rejects_students_and_guardians() {
    let app = common::offline_app();
    let uri = format!("/api/tasks/{}/submissions", Uuid::new_v4());

    for role in [Role::Student, Role::Guardian] {
        let response = app
            .clone()
            .oneshot(common::get(&uri, &common::token(role)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{role}");
    }
}

#[tokio::test]
async fn test_dashboards_are_role_specific() {
    let app = common::offline_app();

    let cases = [
        ("/api/dashboard/student", Role::Teacher),
        ("/api/dashboard/teacher", Role::Student),
        ("/api/dashboard/manager", Role::Teacher),
        ("/api/dashboard/guardian", Role::Student),
    ];

    for (uri, role) in cases {
        let response = app
            .clone()
            .oneshot(common::get(uri, &common::token(role)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{role} {uri}");
    }

    let uri = format!("/api/dashboard/guardian/{}", Uuid::new_v4());
    let response = app
        .oneshot(common::get(&uri, &common::token(Role::Teacher)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_validation_runs_before_role_check() {
    let app = common::offline_app();
    let student = common::token(Role::Student);

    let invalid = json!({ "name": "", "year": 1990 });
    let response = app
        .clone()
        .oneshot(common::json_request("POST", "/api/classes", Some(&student), invalid))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let valid = json!({ "name": "7º Ano A", "year": 2025 });
    let response = app
        .oneshot(common::json_request("POST", "/api/classes", Some(&student), valid))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_only_students_submit_and_only_teaching_roles_grade() {
    let app = common::offline_app();

    let submission = json!({ "task_id": Uuid::new_v4(), "content": "Resposta" });
    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/submissions",
            Some(&common::token(Role::Teacher)),
            submission,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/submissions/{}/grade", Uuid::new_v4());
    let response = app
        .oneshot(common::json_request(
            "PUT",
            &uri,
            Some(&common::token(Role::Student)),
            json!({ "score": 9.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_query_parameters() {
    let app = common::offline_app();
    let token = common::token(Role::Teacher);

    for uri in [
        "/api/classes?page=abc",
        "/api/tasks?class_id=not-a-uuid",
        "/api/submissions?graded=maybe",
    ] {
        let response = app
            .clone()
            .oneshot(common::get(uri, &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = common::body_json(response).await;
        assert!(
            body["error"]
                .as_str()
                .is_some_and(|e| e.starts_with("Invalid query parameters")),
            "{uri}"
        );
    }
}

#[tokio::test]
async fn test_malformed_path_id() {
    let response = common::offline_app()
        .oneshot(common::get("/api/tasks/not-a-uuid", &common::token(Role::Student)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_sees_only_own_classes(pool: PgPool) {
    let (teacher_id, teacher) = common::create_user(&pool, Role::Teacher).await;
    let (other_teacher_id, _) = common::create_user(&pool, Role::Teacher).await;
    let own_class = common::create_class(&pool, Some(teacher_id)).await;
    let other_class = common::create_class(&pool, Some(other_teacher_id)).await;
    let app = common::app(pool);

    let response = app.clone().oneshot(common::get("/api/classes", &teacher)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], own_class.to_string());

    let uri = format!("/api/classes/{other_class}");
    let response = app.clone().oneshot(common::get(&uri, &teacher)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let uri = format!("/api/classes/{own_class}/students");
    let response = app.oneshot(common::get(&uri, &teacher)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submission_lifecycle(pool: PgPool) {
    let (teacher_id, teacher) = common::create_user(&pool, Role::Teacher).await;
    let (student_id, student) = common::create_user(&pool, Role::Student).await;
    let (_, outsider) = common::create_user(&pool, Role::Student).await;
    let class_id = common::create_class(&pool, Some(teacher_id)).await;
    common::enroll(&pool, student_id, class_id).await;
    let open_task = common::create_task(&pool, class_id, 7).await;
    let overdue_task = common::create_task(&pool, class_id, -2).await;
    let app = common::app(pool);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/submissions",
            Some(&outsider),
            json!({ "task_id": open_task, "content": "Minha resposta" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/submissions",
            Some(&student),
            json!({ "task_id": open_task, "content": "Minha resposta" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let submission = common::body_json(response).await;
    assert_eq!(submission["late"], false);
    let submission_id = submission["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/submissions",
            Some(&student),
            json!({ "task_id": open_task, "content": "De novo" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/submissions",
            Some(&student),
            json!({ "task_id": overdue_task, "content": "Atrasada" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(common::body_json(response).await["late"], true);

    let grade_uri = format!("/api/submissions/{submission_id}/grade");
    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            &grade_uri,
            Some(&teacher),
            json!({ "score": 11.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            &grade_uri,
            Some(&teacher),
            json!({ "score": 5.0, "feedback": "Bom trabalho" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["score"], 5.0);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "PATCH",
            &format!("/api/submissions/{submission_id}"),
            Some(&student),
            json!({ "content": "Editada" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(common::get("/api/dashboard/student", &student))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = common::body_json(response).await;
    assert_eq!(dashboard["summary"]["submitted_tasks"], 2);
    assert_eq!(dashboard["summary"]["graded_tasks"], 1);
    assert_eq!(dashboard["summary"]["average_score_percent"], 50.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_guardian_sees_only_linked_students(pool: PgPool) {
    let (_, admin) = common::create_user(&pool, Role::Administrator).await;
    let (guardian_id, guardian) = common::create_user(&pool, Role::Guardian).await;
    let (child_id, _) = common::create_user(&pool, Role::Student).await;
    let (stranger_id, _) = common::create_user(&pool, Role::Student).await;
    let app = common::app(pool);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            &format!("/api/users/{guardian_id}/students"),
            Some(&admin),
            json!({ "student_id": child_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(common::get("/api/dashboard/guardian", &guardian))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["students"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["students"][0]["student_id"], child_id.to_string());

    let response = app
        .clone()
        .oneshot(common::get(&format!("/api/dashboard/guardian/{child_id}"), &guardian))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(common::get(&format!("/api/dashboard/guardian/{stranger_id}"), &guardian))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_forum_membership(pool: PgPool) {
    let (teacher_id, teacher) = common::create_user(&pool, Role::Teacher).await;
    let (student_id, student) = common::create_user(&pool, Role::Student).await;
    let (_, outsider) = common::create_user(&pool, Role::Student).await;
    let class_id = common::create_class(&pool, Some(teacher_id)).await;
    common::enroll(&pool, student_id, class_id).await;
    let app = common::app(pool);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/api/forum/topics",
            Some(&student),
            json!({ "class_id": class_id, "title": "Dúvida", "body": "Como resolver a questão 3?" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let topic_id = common::body_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let messages_uri = format!("/api/forum/topics/{topic_id}/messages");
    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            &messages_uri,
            Some(&teacher),
            json!({ "content": "Use a fórmula de Bhaskara." }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(common::get(&format!("/api/forum/topics/{topic_id}"), &outsider))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(common::get(&format!("/api/forum/topics/{topic_id}"), &student))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let thread = common::body_json(response).await;
    assert_eq!(thread["messages"].as_array().map(Vec::len), Some(1));
}
