use crate::docs::ApiDoc;
use crate::logging::{REQUEST_ID_HEADER, logging_middleware};
use crate::metrics::metrics_middleware;
use crate::middleware::role::require_staff;
use crate::modules::achievements::router::init_achievements_router;
use crate::modules::auth::router::init_auth_router;
use crate::modules::classes::router::init_classes_router;
use crate::modules::dashboard::router::init_dashboard_router;
use crate::modules::enrollments::router::init_enrollments_router;
use crate::modules::forum::router::init_forum_router;
use crate::modules::health::router::init_health_router;
use crate::modules::submissions::router::init_submissions_router;
use crate::modules::tasks::router::init_tasks_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .merge(init_health_router())
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router(state.clone()))
                .nest(
                    "/users",
                    init_users_router()
                        .route_layer(middleware::from_fn_with_state(state.clone(), require_staff)),
                )
                .nest("/classes", init_classes_router())
                .nest(
                    "/enrollments",
                    init_enrollments_router()
                        .route_layer(middleware::from_fn_with_state(state.clone(), require_staff)),
                )
                .nest("/tasks", init_tasks_router(state.clone()))
                .nest("/submissions", init_submissions_router())
                .nest("/forum", init_forum_router())
                .nest("/achievements", init_achievements_router())
                .nest("/dashboard", init_dashboard_router()),
        )
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .allow_credentials(true)
}
