use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::rate_limit::login_rate_limit;
use crate::state::AppState;

use super::controller::{change_password, get_me, login_user, logout_user};

pub fn init_auth_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(login_user).route_layer(middleware::from_fn_with_state(state, login_rate_limit)),
        )
        .route("/logout", post(logout_user))
        .route("/me", get(get_me))
        .route("/change-password", post(change_password))
}
