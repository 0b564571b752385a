use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{
    handlers::investments,
    middleware::auth::auth_middleware,
    state::AppState,
};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(investments::get_investments).post(investments::create_investment))
        .route("/:id", get(investments::get_investment))
        .route("/:id/withdraw", post(investments::withdraw_investment))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
