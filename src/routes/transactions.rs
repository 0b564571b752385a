use axum::{
    middleware,
    routing::get,
    Router,
};

use crate::{
    handlers::transactions,
    middleware::auth::auth_middleware,
    state::AppState,
};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(transactions::get_transactions))
        .route("/:reference", get(transactions::get_transaction_by_reference))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
