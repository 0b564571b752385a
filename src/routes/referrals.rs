use axum::{
    middleware,
    routing::get,
    Router,
};

use crate::{
    handlers::referrals,
    middleware::auth::auth_middleware,
    state::AppState,
};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(referrals::get_referrals))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
