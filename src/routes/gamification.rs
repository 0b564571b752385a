use axum::{
    middleware,
    routing::get,
    Router,
};

use crate::{
    handlers::gamification,
    middleware::auth::auth_middleware,
    state::AppState,
};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/profile", get(gamification::get_profile))
        .route("/points", get(gamification::get_points_history))
        .route(
            "/achievements",
            get(gamification::get_achievements).post(gamification::create_achievement),
        )
        .route("/achievements/mine", get(gamification::get_my_achievements))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
