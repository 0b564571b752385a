use axum::{
    middleware,
    routing::post,
    Router,
};

use crate::{
    handlers::auth,
    middleware::auth::auth_middleware,
    state::AppState,
};

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/set-pin", post(auth::set_pin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Request OTP for login or signup
        .route("/request-otp", post(auth::request_otp))
        // Verify OTP, creating the account on signup
        .route("/verify-otp", post(auth::verify_otp))
        // PIN login for returning users
        .route("/login", post(auth::login))
        // Exchange a refresh token for a new access token
        .route("/refresh", post(auth::refresh_token))
        .merge(protected)
}
