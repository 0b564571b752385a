use axum::{
    middleware,
    routing::get,
    Router,
};

use crate::{
    handlers::products,
    middleware::auth::auth_middleware,
    state::AppState,
};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(products::get_products).post(products::create_product))
        .route("/:id", get(products::get_product).put(products::update_product))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
