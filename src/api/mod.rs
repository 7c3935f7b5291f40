use std::time::Duration;

use axum::{routing::MethodRouter, Extension, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::models::tenant::Tenant;
use crate::AppState;

pub mod health;
pub mod sheets;
pub mod upload;

/// Route tag and path suffix for each tenant. Allura owns the bare paths.
const TENANT_ROUTES: [(&str, &str); 2] = [("allura", ""), ("ihl", "-ihl")];

/// Mount `handler` once per tenant (`/path` and `/path-ihl`), each copy
/// receiving its `Tenant` as an extension
pub(crate) fn per_tenant(router: Router<AppState>, path: &str, handler: MethodRouter<AppState>) -> Router<AppState> {
    TENANT_ROUTES.iter().fold(router, |router, (tag, suffix)| {
        router.route(
            &format!("{}{}", path, suffix),
            handler.clone().layer(Extension(Tenant::from_tag(tag))),
        )
    })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(sheets::routes())
        .merge(upload::routes())
}

/// Full application router. Browsers call this from any origin.
pub fn build_router(state: AppState, debug: bool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let router = routes().layer(cors);
    let router = if debug {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };
    router.with_state(state)
}
