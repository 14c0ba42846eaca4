use crate::auth::middleware::{authenticate_request, Authenticator};
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Builds the application router.
///
/// The authentication pass wraps every route, public ones included: it only
/// binds an identity when it can, and each handler's extractors decide
/// whether anonymous is acceptable.
pub fn create_router(state: AppState) -> Router {
    let authenticator = Arc::new(Authenticator::new(
        state.codec.clone(),
        state.loader.clone(),
    ));

    let api = Router::new()
        // Public routes (no auth required)
        .route("/health", get(crate::api::handlers::health::health))
        .route("/auth/register", post(crate::api::handlers::auth::register))
        .route("/auth/login", post(crate::api::handlers::auth::login))
        .route("/auth/logout", post(crate::api::handlers::auth::logout))
        // Authenticated routes (extractors enforce)
        .route("/auth/userinfo", get(crate::api::handlers::auth::userinfo))
        // Admin-only routes
        .route("/admin/check", get(crate::api::handlers::auth::admin_check));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn(
            move |req: axum::extract::Request, next: axum::middleware::Next| {
                let auth = authenticator.clone();
                async move { authenticate_request(auth, req, next).await }
            },
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
