//! Per-request authentication middleware and identity extractors.
//!
//! The middleware runs once for every inbound request and walks a small
//! state machine: extract the bearer token, verify it, resolve the
//! principal, check enablement, then bind an [`Identity`] into the request
//! extensions. Every failure exit collapses to "proceed anonymously" - the
//! middleware never writes an error response itself. Downstream extractors
//! ([`CurrentUser`], [`RequireAdmin`]) are the authorization seam that turns
//! a missing identity into a client-visible denial.

use crate::auth::handlers::AccessDenied;
use crate::auth::principal::{PrincipalError, PrincipalLoader, Role};
use crate::auth::token::TokenCodec;
use crate::types::AppError;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::sync::Arc;

/// Request-scoped identity context.
///
/// Created by [`authenticate_request`] when a token verifies and its
/// principal is enabled; dropped with the request. Never cached across
/// requests or worker threads.
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
    pub role: Role,
    pub authorities: Vec<String>,
}

impl Identity {
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }
}

/// The collaborators the middleware needs, shared read-only across requests.
pub struct Authenticator {
    codec: Arc<TokenCodec>,
    loader: Arc<PrincipalLoader>,
}

impl Authenticator {
    pub fn new(codec: Arc<TokenCodec>, loader: Arc<PrincipalLoader>) -> Self {
        Self { codec, loader }
    }
}

/// Authentication pass applied to the whole router.
///
/// Absence of a token is not an error: the request proceeds unauthenticated
/// and later authorization decides, which is what lets public and protected
/// routes share one router. Invalid tokens, unknown principals, disabled
/// principals and store failures all take the same anonymous exit, logged at
/// warn with the username when known and never with the raw token.
pub async fn authenticate_request(
    auth: Arc<Authenticator>,
    mut req: Request,
    next: Next,
) -> Response {
    // First successful binding wins; an identity set by an earlier stage is
    // never overwritten.
    if req.extensions().get::<Identity>().is_some() {
        return next.run(req).await;
    }

    let Some(raw) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        tracing::debug!("no authorization header, proceeding anonymously");
        return next.run(req).await;
    };

    let Some(token) = raw.strip_prefix("Bearer ") else {
        tracing::warn!("authorization header without Bearer scheme, proceeding anonymously");
        return next.run(req).await;
    };

    if token.trim().is_empty() {
        tracing::warn!("empty bearer token, proceeding anonymously");
        return next.run(req).await;
    }

    let username = match auth.codec.verify(token) {
        Ok(username) => username,
        Err(e) => {
            tracing::warn!(error = %e, "token rejected, proceeding anonymously");
            return next.run(req).await;
        }
    };

    // Single bounded lookup; a loader failure means anonymous, never a retry.
    let principal = match auth.loader.load_by_username(&username).await {
        Ok(principal) => principal,
        Err(PrincipalError::NotFound | PrincipalError::InvalidInput) => {
            tracing::warn!(%username, "token subject unknown, proceeding anonymously");
            return next.run(req).await;
        }
        Err(PrincipalError::Store(msg)) => {
            tracing::warn!(%username, error = %msg, "user store failed, proceeding anonymously");
            return next.run(req).await;
        }
    };

    if !principal.enabled {
        tracing::warn!(
            username = %principal.username,
            "disabled principal presented a valid token, proceeding anonymously"
        );
        return next.run(req).await;
    }

    tracing::info!(username = %principal.username, "request authenticated");
    let authorities = principal.authorities();
    req.extensions_mut().insert(Identity {
        username: principal.username,
        role: principal.role,
        authorities,
    });

    next.run(req).await
}

// ============= Extractors =============

/// Extractor for handlers that require an authenticated caller.
///
/// Rejects with 401 when no identity was bound, making the extractor the
/// single point that turns "anonymous" into a client-visible outcome.
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Auth("authentication required".to_string()))
    }
}

/// Infallible extractor for handlers that behave differently for anonymous
/// callers (e.g. logout) instead of rejecting them.
pub struct MaybeUser(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Identity>().cloned()))
    }
}

/// Extractor guarding administrator-only routes.
///
/// Anonymous callers get 401; authenticated callers without `ROLE_ADMIN`
/// get the denial handler's fixed 403 payload.
pub struct RequireAdmin(pub Identity);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| {
                AppError::Auth("authentication required".to_string()).into_response()
            })?;

        if !identity.has_authority(&Role::Admin.authority()) {
            return Err(AccessDenied::new(&identity).into_response());
        }

        Ok(RequireAdmin(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordHasher;
    use crate::db::{NewUser, SqliteStore, UserStore};
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Router};
    use tower::ServiceExt;

    const TEST_SECRET: &str = "middleware-test-secret-32-chars-min";

    async fn whoami(MaybeUser(identity): MaybeUser) -> String {
        identity
            .map(|i| i.username)
            .unwrap_or_else(|| "anonymous".to_string())
    }

    async fn authenticator_with_alice(enabled: bool) -> (Arc<Authenticator>, Arc<TokenCodec>) {
        let store = Arc::new(SqliteStore::new_memory().await.expect("store"));
        let hasher = PasswordHasher::default();
        let salt = hasher.generate_salt();
        store
            .create_user(&NewUser {
                username: "alice".to_string(),
                nickname: "Alice".to_string(),
                password_hash: hasher.hash("pw-unused-here", &salt).expect("hash"),
                salt,
                enabled,
                role: Role::User.code().to_string(),
            })
            .await
            .expect("seed alice");

        let codec = Arc::new(TokenCodec::new(TEST_SECRET.to_string(), 3600));
        let loader = Arc::new(PrincipalLoader::new(store));
        (Arc::new(Authenticator::new(codec.clone(), loader)), codec)
    }

    fn router(auth: Arc<Authenticator>) -> Router {
        Router::new().route("/whoami", get(whoami)).layer(
            axum::middleware::from_fn(move |req: Request, next: Next| {
                let auth = auth.clone();
                async move { authenticate_request(auth, req, next).await }
            }),
        )
    }

    async fn body_string(app: Router, req: HttpRequest<Body>) -> String {
        let response = app.oneshot(req).await.expect("infallible");
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    #[tokio::test]
    async fn test_no_header_proceeds_anonymous() {
        let (auth, _codec) = authenticator_with_alice(true).await;

        let req = HttpRequest::get("/whoami").body(Body::empty()).expect("req");
        assert_eq!(body_string(router(auth), req).await, "anonymous");
    }

    #[tokio::test]
    async fn test_valid_token_binds_identity() {
        let (auth, codec) = authenticator_with_alice(true).await;
        let token = codec.issue("alice").expect("issue");

        let req = HttpRequest::get("/whoami")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .expect("req");
        assert_eq!(body_string(router(auth), req).await, "alice");
    }

    #[tokio::test]
    async fn test_invalid_token_proceeds_anonymous() {
        let (auth, _codec) = authenticator_with_alice(true).await;

        let req = HttpRequest::get("/whoami")
            .header("authorization", "Bearer not-a-token")
            .body(Body::empty())
            .expect("req");
        assert_eq!(body_string(router(auth), req).await, "anonymous");
    }

    #[tokio::test]
    async fn test_disabled_principal_proceeds_anonymous() {
        let (auth, codec) = authenticator_with_alice(false).await;
        let token = codec.issue("alice").expect("issue");

        let req = HttpRequest::get("/whoami")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .expect("req");
        assert_eq!(body_string(router(auth), req).await, "anonymous");
    }

    #[tokio::test]
    async fn test_first_binding_wins() {
        let (auth, codec) = authenticator_with_alice(true).await;
        let token = codec.issue("alice").expect("issue");

        // An outer stage (added last, so it runs first) binds an identity
        // before the authentication pass; the pass must not overwrite it,
        // even with a valid token for someone else in the header.
        let app = router(auth).layer(axum::middleware::from_fn(
            |mut req: Request, next: Next| async move {
                req.extensions_mut().insert(Identity {
                    username: "preset".to_string(),
                    role: Role::Admin,
                    authorities: vec![Role::Admin.authority()],
                });
                next.run(req).await
            },
        ));

        let req = HttpRequest::get("/whoami")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .expect("req");

        let response = app.oneshot(req).await.expect("infallible");
        let bytes = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("body");
        assert_eq!(String::from_utf8(bytes.to_vec()).expect("utf8"), "preset");
    }
}
