//! Terminal handlers: authorization denial and logout.

use crate::auth::middleware::Identity;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Denial response for an authenticated but insufficiently privileged caller.
///
/// The payload is fixed: a 403 code and a generic message that never names
/// the authority the caller was missing. The audit detail goes to the log
/// instead, where the client cannot see it.
pub struct AccessDenied {
    username: Option<String>,
}

impl AccessDenied {
    pub fn new(identity: &Identity) -> Self {
        Self {
            username: Some(identity.username.clone()),
        }
    }

    pub fn anonymous() -> Self {
        Self { username: None }
    }
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        match &self.username {
            Some(username) => {
                tracing::warn!(%username, "access denied: insufficient privileges");
            }
            None => tracing::warn!("access denied for anonymous caller"),
        }

        let body = serde_json::json!({
            "code": StatusCode::FORBIDDEN.as_u16(),
            "message": "insufficient privileges to access this resource",
        });

        (StatusCode::FORBIDDEN, Json(body)).into_response()
    }
}

/// Records a logout. The identity context itself is request-scoped and is
/// dropped with the request; outstanding tokens stay valid until their TTL
/// expires because verification is stateless.
pub fn record_logout(identity: Option<&Identity>) {
    match identity {
        Some(identity) => tracing::info!(username = %identity.username, "user logged out"),
        None => tracing::info!("anonymous logout"),
    }
}
