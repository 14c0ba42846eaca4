use crate::{
    auth::handlers::record_logout,
    auth::middleware::{CurrentUser, MaybeUser, RequireAdmin},
    auth::principal::{try_load, Role},
    db::NewUser,
    types::{ApiMessage, AppError, LoginRequest, RegisterRequest, Result, TokenResponse, UserResponse},
    AppState,
};
use axum::{extract::State, Json};

/// Register a new user.
///
/// The write path: generates a fresh salt, hashes the password and stores
/// the pair. New users are enabled with the plain user role.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiMessage>> {
    let username = payload.username.trim().to_string();
    if username.is_empty() || payload.password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Username required and password must be at least 8 characters".to_string(),
        ));
    }

    if try_load(&state.loader, &username).await?.is_some() {
        tracing::warn!(%username, "registration rejected: username taken");
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let salt = state.hasher.generate_salt();
    let password_hash = state.hasher.hash(&payload.password, &salt)?;

    let nickname = if payload.nickname.trim().is_empty() {
        username.clone()
    } else {
        payload.nickname.trim().to_string()
    };

    let user = state
        .store
        .create_user(&NewUser {
            username,
            nickname,
            password_hash,
            salt,
            enabled: true,
            role: Role::User.code().to_string(),
        })
        .await?;

    tracing::info!(username = %user.username, "user registered");
    Ok(Json(ApiMessage::ok("registered")))
}

/// Login with username and password, returning a bearer token.
///
/// Unknown user, wrong password and disabled account all collapse to the
/// same 401 response so the error shape cannot be used for enumeration;
/// the distinctions live in the server log only.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let principal = try_load(&state.loader, &payload.username).await?;

    // Matched before branching on existence so an unknown username costs
    // the same hash work as a wrong password.
    let matched = state.matcher.matches(&payload.password, principal.as_ref());

    let Some(principal) = principal else {
        tracing::warn!(username = %payload.username.trim(), "login failed: unknown user");
        return Err(AppError::Auth("Invalid credentials".to_string()));
    };

    if !matched {
        tracing::warn!(username = %principal.username, "login failed: wrong password");
        return Err(AppError::Auth("Invalid credentials".to_string()));
    }

    if !principal.enabled {
        tracing::warn!(username = %principal.username, "login failed: account disabled");
        return Err(AppError::Auth("Invalid credentials".to_string()));
    }

    let token = state.codec.issue(&principal.username)?;
    tracing::info!(username = %principal.username, "login succeeded");

    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.codec.ttl_secs(),
    }))
}

/// Explicit logout.
///
/// Stateless tokens cannot be revoked server-side; this records the audit
/// event and the client discards its token. Works for anonymous callers too.
pub async fn logout(MaybeUser(identity): MaybeUser) -> Json<ApiMessage> {
    record_logout(identity.as_ref());
    Json(ApiMessage::ok("logged out"))
}

/// Current caller's profile.
pub async fn userinfo(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<UserResponse>> {
    let principal = try_load(&state.loader, &identity.username)
        .await?
        .ok_or_else(|| AppError::NotFound("User no longer exists".to_string()))?;

    Ok(Json(UserResponse {
        username: principal.username,
        nickname: principal.nickname,
        authorities: identity.authorities,
    }))
}

/// Administrator-only probe; exercises the denial handler for everyone else.
pub async fn admin_check(RequireAdmin(identity): RequireAdmin) -> Json<ApiMessage> {
    tracing::debug!(username = %identity.username, "admin check passed");
    Json(ApiMessage::ok("administrator authority confirmed"))
}
