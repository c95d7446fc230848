//! Account creation, login and the bearer-token extractor.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    Json,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::{LoginInput, LoginOutput, RegisterInput, User};
use crate::state::AppState;
use crate::store::AuthSession;

const MIN_PASSWORD_LEN: usize = 8;

/// The user behind the request's token. Rejects with 401 when the token is
/// missing, unknown or expired.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub u64);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized("missing token"))?;
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw);

        let now = state.clock.now();
        let tables = state.db.read().await;
        match tables.session_user(token, now) {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => {
                debug!("rejected unknown or expired token");
                Err(AppError::Unauthorized("invalid token"))
            }
        }
    }
}

pub async fn register(State(state): State<AppState>, Json(input): Json<RegisterInput>) -> AppResult<(StatusCode, Json<User>)> {
    let email = input.email.trim().to_string();
    let name = input.name.trim().to_string();
    if !email.contains('@') {
        return Err(AppError::BadRequest("a valid email is required".to_string()));
    }
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let password = input.password;
    let password_hash = blocking(move || hash_password(&password)).await??;

    let mut tables = state.db.write().await;
    if tables.user_by_email(&email).is_some() {
        return Err(AppError::Conflict("email already registered".to_string()));
    }
    let user = tables.users.insert_with(|id| User {
        id,
        email,
        name,
        password_hash,
    });
    info!(user_id = user.id, "registered user");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Passwords are checked outside the lock; only the session insert takes the
/// write lock, which also sweeps out expired sessions.
pub async fn login(State(state): State<AppState>, Json(input): Json<LoginInput>) -> AppResult<Json<LoginOutput>> {
    let found = state.db.read().await.user_by_email(input.email.trim()).cloned();
    let user = match found {
        Some(user) => {
            let stored = user.password_hash.clone();
            let password = input.password;
            blocking(move || verify_password(&password, &stored))
                .await?
                .then_some(user)
        }
        None => None,
    }
    .ok_or_else(|| {
        warn!("failed login attempt");
        AppError::Unauthorized("invalid credentials")
    })?;

    let now = state.clock.now();
    let expires_at = now
        .checked_add_signed(state.config.session_ttl)
        .ok_or_else(|| AppError::Internal("session expiry is out of range".to_string()))?;

    let token = Uuid::new_v4().to_string();
    let mut tables = state.db.write().await;
    let purged = tables.purge_expired_sessions(now);
    if purged > 0 {
        debug!(purged, "dropped expired sessions");
    }
    tables.sessions.insert(
        token.clone(),
        AuthSession {
            user_id: user.id,
            expires_at,
        },
    );
    info!(user_id = user.id, "user logged in");
    Ok(Json(LoginOutput { token, user }))
}

/// Run CPU-heavy password work off the async workers.
async fn blocking<T: Send + 'static>(work: impl FnOnce() -> T + Send + 'static) -> AppResult<T> {
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("password task failed: {e}")))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_only_the_original_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[tokio::test]
    async fn password_work_runs_on_the_blocking_pool() {
        let hash = blocking(|| hash_password("correct horse")).await.unwrap().unwrap();
        let stored = hash.clone();
        assert!(blocking(move || verify_password("correct horse", &stored)).await.unwrap());
        assert!(!blocking(move || verify_password("wrong horse", &hash)).await.unwrap());
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
