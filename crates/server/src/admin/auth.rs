use crate::app::AppState;
use crate::config::AdminCredentials;
use crate::error::AppError;
use crate::store::Store;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// HTTP Basic login in front of every console route.
pub async fn require_login<S: Store>(State(state): State<AppState<S>>, request: Request, next: Next) -> Result<Response, AppError> {
    let credentials = state.admin.as_deref().ok_or(AppError::NotFound)?;
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    if !credentials_match(credentials, header) {
        tracing::warn!("rejected admin login");
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}

fn credentials_match(expected: &AdminCredentials, header: &str) -> bool {
    let Some(encoded) = header.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    match decoded.split_once(':') {
        Some((username, password)) => {
            let username_ok = digest_eq(username, &expected.username);
            let password_ok = digest_eq(password, &expected.password);
            username_ok & password_ok
        }
        None => false,
    }
}

/// Compares SHA-256 digests in constant time, so neither the content nor the
/// length of the secret shows up in response timing.
fn digest_eq(provided: &str, expected: &str) -> bool {
    Sha256::digest(provided.as_bytes())
        .ct_eq(&Sha256::digest(expected.as_bytes()))
        .into()
}

/// `Authorization` header value for the given login.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}
