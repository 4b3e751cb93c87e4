//! Google sign-in (OAuth authorization code flow).
//!
//! `login` stores a random CSRF state in the session and redirects to
//! Google. `callback` checks the state, exchanges the code, reads the
//! profile and signs the matching account in, creating a `user`-role
//! account without a password on first sign-in.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use vegi_shop_core::Email;
use vegi_shop_db::UserRepository;

use crate::error::{AppError, Result};
use crate::middleware::set_current_user;
use crate::models::{CurrentUser, session_keys};
use crate::services::GoogleClient;
use crate::state::AppState;

/// Where the browser lands when the user declines consent.
const SIGN_IN_PAGE: &str = "/auth/signin";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Random alphanumeric string for the OAuth `state` parameter.
fn generate_state(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}

fn google_client(state: &AppState) -> Result<&GoogleClient> {
    state
        .google()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".to_string()))
}

#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let google = google_client(&state)?;

    let oauth_state = generate_state(32);
    session
        .insert(session_keys::GOOGLE_OAUTH_STATE, &oauth_state)
        .await?;

    let url = google.authorization_url(&state.config().google_redirect_uri(), &oauth_state);
    Ok(Redirect::to(&url))
}

#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect> {
    let google = google_client(&state)?;

    if let Some(error) = query.error {
        tracing::warn!(%error, "Google sign-in declined");
        return Ok(Redirect::to(&format!(
            "{SIGN_IN_PAGE}?error={}",
            urlencoding::encode(&error)
        )));
    }

    // One-time use, whatever the outcome
    let stored_state: Option<String> = session
        .remove(session_keys::GOOGLE_OAUTH_STATE)
        .await
        .ok()
        .flatten();

    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        return Err(AppError::BadRequest("Missing code or state".to_string()));
    };
    if stored_state.as_deref() != Some(returned_state.as_str()) {
        tracing::warn!("Google OAuth state mismatch");
        return Err(AppError::BadRequest("Invalid OAuth state".to_string()));
    }

    let redirect_uri = state.config().google_redirect_uri();
    let access_token = google
        .exchange_code(&code, &redirect_uri)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    let profile = google
        .userinfo(&access_token)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let email = Email::parse(&profile.email)
        .map_err(|_| AppError::BadRequest("Invalid email address".to_string()))?;
    let user = UserRepository::new(state.pool())
        .find_or_create_oauth(&email, profile.name.as_deref(), profile.picture.as_deref())
        .await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    tracing::info!(user_id = %user.id, "Signed in with Google");

    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_state() {
        let a = generate_state(32);
        let b = generate_state(32);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
