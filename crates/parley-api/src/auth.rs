use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::{State, rejection::JsonRejection}, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};

use parley_db::Database;
use parley_types::ChatError;
use parley_types::api::{Claims, RegisterRequest, RegisterResponse, TokenRequest, TokenResponse};

use crate::error::ApiError;
use crate::run_blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    // Validate input
    let username_len = req.username.chars().count();
    if !(3..=32).contains(&username_len) {
        return Err(ChatError::invalid("username", "Username must be 3 to 32 characters").into());
    }
    if req.password.len() < 8 {
        return Err(ChatError::invalid("password", "Password must be at least 8 characters").into());
    }

    let secret = state.jwt_secret.clone();
    let ttl = state.token_ttl;
    let (user_id, token) = run_blocking(&state, move |db| {
        let taken = || ChatError::Conflict("A user with that username already exists.".into());

        // Check if username is taken
        if db.get_user_by_username(&req.username)?.is_some() {
            return Err(taken());
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
            .to_string();

        // A concurrent registration may have claimed the name while we were hashing.
        let Some(user_id) = db.create_user(&req.username, &password_hash)? else {
            warn!("Username {} registered concurrently", req.username);
            return Err(taken());
        };
        info!("Registered user {} ({})", req.username, user_id);

        let token = create_token(&secret, ttl, user_id, &req.username)?;
        Ok((user_id, token))
    })
    .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

/// Exchange a username and password for a bearer token.
pub async fn obtain_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let secret = state.jwt_secret.clone();
    let ttl = state.token_ttl;
    let response = run_blocking(&state, move |db| {
        let bad_credentials =
            || ChatError::Unauthenticated("Unable to log in with provided credentials.".into());

        let Some(user) = db.get_user_by_username(&req.username)? else {
            warn!("Token request for unknown user {}", req.username);
            return Err(bad_credentials());
        };

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("corrupt password hash for user {}: {}", user.id, e))?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| bad_credentials())?;

        let token = create_token(&secret, ttl, user.id, &user.username)?;

        Ok(TokenResponse {
            user_id: user.id,
            username: user.username,
            token,
        })
    })
    .await?;

    Ok(Json(response))
}

fn create_token(
    secret: &str,
    ttl: chrono::Duration,
    user_id: i64,
    username: &str,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
