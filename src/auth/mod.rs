//! User sign up, log in and bearer token authentication.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::Serialize;
use time::Duration;

use crate::{AppState, User};

mod extractor;
mod log_in;
mod sign_up;
mod token;

pub use extractor::AuthUser;
pub use log_in::log_in;
pub use sign_up::sign_up;
pub use token::{DEFAULT_TOKEN_DURATION, JwtKeys, encode_token};

/// The state needed to sign up and log in users.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing tokens.
    pub jwt_keys: JwtKeys,
    /// How long issued tokens are valid for.
    pub token_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_keys.clone()
    }
}

/// The response body for a successful sign up or log in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The bearer token to send with subsequent requests.
    pub token: String,
    /// The signed in user.
    pub user: User,
}
