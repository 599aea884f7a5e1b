//! Logging in existing users.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;

use crate::{
    Error,
    auth::{AuthResponse, AuthState, encode_token},
    user::get_user_by_email,
    validation::Validator,
};

/// The request body for logging in.
#[derive(Debug, Deserialize)]
pub struct LogInRequest {
    email: Option<String>,
    password: Option<String>,
}

/// A route handler for logging in a user with their email and password.
///
/// Unknown emails and wrong passwords both produce [Error::InvalidCredentials].
pub async fn log_in(
    State(state): State<AuthState>,
    request: Result<Json<LogInRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, Error> {
    let Json(request) = request?;

    let mut validator = Validator::new();
    let email = validator.require_text("email", request.email);
    let password = validator.require("password", request.password);
    validator.finish()?;

    let (Some(email), Some(password)) = (email, password) else {
        return Err(Error::MalformedRequest("missing fields".to_owned()));
    };

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_by_email(&email, &connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?
    };

    if !user.password_hash.verify(&password)? {
        tracing::debug!("Wrong password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(user.id, state.token_duration, &state.jwt_keys)?;

    Ok(Json(AuthResponse { token, user }))
}
