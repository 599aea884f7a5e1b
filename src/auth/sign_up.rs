//! Registering new users.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use serde::Deserialize;

use crate::{
    Error, PasswordHash, ValidatedPassword,
    auth::{AuthResponse, AuthState, encode_token},
    user::create_user,
    validation::Validator,
};

/// The request body for signing up.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

/// A route handler for registering a new user.
///
/// Responds with 201 and a token for the new user, or 400 if the request is invalid
/// or the email is already taken.
pub async fn sign_up(
    State(state): State<AuthState>,
    request: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(request) = request?;

    let mut validator = Validator::new();
    let name = validator.require_text("name", request.name);
    let email = request.email.map(|email| email.trim().to_owned());
    validator.check(
        email.as_deref().is_some_and(EmailAddress::is_valid),
        "email",
        "Please provide a valid email",
    );
    let password = validator.require("password", request.password);
    validator.finish()?;

    // The validator has checked these are present.
    let (Some(name), Some(email), Some(password)) = (name, email, password) else {
        return Err(Error::MalformedRequest("missing fields".to_owned()));
    };

    let validated_password = ValidatedPassword::new(&password, &[&name, &email])?;
    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        create_user(&name, &email, password_hash, &connection)?
    };

    tracing::info!("Registered user {}", user.id);

    let token = encode_token(user.id, state.token_duration, &state.jwt_keys)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        auth::token::{JwtKeys, decode_token},
        test_utils::{TEST_SECRET, get_test_server},
    };

    const STRONG_PASSWORD: &str = "turkeysgogobblegobble";

    #[tokio::test]
    async fn sign_up_returns_token_and_user() {
        let server = get_test_server();

        let response = server
            .post("/api/auth/signup")
            .json(&json!({
                "name": "Alice",
                "email": "alice@example.com",
                "password": STRONG_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["user"]["name"], "Alice");
        assert_eq!(body["user"]["email"], "alice@example.com");
        assert!(body["user"].get("passwordHash").is_none());

        let token = body["token"].as_str().expect("token should be a string");
        let user_id = decode_token(token, &JwtKeys::new(TEST_SECRET)).unwrap();
        assert_eq!(body["user"]["id"], user_id.as_i64());
    }

    #[tokio::test]
    async fn sign_up_rejects_duplicate_email() {
        let server = get_test_server();
        let body = json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": STRONG_PASSWORD,
        });
        server
            .post("/api/auth/signup")
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.post("/api/auth/signup").json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"message": "User already exists"}));
    }

    #[tokio::test]
    async fn sign_up_lists_every_invalid_field() {
        let server = get_test_server();

        let response = server
            .post("/api/auth/signup")
            .json(&json!({"name": " ", "email": "not-an-email"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "errors": [
                {"field": "name", "message": "name is required"},
                {"field": "email", "message": "Please provide a valid email"},
                {"field": "password", "message": "password is required"},
            ]
        }));
    }

    #[tokio::test]
    async fn sign_up_rejects_weak_password() {
        let server = get_test_server();

        let response = server
            .post("/api/auth/signup")
            .json(&json!({
                "name": "Alice",
                "email": "alice@example.com",
                "password": "password1",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sign_up_rejects_malformed_json() {
        let server = get_test_server();

        let response = server
            .post("/api/auth/signup")
            .text("{not json")
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
