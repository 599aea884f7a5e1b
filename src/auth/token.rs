//! Signing and verifying the bearer tokens handed out on sign up and log in.

use std::fmt::Debug;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID};

/// How long a token is valid for if the server is not configured otherwise.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(7);

/// The keys used to sign and verify tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Derive the signing keys from a `secret` string.
    pub fn new(secret: &str) -> Self {
        let hash = Sha512::digest(secret);

        Self {
            encoding: EncodingKey::from_secret(&hash),
            decoding: DecodingKey::from_secret(&hash),
        }
    }
}

impl Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys { .. }")
    }
}

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: String,
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
    /// The time the token was issued as a unix timestamp.
    pub iat: usize,
}

/// Create a signed token for `user_id` that expires after `duration`.
///
/// # Errors
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user_id: UserID,
    duration: Duration,
    keys: &JwtKeys,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + duration).unix_timestamp() as usize,
        iat: now.unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, &keys.encoding)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify `token` and get the ID of the user it was issued to.
///
/// # Errors
/// Returns [Error::InvalidToken] if the token is malformed, has a bad signature or has expired.
pub fn decode_token(token: &str, keys: &JwtKeys) -> Result<UserID, Error> {
    let token_data = decode::<Claims>(token, &keys.decoding, &Validation::default()).map_err(
        |error| {
            tracing::debug!("Rejected token: {error}");
            Error::InvalidToken
        },
    )?;

    token_data
        .claims
        .sub
        .parse()
        .map(UserID::new)
        .map_err(|_| Error::InvalidToken)
}
