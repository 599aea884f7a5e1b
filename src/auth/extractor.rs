//! Extracts the authenticated user from the bearer token on a request.

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    Error, UserID,
    auth::token::{JwtKeys, decode_token},
};

/// The ID of the user that sent the request.
///
/// Handlers that take this as an argument reject requests without a valid
/// `Authorization: Bearer <token>` header with a 401 response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthUser(pub UserID);

impl<S> FromRequestParts<S> for AuthUser
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|rejection| {
                if rejection.is_missing() {
                    Error::MissingToken
                } else {
                    Error::InvalidToken
                }
            })?;

        let keys = JwtKeys::from_ref(state);
        let user_id = decode_token(bearer.token(), &keys)?;

        Ok(AuthUser(user_id))
    }
}
