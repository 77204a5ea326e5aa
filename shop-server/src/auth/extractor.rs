//! JWT Extractor
//!
//! `CurrentUser` as a handler argument. Reuses the user injected by
//! [`require_auth`](super::require_auth), otherwise authenticates the header itself.
//! `Option<CurrentUser>` never rejects; public routes use it to widen results
//! for staff.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};

use super::middleware::authenticate;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        let user = authenticate(state, auth_header, parts.uri.path()).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

impl OptionalFromRequestParts<ServerState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(Some(user.clone()));
        }

        let Some(auth_header) = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        else {
            return Ok(None);
        };
        Ok(authenticate(state, Some(auth_header), parts.uri.path())
            .await
            .ok())
    }
}
