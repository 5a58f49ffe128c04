//! Request extractors for the caller's identity.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use super::{blocking, AppState};
use crate::domain::cart::CartOwner;
use crate::domain::user::User;
use crate::errors::AppError;

pub const SESSION_HEADER: &str = "x-session-id";

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn app_state(req: &HttpRequest) -> Result<web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("application state is not configured".to_string()))
}

async fn authenticate(state: web::Data<AppState>, token: String) -> Result<User, AppError> {
    blocking(move || state.auth.authenticate(&token)).await
}

/// A signed-in, active user. Missing or bad tokens are rejected with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = app_state(req);
        Box::pin(async move {
            let token =
                token.ok_or_else(|| AppError::Unauthorized("Access token required".to_string()))?;
            Ok(AuthUser(authenticate(state?, token).await?))
        })
    }
}

/// The signed-in user if a valid token was sent. Anything else means guest.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<User>);

impl FromRequest for MaybeAuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = app_state(req);
        Box::pin(async move {
            let Some(token) = token else {
                return Ok(MaybeAuthUser(None));
            };
            match authenticate(state?, token).await {
                Ok(user) => Ok(MaybeAuthUser(Some(user))),
                Err(e) => {
                    log::debug!("ignoring unusable token on optional-auth route: {e}");
                    Ok(MaybeAuthUser(None))
                }
            }
        })
    }
}

/// Guest cart key from the `x-session-id` header.
#[derive(Debug, Clone)]
pub struct SessionId(pub Option<String>);

impl FromRequest for SessionId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = req
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        ready(Ok(SessionId(session)))
    }
}

/// Signed-in users own a durable cart; guests are keyed by their session id.
pub fn cart_owner(user: &MaybeAuthUser, session: &SessionId) -> Option<CartOwner> {
    match (&user.0, &session.0) {
        (Some(user), _) => Some(CartOwner::User(user.id)),
        (None, Some(sid)) => Some(CartOwner::Session(sid.clone())),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn bearer_prefix_is_required() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def"));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic Zm9v"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);
    }

    #[actix_web::test]
    async fn blank_session_header_is_ignored() {
        let req = TestRequest::default()
            .insert_header((SESSION_HEADER, "  "))
            .to_http_request();
        let SessionId(session) = SessionId::extract(&req).await.expect("extract");
        assert!(session.is_none());
    }

    #[test]
    fn guests_are_keyed_by_session() {
        let owner = cart_owner(&MaybeAuthUser(None), &SessionId(Some("sess-1".into())));
        assert_eq!(owner, Some(CartOwner::Session("sess-1".into())));
        assert_eq!(cart_owner(&MaybeAuthUser(None), &SessionId(None)), None);
    }
}
