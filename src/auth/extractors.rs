use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenError};
use crate::error::AppError;

/// Authenticated caller, threaded explicitly into handlers and services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[derive(Debug, thiserror::Error)]
pub enum AuthRejection {
    #[error("{0}")]
    MissingCredential(&'static str),

    #[error(transparent)]
    InvalidToken(#[from] TokenError),
}

impl From<AuthRejection> for AppError {
    fn from(r: AuthRejection) -> Self {
        let msg = match r {
            AuthRejection::MissingCredential(msg) => msg,
            AuthRejection::InvalidToken(TokenError::Expired) => "Token expired",
            AuthRejection::InvalidToken(_) => "Invalid token",
        };
        AppError::Unauthorized(msg.into())
    }
}

/// Bearer header -> verified token -> validated user id. Stateless.
pub fn authorize(headers: &HeaderMap, keys: &JwtKeys) -> Result<AuthUser, AuthRejection> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthRejection::MissingCredential("Authorization header missing"))?;

    // auth schemes are case-insensitive
    let token = header
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty())
        .ok_or(AuthRejection::MissingCredential("Bearer token not found"))?;

    let claims = keys.verify(token)?;
    let user_id = claims.user_id()?;
    Ok(AuthUser(user_id))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        authorize(&parts.headers, &keys).map_err(|r| {
            warn!(reason = %r, path = %parts.uri.path(), "request rejected by auth gate");
            AppError::from(r)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::http::HeaderValue;

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "gate-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 60,
        })
    }

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn missing_header_is_missing_credential() {
        let err = authorize(&HeaderMap::new(), &keys()).unwrap_err();
        assert!(matches!(err, AuthRejection::MissingCredential(_)));
    }

    #[test]
    fn wrong_scheme_is_missing_credential() {
        let keys = keys();
        let token = keys.issue(Uuid::new_v4(), "a@x.com", "a").unwrap();
        for value in [token.clone(), format!("Basic {token}"), "Bearer ".to_string()] {
            let err = authorize(&headers(&value), &keys).unwrap_err();
            assert!(matches!(err, AuthRejection::MissingCredential(_)), "{value}");
        }
    }

    #[test]
    fn scheme_matches_case_insensitively() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, "a@x.com", "a").unwrap();
        for scheme in ["bearer", "BEARER", "BeArEr"] {
            let user = authorize(&headers(&format!("{scheme} {token}")), &keys).unwrap();
            assert_eq!(user, AuthUser(user_id), "{scheme}");
        }
    }

    #[test]
    fn bad_token_is_invalid() {
        let err = authorize(&headers("Bearer abc.def.ghi"), &keys()).unwrap_err();
        assert!(matches!(err, AuthRejection::InvalidToken(TokenError::Invalid(_))));
    }

    #[test]
    fn valid_token_yields_user_id() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, "a@x.com", "a").unwrap();
        let user = authorize(&headers(&format!("Bearer {token}")), &keys).unwrap();
        assert_eq!(user, AuthUser(user_id));
    }

    #[test]
    fn rejections_render_as_unauthorized() {
        let app_err = AppError::from(AuthRejection::InvalidToken(TokenError::Expired));
        assert!(matches!(app_err, AppError::Unauthorized(ref m) if m == "Token expired"));
    }
}
