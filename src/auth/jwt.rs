use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{
    config::{JwtConfig, MAX_TTL_MINUTES},
    state::AppState,
};

/// Only algorithm ever issued or accepted.
const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        }
    }
}

/// Signing and verification keys, built once from config.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    has_secret: bool,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            has_secret: !cfg.secret.is_empty(),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.clamp(0, MAX_TTL_MINUTES) as u64 * 60),
        }
    }

    fn claims_at(
        &self,
        now: OffsetDateTime,
        user_id: Uuid,
        email: &str,
        username: &str,
    ) -> Claims {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        if !self.has_secret {
            return Err(TokenError::Signing("signing secret is not configured".into()));
        }
        encode(&Header::new(ALGORITHM), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn issue(&self, user_id: Uuid, email: &str, username: &str) -> Result<String, TokenError> {
        let claims = self.claims_at(OffsetDateTime::now_utc(), user_id, email, username);
        let token = self.sign(&claims)?;
        debug!(user_id = %user_id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Checks signature, pinned algorithm, issuer, audience and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, issuer: &str, audience: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 24 * 60,
        }
    }

    fn make_keys() -> JwtKeys {
        JwtKeys::from_config(&config("dev-secret", "test-issuer", "test-aud"))
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, "alice@x.com", "alice").expect("issue");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "alice@x.com");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn two_tokens_for_same_identity_are_both_valid() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let a = keys.issue(user_id, "a@x.com", "a").unwrap();
        let b = keys.issue(user_id, "a@x.com", "a").unwrap();
        assert_eq!(keys.verify(&a).unwrap().sub, keys.verify(&b).unwrap().sub);
    }

    #[test]
    fn expired_token_reports_expiry() {
        let keys = make_keys();
        let past = OffsetDateTime::now_utc() - TimeDuration::days(2);
        let claims = keys.claims_at(past, Uuid::new_v4(), "a@x.com", "a");
        let token = keys.sign(&claims).unwrap();
        assert!(matches!(keys.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn empty_secret_cannot_sign() {
        let keys = JwtKeys::from_config(&config("", "iss", "aud"));
        let err = keys.issue(Uuid::new_v4(), "a@x.com", "a").unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
    }

    #[test]
    fn verify_rejects_foreign_secret() {
        let ours = make_keys();
        let theirs = JwtKeys::from_config(&config("other-secret", "test-issuer", "test-aud"));
        let token = theirs.issue(Uuid::new_v4(), "a@x.com", "a").unwrap();
        assert!(matches!(ours.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = make_keys();
        let bad = JwtKeys::from_config(&config("dev-secret", "bad-iss", "bad-aud"));
        let token = good.issue(Uuid::new_v4(), "a@x.com", "a").unwrap();
        assert!(matches!(bad.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn verify_rejects_mismatched_algorithm() {
        let keys = make_keys();
        let claims = keys.claims_at(OffsetDateTime::now_utc(), Uuid::new_v4(), "a@x.com", "a");
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(matches!(keys.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn verify_rejects_unsigned_none_token() {
        let keys = JwtKeys::from_config(&config("dev-secret", "movieshelf", "movieshelf-users"));
        // {"alg":"none"} . {"sub":"0000..", ..., "exp":9999999999, ...} . <no signature>
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
            eyJzdWIiOiIwMDAwMDAwMC0wMDAwLTAwMDAtMDAwMC0w\
            MDAwMDAwMDAwMDAiLCJlbWFpbCI6ImFAeC5jb20iLCJ1c2VybmFtZSI6ImEiLCJpYXQiOjEsImV4cCI6\
            OTk5OTk5OTk5OSwiaXNzIjoibW92aWVzaGVsZiIsImF1ZCI6Im1vdmllc2hlbGYtdXNlcnMifQ.";
        assert!(matches!(keys.verify(token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys();
        assert!(matches!(keys.verify("not.a.jwt"), Err(TokenError::Invalid(_))));
        assert!(matches!(keys.verify(""), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn non_uuid_subject_is_invalid() {
        let keys = make_keys();
        let mut claims = keys.claims_at(OffsetDateTime::now_utc(), Uuid::new_v4(), "a@x.com", "a");
        claims.sub = "507f1f77bcf86cd799439011".into();
        let token = keys.sign(&claims).unwrap();
        let verified = keys.verify(&token).expect("signature is fine");
        assert!(matches!(verified.user_id(), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn oversized_ttl_is_clamped_instead_of_overflowing() {
        let mut cfg = config("dev-secret", "test-issuer", "test-aud");
        cfg.ttl_minutes = i64::MAX;
        let keys = JwtKeys::from_config(&cfg);
        let token = keys.issue(Uuid::new_v4(), "a@x.com", "a").expect("issue");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.exp - claims.iat, (MAX_TTL_MINUTES * 60) as usize);
    }
}
