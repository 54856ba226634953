use std::{future::Future, sync::Arc, time::Duration};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{LoginRequest, SignupRequest},
    jwt::{JwtKeys, TokenError},
    password::{hash_password, verify_password, PasswordError, MAX_PASSWORD_BYTES},
    repo::UserStore,
    repo_types::{NewUser, User},
};
use crate::db::StoreError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const PASSWORD_SPECIALS: &str = r#"!@#$%^&*(),.?":{}|<>"#;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9]+$").unwrap();
    /// Verified against when the email is unknown so both login failures cost one Argon2 run.
    static ref DUMMY_HASH: Option<String> = hash_password("movieshelf-unknown-account").ok();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Every rule that fails, in a fixed order. Empty means the input is acceptable.
pub fn validate_signup(req: &SignupRequest) -> Vec<String> {
    let mut errors = Vec::new();
    if !is_valid_email(&req.email) {
        errors.push("invalid email format".to_string());
    }
    if !USERNAME_RE.is_match(&req.username) {
        errors.push("username must be alphanumeric only".to_string());
    }
    let pw = &req.password;
    if pw.chars().count() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        ));
    }
    if pw.len() > MAX_PASSWORD_BYTES {
        errors.push(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes long"
        ));
    }
    if !pw.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("password must contain at least one uppercase letter".to_string());
    }
    if !pw.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("password must contain at least one lowercase letter".to_string());
    }
    if !pw.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        errors.push("password must contain at least one special character".to_string());
    }
    errors
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug)]
pub enum SignupOutcome {
    Created(User),
    Invalid(Vec<String>),
    EmailTaken,
    UsernameTaken,
    /// Lost the check-then-insert race; the unique index caught it.
    AlreadyExists,
}

#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated { token: String, user: User },
    InvalidCredentials,
}

/// Failures that are the server's fault, never the caller's.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("store call exceeded {0:?}")]
    Timeout(Duration),
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
    store_timeout: Duration,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys, store_timeout: Duration) -> Self {
        Self {
            users,
            keys,
            store_timeout,
        }
    }

    /// Same deadline for every store call of both flows.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, AuthError> {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(AuthError::Timeout(self.store_timeout)),
        }
    }

    pub async fn find_user(&self, id: uuid::Uuid) -> Result<Option<User>, AuthError> {
        self.bounded(self.users.find_by_id(id)).await
    }

    pub async fn signup(&self, mut req: SignupRequest) -> Result<SignupOutcome, AuthError> {
        req.email = normalize_email(&req.email);
        req.username = req.username.trim().to_string();

        let errors = validate_signup(&req);
        if !errors.is_empty() {
            warn!(errors = ?errors, "signup validation failed");
            return Ok(SignupOutcome::Invalid(errors));
        }

        // Check-then-insert is not atomic; the unique indexes are the backstop.
        if self.bounded(self.users.find_by_email(&req.email)).await?.is_some() {
            warn!(email = %req.email, "email already registered");
            return Ok(SignupOutcome::EmailTaken);
        }
        if self
            .bounded(self.users.find_by_username(&req.username))
            .await?
            .is_some()
        {
            warn!(username = %req.username, "username already registered");
            return Ok(SignupOutcome::UsernameTaken);
        }

        let password_hash = hash_password(&req.password)?;
        let new_user = NewUser {
            username: req.username,
            email: req.email,
            password_hash,
        };
        match self.bounded(self.users.create(new_user)).await {
            Ok(user) => {
                info!(user_id = %user.id, username = %user.username, "user registered");
                Ok(SignupOutcome::Created(user))
            }
            Err(AuthError::Store(StoreError::Conflict(constraint))) => {
                warn!(%constraint, "signup lost uniqueness race");
                Ok(SignupOutcome::AlreadyExists)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginOutcome, AuthError> {
        let email = normalize_email(&req.email);
        if req.password.len() > MAX_PASSWORD_BYTES {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let Some(user) = self.bounded(self.users.find_by_email(&email)).await? else {
            warn!(email = %email, "login unknown email");
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(&req.password, dummy);
            }
            return Ok(LoginOutcome::InvalidCredentials);
        };

        if !verify_password(&req.password, &user.password_hash)? {
            warn!(user_id = %user.id, "login invalid password");
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let token = self.keys.issue(user.id, &user.email, &user.username)?;
        info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome::Authenticated { token, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::JwtConfig, memory::InMemoryUserStore};
    use axum::async_trait;
    use uuid::Uuid;

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "svc-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 24 * 60,
        })
    }

    fn service() -> (AuthService, Arc<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::default());
        let svc = AuthService::new(store.clone(), keys(), Duration::from_secs(5));
        (svc, store)
    }

    fn signup_req(username: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn validation_reports_each_broken_rule() {
        let cases = [
            ("short", "Sh0rt!", "at least 8 characters"),
            ("upper", "passw0rd!", "uppercase"),
            ("lower", "PASSW0RD!", "lowercase"),
            ("special", "Passw0rdd", "special character"),
        ];
        for (username, password, expected) in cases {
            let errors = validate_signup(&signup_req(username, "a@x.com", password));
            assert_eq!(errors.len(), 1, "{password}: {errors:?}");
            assert!(errors[0].contains(expected), "{password}: {errors:?}");
        }
    }

    #[test]
    fn seven_char_password_fails_length_rule() {
        let errors = validate_signup(&signup_req("bob", "bob@x.com", "short1!"));
        assert!(errors.iter().any(|e| e.contains("at least 8 characters")));
    }

    #[test]
    fn email_and_username_shape() {
        let errors = validate_signup(&signup_req("bad name", "not-an-email", "Passw0rd!"));
        assert_eq!(
            errors,
            vec![
                "invalid email format".to_string(),
                "username must be alphanumeric only".to_string(),
            ]
        );
        assert!(validate_signup(&signup_req("alice", "alice@x.com", "Passw0rd!")).is_empty());
    }

    #[tokio::test]
    async fn signup_stores_only_a_hash() {
        let (svc, store) = service();
        let outcome = svc
            .signup(signup_req("alice", "alice@x.com", "Passw0rd!"))
            .await
            .unwrap();
        let SignupOutcome::Created(user) = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "Passw0rd!");
        assert!(verify_password("Passw0rd!", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn signup_rejects_duplicates() {
        let (svc, _) = service();
        svc.signup(signup_req("alice", "alice@x.com", "Passw0rd!"))
            .await
            .unwrap();

        let same_email = svc
            .signup(signup_req("alice2", "Alice@X.com", "Passw0rd!"))
            .await
            .unwrap();
        assert!(matches!(same_email, SignupOutcome::EmailTaken));

        let same_username = svc
            .signup(signup_req("alice", "other@x.com", "Passw0rd!"))
            .await
            .unwrap();
        assert!(matches!(same_username, SignupOutcome::UsernameTaken));
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let (svc, _) = service();
        svc.signup(signup_req("alice", "alice@x.com", "Passw0rd!"))
            .await
            .unwrap();
        let outcome = svc.login(login_req("alice@x.com", "Passw0rd!")).await.unwrap();
        let LoginOutcome::Authenticated { token, user } = outcome else {
            panic!("expected Authenticated, got {outcome:?}");
        };
        let claims = keys().verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@x.com");
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (svc, _) = service();
        svc.signup(signup_req("alice", "alice@x.com", "Passw0rd!"))
            .await
            .unwrap();
        let wrong_pw = svc.login(login_req("alice@x.com", "Passw0rd?")).await.unwrap();
        let unknown = svc.login(login_req("ghost@x.com", "Passw0rd!")).await.unwrap();
        assert!(matches!(wrong_pw, LoginOutcome::InvalidCredentials));
        assert!(matches!(unknown, LoginOutcome::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_email_costs_a_password_check() {
        let (svc, _) = service();
        svc.signup(signup_req("alice", "alice@x.com", "Passw0rd!"))
            .await
            .unwrap();
        // first call initialises the placeholder hash
        svc.login(login_req("ghost@x.com", "Passw0rd!")).await.unwrap();

        let mut known = Duration::ZERO;
        let mut unknown = Duration::ZERO;
        for _ in 0..3 {
            let start = std::time::Instant::now();
            svc.login(login_req("alice@x.com", "Wr0ngpass!")).await.unwrap();
            known += start.elapsed();

            let start = std::time::Instant::now();
            svc.login(login_req("ghost@x.com", "Wr0ngpass!")).await.unwrap();
            unknown += start.elapsed();
        }
        assert!(
            unknown * 4 >= known,
            "unknown email {unknown:?} vs known email {known:?}"
        );
    }

    struct StalledStore;

    #[async_trait]
    impl UserStore for StalledStore {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
            std::future::pending().await
        }
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            std::future::pending().await
        }
        async fn find_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
            std::future::pending().await
        }
        async fn create(&self, _user: NewUser) -> Result<User, StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn both_flows_honour_store_timeout() {
        let svc = AuthService::new(Arc::new(StalledStore), keys(), Duration::from_millis(20));
        let signup = svc
            .signup(signup_req("alice", "alice@x.com", "Passw0rd!"))
            .await;
        assert!(matches!(signup, Err(AuthError::Timeout(_))));
        let login = svc.login(login_req("alice@x.com", "Passw0rd!")).await;
        assert!(matches!(login, Err(AuthError::Timeout(_))));
    }
}
