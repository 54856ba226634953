use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::TokenError;

/// JWT payload used for authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // user ID, UUID text
    pub email: String,
    pub username: String,
    pub iat: usize,       // issued at (unix timestamp)
    pub exp: usize,       // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}

impl Claims {
    /// The subject as a store id; anything that is not a UUID is an invalid token.
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| TokenError::Invalid("subject is not a valid user id".into()))
    }
}
