use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{
    jwt::JwtKeys,
    repo::{PgUserStore, UserStore},
    services::AuthService,
};
use crate::config::AppConfig;
use crate::memory::{InMemoryMovieStore, InMemoryUserStore};
use crate::movies::{
    repo::{MovieStore, PgMovieStore},
    services::MovieService,
};

#[derive(Clone)]
pub struct AppState {
    pub keys: JwtKeys,
    pub auth: AuthService,
    pub movies: MovieService,
}

impl AppState {
    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        movies: Arc<dyn MovieStore>,
    ) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        Self {
            auth: AuthService::new(users, keys.clone(), config.store_timeout()),
            movies: MovieService::new(movies),
            keys,
        }
    }

    pub fn with_postgres(config: Arc<AppConfig>, db: PgPool) -> Self {
        let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        let movies = Arc::new(PgMovieStore::new(db)) as Arc<dyn MovieStore>;
        Self::from_parts(config, users, movies)
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        Self::from_parts(
            config,
            Arc::new(InMemoryUserStore::default()),
            Arc::new(InMemoryMovieStore::default()),
        )
    }

    /// In-memory state with a fixed test secret.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::JwtConfig;

        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 24 * 60,
            },
            store_timeout_secs: 5,
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::in_memory(config)
    }
}
