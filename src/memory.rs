//! In-process stores backing the same traits as Postgres. Used by tests and
//! when no `DATABASE_URL` is configured.

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{
    repo::UserStore,
    repo_types::{NewUser, User},
};
use crate::db::StoreError;
use crate::movies::{
    repo::MovieStore,
    repo_types::{Movie, MovieFields, Page, PageRequest},
};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        if users.iter().any(|u| u.username == new.username) {
            return Err(StoreError::Conflict("users_username_key".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

/// Keeps insertion order, which is the listing order.
#[derive(Default)]
pub struct InMemoryMovieStore {
    movies: RwLock<Vec<Movie>>,
}

fn paginate<'a>(matching: impl Iterator<Item = &'a Movie>, page: PageRequest) -> Page<Movie> {
    let matching: Vec<&Movie> = matching.collect();
    let items = matching
        .iter()
        .skip(page.offset() as usize)
        .take(page.size as usize)
        .map(|m| (*m).clone())
        .collect();
    Page {
        items,
        total: matching.len() as i64,
    }
}

#[async_trait]
impl MovieStore for InMemoryMovieStore {
    async fn create(&self, owner: Uuid, f: MovieFields) -> Result<Movie, StoreError> {
        let movie = Movie {
            id: Uuid::new_v4(),
            title: f.title,
            description: f.description,
            poster: f.poster,
            trailer: f.trailer,
            actors: f.actors,
            genres: f.genres,
            user_id: owner,
            created_at: OffsetDateTime::now_utc(),
        };
        self.movies.write().await.push(movie.clone());
        Ok(movie)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Movie>, StoreError> {
        Ok(self.movies.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Movie>, StoreError> {
        let movies = self.movies.read().await;
        Ok(paginate(movies.iter(), page))
    }

    async fn search_by_title(
        &self,
        title: &str,
        page: PageRequest,
    ) -> Result<Page<Movie>, StoreError> {
        let needle = title.to_lowercase();
        let movies = self.movies.read().await;
        Ok(paginate(
            movies
                .iter()
                .filter(|m| m.title.to_lowercase().contains(&needle)),
            page,
        ))
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        page: PageRequest,
    ) -> Result<Page<Movie>, StoreError> {
        let movies = self.movies.read().await;
        Ok(paginate(movies.iter().filter(|m| m.user_id == owner), page))
    }

    async fn update(&self, id: Uuid, f: MovieFields) -> Result<Option<Movie>, StoreError> {
        let mut movies = self.movies.write().await;
        let Some(movie) = movies.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        movie.title = f.title;
        movie.description = f.description;
        movie.poster = f.poster;
        movie.trailer = f.trailer;
        movie.actors = f.actors;
        movie.genres = f.genres;
        Ok(Some(movie.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut movies = self.movies.write().await;
        let before = movies.len();
        movies.retain(|m| m.id != id);
        Ok(movies.len() != before)
    }
}
