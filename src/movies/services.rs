use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::{
    repo::MovieStore,
    repo_types::{Movie, MovieFields, Page, PageRequest},
};
use crate::{auth::extractors::AuthUser, db::StoreError};

/// Result of an owner-gated mutation.
#[derive(Debug)]
pub enum OwnedMutation<T> {
    Done(T),
    NotFound,
    Forbidden,
}

#[derive(Clone)]
pub struct MovieService {
    movies: Arc<dyn MovieStore>,
}

impl MovieService {
    pub fn new(movies: Arc<dyn MovieStore>) -> Self {
        Self { movies }
    }

    pub async fn create(&self, owner: AuthUser, fields: MovieFields) -> Result<Movie, StoreError> {
        let movie = self.movies.create(owner.0, fields).await?;
        info!(movie_id = %movie.id, user_id = %owner.0, "movie created");
        Ok(movie)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Movie>, StoreError> {
        self.movies.get(id).await
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<Movie>, StoreError> {
        self.movies.list(page).await
    }

    pub async fn search(&self, title: &str, page: PageRequest) -> Result<Page<Movie>, StoreError> {
        self.movies.search_by_title(title, page).await
    }

    pub async fn list_mine(
        &self,
        owner: AuthUser,
        page: PageRequest,
    ) -> Result<Page<Movie>, StoreError> {
        self.movies.list_by_owner(owner.0, page).await
    }

    /// Loads the movie and compares its owner to the caller.
    async fn owned(
        &self,
        user: AuthUser,
        id: Uuid,
        action: &'static str,
    ) -> Result<OwnedMutation<Movie>, StoreError> {
        let Some(movie) = self.movies.get(id).await? else {
            return Ok(OwnedMutation::NotFound);
        };
        if movie.user_id != user.0 {
            warn!(
                movie_id = %id,
                owner = %movie.user_id,
                user_id = %user.0,
                action,
                "ownership check failed"
            );
            return Ok(OwnedMutation::Forbidden);
        }
        Ok(OwnedMutation::Done(movie))
    }

    /// The stored owner is kept; `fields` cannot carry one.
    pub async fn update(
        &self,
        user: AuthUser,
        id: Uuid,
        fields: MovieFields,
    ) -> Result<OwnedMutation<Movie>, StoreError> {
        match self.owned(user, id, "update").await? {
            OwnedMutation::Done(_) => {}
            OwnedMutation::NotFound => return Ok(OwnedMutation::NotFound),
            OwnedMutation::Forbidden => return Ok(OwnedMutation::Forbidden),
        }
        match self.movies.update(id, fields).await? {
            Some(movie) => {
                info!(movie_id = %id, user_id = %user.0, "movie updated");
                Ok(OwnedMutation::Done(movie))
            }
            // deleted between the check and the write
            None => Ok(OwnedMutation::NotFound),
        }
    }

    pub async fn delete(&self, user: AuthUser, id: Uuid) -> Result<OwnedMutation<()>, StoreError> {
        match self.owned(user, id, "delete").await? {
            OwnedMutation::Done(_) => {}
            OwnedMutation::NotFound => return Ok(OwnedMutation::NotFound),
            OwnedMutation::Forbidden => return Ok(OwnedMutation::Forbidden),
        }
        if !self.movies.delete(id).await? {
            return Ok(OwnedMutation::NotFound);
        }
        info!(movie_id = %id, user_id = %user.0, "movie deleted");
        Ok(OwnedMutation::Done(()))
    }
}
