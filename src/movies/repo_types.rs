use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub poster: String,
    pub trailer: String,
    pub actors: Vec<String>,
    pub genres: Vec<String>,
    pub user_id: Uuid, // owner, fixed at creation
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The mutable part of a movie; never carries the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieFields {
    pub title: String,
    pub description: String,
    pub poster: String,
    pub trailer: String,
    pub actors: Vec<String>,
    pub genres: Vec<String>,
}

/// 1-indexed page request, already clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}
