use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    response::{ApiResponse, PaginatedResponse},
    state::AppState,
};

use super::{
    dto::{MovieRequest, Pagination, SearchQuery},
    repo_types::{Movie, Page, PageRequest},
    services::OwnedMutation,
};

pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/search", get(search_movies))
        .route("/movies/mine", get(list_my_movies))
        .route(
            "/movies/:id",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
}

const RETRIEVED: &str = "Movies retrieved successfully";

fn paginated(page: Page<Movie>, req: PageRequest) -> Json<PaginatedResponse<Movie>> {
    Json(PaginatedResponse {
        success: true,
        message: RETRIEVED.into(),
        object: page.items,
        page_number: req.page,
        page_size: req.size,
        total_size: page.total,
    })
}

/// Ids that cannot exist are reported the same way as ids that do not.
fn movie_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Movie not found".into()))
}

fn query<T>(q: Result<Query<T>, QueryRejection>) -> AppResult<T> {
    q.map(|Query(v)| v).map_err(|e| AppError::BadRequest {
        message: "Invalid query parameters".into(),
        errors: Some(vec![e.body_text()]),
    })
}

#[instrument(skip(state, payload))]
pub async fn create_movie(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<MovieRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Movie>>)> {
    let Json(payload) = payload?;
    let fields = payload.into_fields().map_err(AppError::Validation)?;
    let movie = state.movies.create(user, fields).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Movie created successfully", movie)),
    ))
}

#[instrument(skip(state))]
pub async fn list_movies(
    State(state): State<AppState>,
    _user: AuthUser,
    q: Result<Query<Pagination>, QueryRejection>,
) -> AppResult<Json<PaginatedResponse<Movie>>> {
    let req = PageRequest::from(query(q)?);
    let page = state.movies.list(req).await?;
    Ok(paginated(page, req))
}

#[instrument(skip(state))]
pub async fn search_movies(
    State(state): State<AppState>,
    _user: AuthUser,
    q: Result<Query<SearchQuery>, QueryRejection>,
) -> AppResult<Json<PaginatedResponse<Movie>>> {
    let q = query(q)?;
    let req = PageRequest::new(q.page, q.size);
    let page = state.movies.search(&q.title, req).await?;
    Ok(paginated(page, req))
}

#[instrument(skip(state))]
pub async fn list_my_movies(
    State(state): State<AppState>,
    user: AuthUser,
    q: Result<Query<Pagination>, QueryRejection>,
) -> AppResult<Json<PaginatedResponse<Movie>>> {
    let req = PageRequest::from(query(q)?);
    let page = state.movies.list_mine(user, req).await?;
    Ok(paginated(page, req))
}

#[instrument(skip(state))]
pub async fn get_movie(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Movie>>> {
    let id = movie_id(&id)?;
    let movie = state
        .movies
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".into()))?;
    Ok(Json(ApiResponse::ok("Movie retrieved successfully", movie)))
}

#[instrument(skip(state, payload))]
pub async fn update_movie(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<MovieRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Movie>>> {
    let id = movie_id(&id)?;
    let Json(payload) = payload?;
    let fields = payload.into_fields().map_err(AppError::Validation)?;

    match state.movies.update(user, id, fields).await? {
        OwnedMutation::Done(movie) => {
            Ok(Json(ApiResponse::ok("Movie updated successfully", movie)))
        }
        OwnedMutation::NotFound => Err(AppError::NotFound("Movie not found".into())),
        OwnedMutation::Forbidden => Err(AppError::Forbidden(
            "You are not authorized to update this movie".into(),
        )),
    }
}

#[instrument(skip(state))]
pub async fn delete_movie(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = movie_id(&id)?;

    match state.movies.delete(user, id).await? {
        OwnedMutation::Done(()) => Ok(Json(ApiResponse::message("Movie deleted successfully"))),
        OwnedMutation::NotFound => Err(AppError::NotFound("Movie not found".into())),
        OwnedMutation::Forbidden => Err(AppError::Forbidden(
            "You are not authorized to delete this movie".into(),
        )),
    }
}
