use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{ListParams, Movie, MoviePatch, NewMovie},
};

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewMovie>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let Json(new) = body?;
    let movie = state.movies.create(new).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<MoviePatch>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let Json(patch) = body?;
    let movie = state.movies.update(&id, patch).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<Json<Vec<Movie>>> {
    let Query(params) = query?;
    let movies = state.movies.list(params.filter()).await?;
    Ok(Json(movies))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Movie>> {
    let movie = state.movies.find(&id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(movie))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::validation("movie id is required"));
    }

    state.movies.delete(id).await?;
    Ok(Json(json!({ "message": "movie deleted" })))
}
