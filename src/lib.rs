pub mod client;
pub mod config;
pub mod context;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod movies;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::Config, movies::MovieRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub movies: MovieRepository,
}

impl AppState {
    pub async fn connect(config: Config) -> error::AppResult<Arc<Self>> {
        let db = db::connect_and_migrate(&config).await?;
        Ok(Arc::new(Self { config: Arc::new(config), movies: MovieRepository::new(db) }))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/movie", post(routes::create_movie))
        .route("/api/movie/{id}", get(routes::get_movie).put(routes::update_movie))
        .route("/api/movies", get(routes::list_movies))
        .route("/api/movies/{id}", delete(routes::delete_movie))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
