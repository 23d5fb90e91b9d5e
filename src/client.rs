use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::models::{ListParams, Movie, MoviePatch, NewMovie, SortOrder};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded {status}: {message}")]
    Api { status: StatusCode, message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

/// Typed access to the movie endpoints of a running server.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent("movieshelf/0.1")
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn list_movies(&self, params: &ListParams) -> ClientResult<Vec<Movie>> {
        let resp = self.http.get(self.url("/api/movies")).query(params).send().await?;
        decode(resp).await
    }

    pub async fn watched_movies(&self) -> ClientResult<Vec<Movie>> {
        self.list_movies(&ListParams::watched(true)).await
    }

    pub async fn not_watched_movies(&self) -> ClientResult<Vec<Movie>> {
        self.list_movies(&ListParams::watched(false)).await
    }

    pub async fn movies_by_rating(&self) -> ClientResult<Vec<Movie>> {
        self.list_movies(&ListParams::by_rating(SortOrder::Desc)).await
    }

    /// `Ok(None)` when the server has no movie with this id.
    pub async fn movie(&self, id: &str) -> ClientResult<Option<Movie>> {
        let url = self.url(&format!("/api/movie/{}", urlencoding::encode(id)));
        let resp = self.http.get(url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(resp).await.map(Some)
    }

    pub async fn create_movie(&self, movie: &NewMovie) -> ClientResult<Movie> {
        let resp = self.http.post(self.url("/api/movie")).json(movie).send().await?;
        decode(resp).await
    }

    pub async fn update_movie(&self, id: &str, patch: &MoviePatch) -> ClientResult<Movie> {
        let url = self.url(&format!("/api/movie/{}", urlencoding::encode(id)));
        let resp = self.http.put(url).json(patch).send().await?;
        decode(resp).await
    }

    /// Returns the server's confirmation message.
    pub async fn delete_movie(&self, id: &str) -> ClientResult<String> {
        let url = self.url(&format!("/api/movies/{}", urlencoding::encode(id)));
        let resp = self.http.delete(url).send().await?;
        let body: MessageBody = decode(resp).await?;
        Ok(body.message)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> ClientResult<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    Err(ClientError::Api { status, message })
}
