use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::RwLock;

use crate::{
    client::{ApiClient, ClientResult},
    models::{MAX_STARS, Movie, MoviePatch, NewMovie},
};

/// Shared client-side view of the collection.
///
/// Every action calls the server first and only then patches the local list,
/// so the list follows the last known server state. Failures are logged and
/// leave the list as it was.
#[derive(Clone)]
pub struct MovieContext {
    api: ApiClient,
    movies: Arc<RwLock<Vec<Movie>>>,
    loading: Arc<AtomicBool>,
}

impl MovieContext {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            movies: Arc::new(RwLock::new(Vec::new())),
            loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn movies(&self) -> Vec<Movie> {
        self.movies.read().await.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub async fn create(&self, movie: NewMovie) {
        match self.api.create_movie(&movie).await {
            Ok(created) => self.movies.write().await.push(created),
            Err(err) => tracing::error!(error = %err, "failed to create movie"),
        }
    }

    pub async fn update_fields(&self, id: &str, patch: MoviePatch) {
        match self.api.update_movie(id, &patch).await {
            Ok(updated) => {
                self.patch_local(id, |m| *m = updated).await;
            }
            Err(err) => tracing::error!(id, error = %err, "failed to update movie"),
        }
    }

    pub async fn update_rating(&self, id: &str, rating: i32) {
        if !(1..=MAX_STARS).contains(&rating) {
            tracing::warn!(id, rating, "rating outside the star scale, ignoring");
            return;
        }

        let patch = MoviePatch::rating(rating);
        match self.api.update_movie(id, &patch).await {
            Ok(_) => self.patch_local(id, |m| patch.apply_to(m)).await,
            Err(err) => tracing::error!(id, error = %err, "failed to update rating"),
        }
    }

    pub async fn toggle_watched(&self, id: &str, watched: bool) {
        let patch = MoviePatch::watched(watched);
        match self.api.update_movie(id, &patch).await {
            Ok(_) => self.patch_local(id, |m| patch.apply_to(m)).await,
            Err(err) => tracing::error!(id, error = %err, "failed to update watched status"),
        }
    }

    pub async fn delete(&self, id: &str) {
        match self.api.delete_movie(id).await {
            Ok(_) => self.movies.write().await.retain(|m| m.id != id),
            Err(err) => tracing::error!(id, error = %err, "failed to delete movie"),
        }
    }

    pub async fn movie_by_id(&self, id: &str) -> Option<Movie> {
        match self.api.movie(id).await {
            Ok(movie) => movie,
            Err(err) => {
                tracing::error!(id, error = %err, "failed to fetch movie");
                None
            }
        }
    }

    pub async fn load_all(&self) {
        self.load("all", |api| async move { api.list_movies(&Default::default()).await })
            .await;
    }

    pub async fn load_watched(&self) {
        self.load("watched", |api| async move { api.watched_movies().await }).await;
    }

    pub async fn load_not_watched(&self) {
        self.load("not watched", |api| async move { api.not_watched_movies().await }).await;
    }

    pub async fn load_by_rating(&self) {
        self.load("by rating", |api| async move { api.movies_by_rating().await }).await;
    }

    async fn load<F, Fut>(&self, kind: &'static str, fetch: F)
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = ClientResult<Vec<Movie>>>,
    {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            tracing::debug!(kind, "load already in flight, skipping");
            return;
        };

        match fetch(self.api.clone()).await {
            Ok(movies) => *self.movies.write().await = movies,
            Err(err) => tracing::error!(kind, error = %err, "failed to load movies"),
        }
    }

    async fn patch_local(&self, id: &str, f: impl FnOnce(&mut Movie)) {
        let mut movies = self.movies.write().await;
        if let Some(movie) = movies.iter_mut().find(|m| m.id == id) {
            f(movie);
        }
    }
}

/// Holds the loading flag for the duration of one list load.
struct LoadGuard<'a>(&'a AtomicBool);

impl<'a> LoadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);

        let guard = LoadGuard::acquire(&flag).expect("first acquire");
        assert!(flag.load(Ordering::Acquire));
        assert!(LoadGuard::acquire(&flag).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(LoadGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn failed_load_keeps_list_and_clears_flag() {
        let api = ApiClient::new("http://127.0.0.1:1").unwrap();
        let ctx = MovieContext::new(api);

        ctx.load_all().await;

        assert!(ctx.movies().await.is_empty());
        assert!(!ctx.is_loading());
    }

    #[tokio::test]
    async fn star_scale_is_checked_before_any_request() {
        let api = ApiClient::new("http://127.0.0.1:1").unwrap();
        let ctx = MovieContext::new(api);
        ctx.movies.write().await.push(Movie {
            id: "m1".into(),
            title: "Alien".into(),
            year: Some(1979),
            genre: "Terror".into(),
            watched: true,
            rating: 4,
            created_at: jiff::Timestamp::UNIX_EPOCH,
        });

        ctx.update_rating("m1", MAX_STARS + 1).await;
        ctx.update_rating("m1", 0).await;

        assert_eq!(ctx.movies().await[0].rating, 4);
    }
}
