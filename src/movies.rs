use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::{
        DEFAULT_GENRE, DEFAULT_RATING, Movie, MovieFilter, MoviePatch, MovieSort, NewMovie,
        SortOrder,
    },
};

#[derive(Clone)]
pub struct MovieRepository {
    db: DatabaseConnection,
}

impl MovieRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewMovie) -> AppResult<Movie> {
        let title = new.validate()?;

        let model = movie::ActiveModel {
            id: Set(uuid::Uuid::now_v7().to_string()),
            title: Set(title),
            year: Set(new.year),
            gender: Set(new.genre.unwrap_or_else(|| DEFAULT_GENRE.to_string())),
            watched: Set(new.watched.unwrap_or(false)),
            rating: Set(new.rating.unwrap_or(DEFAULT_RATING)),
            created_at: Set(now_ms()),
        }
        .insert(&self.db)
        .await?;

        tracing::debug!(id = %model.id, title = %model.title, "movie created");
        Ok(model.into())
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<Movie>> {
        let found = movie::Entity::find_by_id(id.to_string()).one(&self.db).await?;
        Ok(found.map(Movie::from))
    }

    pub async fn list(&self, filter: MovieFilter) -> AppResult<Vec<Movie>> {
        let mut query = movie::Entity::find();

        if let Some(watched) = filter.watched {
            query = query.filter(movie::Column::Watched.eq(watched));
        }

        query = match filter.sort {
            MovieSort::Title => query.order_by_asc(movie::Column::Title),
            MovieSort::Rating(SortOrder::Asc) => {
                query.order_by_asc(movie::Column::Rating).order_by_asc(movie::Column::Title)
            }
            MovieSort::Rating(SortOrder::Desc) => {
                query.order_by_desc(movie::Column::Rating).order_by_asc(movie::Column::Title)
            }
        };

        let rows = query.all(&self.db).await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    pub async fn update(&self, id: &str, patch: MoviePatch) -> AppResult<Movie> {
        patch.validate()?;

        let existing = movie::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: movie::ActiveModel = existing.into();
        if let Some(title) = patch.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(year) = patch.year {
            active.year = Set(year);
        }
        if let Some(genre) = patch.genre {
            active.gender = Set(genre);
        }
        if let Some(watched) = patch.watched {
            active.watched = Set(watched);
        }
        if let Some(rating) = patch.rating {
            active.rating = Set(rating);
        }

        let model = active.update(&self.db).await?;
        tracing::debug!(id = %model.id, "movie updated");
        Ok(model.into())
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let res = movie::Entity::delete_by_id(id.to_string()).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        tracing::debug!(id, "movie deleted");
        Ok(())
    }
}

fn now_ms() -> i64 {
    jiff::Timestamp::now().as_millisecond()
}
