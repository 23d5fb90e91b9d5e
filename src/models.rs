use std::ops::RangeInclusive;

use jiff::{Timestamp, civil::Date, tz::TimeZone};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::{
    entities::movie,
    error::{AppError, AppResult},
};

pub const DEFAULT_GENRE: &str = "Drama";
pub const DEFAULT_RATING: i32 = 1;
pub const RATING_RANGE: RangeInclusive<i32> = 1..=10;

/// Upper bound of the star scale the client UI rates with.
pub const MAX_STARS: i32 = 5;

const YEAR_RANGE: RangeInclusive<i32> = 1..=9999;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    #[serde(rename = "gender")]
    pub genre: String,
    pub watched: bool,
    pub rating: i32,
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
}

impl From<movie::Model> for Movie {
    fn from(m: movie::Model) -> Self {
        let created_at = Timestamp::from_millisecond(m.created_at).unwrap_or_else(|err| {
            tracing::warn!(id = %m.id, created_at = m.created_at, error = %err, "corrupt createdAt");
            Timestamp::UNIX_EPOCH
        });
        Self {
            id: m.id,
            title: m.title,
            year: m.year,
            genre: m.gender,
            watched: m.watched,
            rating: m.rating,
            created_at,
        }
    }
}

/// Body of `POST /api/movie`. Everything but the title falls back to a default.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewMovie {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_year", skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, rename = "gender", skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
}

impl NewMovie {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..Default::default() }
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn watched(mut self, watched: bool) -> Self {
        self.watched = Some(watched);
        self
    }

    pub fn rating(mut self, rating: i32) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Checks the body and returns the trimmed title.
    pub fn validate(&self) -> AppResult<String> {
        let title = self.title.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() {
            return Err(AppError::validation("title is required"));
        }
        if let Some(rating) = self.rating {
            check_rating(rating)?;
        }
        Ok(title.to_string())
    }
}

/// Body of `PUT /api/movie/{id}`. Absent fields are left untouched; `_id` and
/// `createdAt` are not part of the patch and are dropped during parsing.
/// `year` distinguishes absent (`None`) from an explicit `null` (`Some(None)`),
/// which clears the stored year.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoviePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_patch_year", skip_serializing_if = "Option::is_none")]
    pub year: Option<Option<i32>>,
    #[serde(default, rename = "gender", skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
}

impl MoviePatch {
    pub fn rating(rating: i32) -> Self {
        Self { rating: Some(rating), ..Default::default() }
    }

    pub fn watched(watched: bool) -> Self {
        Self { watched: Some(watched), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.year.is_none()
            && self.genre.is_none()
            && self.watched.is_none()
            && self.rating.is_none()
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.is_empty() {
            return Err(AppError::validation("at least one field is required"));
        }
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::validation("title must not be empty"));
        }
        if let Some(rating) = self.rating {
            check_rating(rating)?;
        }
        Ok(())
    }

    /// Applies the patched fields to an in-memory record.
    pub fn apply_to(&self, movie: &mut Movie) {
        if let Some(title) = &self.title {
            movie.title = title.trim().to_string();
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(genre) = &self.genre {
            movie.genre = genre.clone();
        }
        if let Some(watched) = self.watched {
            movie.watched = watched;
        }
        if let Some(rating) = self.rating {
            movie.rating = rating;
        }
    }
}

fn check_rating(rating: i32) -> AppResult<()> {
    if RATING_RANGE.contains(&rating) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "rating must be between {} and {}",
            RATING_RANGE.start(),
            RATING_RANGE.end()
        )))
    }
}

/// Query string of `GET /api/movies`, kept as raw strings so the server can
/// apply the exact matching rules in [`ListParams::filter`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched: Option<String>,
    #[serde(default, rename = "sortBy", skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

impl ListParams {
    pub fn watched(watched: bool) -> Self {
        Self { watched: Some(watched.to_string()), ..Default::default() }
    }

    pub fn by_rating(order: SortOrder) -> Self {
        Self {
            sort_by: Some("rating".to_string()),
            order: Some(order.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn filter(&self) -> MovieFilter {
        let watched = self.watched.as_deref().map(|w| w == "true");
        let sort = match self.sort_by.as_deref() {
            Some("rating") => match self.order.as_deref() {
                Some("desc") => MovieSort::Rating(SortOrder::Desc),
                _ => MovieSort::Rating(SortOrder::Asc),
            },
            _ => MovieSort::Title,
        };
        MovieFilter { watched, sort }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MovieSort {
    /// Alphabetical, always ascending.
    Title,
    /// By rating, ties broken by title ascending.
    Rating(SortOrder),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MovieFilter {
    pub watched: Option<bool>,
    pub sort: MovieSort,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YearInput {
    Number(i64),
    Text(String),
}

/// Accepts `2021`, `"2021"`, `"2021-10-22"` or `"2021-10-22T00:00:00.000Z"`
/// and keeps only the calendar year.
fn de_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(input) = Option::<YearInput>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let year = match input {
        YearInput::Number(n) => i32::try_from(n).ok(),
        YearInput::Text(s) => parse_year(&s),
    }
    .filter(|y| YEAR_RANGE.contains(y));

    year.map(Some).ok_or_else(|| de::Error::custom("year must be a year, date, or timestamp"))
}

/// Only called when the field is present, so `null` becomes `Some(None)`.
fn de_patch_year<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: Deserializer<'de>,
{
    de_year(deserializer).map(Some)
}

fn parse_year(s: &str) -> Option<i32> {
    let s = s.trim();
    if let Ok(year) = s.parse::<i32>() {
        return Some(year);
    }
    if let Ok(date) = s.parse::<Date>() {
        return Some(i32::from(date.year()));
    }
    let ts: Timestamp = s.parse().ok()?;
    Some(i32::from(ts.to_zoned(TimeZone::UTC).year()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year_of(json: &str) -> Result<Option<i32>, serde_json::Error> {
        serde_json::from_str::<NewMovie>(&format!(r#"{{"year": {json}}}"#)).map(|m| m.year)
    }

    #[test]
    fn year_accepts_numbers_dates_and_timestamps() {
        assert_eq!(year_of("2021").unwrap(), Some(2021));
        assert_eq!(year_of(r#""1999""#).unwrap(), Some(1999));
        assert_eq!(year_of(r#""1984-12-14""#).unwrap(), Some(1984));
        assert_eq!(year_of(r#""2021-10-22T00:00:00.000Z""#).unwrap(), Some(2021));
        assert_eq!(year_of("null").unwrap(), None);
    }

    #[test]
    fn year_rejects_garbage() {
        assert!(year_of(r#""next summer""#).is_err());
        assert!(year_of("0").is_err());
        assert!(year_of("123456").is_err());
    }

    #[test]
    fn list_params_follow_query_rules() {
        let params = ListParams::default();
        assert_eq!(params.filter(), MovieFilter { watched: None, sort: MovieSort::Title });

        let params = ListParams { watched: Some("yes".into()), ..Default::default() };
        assert_eq!(params.filter().watched, Some(false));

        let params = ListParams {
            sort_by: Some("title".into()),
            order: Some("desc".into()),
            ..Default::default()
        };
        assert_eq!(params.filter().sort, MovieSort::Title);

        let params = ListParams { sort_by: Some("rating".into()), ..Default::default() };
        assert_eq!(params.filter().sort, MovieSort::Rating(SortOrder::Asc));

        let params = ListParams::by_rating(SortOrder::Desc);
        assert_eq!(params.filter().sort, MovieSort::Rating(SortOrder::Desc));
    }

    #[test]
    fn list_params_serialize_to_query_names() {
        let query = serde_json::to_value(ListParams::by_rating(SortOrder::Desc)).unwrap();
        assert_eq!(query, serde_json::json!({ "sortBy": "rating", "order": "desc" }));
    }

    #[test]
    fn patch_ignores_identity_fields() {
        let patch: MoviePatch =
            serde_json::from_str(r#"{"_id": "abc", "createdAt": "2020-01-01T00:00:00Z"}"#).unwrap();
        assert!(patch.is_empty());
        assert!(matches!(patch.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn patch_tells_null_year_from_absent_year() {
        let absent: MoviePatch = serde_json::from_str(r#"{"watched": true}"#).unwrap();
        assert_eq!(absent.year, None);

        let cleared: MoviePatch = serde_json::from_str(r#"{"year": null}"#).unwrap();
        assert_eq!(cleared.year, Some(None));
        assert!(!cleared.is_empty());
        assert!(cleared.validate().is_ok());

        let set: MoviePatch = serde_json::from_str(r#"{"year": "1984-12-14"}"#).unwrap();
        assert_eq!(set.year, Some(Some(1984)));

        let json = serde_json::to_value(&cleared).unwrap();
        assert_eq!(json, serde_json::json!({ "year": null }));
    }

    #[test]
    fn patch_validation() {
        let patch = MoviePatch { title: Some("   ".into()), ..Default::default() };
        assert!(patch.validate().is_err());
        assert!(MoviePatch::rating(11).validate().is_err());
        assert!(MoviePatch::rating(10).validate().is_ok());
    }

    #[test]
    fn new_movie_requires_title() {
        assert!(NewMovie::default().validate().is_err());
        assert!(NewMovie::new("  ").validate().is_err());
        assert!(NewMovie::new("Dune").rating(0).validate().is_err());
        assert_eq!(NewMovie::new("  Dune ").validate().unwrap(), "Dune");
    }

    #[test]
    fn corrupt_created_at_falls_back_to_epoch() {
        let movie = Movie::from(movie::Model {
            id: "bad".into(),
            title: "Cats".into(),
            year: None,
            gender: DEFAULT_GENRE.into(),
            watched: false,
            rating: DEFAULT_RATING,
            created_at: i64::MAX,
        });
        assert_eq!(movie.created_at, Timestamp::UNIX_EPOCH);
        assert_eq!(movie.id, "bad");
    }

    #[test]
    fn apply_to_touches_only_patched_fields() {
        let mut movie = Movie {
            id: "1".into(),
            title: "Dune".into(),
            year: Some(2021),
            genre: "Ficção Científica".into(),
            watched: false,
            rating: 1,
            created_at: Timestamp::UNIX_EPOCH,
        };
        let before = movie.clone();

        MoviePatch::watched(true).apply_to(&mut movie);
        assert!(movie.watched);
        assert_eq!(movie.title, before.title);
        assert_eq!(movie.rating, before.rating);
        assert_eq!(movie.year, before.year);

        let cleared = MoviePatch { year: Some(None), ..Default::default() };
        cleared.apply_to(&mut movie);
        assert_eq!(movie.year, None);
        assert!(movie.watched);
    }
}
