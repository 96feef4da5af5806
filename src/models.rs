use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: i64,
    pub title: String,
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub director: String,
    pub actors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    /// Link to a poster image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Payload for creating a film. Every field is optional at the wire level so
/// that a missing required field is reported as a validation error rather than
/// a body rejection.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FilmDraft {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub director: Option<String>,
    #[serde(default, deserialize_with = "lenient_actors")]
    pub actors: Option<Vec<String>>,
    pub annotation: Option<String>,
    pub image: Option<String>,
}

/// A validated draft, ready for id and timestamp assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct NewFilm {
    pub title: String,
    pub genre: String,
    pub year: Option<i32>,
    pub director: String,
    pub actors: Vec<String>,
    pub annotation: Option<String>,
    pub image: Option<String>,
}

impl FilmDraft {
    pub fn validate(self) -> AppResult<NewFilm> {
        let title = trimmed(self.title);
        let genre = trimmed(self.genre);
        let director = trimmed(self.director);
        let actors = self.actors.map(normalize_actors).filter(|a| !a.is_empty());

        let mut missing = Vec::new();
        if title.is_none() {
            missing.push("title");
        }
        if genre.is_none() {
            missing.push("genre");
        }
        if director.is_none() {
            missing.push("director");
        }
        if actors.is_none() {
            missing.push("actors[]");
        }

        match (title, genre, director, actors) {
            (Some(title), Some(genre), Some(director), Some(actors)) => Ok(NewFilm {
                title,
                genre,
                year: self.year,
                director,
                actors,
                annotation: trimmed(self.annotation),
                image: trimmed(self.image),
            }),
            _ => Err(AppError::validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }
}

/// Sparse update. An absent field is left alone; `year`, `annotation` and
/// `image` distinguish "absent" (`None`) from an explicit `null` (`Some(None)`).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FilmPatch {
    pub title: Option<String>,
    pub genre: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub year: Option<Option<i32>>,
    pub director: Option<String>,
    #[serde(default, deserialize_with = "lenient_actors")]
    pub actors: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub annotation: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
}

impl FilmPatch {
    /// Applies the present fields to `film`. Nothing is written unless the
    /// whole patch is valid. Does not touch `updated_at`.
    pub fn apply(self, film: &mut Film) -> AppResult<()> {
        let title = non_blank("title", self.title)?;
        let genre = non_blank("genre", self.genre)?;
        let director = non_blank("director", self.director)?;
        let actors = self.actors.map(normalize_actors).filter(|a| !a.is_empty());

        if let Some(title) = title {
            film.title = title;
        }
        if let Some(genre) = genre {
            film.genre = genre;
        }
        if let Some(year) = self.year {
            film.year = year;
        }
        if let Some(director) = director {
            film.director = director;
        }
        if let Some(actors) = actors {
            film.actors = actors;
        }
        if let Some(annotation) = self.annotation {
            film.annotation = trimmed(annotation);
        }
        if let Some(image) = self.image {
            film.image = trimmed(image);
        }
        Ok(())
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn non_blank(field: &str, value: Option<String>) -> AppResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(s) => match trimmed(Some(s)) {
            Some(s) => Ok(Some(s)),
            None => Err(AppError::validation(format!("{field} must not be empty"))),
        },
    }
}

fn normalize_actors(actors: Vec<String>) -> Vec<String> {
    actors
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

// Anything other than an array of strings reads as "not supplied".
fn lenient_actors<'de, D>(de: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(de)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => None,
    })
}

fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
