use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions, Strength};
use jiff::{
    Timestamp,
    civil::{Date, DateTime},
    tz::TimeZone,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::Film,
};

/// Search terms shorter than this (after trimming) do not filter.
pub const MIN_SEARCH_LEN: usize = 3;

/// Raw `GET /api/films` parameters, exactly as they arrive on the query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub genre: Option<String>,
    pub year: Option<String>,
    pub search: Option<String>,
    pub added_from: Option<String>,
    pub added_to: Option<String>,
    pub updated_from: Option<String>,
    pub updated_to: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
}

/// Inclusive timestamp bounds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateRange {
    pub from: Timestamp,
    pub to: Timestamp,
}

impl DateRange {
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.from <= ts && ts <= self.to
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Only `desc` inverts; anything else is ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortField {
    Id,
    Title,
    Genre,
    Year,
    Director,
    Annotation,
    Image,
}

enum SortKey<'a> {
    Text(&'a str),
    Number(i64),
    Missing,
}

impl SortField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(SortField::Id),
            "title" => Some(SortField::Title),
            "genre" => Some(SortField::Genre),
            "year" => Some(SortField::Year),
            "director" => Some(SortField::Director),
            "annotation" => Some(SortField::Annotation),
            "image" => Some(SortField::Image),
            _ => None,
        }
    }

    fn key(self, film: &Film) -> SortKey<'_> {
        match self {
            SortField::Id => SortKey::Number(film.id),
            SortField::Title => SortKey::Text(&film.title),
            SortField::Genre => SortKey::Text(&film.genre),
            SortField::Director => SortKey::Text(&film.director),
            SortField::Year => film.year.map_or(SortKey::Missing, |y| SortKey::Number(y.into())),
            SortField::Annotation => {
                film.annotation.as_deref().map_or(SortKey::Missing, SortKey::Text)
            }
            SortField::Image => film.image.as_deref().map_or(SortKey::Missing, SortKey::Text),
        }
    }

    /// Ascending comparison. A field missing on either side compares equal.
    pub fn compare(self, a: &Film, b: &Film) -> Ordering {
        match (self.key(a), self.key(b)) {
            (SortKey::Text(a), SortKey::Text(b)) => collate(a, b),
            (SortKey::Number(a), SortKey::Number(b)) => a.cmp(&b),
            _ => Ordering::Equal,
        }
    }
}

thread_local! {
    static COLLATOR: Option<Collator> = {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Tertiary);
        Collator::try_new(&Default::default(), options).ok()
    };
}

/// Root-locale string ordering: base letters first, then accents, then case
/// (lower case before upper case).
pub fn collate(a: &str, b: &str) -> Ordering {
    COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => {
            let folded = a
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase));
            folded.then_with(|| b.cmp(a))
        }
    })
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    pub fn compare(&self, a: &Film, b: &Film) -> Ordering {
        let ord = self.field.compare(a, b);
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

/// Structured, well-typed list query. `None` means no constraint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilmQuery {
    pub genre: Option<String>,
    /// Compared numerically; a fractional value matches no film.
    pub year: Option<f64>,
    pub added: Option<DateRange>,
    pub updated: Option<DateRange>,
    /// Free-text term. Trimmed and lower-cased when matched; ignored when
    /// shorter than [`MIN_SEARCH_LEN`].
    pub search: Option<String>,
    pub sort: Option<Sort>,
}

impl TryFrom<ListParams> for FilmQuery {
    type Error = AppError;

    fn try_from(params: ListParams) -> AppResult<Self> {
        let added = date_range(
            "addedFrom",
            params.added_from.as_deref(),
            "addedTo",
            params.added_to.as_deref(),
        )?;
        let updated = date_range(
            "updatedFrom",
            params.updated_from.as_deref(),
            "updatedTo",
            params.updated_to.as_deref(),
        )?;

        let sort = non_empty(params.sort_field.as_deref())
            .and_then(SortField::from_name)
            .map(|field| Sort { field, order: SortOrder::parse(params.sort_order.as_deref()) });

        Ok(FilmQuery {
            genre: non_empty(params.genre.as_deref()).map(str::to_string),
            year: non_empty(params.year.as_deref()).and_then(parse_number),
            added,
            updated,
            search: params.search.as_deref().and_then(search_term),
            sort,
        })
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.is_empty())
}

/// Numeric coercion of a query value: surrounding whitespace is ignored, an
/// all-blank value is zero, and exponent or decimal forms are accepted.
fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0.0);
    }
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// The normalized search term, or `None` when it is too short to filter.
pub fn search_term(raw: &str) -> Option<String> {
    let term = raw.trim();
    (term.chars().count() >= MIN_SEARCH_LEN).then(|| term.to_lowercase())
}

fn date_range(
    from_name: &str,
    from: Option<&str>,
    to_name: &str,
    to: Option<&str>,
) -> AppResult<Option<DateRange>> {
    // Every supplied bound is validated, even when its partner is missing.
    let from = non_empty(from).map(|raw| parse_instant(from_name, raw)).transpose()?;
    let to = non_empty(to).map(|raw| parse_instant(to_name, raw)).transpose()?;
    Ok(match (from, to) {
        (Some(from), Some(to)) => Some(DateRange { from, to }),
        _ => None,
    })
}

/// Accepts RFC 3339 timestamps, civil date-times (UTC) and plain dates (UTC
/// midnight).
fn parse_instant(name: &str, raw: &str) -> AppResult<Timestamp> {
    let raw = raw.trim();
    let invalid = || AppError::validation(format!("{name}: invalid date `{raw}`"));

    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Ok(ts);
    }

    let civil = if raw.len() == 10 {
        let date: Date = raw.parse().map_err(|_| invalid())?;
        date.at(0, 0, 0, 0)
    } else {
        raw.parse::<DateTime>().map_err(|_| invalid())?
    };

    civil.to_zoned(TimeZone::UTC).map(|z| z.timestamp()).map_err(|_| invalid())
}
