use std::cmp::Ordering;

use tracing::debug;

use crate::{
    models::Film,
    query::{FilmQuery, search_term},
};

/// Filters `films` by every constraint in `query`, then stable-sorts the
/// survivors if a sort is requested.
pub fn run(films: Vec<Film>, query: &FilmQuery) -> Vec<Film> {
    let total = films.len();
    let mut result: Vec<Film> = films.into_iter().filter(|f| matches(f, query)).collect();

    if let Some(sort) = query.sort {
        result = merge_sort(result, &|a: &Film, b: &Film| sort.compare(a, b));
    }

    debug!(total, matched = result.len(), sort = ?query.sort, "ran film query");
    result
}

pub fn matches(film: &Film, query: &FilmQuery) -> bool {
    if query.genre.as_deref().is_some_and(|g| film.genre != g) {
        return false;
    }
    if query.year.is_some_and(|y| film.year.map(f64::from) != Some(y)) {
        return false;
    }
    if query.added.is_some_and(|r| !r.contains(film.created_at)) {
        return false;
    }
    if query.updated.is_some_and(|r| !r.contains(film.updated_at)) {
        return false;
    }
    if let Some(term) = query.search.as_deref().and_then(search_term) {
        return haystack(film).contains(&term);
    }
    true
}

/// Stable merge sort. Unlike `slice::sort_by` it tolerates comparators that are
/// not a total order, which a sort key missing on some films produces.
fn merge_sort<T, F>(mut items: Vec<T>, cmp: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, cmp);
    let right = merge_sort(right, cmp);

    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => cmp(b, a) == Ordering::Less,
            _ => break,
        };
        out.extend(if take_right { right.next() } else { left.next() });
    }
    out.extend(left);
    out.extend(right);
    out
}

/// Title, director, annotation and actors joined by spaces, lower-cased.
fn haystack(film: &Film) -> String {
    let mut parts = vec![
        film.title.as_str(),
        film.director.as_str(),
        film.annotation.as_deref().unwrap_or(""),
    ];
    parts.extend(film.actors.iter().map(String::as_str));
    parts.join(" ").to_lowercase()
}
