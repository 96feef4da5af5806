use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    models::{Film, FilmDraft, FilmPatch},
};

/// In-memory film store. Clones share the same underlying sequence; every
/// mutation runs under the write lock.
#[derive(Clone, Default)]
pub struct FilmStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    films: Vec<Film>,
    /// Highest id ever handed out; ids freed by `delete` are not reused.
    last_id: i64,
}

impl FilmStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the bundled sample film.
    pub fn with_sample() -> AppResult<Self> {
        let store = Self::new();
        store.create(FilmDraft {
            title: Some("Inception".to_string()),
            genre: Some("Sci-Fi".to_string()),
            year: Some(2010),
            director: Some("Christopher Nolan".to_string()),
            actors: Some(vec!["Leonardo DiCaprio".to_string(), "Joseph Gordon-Levitt".to_string()]),
            annotation: Some("A mind-bending thriller".to_string()),
            image: None,
        })?;
        Ok(store)
    }

    /// Snapshot of every film in insertion order.
    pub fn list_all(&self) -> Vec<Film> {
        self.inner.read().films.clone()
    }

    pub fn get(&self, id: i64) -> AppResult<Film> {
        self.inner.read().films.iter().find(|f| f.id == id).cloned().ok_or(AppError::NotFound(id))
    }

    pub fn create(&self, draft: FilmDraft) -> AppResult<Film> {
        let new = draft.validate()?;

        let mut inner = self.inner.write();
        let max_id = inner.films.iter().map(|f| f.id).max().unwrap_or(0);
        let id = max_id.max(inner.last_id) + 1;
        let now = Timestamp::now();

        let film = Film {
            id,
            title: new.title,
            genre: new.genre,
            year: new.year,
            director: new.director,
            actors: new.actors,
            annotation: new.annotation,
            image: new.image,
            created_at: now,
            updated_at: now,
        };

        inner.last_id = id;
        inner.films.push(film.clone());
        info!(id, title = %film.title, "created film");
        Ok(film)
    }

    pub fn update(&self, id: i64, patch: FilmPatch) -> AppResult<Film> {
        let mut inner = self.inner.write();
        let film = inner.films.iter_mut().find(|f| f.id == id).ok_or(AppError::NotFound(id))?;

        patch.apply(film)?;
        film.updated_at = next_timestamp(film.updated_at);

        debug!(id, updated_at = %film.updated_at, "updated film");
        Ok(film.clone())
    }

    pub fn delete(&self, id: i64) -> AppResult<()> {
        let mut inner = self.inner.write();
        let index = inner.films.iter().position(|f| f.id == id).ok_or(AppError::NotFound(id))?;
        let film = inner.films.remove(index);
        info!(id, title = %film.title, "deleted film");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().films.len()
    }
}

/// The current time, or one nanosecond past `prev` if the clock has not moved
/// beyond it.
fn next_timestamp(prev: Timestamp) -> Timestamp {
    let now = Timestamp::now();
    if now > prev {
        now
    } else {
        prev.checked_add(SignedDuration::from_nanos(1)).unwrap_or(prev)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn draft(title: &str) -> FilmDraft {
        FilmDraft {
            title: Some(title.to_string()),
            genre: Some("Drama".to_string()),
            director: Some("Y".to_string()),
            actors: Some(vec!["A".to_string()]),
            ..FilmDraft::default()
        }
    }

    #[test]
    fn first_id_is_one() {
        let store = FilmStore::new();
        assert_eq!(store.create(draft("X")).unwrap().id, 1);
    }

    #[test]
    fn create_against_sample_store() {
        let store = FilmStore::with_sample().unwrap();
        let film = store.create(draft("X")).unwrap();
        assert_eq!(film.id, 2);
        assert_eq!(film.created_at, film.updated_at);

        let all = store.list_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|f| f.id == 2).count(), 1);
    }

    #[test]
    fn create_rejects_incomplete_drafts() {
        let store = FilmStore::new();
        let err = store.create(FilmDraft { actors: Some(vec![]), ..draft("X") }).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn ids_follow_the_max_existing_id() {
        let store = FilmStore::new();
        for title in ["a", "b", "c"] {
            store.create(draft(title)).unwrap();
        }
        store.delete(1).unwrap();
        assert_eq!(store.create(draft("d")).unwrap().id, 4);
    }

    #[test]
    fn deleted_max_id_is_not_reused() {
        let store = FilmStore::new();
        store.create(draft("a")).unwrap();
        store.create(draft("b")).unwrap();
        store.delete(2).unwrap();
        assert_eq!(store.create(draft("c")).unwrap().id, 3);
    }

    #[test]
    fn empty_update_only_bumps_updated_at() {
        let store = FilmStore::with_sample().unwrap();
        let before = store.get(1).unwrap();

        let after = store.update(1, FilmPatch::default()).unwrap();
        assert!(after.updated_at > before.updated_at);
        assert_eq!(Film { updated_at: before.updated_at, ..after.clone() }, before);
        assert!(after.created_at <= after.updated_at);
    }

    #[test]
    fn update_year_only() {
        let store = FilmStore::with_sample().unwrap();
        let before = store.get(1).unwrap();

        let patch = FilmPatch { year: Some(Some(2011)), ..FilmPatch::default() };
        let after = store.update(1, patch).unwrap();
        assert_eq!(after.year, Some(2011));
        assert_eq!(after.title, before.title);
        assert_eq!(after.actors, before.actors);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
        assert_eq!(store.get(1).unwrap(), after);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let store = FilmStore::with_sample().unwrap();
        let patch = FilmPatch { title: Some("Z".to_string()), ..FilmPatch::default() };
        assert!(matches!(store.update(999, patch), Err(AppError::NotFound(999))));
    }

    #[test]
    fn rejected_update_leaves_timestamp_alone() {
        let store = FilmStore::with_sample().unwrap();
        let before = store.get(1).unwrap();
        let patch = FilmPatch { director: Some(" ".to_string()), ..FilmPatch::default() };
        assert!(matches!(store.update(1, patch), Err(AppError::Validation(_))));
        assert_eq!(store.get(1).unwrap(), before);
    }

    #[test]
    fn delete_twice() {
        let store = FilmStore::with_sample().unwrap();
        store.delete(1).unwrap();
        assert!(store.list_all().iter().all(|f| f.id != 1));
        assert!(matches!(store.delete(1), Err(AppError::NotFound(1))));
    }

    #[test]
    fn list_all_is_a_snapshot() {
        let store = FilmStore::with_sample().unwrap();
        let mut snapshot = store.list_all();
        snapshot[0].title = "Changed".to_string();
        snapshot.clear();
        assert_eq!(store.get(1).unwrap().title, "Inception");
    }

    #[test]
    fn clones_share_state() {
        let store = FilmStore::new();
        let handle = store.clone();
        handle.create(draft("X")).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_creates_get_unique_ids() {
        let store = FilmStore::new();
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.create(draft(&format!("{t}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut ids: Vec<i64> = store.list_all().iter().map(|f| f.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=200).collect::<Vec<_>>());
    }
}
