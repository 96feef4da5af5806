use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::{
    AppState, engine,
    error::AppResult,
    models::{Film, FilmDraft, FilmPatch},
    query::{FilmQuery, ListParams},
};

pub async fn list_films(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<Json<Vec<Film>>> {
    let Query(params) = params?;
    let query = FilmQuery::try_from(params)?;
    Ok(Json(engine::run(state.store.list_all(), &query)))
}

pub async fn get_film(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Film>> {
    let Path(id) = id?;
    Ok(Json(state.store.get(id)?))
}

pub async fn create_film(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FilmDraft>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Film>)> {
    let Json(draft) = payload?;
    let film = state.store.create(draft)?;
    Ok((StatusCode::CREATED, Json(film)))
}

pub async fn update_film(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<FilmPatch>, JsonRejection>,
) -> AppResult<Json<Film>> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    Ok(Json(state.store.update(id, patch)?))
}

pub async fn delete_film(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(id) = id?;
    state.store.delete(id)?;
    Ok(Json(json!({ "message": "film deleted", "id": id })))
}
