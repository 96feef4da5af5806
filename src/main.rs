mod config;
mod engine;
mod error;
mod models;
mod query;
mod routes;
mod store;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::Config, store::FilmStore};

#[derive(Clone)]
pub struct AppState {
    pub store: FilmStore,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/films", get(routes::list_films).post(routes::create_film))
        .route(
            "/api/films/{id}",
            get(routes::get_film).put(routes::update_film).delete(routes::delete_film),
        )
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,film_catalog=debug".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let store = if config.seed_sample { FilmStore::with_sample()? } else { FilmStore::new() };
    tracing::info!(films = store.len(), "store ready");

    let state = Arc::new(AppState { store });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
