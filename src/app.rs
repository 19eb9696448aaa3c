use crate::aggregate::Aggregator;
use crate::cache::{keys, CacheStore, MemoryCache};
use crate::error::ApiError;
use crate::models::{MovieBundle, MovieSummary};
use crate::omdb::{OmdbApi, OmdbClient};
use crate::tmdb::{TmdbApi, TmdbClient};
use crate::trakt::{TraktApi, TraktClient};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{env, net::SocketAddr, sync::Arc};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 8080;

#[derive(Clone)]
pub struct AppState {
    pub agg: Aggregator,
    pub cache: Arc<dyn CacheStore>,
}

pub async fn run_server() -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::from_env()?);
    let trakt: Arc<dyn TraktApi> = Arc::new(TraktClient::from_env()?);
    let omdb_client = OmdbClient::from_env()?;
    if !omdb_client.enabled() {
        info!("OMDB_API_KEY not set, ratings enrichment disabled");
    }
    let omdb: Arc<dyn OmdbApi> = Arc::new(omdb_client);

    let state = AppState {
        agg: Aggregator::new(tmdb, trakt, omdb),
        cache: Arc::new(MemoryCache::new()),
    };

    let app = build_router(state);

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/nowPlaying", get(now_playing))
        .route("/trending", get(trending))
        .route("/traktTrending", get(trakt_trending))
        .route("/movieDetails", get(movie_details))
        .route("/search", get(search))
        .route("/topRated", get(top_rated))
        .route("/topGrossing", get(top_grossing))
        .route("/cache/*key", get(read_cache))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Write-through for a successful aggregation. A cache write never fails the
/// request that produced the data.
async fn write_cache<T: Serialize>(state: &AppState, key: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(payload) => state.cache.put(key, payload).await,
        Err(err) => warn!("skipping cache write for {}: {}", key, err),
    }
}

async fn now_playing(
    State(state): State<AppState>,
) -> Result<Json<Vec<MovieSummary>>, ApiError> {
    let movies = state.agg.now_playing().await?;
    write_cache(&state, keys::NOW_PLAYING, &movies).await;
    Ok(Json(movies))
}

async fn trending(State(state): State<AppState>) -> Result<Json<Vec<MovieSummary>>, ApiError> {
    let movies = state.agg.trending().await?;
    write_cache(&state, keys::TRENDING, &movies).await;
    Ok(Json(movies))
}

async fn trakt_trending(
    State(state): State<AppState>,
) -> Result<Json<Vec<MovieSummary>>, ApiError> {
    let movies = state.agg.social_trending().await?;
    write_cache(&state, keys::TRAKT_TRENDING, &movies).await;
    Ok(Json(movies))
}

#[derive(Deserialize)]
struct DetailsParams {
    id: Option<i32>,
}

async fn movie_details(
    State(state): State<AppState>,
    Query(params): Query<DetailsParams>,
) -> Result<Json<MovieBundle>, ApiError> {
    let id = params.id.ok_or(ApiError::Validation("id"))?;
    let bundle = state.agg.movie_detail(id).await?;
    write_cache(&state, &keys::movie_key(id), &bundle).await;
    Ok(Json(bundle))
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<MovieSummary>>, ApiError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(ApiError::Validation("q"))?;
    let movies = state.agg.search(query).await?;
    Ok(Json(movies))
}

#[derive(Deserialize)]
struct TopRatedParams {
    region: Option<String>,
    pages: Option<u32>,
}

async fn top_rated(
    State(state): State<AppState>,
    Query(params): Query<TopRatedParams>,
) -> Result<Json<Vec<MovieSummary>>, ApiError> {
    let movies = state
        .agg
        .top_rated(params.region.as_deref(), params.pages.unwrap_or(1))
        .await?;
    Ok(Json(movies))
}

#[derive(Deserialize)]
struct TopGrossingParams {
    pages: Option<u32>,
}

async fn top_grossing(
    State(state): State<AppState>,
    Query(params): Query<TopGrossingParams>,
) -> Result<Json<Vec<MovieSummary>>, ApiError> {
    let movies = state.agg.top_grossing(params.pages.unwrap_or(1)).await?;
    Ok(Json(movies))
}

/// The fallback read path. Clients hit this when a live endpoint fails and
/// treat a 404 as an empty result set; the server never does that mapping.
async fn read_cache(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.cache.get(&key).await {
        Some(entry) => (StatusCode::OK, Json(entry)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no cache entry for '{key}'") })),
        )
            .into_response(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
