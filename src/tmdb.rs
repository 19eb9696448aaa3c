use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::env;
use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::models::{
    Credits, ExternalIds, MovieDetail, MovieSummary, PagedResults, WatchProviderRegion,
    WatchProvidersResponse,
};

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const SERVICE: &str = "tmdb";

/// Latency/upstream-load cap on the page loops: no listing call fetches more
/// than this many pages, regardless of what the caller asked for.
pub const MAX_LIST_PAGES: u32 = 5;

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
}

/// The catalog API. Every call is a single HTTP GET with the server-held key
/// injected as a query parameter; no retries.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn now_playing(&self) -> Result<Vec<MovieSummary>>;
    async fn trending(&self) -> Result<Vec<MovieSummary>>;
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>>;
    async fn top_rated(&self, region: Option<&str>, pages: u32) -> Result<Vec<MovieSummary>>;
    async fn top_grossing(&self, pages: u32) -> Result<Vec<MovieSummary>>;
    async fn movie_detail(&self, id: i32) -> Result<MovieDetail>;
    async fn credits(&self, id: i32) -> Result<Credits>;
    async fn watch_providers(&self, id: i32, region: &str) -> Result<Option<WatchProviderRegion>>;
    async fn external_ids(&self, id: i32) -> Result<ExternalIds>;
}

impl TmdbClient {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("TMDB_API_KEY")
            .map_err(|_| anyhow::anyhow!("TMDB_API_KEY not set"))?;
        Self::new(api_key)
    }

    pub fn new(api_key: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(format!("boxofficer/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, api_key })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let mut url = format!(
            "{TMDB_BASE}{path}?api_key={}&language=en-US",
            self.api_key
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Transport { service: SERVICE, source })?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|source| ApiError::Transport { service: SERVICE, source })?;
        if !status.is_success() {
            return Err(ApiError::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|source| ApiError::Parse { service: SERVICE, source })
    }

    /// Fetches `pages` pages of a listing endpoint in ascending order and
    /// concatenates the results. Pages are fetched sequentially, matching
    /// upstream's expectation of gentle paging.
    async fn fetch_pages(
        &self,
        path: &str,
        base_params: &[(&str, &str)],
        pages: u32,
    ) -> Result<Vec<MovieSummary>> {
        let mut all = Vec::new();
        for page in 1..=pages.clamp(1, MAX_LIST_PAGES) {
            let page_str = page.to_string();
            let mut params: Vec<(&str, &str)> = base_params.to_vec();
            params.push(("page", page_str.as_str()));
            let data: PagedResults = self.get_json(path, &params).await?;
            all.extend(data.results);
        }
        Ok(all)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn now_playing(&self) -> Result<Vec<MovieSummary>> {
        let data: PagedResults = self
            .get_json("/movie/now_playing", &[("page", "1")])
            .await?;
        Ok(data.results)
    }

    async fn trending(&self) -> Result<Vec<MovieSummary>> {
        let data: PagedResults = self.get_json("/trending/movie/week", &[]).await?;
        Ok(data.results)
    }

    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>> {
        let data: PagedResults = self
            .get_json("/search/movie", &[("query", query), ("page", "1")])
            .await?;
        Ok(data.results)
    }

    async fn top_rated(&self, region: Option<&str>, pages: u32) -> Result<Vec<MovieSummary>> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(region) = region {
            params.push(("region", region));
        }
        self.fetch_pages("/movie/top_rated", &params, pages).await
    }

    async fn top_grossing(&self, pages: u32) -> Result<Vec<MovieSummary>> {
        let params = [
            ("sort_by", "revenue.desc"),
            ("vote_count.gte", "500"),
        ];
        self.fetch_pages("/discover/movie", &params, pages).await
    }

    async fn movie_detail(&self, id: i32) -> Result<MovieDetail> {
        self.get_json(&format!("/movie/{id}"), &[]).await
    }

    async fn credits(&self, id: i32) -> Result<Credits> {
        self.get_json(&format!("/movie/{id}/credits"), &[]).await
    }

    async fn watch_providers(&self, id: i32, region: &str) -> Result<Option<WatchProviderRegion>> {
        let mut data: WatchProvidersResponse = self
            .get_json(&format!("/movie/{id}/watch/providers"), &[])
            .await?;
        Ok(data.results.remove(region))
    }

    async fn external_ids(&self, id: i32) -> Result<ExternalIds> {
        self.get_json(&format!("/movie/{id}/external_ids"), &[]).await
    }
}
