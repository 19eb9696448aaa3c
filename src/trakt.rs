use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::env;
use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::models::TraktTrendingItem;

const TRAKT_BASE: &str = "https://api.trakt.tv";
const TRAKT_API_VERSION: &str = "2";
const SERVICE: &str = "trakt";

/// The social-trending API. Upstream ordering is the ranking; the client
/// never re-sorts.
#[async_trait]
pub trait TraktApi: Send + Sync {
    async fn trending_movies(&self) -> Result<Vec<TraktTrendingItem>>;
}

#[derive(Debug, Clone)]
pub struct TraktClient {
    client: Client,
    headers: HeaderMap,
}

impl TraktClient {
    pub fn from_env() -> anyhow::Result<Self> {
        let client_id = env::var("TRAKT_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("TRAKT_CLIENT_ID not set"))?;
        Self::new(&client_id)
    }

    pub fn new(client_id: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "trakt-api-version",
            HeaderValue::from_static(TRAKT_API_VERSION),
        );
        headers.insert(
            "trakt-api-key",
            HeaderValue::from_str(client_id)
                .map_err(|_| anyhow::anyhow!("TRAKT_CLIENT_ID contains invalid characters"))?,
        );

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(format!("boxofficer/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, headers })
    }
}

#[async_trait]
impl TraktApi for TraktClient {
    async fn trending_movies(&self) -> Result<Vec<TraktTrendingItem>> {
        let url = format!("{TRAKT_BASE}/movies/trending");
        let res = self
            .client
            .get(&url)
            .headers(self.headers.clone())
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
}
