use async_trait::async_trait;
use reqwest::Client;
use std::env;
use std::time::Duration;

use crate::models::OmdbPayload;

const OMDB_BASE: &str = "https://www.omdbapi.com";

/// The ratings-aggregation API. Strictly optional enrichment: a missing key,
/// an unreachable upstream, a decode failure and an OMDb "not found" all
/// come back as `None`. A lookup can slow a request down but never fail it.
#[async_trait]
pub trait OmdbApi: Send + Sync {
    async fn lookup(&self, imdb_id: &str) -> Option<OmdbPayload>;
}

#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    api_key: Option<String>,
}

impl OmdbClient {
    /// Reads `OMDB_API_KEY` if present. No key means every lookup is `None`.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("OMDB_API_KEY").ok().filter(|s| !s.is_empty());
        Self::new(api_key)
    }

    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(format!("boxofficer/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, api_key })
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl OmdbApi for OmdbClient {
    async fn lookup(&self, imdb_id: &str) -> Option<OmdbPayload> {
        let api_key = self.api_key.as_deref()?;
        let url = format!(
            "{OMDB_BASE}/?i={}&apikey={}",
            urlencoding::encode(imdb_id),
            api_key
        );

        let res = match self.client.get(&url).send().await {
            Ok(res) => res,
            Err(err) => {
                tracing::debug!("omdb lookup for {} failed: {}", imdb_id, err);
                return None;
            }
        };
        if !res.status().is_success() {
            tracing::debug!("omdb lookup for {} returned {}", imdb_id, res.status());
            return None;
        }

        let payload: OmdbPayload = match res.json().await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!("omdb payload for {} did not decode: {}", imdb_id, err);
                return None;
            }
        };
        // OMDb signals "no such title" inside a 200 body.
        if payload.response.as_deref() == Some("False") {
            return None;
        }
        Some(payload)
    }
}
