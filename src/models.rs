use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::boxoffice::RevenueFigure;

/// One movie as TMDB lists it (search, now-playing, trending, discover).
/// `watchers` is only populated on the trakt-hydrated trending path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watchers: Option<u64>,
}

/// Envelope around every paged TMDB listing endpoint.
#[derive(Debug, Deserialize)]
pub struct PagedResults {
    pub page: u32,
    pub results: Vec<MovieSummary>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub release_date: Option<String>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub budget: i64,
    #[serde(default)]
    pub revenue: i64,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: i64,
    pub name: String,
    pub job: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchProvider {
    pub provider_id: i32,
    pub provider_name: String,
    pub logo_path: Option<String>,
}

/// Availability for one region: subscription (`flatrate`), rent and buy lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchProviderRegion {
    pub link: Option<String>,
    pub flatrate: Option<Vec<WatchProvider>>,
    pub rent: Option<Vec<WatchProvider>>,
    pub buy: Option<Vec<WatchProvider>>,
}

#[derive(Debug, Deserialize)]
pub struct WatchProvidersResponse {
    #[serde(default)]
    pub results: HashMap<String, WatchProviderRegion>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalIds {
    pub imdb_id: Option<String>,
}

// ----- Trakt wire types -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktIds {
    pub trakt: i64,
    pub slug: String,
    pub imdb: Option<String>,
    pub tmdb: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktMovie {
    pub title: String,
    pub year: Option<i32>,
    pub ids: TraktIds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktTrendingItem {
    pub watchers: u64,
    pub movie: TraktMovie,
}

// ----- OMDb wire types -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmdbRating {
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// OMDb answers `200` with `"Response": "False"` for unknown ids, so the
/// client has to inspect the payload rather than the status code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmdbPayload {
    #[serde(rename = "imdbID")]
    pub imdb_id: Option<String>,
    #[serde(rename = "Ratings")]
    pub ratings: Option<Vec<OmdbRating>>,
    #[serde(rename = "BoxOffice")]
    pub box_office: Option<String>,
    #[serde(rename = "Response")]
    pub response: Option<String>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

/// The merged `movieDetails` response: TMDB detail flattened at the top
/// level, with credits, the single-region providers, external ids and the
/// optional OMDb enrichment nested alongside.
#[derive(Debug, Clone, Serialize)]
pub struct MovieBundle {
    #[serde(flatten)]
    pub detail: MovieDetail,
    pub credits: Credits,
    #[serde(rename = "watchProviders")]
    pub watch_providers: Option<WatchProviderRegion>,
    #[serde(rename = "externalIds")]
    pub external_ids: ExternalIds,
    pub omdb: Option<OmdbPayload>,
    #[serde(rename = "revenueDisplay", skip_serializing_if = "Option::is_none")]
    pub revenue_display: Option<RevenueFigure>,
}
