use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::boxoffice::reconcile_revenue;
use crate::error::Result;
use crate::models::{MovieBundle, MovieDetail, MovieSummary};
use crate::omdb::OmdbApi;
use crate::tmdb::{TmdbApi, MAX_LIST_PAGES};
use crate::trakt::TraktApi;

/// How many trakt items get hydrated per request. Also the effective cap on
/// the hydration fan-out.
pub const SOCIAL_TRENDING_LIMIT: usize = 20;

/// Watch-provider availability is filtered to this region.
pub const WATCH_REGION: &str = "US";

/// The aggregation layer: one operation per supported query, each built from
/// the injected upstream clients. Holds no per-request state.
#[derive(Clone)]
pub struct Aggregator {
    tmdb: Arc<dyn TmdbApi>,
    trakt: Arc<dyn TraktApi>,
    omdb: Arc<dyn OmdbApi>,
}

impl Aggregator {
    pub fn new(tmdb: Arc<dyn TmdbApi>, trakt: Arc<dyn TraktApi>, omdb: Arc<dyn OmdbApi>) -> Self {
        Self { tmdb, trakt, omdb }
    }

    pub async fn now_playing(&self) -> Result<Vec<MovieSummary>> {
        self.tmdb.now_playing().await
    }

    pub async fn trending(&self) -> Result<Vec<MovieSummary>> {
        self.tmdb.trending().await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<MovieSummary>> {
        self.tmdb.search(query).await
    }

    pub async fn top_rated(&self, region: Option<&str>, pages: u32) -> Result<Vec<MovieSummary>> {
        self.tmdb.top_rated(region, pages.clamp(1, MAX_LIST_PAGES)).await
    }

    pub async fn top_grossing(&self, pages: u32) -> Result<Vec<MovieSummary>> {
        self.tmdb.top_grossing(pages.clamp(1, MAX_LIST_PAGES)).await
    }

    /// Trakt trending, hydrated against the catalog. Takes the top 20 ranked
    /// items, resolves each one's tmdb cross-reference concurrently, and
    /// drops items with no cross-reference or a failed resolution — the
    /// output may be shorter than 20. Results are re-sorted by TMDB
    /// popularity, which discards trakt's rank order; that matches the
    /// shipped behavior of the original service.
    pub async fn social_trending(&self) -> Result<Vec<MovieSummary>> {
        let items = self.trakt.trending_movies().await?;

        let mut tasks = JoinSet::new();
        for item in items.into_iter().take(SOCIAL_TRENDING_LIMIT) {
            let Some(tmdb_id) = item.movie.ids.tmdb else {
                debug!("dropping trakt item '{}': no tmdb id", item.movie.title);
                continue;
            };
            let tmdb = Arc::clone(&self.tmdb);
            let watchers = item.watchers;
            tasks.spawn(async move {
                match tmdb.movie_detail(tmdb_id).await {
                    Ok(detail) => Some(summary_from_detail(detail, watchers)),
                    Err(err) => {
                        debug!("dropping trakt item {}: hydration failed: {}", tmdb_id, err);
                        None
                    }
                }
            });
        }

        let mut hydrated = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(movie)) => hydrated.push(movie),
                Ok(None) => {}
                Err(err) => warn!("hydration task panicked: {}", err),
            }
        }

        hydrated.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
        Ok(hydrated)
    }

    /// Full detail merge: detail, credits and external ids are required and
    /// fetched concurrently; the watch-provider region and the OMDb payload
    /// are optional and degrade to absent fields.
    pub async fn movie_detail(&self, id: i32) -> Result<MovieBundle> {
        let (detail, credits, external_ids) = tokio::try_join!(
            self.tmdb.movie_detail(id),
            self.tmdb.credits(id),
            self.tmdb.external_ids(id),
        )?;

        let watch_providers = match self.tmdb.watch_providers(id, WATCH_REGION).await {
            Ok(region) => region,
            Err(err) => {
                debug!("watch providers for {} unavailable: {}", id, err);
                None
            }
        };

        let omdb = match external_ids.imdb_id.as_deref() {
            Some(imdb_id) => self.omdb.lookup(imdb_id).await,
            None => None,
        };

        let revenue_display = reconcile_revenue(
            detail.revenue,
            omdb.as_ref().and_then(|o| o.box_office.as_deref()),
        );

        Ok(MovieBundle {
            detail,
            credits,
            watch_providers,
            external_ids,
            omdb,
            revenue_display,
        })
    }
}

fn summary_from_detail(detail: MovieDetail, watchers: u64) -> MovieSummary {
    MovieSummary {
        id: detail.id,
        title: detail.title,
        overview: detail.overview,
        release_date: detail.release_date,
        poster_path: detail.poster_path,
        backdrop_path: detail.backdrop_path,
        vote_average: detail.vote_average,
        popularity: detail.popularity,
        genre_ids: detail.genres.into_iter().map(|g| g.id).collect(),
        watchers: Some(watchers),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxoffice::RevenueScope;
    use crate::error::ApiError;
    use crate::models::{
        Credits, ExternalIds, Genre, OmdbPayload, TraktIds, TraktMovie, TraktTrendingItem,
        WatchProviderRegion,
    };
    use async_trait::async_trait;

    struct StubTmdb {
        details: Vec<MovieDetail>,
    }

    fn detail(id: i32, popularity: f64) -> MovieDetail {
        MovieDetail {
            id,
            title: format!("Movie {id}"),
            overview: String::new(),
            release_date: Some("2025-06-01".to_string()),
            runtime: Some(110),
            budget: 0,
            revenue: 0,
            poster_path: Some(format!("/poster-{id}.jpg")),
            backdrop_path: None,
            vote_average: 7.0,
            vote_count: 100,
            popularity,
            genres: vec![Genre {
                id: 18,
                name: "Drama".to_string(),
            }],
        }
    }

    #[async_trait]
    impl TmdbApi for StubTmdb {
        async fn now_playing(&self) -> Result<Vec<MovieSummary>> {
            Ok(Vec::new())
        }
        async fn trending(&self) -> Result<Vec<MovieSummary>> {
            Ok(Vec::new())
        }
        async fn search(&self, _query: &str) -> Result<Vec<MovieSummary>> {
            Ok(Vec::new())
        }
        async fn top_rated(&self, _region: Option<&str>, _pages: u32) -> Result<Vec<MovieSummary>> {
            Ok(Vec::new())
        }
        async fn top_grossing(&self, _pages: u32) -> Result<Vec<MovieSummary>> {
            Ok(Vec::new())
        }
        async fn movie_detail(&self, id: i32) -> Result<MovieDetail> {
            self.details
                .iter()
                .find(|d| d.id == id)
                .cloned()
                .ok_or(ApiError::Upstream {
                    service: "tmdb",
                    status: 404,
                    body: "not found".to_string(),
                })
        }
        async fn credits(&self, _id: i32) -> Result<Credits> {
            Ok(Credits::default())
        }
        async fn watch_providers(
            &self,
            _id: i32,
            _region: &str,
        ) -> Result<Option<WatchProviderRegion>> {
            Ok(None)
        }
        async fn external_ids(&self, _id: i32) -> Result<ExternalIds> {
            Ok(ExternalIds {
                imdb_id: Some("tt0137523".to_string()),
            })
        }
    }

    struct StubTrakt {
        items: Vec<TraktTrendingItem>,
    }

    #[async_trait]
    impl TraktApi for StubTrakt {
        async fn trending_movies(&self) -> Result<Vec<TraktTrendingItem>> {
            Ok(self.items.clone())
        }
    }

    struct StubOmdb {
        payload: Option<OmdbPayload>,
    }

    #[async_trait]
    impl OmdbApi for StubOmdb {
        async fn lookup(&self, _imdb_id: &str) -> Option<OmdbPayload> {
            self.payload.clone()
        }
    }

    fn trakt_item(tmdb_id: Option<i32>, watchers: u64) -> TraktTrendingItem {
        TraktTrendingItem {
            watchers,
            movie: TraktMovie {
                title: format!("Trakt {watchers}"),
                year: Some(2025),
                ids: TraktIds {
                    trakt: watchers as i64,
                    slug: format!("trakt-{watchers}"),
                    imdb: None,
                    tmdb: tmdb_id,
                },
            },
        }
    }

    fn aggregator(tmdb: StubTmdb, trakt: StubTrakt, omdb: StubOmdb) -> Aggregator {
        Aggregator::new(Arc::new(tmdb), Arc::new(trakt), Arc::new(omdb))
    }

    #[tokio::test]
    async fn social_trending_drops_unresolvable_and_sorts_by_popularity() {
        let tmdb = StubTmdb {
            details: vec![detail(1, 10.0), detail(2, 99.0), detail(3, 50.0)],
        };
        let trakt = StubTrakt {
            items: vec![
                trakt_item(Some(1), 400),
                trakt_item(None, 300),     // no cross-reference id
                trakt_item(Some(2), 200),
                trakt_item(Some(777), 100), // hydration 404s
                trakt_item(Some(3), 50),
            ],
        };
        let agg = aggregator(tmdb, trakt, StubOmdb { payload: None });

        let movies = agg.social_trending().await.unwrap();
        let ids: Vec<i32> = movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(movies[0].watchers, Some(200));
        assert_eq!(movies[2].genre_ids, vec![18]);
    }

    #[tokio::test]
    async fn social_trending_hydrates_at_most_twenty() {
        let details: Vec<MovieDetail> = (1..=30).map(|id| detail(id, id as f64)).collect();
        let items: Vec<TraktTrendingItem> = (1..=30)
            .map(|id| trakt_item(Some(id), 1000 - id as u64))
            .collect();
        let agg = aggregator(
            StubTmdb { details },
            StubTrakt { items },
            StubOmdb { payload: None },
        );

        let movies = agg.social_trending().await.unwrap();
        assert_eq!(movies.len(), SOCIAL_TRENDING_LIMIT);
    }

    #[tokio::test]
    async fn movie_detail_attaches_domestic_fallback_revenue() {
        let agg = aggregator(
            StubTmdb {
                details: vec![detail(42, 1.0)],
            },
            StubTrakt { items: Vec::new() },
            StubOmdb {
                payload: Some(OmdbPayload {
                    imdb_id: Some("tt0137523".to_string()),
                    ratings: None,
                    box_office: Some("$123,456,789".to_string()),
                    response: Some("True".to_string()),
                    error: None,
                }),
            },
        );

        let bundle = agg.movie_detail(42).await.unwrap();
        assert_eq!(bundle.detail.id, 42);
        let figure = bundle.revenue_display.unwrap();
        assert_eq!(figure.amount, 123_456_789);
        assert_eq!(figure.scope, RevenueScope::DomesticOnly);
    }
}
