use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, PRAGMA,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ApiError, ApiResult, ErrorKind};
use crate::models::{Movie, Review, ReviewSubmission, SearchKind, SearchRequest};
use crate::token::TokenStore;

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_movies(&self) -> ApiResult<Vec<Movie>>;
    async fn get_movie(&self, id: &str) -> ApiResult<Movie>;
    async fn search_movies(&self, term: &str, kind: SearchKind) -> ApiResult<Vec<Movie>>;
    async fn submit_review(&self, review: &ReviewSubmission) -> ApiResult<Value>;
    /// Reviews for one movie. Never fails: when neither reviews endpoint
    /// answers, the list is empty.
    async fn movie_reviews(&self, id: &str) -> Vec<Review>;
}

#[derive(Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for HttpCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCatalogClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// The reviews endpoint answers with either a bare array or an object
/// wrapping it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReviewsPayload {
    List(Vec<Review>),
    Wrapped {
        #[serde(default)]
        reviews: Vec<Review>,
    },
}

impl ReviewsPayload {
    fn into_reviews(self) -> Vec<Review> {
        match self {
            ReviewsPayload::List(r) | ReviewsPayload::Wrapped { reviews: r } => r,
        }
    }
}

impl HttpCatalogClient {
    pub fn new(config: &Config, tokens: Arc<dyn TokenStore>) -> anyhow::Result<Self> {
        use anyhow::Context;
        let user_agent = format!("cinereel/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(config.request_timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build catalog HTTP client")?;
        Ok(Self::with_client(client, &config.api_url, tokens))
    }

    pub fn with_client(client: Client, base_url: &str, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let token = self.tokens.load().unwrap_or_default();
        let auth = HeaderValue::from_str(&token).unwrap_or_else(|_| {
            warn!("Stored token is not a valid header value; sending empty Authorization");
            HeaderValue::from_static("")
        });
        headers.insert(AUTHORIZATION, auth);
        headers
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .headers(self.default_headers())
    }

    /// Sends a request and parses a success body as `T`; any failure is
    /// normalised into an [`ApiError`] naming `operation`.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        operation: &str,
    ) -> ApiResult<T> {
        let res = req
            .send()
            .await
            .map_err(|e| ApiError::transport(operation, &e))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| ApiError::transport(operation, &e))?;
        debug!(status = status.as_u16(), operation, "response received");
        if !status.is_success() {
            return Err(ApiError::from_http(operation, status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(|e| ApiError::decode(operation, e))
    }

    async fn try_reviews(&self, path: &str) -> ApiResult<Vec<Review>> {
        let payload: ReviewsPayload = self
            .send_json(self.request(Method::GET, path), "fetch reviews")
            .await?;
        Ok(payload.into_reviews())
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn list_movies(&self) -> ApiResult<Vec<Movie>> {
        let movies: Vec<Movie> = self
            .send_json(
                self.request(Method::GET, "/movies?reviews=true"),
                "fetch movies",
            )
            .await?;
        info!("Fetched {} movies", movies.len());
        Ok(movies)
    }

    async fn get_movie(&self, id: &str) -> ApiResult<Movie> {
        if id.trim().is_empty() {
            return Err(ApiError::validation("Movie id must not be empty"));
        }
        let path = format!("/movies/{}?reviews=true", urlencoding::encode(id));
        let req = self
            .request(Method::GET, &path)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache");
        let movie: Movie = self.send_json(req, "fetch movie").await?;
        info!("Fetched movie '{}' ({})", movie.title, movie.id);
        Ok(movie)
    }

    async fn search_movies(&self, term: &str, kind: SearchKind) -> ApiResult<Vec<Movie>> {
        let body = SearchRequest {
            search_term: term,
            search_type: kind,
        };
        let req = self.request(Method::POST, "/movies/search").json(&body);
        let results: Vec<Movie> = self.send_json(req, "search movies").await?;
        info!(
            "Search by {} for '{}' returned {} movies",
            kind.as_str(),
            term,
            results.len()
        );
        Ok(results)
    }

    async fn submit_review(&self, review: &ReviewSubmission) -> ApiResult<Value> {
        let req = self.request(Method::POST, "/reviews").json(review);
        let res: Value = self.send_json(req, "submit review").await?;
        info!(
            "Submitted {}-star review for movie {}",
            review.rating, review.movie_id
        );
        Ok(res)
    }

    async fn movie_reviews(&self, id: &str) -> Vec<Review> {
        let encoded = urlencoding::encode(id);
        let primary = format!("/movies/{encoded}/reviews");
        let err = match self.try_reviews(&primary).await {
            Ok(reviews) => return reviews,
            Err(e) => e,
        };
        debug!("Primary reviews endpoint failed for {}: {}", id, err);

        let fallback = format!("/reviews?movieId={encoded}");
        match self.try_reviews(&fallback).await {
            Ok(reviews) => reviews,
            Err(e) => {
                let transport = e.kind == ErrorKind::Transport || err.kind == ErrorKind::Transport;
                warn!(
                    transport,
                    "No reviews available for movie {}: {} / {}", id, err, e
                );
                Vec::new()
            }
        }
    }
}
