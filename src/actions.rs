use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::CatalogApi;
use crate::error::{ApiError, ApiResult};
use crate::models::{Movie, Rating, Review, ReviewSubmission, SearchKind};
use crate::store::{Channel, Event, Store};

pub async fn list_movies(api: &dyn CatalogApi, store: &Store) -> ApiResult<Vec<Movie>> {
    let ticket = store.begin(Channel::Movies);
    store.dispatch(Event::MoviesLoadStarted);
    match api.list_movies().await {
        Ok(movies) => {
            store.settle(
                ticket,
                Event::MoviesLoaded {
                    movies: movies.clone(),
                },
            );
            Ok(movies)
        }
        Err(e) => {
            error!("Error fetching movies: {}", e);
            store.settle(ticket, Event::MoviesLoadFailed { error: e.clone() });
            Err(e)
        }
    }
}

pub async fn get_movie(api: &dyn CatalogApi, store: &Store, id: &str) -> ApiResult<Movie> {
    let ticket = store.begin(Channel::Movie);
    store.dispatch(Event::MovieLoadStarted);
    match api.get_movie(id).await {
        Ok(movie) => {
            store.settle(
                ticket,
                Event::MovieLoaded {
                    movie: movie.clone(),
                },
            );
            Ok(movie)
        }
        Err(e) => {
            error!("Error fetching movie {}: {}", id, e);
            store.settle(ticket, Event::MovieLoadFailed { error: e.clone() });
            Err(e)
        }
    }
}

/// Seeds the detail view from a list item before the authoritative fetch.
pub fn select_movie(store: &Store, movie: Movie) {
    debug!("Selected movie {}", movie.id);
    store.dispatch(Event::MovieSelected { movie });
}

pub async fn search_movies(
    api: &dyn CatalogApi,
    store: &Store,
    term: &str,
    kind: SearchKind,
) -> ApiResult<Vec<Movie>> {
    let ticket = store.begin(Channel::Search);
    store.dispatch(Event::SearchStarted);
    match api.search_movies(term, kind).await {
        Ok(results) => {
            store.settle(
                ticket,
                Event::SearchResultsLoaded {
                    results: results.clone(),
                },
            );
            Ok(results)
        }
        Err(e) => {
            error!("Error searching movies: {}", e);
            store.settle(ticket, Event::SearchFailed { error: e.clone() });
            Err(e)
        }
    }
}

/// Validates and posts a review. Failures are only returned, never
/// dispatched; display of the error is up to the caller.
pub async fn submit_review(
    api: &dyn CatalogApi,
    store: &Store,
    movie_id: &str,
    rating: i64,
    comment: &str,
) -> ApiResult<Value> {
    let rating = Rating::new(rating)?;
    if movie_id.trim().is_empty() {
        return Err(ApiError::validation("Movie id must not be empty"));
    }
    let submission = ReviewSubmission {
        movie_id: movie_id.to_string(),
        rating,
        comment: comment.to_string(),
    };
    match api.submit_review(&submission).await {
        Ok(res) => {
            store.dispatch(Event::ReviewSubmitted);
            Ok(res)
        }
        Err(e) => {
            error!("Error submitting review: {}", e);
            Err(e)
        }
    }
}

pub fn dismiss_review_notice(store: &Store) {
    store.dispatch(Event::ReviewNoticeDismissed);
}

/// Refreshes the selected movie's reviews through the fallback-aware reviews
/// path. Dropped if the selection moved to another movie meanwhile.
pub async fn load_reviews(api: &dyn CatalogApi, store: &Store, movie_id: &str) -> Vec<Review> {
    let reviews = api.movie_reviews(movie_id).await;
    let still_selected = store
        .snapshot()
        .selected_movie
        .is_some_and(|m| m.id == movie_id);
    if still_selected {
        info!("Loaded {} reviews for {}", reviews.len(), movie_id);
        store.dispatch(Event::ReviewsLoaded {
            reviews: reviews.clone(),
        });
    } else {
        warn!("Selection changed before reviews for {} arrived", movie_id);
    }
    reviews
}
