//! Client state and the reducer that folds fetch events into it.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::debug;

use crate::error::ApiError;
use crate::models::{Movie, Review};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientState {
    pub movies: Vec<Movie>,
    pub selected_movie: Option<Movie>,
    pub search_results: Vec<Movie>,
    pub loading: bool,
    pub searching: bool,
    pub review_submitted: bool,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    MoviesLoadStarted,
    MoviesLoaded { movies: Vec<Movie> },
    MoviesLoadFailed { error: ApiError },
    MovieLoadStarted,
    MovieLoaded { movie: Movie },
    MovieLoadFailed { error: ApiError },
    MovieSelected { movie: Movie },
    ReviewSubmitted,
    ReviewNoticeDismissed,
    ReviewsLoaded { reviews: Vec<Review> },
    SearchStarted,
    SearchResultsLoaded { results: Vec<Movie> },
    SearchFailed { error: ApiError },
    #[serde(other)]
    Unknown,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::MoviesLoadStarted => "movies_load_started",
            Event::MoviesLoaded { .. } => "movies_loaded",
            Event::MoviesLoadFailed { .. } => "movies_load_failed",
            Event::MovieLoadStarted => "movie_load_started",
            Event::MovieLoaded { .. } => "movie_loaded",
            Event::MovieLoadFailed { .. } => "movie_load_failed",
            Event::MovieSelected { .. } => "movie_selected",
            Event::ReviewSubmitted => "review_submitted",
            Event::ReviewNoticeDismissed => "review_notice_dismissed",
            Event::ReviewsLoaded { .. } => "reviews_loaded",
            Event::SearchStarted => "search_started",
            Event::SearchResultsLoaded { .. } => "search_results_loaded",
            Event::SearchFailed { .. } => "search_failed",
            Event::Unknown => "unknown",
        }
    }
}

/// Pure transition `(state, event) -> state'`.
///
/// Total over every state and event. Failure events keep previously loaded
/// data and only touch `loading`/`error`.
pub fn reduce(state: &ClientState, event: &Event) -> ClientState {
    match event {
        Event::MoviesLoadStarted | Event::MovieLoadStarted => ClientState {
            loading: true,
            error: None,
            ..state.clone()
        },
        Event::MoviesLoaded { movies } => ClientState {
            movies: movies.clone(),
            loading: false,
            error: None,
            ..state.clone()
        },
        Event::MovieLoaded { movie } => ClientState {
            selected_movie: Some(movie.clone()),
            loading: false,
            error: None,
            ..state.clone()
        },
        Event::MoviesLoadFailed { error } | Event::MovieLoadFailed { error } => ClientState {
            loading: false,
            error: Some(error.clone()),
            ..state.clone()
        },
        Event::MovieSelected { movie } => ClientState {
            selected_movie: Some(movie.clone()),
            ..state.clone()
        },
        Event::ReviewSubmitted => ClientState {
            review_submitted: true,
            ..state.clone()
        },
        Event::ReviewNoticeDismissed => ClientState {
            review_submitted: false,
            ..state.clone()
        },
        Event::ReviewsLoaded { reviews } => match &state.selected_movie {
            Some(selected) => ClientState {
                selected_movie: Some(Movie {
                    reviews: reviews.clone(),
                    ..selected.clone()
                }),
                ..state.clone()
            },
            None => state.clone(),
        },
        Event::SearchStarted => ClientState {
            loading: true,
            searching: true,
            error: None,
            ..state.clone()
        },
        Event::SearchResultsLoaded { results } => ClientState {
            search_results: results.clone(),
            loading: false,
            searching: false,
            error: None,
            ..state.clone()
        },
        Event::SearchFailed { error } => ClientState {
            loading: false,
            searching: false,
            error: Some(error.clone()),
            ..state.clone()
        },
        Event::Unknown => state.clone(),
    }
}

/// Request streams whose responses can race each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Movies,
    Movie,
    Search,
}

impl Channel {
    fn slot(self) -> usize {
        match self {
            Channel::Movies => 0,
            Channel::Movie => 1,
            Channel::Search => 2,
        }
    }
}

/// Identifies one issued request; only the latest ticket per channel may
/// settle into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub channel: Channel,
    pub generation: u64,
}

#[derive(Debug)]
pub struct Store {
    state: watch::Sender<ClientState>,
    generations: [AtomicU64; 3],
}

impl Default for Store {
    fn default() -> Self {
        Self::new(ClientState::default())
    }
}

impl Store {
    pub fn new(initial: ClientState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state,
            generations: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
        }
    }

    pub fn snapshot(&self) -> ClientState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.subscribe()
    }

    pub fn dispatch(&self, event: Event) {
        debug!(event = event.name(), "dispatch");
        self.state.send_modify(|state| *state = reduce(state, &event));
    }

    /// Starts a new request on `channel`, superseding any in flight.
    pub fn begin(&self, channel: Channel) -> Ticket {
        let generation = self.generations[channel.slot()].fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            channel,
            generation,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generations[ticket.channel.slot()].load(Ordering::SeqCst) == ticket.generation
    }

    /// Applies a terminal event unless a newer request on the same channel
    /// has started. Returns whether the event was applied.
    pub fn settle(&self, ticket: Ticket, event: Event) -> bool {
        let mut applied = false;
        self.state.send_if_modified(|state| {
            if !self.is_current(ticket) {
                return false;
            }
            *state = reduce(state, &event);
            applied = true;
            true
        });
        if !applied {
            debug!(
                event = event.name(),
                generation = ticket.generation,
                "discarding stale response"
            );
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn movie(id: &str, title: &str) -> Movie {
        Movie {
            id: id.to_string(),
            title: title.to_string(),
            ..Movie::default()
        }
    }

    fn failure(message: &str) -> ApiError {
        ApiError::new(ErrorKind::Http, message)
    }

    #[test]
    fn movies_loaded_replaces_list_and_leaves_rest() {
        let state = ClientState::default();
        let next = reduce(
            &state,
            &Event::MoviesLoaded {
                movies: vec![movie("1", "A")],
            },
        );
        assert_eq!(next.movies, vec![movie("1", "A")]);
        assert!(!next.loading);
        assert!(next.error.is_none());
        assert!(next.selected_movie.is_none());
        assert!(next.search_results.is_empty());
    }

    #[test]
    fn failed_fetch_keeps_previous_data() {
        let mut state = ClientState {
            movies: vec![movie("1", "A")],
            selected_movie: Some(movie("1", "A")),
            ..ClientState::default()
        };
        state = reduce(&state, &Event::MovieLoadStarted);
        assert!(state.loading);
        state = reduce(
            &state,
            &Event::MovieLoadFailed {
                error: failure("boom"),
            },
        );
        assert!(!state.loading);
        assert_eq!(state.error.as_ref().map(|e| e.message.as_str()), Some("boom"));
        assert_eq!(state.movies, vec![movie("1", "A")]);
        assert_eq!(state.selected_movie, Some(movie("1", "A")));
    }

    #[test]
    fn success_clears_previous_error() {
        let state = ClientState {
            error: Some(failure("old")),
            ..ClientState::default()
        };
        let next = reduce(&state, &Event::MovieLoaded { movie: movie("2", "B") });
        assert!(next.error.is_none());
        assert_eq!(next.selected_movie, Some(movie("2", "B")));
    }

    #[test]
    fn search_failure_leaves_results() {
        let state = ClientState {
            search_results: vec![movie("9", "Z")],
            ..ClientState::default()
        };
        let started = reduce(&state, &Event::SearchStarted);
        assert!(started.loading && started.searching);
        let failed = reduce(
            &started,
            &Event::SearchFailed {
                error: failure("timeout"),
            },
        );
        assert!(!failed.loading && !failed.searching);
        assert_eq!(failed.error.unwrap().message, "timeout");
        assert_eq!(failed.search_results, vec![movie("9", "Z")]);
    }

    #[test]
    fn reviews_loaded_without_selection_is_noop() {
        let state = ClientState::default();
        let reviews = vec![Review {
            rating: 3,
            ..Review::default()
        }];
        assert_eq!(reduce(&state, &Event::ReviewsLoaded { reviews }), state);
    }

    #[test]
    fn reviews_loaded_replaces_only_reviews() {
        let selected = Movie {
            avg_rating: Some(4.0),
            genre: Some("Drama".to_string()),
            reviews: vec![Review::default()],
            ..movie("1", "A")
        };
        let state = ClientState {
            selected_movie: Some(selected.clone()),
            ..ClientState::default()
        };
        let reviews = vec![Review {
            username: Some("kim".to_string()),
            rating: 5,
            comment: Some("great".to_string()),
        }];
        let next = reduce(
            &state,
            &Event::ReviewsLoaded {
                reviews: reviews.clone(),
            },
        );
        let updated = next.selected_movie.unwrap();
        assert_eq!(updated.reviews, reviews);
        assert_eq!(
            Movie {
                reviews: selected.reviews.clone(),
                ..updated
            },
            selected
        );
    }

    #[test]
    fn review_flag_is_one_shot_until_dismissed() {
        let submitted = reduce(&ClientState::default(), &Event::ReviewSubmitted);
        assert!(submitted.review_submitted);
        let dismissed = reduce(&submitted, &Event::ReviewNoticeDismissed);
        assert!(!dismissed.review_submitted);
    }

    #[test]
    fn unknown_event_tag_is_identity() {
        let event: Event = serde_json::from_str(r#"{"type":"SOMETHING_ELSE","x":1}"#).unwrap();
        assert_eq!(event, Event::Unknown);
        let state = ClientState {
            loading: true,
            ..ClientState::default()
        };
        assert_eq!(reduce(&state, &event), state);
    }

    #[test]
    fn every_event_sequence_keeps_state_valid() {
        let events = vec![
            Event::MoviesLoadStarted,
            Event::MoviesLoaded {
                movies: vec![movie("1", "A"), movie("2", "B")],
            },
            Event::MovieSelected {
                movie: movie("2", "B"),
            },
            Event::MovieLoadStarted,
            Event::ReviewsLoaded { reviews: vec![] },
            Event::MovieLoadFailed {
                error: failure("x"),
            },
            Event::SearchStarted,
            Event::SearchResultsLoaded { results: vec![] },
            Event::ReviewSubmitted,
            Event::Unknown,
        ];
        let mut state = ClientState::default();
        for event in &events {
            state = reduce(&state, event);
            if let Some(err) = &state.error {
                assert!(!err.message.is_empty());
            }
        }
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.selected_movie.map(|m| m.id), Some("2".to_string()));
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let store = Store::default();
        let first = store.begin(Channel::Movie);
        let second = store.begin(Channel::Movie);
        assert!(store.settle(
            second,
            Event::MovieLoaded {
                movie: movie("2", "fast")
            }
        ));
        assert!(!store.settle(
            first,
            Event::MovieLoaded {
                movie: movie("1", "slow")
            }
        ));
        assert_eq!(
            store.snapshot().selected_movie.map(|m| m.title),
            Some("fast".to_string())
        );
    }

    #[test]
    fn channels_do_not_supersede_each_other() {
        let store = Store::default();
        let list = store.begin(Channel::Movies);
        let _search = store.begin(Channel::Search);
        assert!(store.is_current(list));
    }
}
