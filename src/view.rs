use std::fmt::Write;

use crate::catalog::{dedupe_movies, filter_movies};
use crate::models::Movie;
use crate::store::ClientState;

pub const NO_MOVIES: &str = "No movies available at this time.";
pub const NO_MATCHES: &str = "No movies found matching your search.";
pub const NO_MOVIE: &str = "No movie data available.";
pub const NO_REVIEWS: &str = "No reviews yet. Be the first to review!";
pub const NO_RESULTS: &str = "No results found";

pub fn render_movie_list(state: &ClientState, filter: &str) -> String {
    if state.loading {
        return "Loading movies...".to_string();
    }
    if let Some(err) = &state.error {
        return format!("Error loading movies: {}", err.message);
    }

    let unique = dedupe_movies(&state.movies);
    let shown = filter_movies(&unique, filter);
    if shown.is_empty() {
        return if filter.trim().is_empty() {
            NO_MOVIES.to_string()
        } else {
            NO_MATCHES.to_string()
        };
    }

    let mut out = String::new();
    for movie in shown {
        let _ = writeln!(out, "{}", movie_line(movie));
    }
    out
}

pub fn render_movie_detail(state: &ClientState) -> String {
    if state.loading {
        return "Loading movie details...".to_string();
    }
    if let Some(err) = &state.error {
        let mut out = format!("Error: {}", err.message);
        if let Some(details) = &err.details {
            let _ = write!(out, " ({details})");
        }
        return out;
    }
    let Some(movie) = &state.selected_movie else {
        return NO_MOVIE.to_string();
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", movie.title);
    let _ = writeln!(out, "Poster: {}", movie.image_or_placeholder());
    if let Some(genre) = &movie.genre {
        let _ = writeln!(out, "Genre: {genre}");
    }
    if let Some(date) = &movie.release_date {
        let _ = writeln!(out, "Released: {date}");
    }
    for actor in &movie.actors {
        let _ = writeln!(out, "  {} {}", actor.name, actor.character);
    }
    let _ = writeln!(out, "Rating: {}", movie.rating_label());
    let _ = writeln!(out, "Reviews:");
    if movie.reviews.is_empty() {
        let _ = writeln!(out, "  {NO_REVIEWS}");
    }
    for review in &movie.reviews {
        let _ = writeln!(
            out,
            "  {} ({}/5): {}",
            review.author(),
            review.rating,
            review.comment_or_default()
        );
    }
    if state.review_submitted {
        let _ = writeln!(out, "Review submitted successfully!");
    }
    out
}

pub fn render_search(state: &ClientState, term: &str) -> String {
    let mut out = String::new();
    if state.loading {
        let _ = writeln!(out, "Searching...");
    }
    if let Some(err) = &state.error {
        let _ = writeln!(out, "Error: {}", err.message);
        return out;
    }
    if state.search_results.is_empty() {
        if !term.trim().is_empty() && !state.loading {
            let _ = writeln!(out, "{NO_RESULTS}");
        }
        return out;
    }
    for movie in &state.search_results {
        let _ = writeln!(out, "{}", movie_line(movie));
        if !movie.actors.is_empty() {
            let cast = movie
                .actors
                .iter()
                .map(|a| format!("{} as {}", a.name, a.character))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "    Cast: {cast}");
        }
    }
    out
}

fn movie_line(movie: &Movie) -> String {
    let released = movie.release_date.as_deref().unwrap_or("-");
    format!(
        "[{}] {} ({}) * {}",
        movie.id,
        movie.title,
        released,
        movie.rating_label()
    )
}
