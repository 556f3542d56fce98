use std::collections::HashMap;

use crate::models::Movie;

/// Collapses movies sharing a title and release year, keeping the one with
/// the higher average rating in the slot where that title first appeared.
pub fn dedupe_movies(movies: &[Movie]) -> Vec<Movie> {
    let mut slots: HashMap<(String, Option<String>), usize> = HashMap::new();
    let mut out: Vec<Movie> = Vec::with_capacity(movies.len());

    for movie in movies {
        let key = (
            movie.title.trim().to_lowercase(),
            movie.release_year().map(str::to_string),
        );
        match slots.get(&key) {
            Some(&idx) => {
                if rating_of(movie) > rating_of(&out[idx]) {
                    out[idx] = movie.clone();
                }
            }
            None => {
                slots.insert(key, out.len());
                out.push(movie.clone());
            }
        }
    }
    out
}

fn rating_of(movie: &Movie) -> f64 {
    movie.avg_rating.unwrap_or(f64::NEG_INFINITY)
}

/// Case-insensitive match on title, actor name or character name. A blank
/// term keeps everything.
pub fn filter_movies<'a>(movies: &'a [Movie], term: &str) -> Vec<&'a Movie> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return movies.iter().collect();
    }
    movies
        .iter()
        .filter(|m| {
            m.title.to_lowercase().contains(&needle)
                || m.actors.iter().any(|a| {
                    a.name.to_lowercase().contains(&needle)
                        || a.character.to_lowercase().contains(&needle)
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Actor;

    fn movie(id: &str, title: &str, year: &str, rating: Option<f64>) -> Movie {
        Movie {
            id: id.to_string(),
            title: title.to_string(),
            release_date: Some(year.to_string()),
            avg_rating: rating,
            ..Movie::default()
        }
    }

    #[test]
    fn keeps_higher_rated_duplicate_in_first_position() {
        let list = vec![
            movie("1", "Alien", "1979", Some(3.0)),
            movie("2", "Heat", "1995", Some(4.0)),
            movie("3", "Alien", "1979", Some(4.5)),
            movie("4", "Alien", "1979", None),
        ];
        let deduped = dedupe_movies(&list);
        let ids: Vec<&str> = deduped.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2"]);
    }

    #[test]
    fn remakes_with_other_year_are_kept() {
        let list = vec![
            movie("1", "Dune", "1984", Some(3.0)),
            movie("2", "Dune", "2021", Some(4.0)),
        ];
        assert_eq!(dedupe_movies(&list).len(), 2);
    }

    #[test]
    fn filter_matches_cast_and_characters() {
        let mut heat = movie("1", "Heat", "1995", None);
        heat.actors.push(Actor {
            name: "Robert De Niro".to_string(),
            character: "Neil McCauley".to_string(),
        });
        let list = vec![heat, movie("2", "Alien", "1979", None)];

        assert_eq!(filter_movies(&list, "  ").len(), 2);
        assert_eq!(filter_movies(&list, "de niro")[0].id, "1");
        assert_eq!(filter_movies(&list, "mccauley")[0].id, "1");
        assert_eq!(filter_movies(&list, "ALI")[0].id, "2");
        assert!(filter_movies(&list, "zzz").is_empty());
    }
}
