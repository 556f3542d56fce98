use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::ApiError;

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x450?text=No+Image";
pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actors: Vec<Actor>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviews: Vec<Review>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Actor {
    #[serde(rename = "actorName", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "characterName", default, deserialize_with = "null_as_default")]
    pub character: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Review {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Stars as stored by the server, rounded into `0..=5`; 0 when absent.
    #[serde(default, deserialize_with = "lenient_stars")]
    pub rating: u8,
    #[serde(rename = "review", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Movie {
    /// Average rating with one decimal, or a placeholder label when the API
    /// has not computed one yet.
    pub fn rating_label(&self) -> String {
        match self.avg_rating {
            Some(avg) if avg > 0.0 => format!("{avg:.1}"),
            _ => "No ratings".to_string(),
        }
    }

    pub fn image_or_placeholder(&self) -> &str {
        self.image_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .map(str::trim)
            .filter(|y| !y.is_empty())
    }
}

impl Review {
    pub fn author(&self) -> &str {
        self.username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(ANONYMOUS)
    }

    pub fn comment_or_default(&self) -> &str {
        self.comment
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("No comment")
    }
}

/// Star rating accepted by the reviews endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, ApiError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ApiError::validation(format!(
                "Rating must be between {} and {}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ReviewSubmission {
    #[serde(rename = "movieId")]
    pub movie_id: String,
    pub rating: Rating,
    #[serde(rename = "review")]
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    #[default]
    Title,
    Actor,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Title => "title",
            SearchKind::Actor => "actor",
        }
    }
}

impl std::str::FromStr for SearchKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "title" => Ok(SearchKind::Title),
            "actor" => Ok(SearchKind::Actor),
            _ => Err(anyhow::anyhow!("search kind must be 'title' or 'actor'")),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest<'a> {
    #[serde(rename = "searchTerm")]
    pub search_term: &'a str,
    #[serde(rename = "searchType")]
    pub search_type: SearchKind,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub username: String,
    pub password: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Int(n)) => Some(n.to_string()),
        Some(Raw::Float(n)) => Some(n.to_string()),
        None => None,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_stars<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let value = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Int(n)) => n as f64,
        Some(Raw::Float(n)) => n,
        Some(Raw::Text(s)) => s.trim().parse().unwrap_or(0.0),
        None => 0.0,
    };
    if !value.is_finite() {
        return Ok(0);
    }
    Ok(value.round().clamp(0.0, f64::from(Rating::MAX)) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_api_movie_shape() {
        let raw = json!({
            "_id": "m1",
            "title": "Heat",
            "releaseDate": 1995,
            "genre": "Action",
            "avgRating": 4.26,
            "actors": [{ "actorName": "Al Pacino", "characterName": "Vincent Hanna" }],
            "reviews": [{ "username": "sam", "rating": 5, "review": "classic", "movieId": "m1" }],
            "__v": 0
        });
        let movie: Movie = serde_json::from_value(raw).unwrap();
        assert_eq!(movie.id, "m1");
        assert_eq!(movie.release_date.as_deref(), Some("1995"));
        assert_eq!(movie.actors[0].character, "Vincent Hanna");
        assert_eq!(movie.reviews[0].comment.as_deref(), Some("classic"));
        assert_eq!(movie.rating_label(), "4.3");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let movie: Movie =
            serde_json::from_value(json!({ "_id": "1", "title": "A", "actors": null })).unwrap();
        assert!(movie.actors.is_empty());
        assert_eq!(movie.rating_label(), "No ratings");
        assert_eq!(movie.image_or_placeholder(), PLACEHOLDER_IMAGE);
        assert_eq!(movie.release_year(), None);

        let review = Review::default();
        assert_eq!(review.author(), "Anonymous");
        assert_eq!(review.comment_or_default(), "No comment");
    }

    #[test]
    fn release_year_from_full_date() {
        let movie = Movie {
            release_date: Some("2010-07-16".to_string()),
            ..Movie::default()
        };
        assert_eq!(movie.release_year(), Some("2010"));
    }

    #[test]
    fn rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(1).unwrap().get(), 1);
        assert_eq!(Rating::new(5).unwrap().get(), 5);
    }

    #[test]
    fn submission_uses_wire_names() {
        let body = serde_json::to_value(ReviewSubmission {
            movie_id: "m1".to_string(),
            rating: Rating::new(4).unwrap(),
            comment: "good".to_string(),
        })
        .unwrap();
        assert_eq!(body, json!({ "movieId": "m1", "rating": 4, "review": "good" }));
    }

    #[test]
    fn null_fields_do_not_sink_the_payload() {
        let raw = json!([
            {
                "_id": "m1",
                "title": null,
                "releaseDate": null,
                "actors": [{ "actorName": null, "characterName": "Neil" }],
                "reviews": [
                    { "username": null, "rating": null, "review": null },
                    { "username": "kim", "rating": 4.5, "review": "tense" },
                    { "username": "lee", "rating": "3", "review": "ok" },
                    { "username": "max", "rating": 9 }
                ]
            },
            { "_id": "m2", "title": "Ronin" }
        ]);
        let movies: Vec<Movie> = serde_json::from_value(raw).unwrap();
        assert_eq!(movies.len(), 2);

        let heat = &movies[0];
        assert_eq!(heat.title, "");
        assert_eq!(heat.release_date, None);
        assert_eq!(heat.actors[0].name, "");
        assert_eq!(heat.actors[0].character, "Neil");
        let stars: Vec<u8> = heat.reviews.iter().map(|r| r.rating).collect();
        assert_eq!(stars, vec![0, 5, 3, 5]);
        assert_eq!(heat.reviews[0].author(), ANONYMOUS);
        assert_eq!(movies[1].title, "Ronin");
    }
}
