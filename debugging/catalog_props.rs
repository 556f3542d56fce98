//! Fetch raw catalog JSON and print it next to what the client parses from it.
//! Usage:
//!   cargo run --bin catalog_props -- movies
//!   cargo run --bin catalog_props -- movie <movie_id>
//!   cargo run --bin catalog_props -- reviews <movie_id>
//! Uses CATALOG_API_URL and CATALOG_TOKEN_FILE from the environment (.env supported).

use anyhow::{Context, Result};
use cinereel::config::Config;
use cinereel::models::{Movie, Review};
use cinereel::token::{FileTokenStore, TokenStore};
use dotenvy::dotenv;
use reqwest::Client;
use serde_json::Value;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;
    let token = FileTokenStore::new(&config.token_file)
        .load()
        .unwrap_or_default();

    let mut args = env::args().skip(1);
    let kind = args.next().unwrap_or_else(|| "movies".to_string());
    let path = match kind.as_str() {
        "movies" => "/movies?reviews=true".to_string(),
        "movie" => {
            let id = args.next().context("movie requires <movie_id>")?;
            format!("/movies/{}?reviews=true", urlencoding::encode(&id))
        }
        "reviews" => {
            let id = args.next().context("reviews requires <movie_id>")?;
            format!("/movies/{}/reviews", urlencoding::encode(&id))
        }
        other => anyhow::bail!("unknown kind '{}': use movies, movie or reviews", other),
    };

    let client = Client::new();
    let response = client
        .get(format!("{}{}", config.api_url, path))
        .header("Accept", "application/json")
        .header("Authorization", token)
        .send()
        .await
        .context("Failed to call catalog API")?;
    let status = response.status();
    let raw: Value = response.json().await.context("Response was not JSON")?;

    println!("status: {}", status);
    println!("{}", serde_json::to_string_pretty(&raw)?);

    match kind.as_str() {
        "movies" => {
            let parsed: Vec<Movie> = serde_json::from_value(raw).context("Not a movie list")?;
            for movie in parsed {
                println!("parsed: {}", serde_json::to_string(&movie)?);
            }
        }
        "movie" => {
            let parsed: Movie = serde_json::from_value(raw).context("Not a movie")?;
            println!("parsed: {}", serde_json::to_string_pretty(&parsed)?);
        }
        _ => {
            let list = raw.get("reviews").cloned().unwrap_or(raw);
            let parsed: Vec<Review> = serde_json::from_value(list).context("Not a review list")?;
            println!("parsed {} reviews", parsed.len());
        }
    }
    Ok(())
}
