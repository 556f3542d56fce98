use anyhow::{Context, Result};
use cinereel::actions;
use cinereel::api::{CatalogApi, HttpCatalogClient};
use cinereel::auth::AuthApi;
use cinereel::config::Config;
use cinereel::debounce::Debouncer;
use cinereel::models::{Credentials, SearchKind};
use cinereel::store::Store;
use cinereel::token::FileTokenStore;
use cinereel::view;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cinereel")]
#[command(about = "Browse, search and review movies from a catalog API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List movies, optionally filtered by title or cast
    List {
        #[arg(short, long, default_value = "")]
        filter: String,
    },
    /// Show one movie with cast and reviews
    Show { id: String },
    /// Refresh only the reviews of one movie
    Reviews { id: String },
    /// Search the catalog
    Search {
        term: String,
        #[arg(short, long, default_value = "title")]
        by: SearchKind,
    },
    /// Submit a 1-5 star review, then reload the movie
    Review {
        id: String,
        rating: i64,
        #[arg(default_value = "")]
        comment: String,
    },
    /// Sign in and store the returned token
    Signin {
        #[arg(short, long, env = "CATALOG_USERNAME")]
        username: String,
        #[arg(short, long, env = "CATALOG_PASSWORD")]
        password: String,
    },
    /// Register a new account
    Signup {
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, env = "CATALOG_USERNAME")]
        username: String,
        #[arg(short, long, env = "CATALOG_PASSWORD")]
        password: String,
    },
    /// Forget the stored token
    Signout,
    /// Read search input from stdin, one line per edit, and search once typing pauses
    WatchSearch {
        #[arg(short, long, default_value = "title")]
        by: SearchKind,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_result = dotenv();
    init_tracing();
    match dotenv_result {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let tokens = Arc::new(FileTokenStore::new(&config.token_file));
    let client = Arc::new(HttpCatalogClient::new(&config, tokens)?);
    let store = Arc::new(Store::default());

    let needs_token = !matches!(
        cli.command,
        Command::Signin { .. } | Command::Signup { .. } | Command::Signout
    );
    if needs_token && !client.is_signed_in() {
        warn!("No stored token; requests go out unauthenticated. Run `cinereel signin` first.");
    }

    run(cli.command, &config, client, store).await
}

async fn run(
    command: Command,
    config: &Config,
    client: Arc<HttpCatalogClient>,
    store: Arc<Store>,
) -> Result<()> {
    let api: &dyn CatalogApi = client.as_ref();
    match command {
        Command::List { filter } => {
            let _ = actions::list_movies(api, &store).await;
            print!("{}", view::render_movie_list(&store.snapshot(), &filter));
        }
        Command::Show { id } => {
            let _ = actions::get_movie(api, &store, &id).await;
            print!("{}", view::render_movie_detail(&store.snapshot()));
        }
        Command::Reviews { id } => {
            actions::get_movie(api, &store, &id).await?;
            actions::load_reviews(api, &store, &id).await;
            print!("{}", view::render_movie_detail(&store.snapshot()));
        }
        Command::Search { term, by } => {
            let _ = actions::search_movies(api, &store, &term, by).await;
            print!("{}", view::render_search(&store.snapshot(), &term));
        }
        Command::Review {
            id,
            rating,
            comment,
        } => {
            actions::submit_review(api, &store, &id, rating, &comment)
                .await
                .context("Failed to submit review")?;
            let _ = actions::get_movie(api, &store, &id).await;
            print!("{}", view::render_movie_detail(&store.snapshot()));
            actions::dismiss_review_notice(&store);
        }
        Command::Signin { username, password } => {
            let credentials = Credentials {
                name: None,
                username,
                password,
            };
            client
                .sign_in(&credentials)
                .await
                .context("Invalid username or password")?;
            println!("Signed in as {}", credentials.username);
        }
        Command::Signup {
            name,
            username,
            password,
        } => {
            let credentials = Credentials {
                name,
                username,
                password,
            };
            client
                .sign_up(&credentials)
                .await
                .context("Registration failed")?;
            println!("Registered {}; sign in to continue", credentials.username);
        }
        Command::Signout => {
            client.sign_out()?;
            println!("Signed out");
        }
        Command::WatchSearch { by } => watch_search(config, client, store, by).await?,
    }
    Ok(())
}

async fn watch_search(
    config: &Config,
    client: Arc<HttpCatalogClient>,
    store: Arc<Store>,
    kind: SearchKind,
) -> Result<()> {
    let mut debouncer = Debouncer::new(config.search_debounce);
    let mut updates = store.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_term = String::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                last_term = line.trim().to_string();
                if last_term.is_empty() {
                    debouncer.cancel();
                    continue;
                }
                let client = client.clone();
                let store = store.clone();
                let term = last_term.clone();
                debouncer.schedule(async move {
                    let _ = actions::search_movies(client.as_ref(), &store, &term, kind).await;
                });
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print!("{}", view::render_search(&snapshot, &last_term));
            }
        }
    }

    // Input closed: let a search still waiting on the quiet period, or
    // already in flight, land before exiting.
    if debouncer.is_pending() {
        let grace = debouncer.delay() + config.request_timeout;
        if tokio::time::timeout(grace, debouncer.idle()).await.is_err() {
            warn!("Search still running after {:?}; exiting", grace);
        }
        print!("{}", view::render_search(&store.snapshot(), &last_term));
    }
    Ok(())
}
