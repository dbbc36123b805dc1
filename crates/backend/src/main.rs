mod graphql;
mod records;
mod seed;
mod storage;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::{FromRef, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::{routing::get, Router};
use commute_shared::{dates, models::RouteObject};
use serde::Deserialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

use graphql::Schema;
use storage::Storage;

/// Runtime settings, read once from the environment.
#[derive(Debug, Clone, PartialEq)]
struct Config {
    port: u16,
    assets_dir: PathBuf,
    db_path: PathBuf,
    seed_file: PathBuf,
}

impl Config {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Ignoring invalid PORT");
                3000
            }),
            None => 3000,
        };
        Config {
            port,
            assets_dir: PathBuf::from(lookup("ASSETS_DIR").unwrap_or_else(|| "assets".to_string())),
            db_path: PathBuf::from(
                lookup("DB_PATH").unwrap_or_else(|| "data/transports.redb".to_string()),
            ),
            seed_file: PathBuf::from(
                lookup("SEED_FILE").unwrap_or_else(|| "assets/data/transports.json".to_string()),
            ),
        }
    }
}

#[derive(Clone)]
struct AppState {
    schema: Schema,
    storage: Arc<Storage>,
}

impl FromRef<AppState> for Schema {
    fn from_ref(state: &AppState) -> Self {
        state.schema.clone()
    }
}

impl FromRef<AppState> for Arc<Storage> {
    fn from_ref(state: &AppState) -> Self {
        state.storage.clone()
    }
}

async fn graphql_handler(State(schema): State<Schema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}

#[derive(Deserialize)]
struct DayQuery {
    date: Option<String>,
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// `GET /transports?date=YYYY-MM-DD`: the day's routes, ready to draw.
async fn transports_handler(
    State(storage): State<Arc<Storage>>,
    Query(query): Query<DayQuery>,
) -> Response {
    let Some(date) = query.date else {
        return json_error(StatusCode::BAD_REQUEST, "Missing date parameter");
    };
    if dates::parse_date(&date).is_none() {
        return json_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid date: {} (expected YYYY-MM-DD)", date),
        );
    }

    match storage.transports_on(&date) {
        Ok(day) => {
            tracing::debug!(date = %date, count = day.len(), "Serving transports");
            let routes: Vec<RouteObject> = day.iter().map(|t| t.to_route_object()).collect();
            Json(routes).into_response()
        }
        Err(e) => {
            tracing::error!(date = %date, error = %e, "Failed to load transports");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Build the full application router.
fn build_app(state: AppState, assets_dir: &Path) -> Router {
    // Static file routers are stateless, merge them before adding app state
    let static_files = Router::new()
        .nest("/static", cached_static_router(assets_dir, CACHE_1DAY))
        .nest(
            "/dist",
            cached_static_router(Path::new("dist"), CACHE_IMMUTABLE),
        )
        .nest(
            "/assets",
            cached_static_router(Path::new("dist/assets"), CACHE_IMMUTABLE),
        );

    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/transports", get(transports_handler))
        .route("/", get(serve_index))
        .route("/day/{date}", get(serve_index))
        .with_state(state)
        .merge(static_files)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    if let Some(parent) = config.db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!(path = %parent.display(), error = %e, "Failed to create database directory");
            std::process::exit(1);
        }
    }
    let storage = match Storage::open(&config.db_path) {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open storage");
            std::process::exit(1);
        }
    };
    if let Err(e) = seed::seed_if_empty(&storage, &config.seed_file) {
        tracing::warn!(error = %e, "Seeding failed, starting with existing data");
    }

    let schema = graphql::build_schema(storage.clone());
    let app = build_app(AppState { schema, storage }, &config.assets_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!("Server running at http://localhost:{}", config.port);
    tracing::info!("GraphiQL playground at http://localhost:{}/graphql", config.port);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server stopped");
        std::process::exit(1);
    }
}

async fn serve_index() -> Html<String> {
    // Try to serve the built frontend, fall back to a simple message
    match std::fs::read_to_string("dist/index.html") {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Commute Routes</title></head>
<body>
<h1>Commute Routes</h1>
<p>Frontend not built yet. Try <a href="/transports?date=2014-05-12">/transports</a> or visit <a href="/graphql">GraphiQL</a> to explore the API.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}
