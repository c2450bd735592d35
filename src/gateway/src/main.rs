use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use linebook_core::{build_router, LineBook, LinebookConfig, ServerConfig, SqliteStore};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_filter())
        .init();

    let file_config = load_linebook_config();
    let defaults = ServerConfig::default();

    let config = ServerConfig {
        bind: parse_socket("LINEBOOK_BIND", defaults.bind),
        default_sort: file_config.default_sort(),
    };

    let db_path = match env::var("LINEBOOK_DB_PATH") {
        Ok(path) => PathBuf::from(path),
        Err(_) => file_config.db_path()?,
    };
    tracing::info!(path = %db_path.display(), "opening line store");
    let store = Arc::new(SqliteStore::open(&db_path)?);
    let book = LineBook::load(store);

    let app = build_router(config.clone(), book);

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %config.bind, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn load_linebook_config() -> LinebookConfig {
    match LinebookConfig::load() {
        Ok(config) => config,
        Err(err) => {
            let path = LinebookConfig::config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "~/.linebook/config.toml".to_string());
            tracing::warn!(%path, error = %err, "failed to load linebook config; using defaults");
            LinebookConfig::default()
        }
    }
}

fn parse_socket(key: &str, default: SocketAddr) -> SocketAddr {
    match env::var(key) {
        Ok(v) => v.parse().unwrap_or_else(|_| {
            tracing::warn!(%key, value = %v, "invalid socket address; using default");
            default
        }),
        Err(_) => default,
    }
}

fn tracing_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}
