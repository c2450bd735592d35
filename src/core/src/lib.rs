mod config;
mod error;
mod linebook_config;
pub mod lines;
mod server;
pub mod storage;

pub use config::ServerConfig;
pub use error::LineBookError;
pub use linebook_config::{LinebookConfig, StorageConfig, ViewConfig};
pub use lines::{LineBook, MigrationReport, ViewRequest};
pub use server::build_router;
pub use storage::{KvStore, MemoryStore, SqliteStore};
