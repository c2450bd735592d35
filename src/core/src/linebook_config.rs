use std::path::PathBuf;

use directories::BaseDirs;
use linebook_protocol::{SortDirection, SortField, SortSpec};
use serde::Deserialize;

use crate::error::LineBookError;

const HOME_ENV: &str = "LINEBOOK_HOME";
const CONFIG_FILE: &str = "config.toml";
const DB_FILE: &str = "linebook.db";

/// Contents of `~/.linebook/config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinebookConfig {
    pub storage: StorageConfig,
    pub view: ViewConfig,
}

impl LinebookConfig {
    pub fn load() -> Result<Self, LineBookError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| LineBookError::Config(format!("read config.toml: {e}")))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, LineBookError> {
        toml::from_str(raw).map_err(|e| LineBookError::Config(format!("parse config.toml: {e}")))
    }

    pub fn config_path() -> Result<PathBuf, LineBookError> {
        Ok(linebook_home_dir()?.join(CONFIG_FILE))
    }

    /// Database file: the configured override, or `~/.linebook/linebook.db`.
    pub fn db_path(&self) -> Result<PathBuf, LineBookError> {
        match self.storage.db_path.as_deref() {
            Some(path) => resolve_path(path),
            None => Ok(linebook_home_dir()?.join(DB_FILE)),
        }
    }

    /// Default sort. Unknown names fall back to `contractDate asc`.
    pub fn default_sort(&self) -> SortSpec {
        let fallback = SortSpec::default();
        let field = self.view.sort_field.parse::<SortField>().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid view.sort_field; using default");
            fallback.field
        });
        let direction = self
            .view
            .sort_direction
            .parse::<SortDirection>()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "invalid view.sort_direction; using default");
                fallback.direction
            });
        SortSpec::new(field, direction)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub sort_field: String,
    pub sort_direction: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            sort_field: "contractDate".to_string(),
            sort_direction: "asc".to_string(),
        }
    }
}

/// `$LINEBOOK_HOME`, or `.linebook` under the user's home. Created if missing.
fn linebook_home_dir() -> Result<PathBuf, LineBookError> {
    let dir = match std::env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
        Some(value) => {
            let dir = PathBuf::from(value);
            if dir.is_relative() {
                return Err(LineBookError::Config(format!(
                    "{HOME_ENV} must be an absolute path"
                )));
            }
            dir
        }
        None => BaseDirs::new()
            .map(|base| base.home_dir().join(".linebook"))
            .ok_or_else(|| {
                LineBookError::Config(format!("cannot resolve a home directory; set {HOME_ENV}"))
            })?,
    };
    std::fs::create_dir_all(&dir)
        .map_err(|e| LineBookError::Config(format!("create {}: {e}", dir.display())))?;
    Ok(dir)
}

/// `~/` expands to the user's home; other relative paths sit under the
/// linebook home.
fn resolve_path(value: &str) -> Result<PathBuf, LineBookError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LineBookError::Config("path override is empty".to_string()));
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return Ok(base.home_dir().join(rest));
        }
    }
    let path = PathBuf::from(trimmed);
    if path.is_relative() {
        return Ok(linebook_home_dir()?.join(path));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = LinebookConfig::parse("").unwrap();
        assert!(config.storage.db_path.is_none());
        assert_eq!(config.default_sort(), SortSpec::default());
    }

    #[test]
    fn parses_view_section() {
        let config = LinebookConfig::parse(
            r#"
            [view]
            sort_field = "cancellationDate"
            sort_direction = "desc"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.default_sort(),
            SortSpec::new(SortField::CancellationDate, SortDirection::Desc)
        );
    }

    #[test]
    fn unknown_sort_names_fall_back() {
        let config = LinebookConfig::parse(
            r#"
            [view]
            sort_field = "price"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_sort(), SortSpec::default());
    }

    #[test]
    fn absolute_db_path_is_kept() {
        let config = LinebookConfig::parse(
            r#"
            [storage]
            db_path = "/var/lib/linebook/lines.db"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.db_path().unwrap(),
            PathBuf::from("/var/lib/linebook/lines.db")
        );
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            LinebookConfig::parse("[view"),
            Err(LineBookError::Config(_))
        ));
    }

    #[test]
    fn relative_paths_resolve_under_linebook_home() {
        let home = std::env::temp_dir().join(format!("linebook-home-{}", std::process::id()));
        std::env::set_var(HOME_ENV, &home);

        let config = LinebookConfig::parse(
            r#"
            [storage]
            db_path = "data/lines.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path().unwrap(), home.join("data/lines.db"));
        assert_eq!(LinebookConfig::config_path().unwrap(), home.join(CONFIG_FILE));
        assert_eq!(LinebookConfig::default().db_path().unwrap(), home.join(DB_FILE));
        assert!(home.is_dir());

        std::env::remove_var(HOME_ENV);
        let _ = std::fs::remove_dir_all(&home);
    }
}
