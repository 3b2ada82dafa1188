//! Configuration management for the `docquery` command.
//!
//! Settings come from a TOML file, `docquery.toml` in the working directory
//! unless `--config` or `DOCQUERY_CONFIG` names another one. A missing file
//! means defaults; command-line flags override individual values afterwards.

mod schema;

pub use schema::{
    ApiConfig, AssistantConfig, CODE_PLACEHOLDER, ConfigIssue, DEFAULT_CODE,
    DEFAULT_QUERY_TEMPLATE, DocqueryConfig, IssueLevel, KnowledgeStoreConfig, MAX_POLL_MULTIPLIER,
    PollConfig, QueryConfig,
};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "docquery.toml";

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// The file exists and overwriting was not requested.
    #[error("config file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// The explicit path if given, otherwise [`DEFAULT_CONFIG_FILE`].
#[must_use]
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load configuration from a specific path.
pub async fn load_config_from(path: &Path) -> ConfigResult<DocqueryConfig> {
    if !tokio::fs::try_exists(path).await? {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(DocqueryConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: DocqueryConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Save configuration to a specific path.
pub async fn save_config_to(config: &DocqueryConfig, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}

/// Write the default configuration to `path`.
///
/// An existing file is only replaced when `force` is set.
pub async fn init_config_at(path: &Path, force: bool) -> ConfigResult<DocqueryConfig> {
    if !force && tokio::fs::try_exists(path).await? {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }

    let config = DocqueryConfig::default();
    save_config_to(&config, path).await?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        assert_eq!(config_path(None), PathBuf::from("docquery.toml"));
        assert_eq!(
            config_path(Some(PathBuf::from("/etc/dq.toml"))),
            PathBuf::from("/etc/dq.toml")
        );
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).await.unwrap();
        assert_eq!(config, DocqueryConfig::default());
    }

    #[tokio::test]
    async fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_CONFIG_FILE);

        init_config_at(&path, false).await.unwrap();
        let loaded = load_config_from(&path).await.unwrap();
        assert_eq!(loaded, DocqueryConfig::default());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        tokio::fs::write(&path, "[query]\ncode = \"2130\"\n").await.unwrap();

        let err = init_config_at(&path, false).await.unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists(_)));
        assert_eq!(load_config_from(&path).await.unwrap().query.code, "2130");

        init_config_at(&path, true).await.unwrap();
        assert_eq!(load_config_from(&path).await.unwrap().query.code, DEFAULT_CODE);
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        tokio::fs::write(&path, "[poll]\ninterval_ms = \"fast\"\n").await.unwrap();

        assert!(matches!(
            load_config_from(&path).await,
            Err(ConfigError::TomlParse(_))
        ));
    }
}
