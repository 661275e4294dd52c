mod file_config;

pub use file_config::{FileConfig, LlmConfig, ProvidersConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
}

/// Provider API keys; a missing key simply leaves that provider
/// unregistered.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub omdb_api_key: Option<String>,
    pub google_books_api_key: Option<String>,
}

/// Genre-deduction LLM settings; the deducer is only built when this
/// section is present in the config file.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,

    // Feature configs
    pub providers: ProviderSettings,
    pub llm: Option<LlmSettings>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let logging_level = match file.logging_level {
            Some(raw) => RequestsLoggingLevel::from_str(&raw, true)
                .map_err(|e| anyhow::anyhow!("Invalid logging_level in config file: {}", e))?,
            None => cli.logging_level.clone(),
        };

        let providers = file
            .providers
            .map(|p| ProviderSettings {
                omdb_api_key: p.omdb_api_key,
                google_books_api_key: p.google_books_api_key,
            })
            .unwrap_or_default();

        let llm = file.llm.map(|l| LlmSettings {
            base_url: l
                .base_url
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: l.model.unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            api_key: l.api_key,
        });

        Ok(AppConfig {
            db_dir,
            port: file.port.unwrap_or(cli.port),
            metrics_port: file.metrics_port.unwrap_or(cli.metrics_port),
            logging_level,
            frontend_dir_path: file.frontend_dir_path.or_else(|| cli.frontend_dir_path.clone()),
            providers,
            llm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with_db_dir(dir: &std::path::Path) -> CliConfig {
        CliConfig {
            db_dir: Some(dir.to_path_buf()),
            port: 3001,
            metrics_port: 9091,
            ..Default::default()
        }
    }

    #[test]
    fn test_toml_overrides_cli() {
        let dir = tempfile::tempdir().unwrap();
        let file: FileConfig = toml::from_str("port = 4100").unwrap();

        let config = AppConfig::resolve(&cli_with_db_dir(dir.path()), Some(file)).unwrap();
        assert_eq!(config.port, 4100);
        assert_eq!(config.metrics_port, 9091);
    }

    #[test]
    fn test_missing_db_dir_is_rejected() {
        let cli = CliConfig::default();
        assert!(AppConfig::resolve(&cli, None).is_err());

        let cli = cli_with_db_dir(std::path::Path::new("/definitely/not/a/real/dir"));
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_llm_section_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file: FileConfig = toml::from_str("[llm]\napi_key = \"sk-test\"").unwrap();

        let config = AppConfig::resolve(&cli_with_db_dir(dir.path()), Some(file)).unwrap();
        let llm = config.llm.unwrap();
        assert_eq!(llm.base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(llm.model, DEFAULT_LLM_MODEL);
        assert_eq!(llm.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_no_llm_section_disables_deduction() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::resolve(&cli_with_db_dir(dir.path()), None).unwrap();
        assert!(config.llm.is_none());
    }
}
