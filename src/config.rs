//! Runtime configuration read from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::assembly::common::default_templates_dir;
use crate::assembly::engine::DEFAULT_MISSING_VALUE;
use crate::assembly::AssemblyOptions;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DOCUMENTS_DIR: &str = "./data/documents";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a valid port number, got '{value}'")]
    InvalidPort { name: String, value: String },
    #[error("{name} must be true or false, got '{value}'")]
    InvalidBool { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub templates_dir: PathBuf,
    pub documents_dir: PathBuf,
    /// Command line of the HTML to PDF converter, if any.
    pub pdf_renderer: Option<String>,
    pub missing_value: String,
    pub cleanup_unresolved: bool,
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            templates_dir: default_templates_dir().to_path_buf(),
            documents_dir: PathBuf::from(DEFAULT_DOCUMENTS_DIR),
            pdf_renderer: None,
            missing_value: DEFAULT_MISSING_VALUE.to_string(),
            cleanup_unresolved: false,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://localhost:8081".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match read("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort {
                name: "PORT".to_string(),
                value,
            })?,
            None => defaults.port,
        };

        let cleanup_unresolved = match read("CLEANUP_UNRESOLVED") {
            Some(value) => parse_bool("CLEANUP_UNRESOLVED", &value)?,
            None => defaults.cleanup_unresolved,
        };

        let allowed_origins = match read("ALLOWED_ORIGINS") {
            Some(value) => value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.allowed_origins,
        };

        Ok(Self {
            host: read("HOST").unwrap_or(defaults.host),
            port,
            templates_dir: read("TEMPLATES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.templates_dir),
            documents_dir: read("DOCUMENTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.documents_dir),
            pdf_renderer: read("PDF_RENDERER"),
            // An explicitly empty MISSING_VALUE is meaningful
            missing_value: lookup("MISSING_VALUE").unwrap_or(defaults.missing_value),
            cleanup_unresolved,
            allowed_origins,
        })
    }

    /// Assembly options used when a request does not override them.
    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions::new(self.missing_value.clone()).with_cleanup(self.cleanup_unresolved)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.assembly_options(), AssemblyOptions::default());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "9090"),
            ("DOCUMENTS_DIR", "/tmp/docs"),
            ("PDF_RENDERER", "wkhtmltopdf --quiet"),
            ("MISSING_VALUE", ""),
            ("CLEANUP_UNRESOLVED", "yes"),
            ("ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.documents_dir, PathBuf::from("/tmp/docs"));
        assert_eq!(config.pdf_renderer.as_deref(), Some("wkhtmltopdf --quiet"));
        assert_eq!(config.missing_value, "");
        assert!(config.cleanup_unresolved);
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_invalid_values() {
        let port = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")]));
        assert!(matches!(port, Err(ConfigError::InvalidPort { .. })));

        let cleanup = AppConfig::from_lookup(lookup_from(&[("CLEANUP_UNRESOLVED", "maybe")]));
        assert!(matches!(cleanup, Err(ConfigError::InvalidBool { .. })));
    }
}
