use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_MODEL: &str = "llama3.2";
const DEFAULT_CONFIG_PATH: &str = "config/roster.toml";
pub const CONFIG_PATH: &str = DEFAULT_CONFIG_PATH;
pub const DEFAULT_MAX_STEPS: usize = 8;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"
You are a careful assistant for a small people roster. Keep answers short, factual, and grounded in what the tools actually returned.

{{custom_instruction}}

Never invent records that the tools did not report.
"#;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub system_prompt: Option<String>,
    pub prompt_template: Option<String>,
    pub host_url: Option<String>,
    pub api_url: Option<String>,
    pub database: Option<PathBuf>,
    pub max_steps: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    model: Option<String>,
    system_prompt: Option<String>,
    prompt_template: Option<String>,
    host_url: Option<String>,
    api_url: Option<String>,
    database: Option<PathBuf>,
    max_steps: Option<usize>,
    request_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Loads configuration from `path`, or from the default location
    /// when `path` is `None`. A missing file at the default location is
    /// not an error; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return read_config(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        match read_config(default_path) {
            Ok(config) => Ok(config),
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!("Configuration file not found; using defaults");
                Ok(Self::default())
            }
            Err(other) => Err(other),
        }
    }

    pub fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            prompt_template: Some(DEFAULT_PROMPT_TEMPLATE.to_string()),
            host_url: None,
            api_url: None,
            database: None,
            max_steps: DEFAULT_MAX_STEPS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading configuration file");
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(AppConfig {
        model: parsed.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        system_prompt: parsed.system_prompt,
        prompt_template: Some(
            parsed
                .prompt_template
                .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string()),
        ),
        host_url: parsed.host_url,
        api_url: parsed.api_url,
        database: parsed.database,
        max_steps: parsed.max_steps.unwrap_or(DEFAULT_MAX_STEPS),
        request_timeout_secs: parsed
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
    })
}
