//! Configuration loading and the notifier factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examkit_core::traits::Notifier;

use crate::mock::MockNotifier;
use crate::notifier::HttpNotifier;

/// Configuration for the outbound notifier.
///
/// Note: Custom Debug impl masks the api key to prevent accidental
/// exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotifierConfig {
    Http {
        endpoint: String,
        api_key: String,
    },
    /// Records messages instead of sending them (tests, dry runs).
    Mock,
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifierConfig::Http {
                api_key: _,
                endpoint,
            } => f
                .debug_struct("Http")
                .field("endpoint", endpoint)
                .field("api_key", &"***")
                .finish(),
            NotifierConfig::Mock => f.debug_struct("Mock").finish(),
        }
    }
}

/// Mail envelope settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Display name messages are sent as.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_from_name() -> String {
    "Course Staff".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_name: default_from_name(),
        }
    }
}

/// Top-level examkit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamkitConfig {
    /// Notifier configuration.
    #[serde(default = "default_notifier")]
    pub notifier: NotifierConfig,
    /// Mail envelope settings.
    #[serde(default)]
    pub mail: MailConfig,
    /// Max retries on transient collaborator errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Time bound for one student's resolution, in seconds.
    #[serde(default = "default_student_timeout")]
    pub student_timeout_secs: u64,
    /// Output directory for assignments and reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_notifier() -> NotifierConfig {
    NotifierConfig::Mock
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    500
}
fn default_student_timeout() -> u64 {
    30
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./examkit-out")
}

impl Default for ExamkitConfig {
    fn default() -> Self {
        Self {
            notifier: default_notifier(),
            mail: MailConfig::default(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            student_timeout_secs: default_student_timeout(),
            output_dir: default_output_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examkit.toml` in the current directory
/// 2. `~/.config/examkit/config.toml`
///
/// Environment variable override: `EXAMKIT_MAIL_API_KEY`.
pub fn load_config() -> Result<ExamkitConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamkitConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examkit.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ExamkitConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamkitConfig::default(),
    };

    // Apply env var override
    if let Ok(key) = std::env::var("EXAMKIT_MAIL_API_KEY") {
        if let NotifierConfig::Http { api_key, .. } = &mut config.notifier {
            *api_key = key;
        }
    }

    // Resolve env vars in the notifier config
    if let NotifierConfig::Http { endpoint, api_key } = &mut config.notifier {
        *endpoint = resolve_env_vars(endpoint);
        *api_key = resolve_env_vars(api_key);
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examkit"))
}

/// Create a notifier instance from the configuration.
pub fn create_notifier(config: &ExamkitConfig) -> Result<Box<dyn Notifier>> {
    match &config.notifier {
        NotifierConfig::Http { endpoint, api_key } => {
            anyhow::ensure!(!endpoint.is_empty(), "notifier endpoint is empty");
            Ok(Box::new(HttpNotifier::new(
                endpoint,
                api_key,
                &config.mail.from_name,
            )))
        }
        NotifierConfig::Mock => Ok(Box::new(MockNotifier::new())),
    }
}
