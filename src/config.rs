use std::{env, net::SocketAddr, num::NonZeroUsize, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::model::{DEFAULT_MAX_TOKEN_LENGTH, ModelBackend, ModelSettings};

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    model_backend: ModelBackend,
    model_path: PathBuf,
    tokenizer_path: Option<PathBuf>,
    max_token_length: NonZeroUsize,
    lexicon_path: Option<PathBuf>,
    request_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// Reads and validates the service configuration from the environment.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] if `BIAS_MODEL_PATH` is unset and
    /// [`ConfigError::Invalid`] if any value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let model_path = PathBuf::from(env_var("BIAS_MODEL_PATH")?);
        let model_backend = parse_backend("BIAS_MODEL_BACKEND", ModelBackend::Transformer)?;
        let tokenizer_path = optional_path("BIAS_TOKENIZER_PATH");
        let max_token_length =
            parse_non_zero_usize("BIAS_MAX_TOKEN_LENGTH", DEFAULT_MAX_TOKEN_LENGTH)?;

        // Unset means the lexicon compiled into the binary.
        let lexicon_path = optional_path("BIAS_LEXICON_PATH");

        let http_bind = parse_socket_addr("BIAS_HTTP_BIND", "0.0.0.0:9010")?;
        let request_timeout = parse_duration_ms("BIAS_REQUEST_TIMEOUT_MS", 5000)?;

        Ok(Self {
            http_bind,
            model_backend,
            model_path,
            tokenizer_path,
            max_token_length,
            lexicon_path,
            request_timeout,
        })
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn model_backend(&self) -> ModelBackend {
        self.model_backend
    }

    #[must_use]
    pub fn model_path(&self) -> &std::path::Path {
        &self.model_path
    }

    #[must_use]
    pub fn tokenizer_path(&self) -> Option<&std::path::Path> {
        self.tokenizer_path.as_deref()
    }

    #[must_use]
    pub fn max_token_length(&self) -> NonZeroUsize {
        self.max_token_length
    }

    #[must_use]
    pub fn lexicon_path(&self) -> Option<&std::path::Path> {
        self.lexicon_path.as_deref()
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[must_use]
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            backend: self.model_backend,
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            max_token_length: self.max_token_length,
        }
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn optional_path(name: &'static str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from)
}

fn parse_backend(name: &'static str, default: ModelBackend) -> Result<ModelBackend, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|error| ConfigError::Invalid {
            name,
            source: anyhow::Error::new(error),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_socket_addr(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());

    raw.parse().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_non_zero_usize(name: &'static str, default: usize) -> Result<NonZeroUsize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    NonZeroUsize::new(parsed).ok_or_else(|| ConfigError::Invalid {
        name,
        source: anyhow::anyhow!("must be greater than zero"),
    })
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default_ms.to_string());
    let ms = raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if ms == 0 {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("timeout must be greater than zero"),
        });
    }
    Ok(Duration::from_millis(ms))
}
