use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::time::Duration;

pub const DEFAULT_LLM_ENDPOINT: &str = "https://models.inference.ai.azure.com";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEXT_CONTEXT_CHARS: usize = 1000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;
pub const DEFAULT_MAX_SESSIONS: usize = 256;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub context: ContextConfig,
    pub sessions: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8501,
            host: "0.0.0.0".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Remote chat-completion settings. The credential itself is loaded through
/// a `CredentialSource`, not stored here.
#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub endpoint: String,
    pub model: String,
    /// `None` means the request waits for the service indefinitely
    pub timeout_secs: Option<u64>,
    /// Extra attempts after the first failure; 0 disables retrying
    pub max_retries: u32,
}

impl LLMConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout_secs: None,
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextConfig {
    pub text_char_limit: usize,
    /// Table summaries are sent in full unless this is set
    pub table_char_limit: Option<usize>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            text_char_limit: DEFAULT_TEXT_CONTEXT_CHARS,
            table_char_limit: None,
        }
    }
}

/// Bounds on the in-memory session map
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Oldest-accessed sessions are dropped beyond this count
    pub max_sessions: usize,
    /// Sessions untouched for this long are dropped on the next insert
    pub idle_timeout_secs: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            idle_timeout_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8501".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
                    .parse()?,
            },
            llm: LLMConfig {
                endpoint: env::var("LLM_ENDPOINT")
                    .unwrap_or_else(|_| DEFAULT_LLM_ENDPOINT.to_string()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
                timeout_secs: optional_var("LLM_TIMEOUT_SECS")?,
                max_retries: env::var("LLM_MAX_RETRIES")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()?,
            },
            context: ContextConfig {
                text_char_limit: env::var("CONTEXT_TEXT_CHAR_LIMIT")
                    .unwrap_or_else(|_| DEFAULT_TEXT_CONTEXT_CHARS.to_string())
                    .parse()?,
                table_char_limit: optional_var("CONTEXT_TABLE_CHAR_LIMIT")?,
            },
            sessions: SessionConfig {
                max_sessions: env::var("MAX_SESSIONS")
                    .unwrap_or_else(|_| DEFAULT_MAX_SESSIONS.to_string())
                    .parse()?,
                idle_timeout_secs: env::var("SESSION_IDLE_SECS")
                    .unwrap_or_else(|_| DEFAULT_SESSION_IDLE_SECS.to_string())
                    .parse()?,
            },
            logging: LoggingConfig {
                log_dir: env::var("LOG_DIR").ok().filter(|s| !s.trim().is_empty()),
            },
        })
    }
}

fn optional_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => Ok(Some(raw.trim().parse()?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let llm = LLMConfig::default();
        assert_eq!(llm.model, "gpt-4o");
        assert_eq!(llm.max_retries, 0);
        assert!(llm.timeout().is_none());

        let context = ContextConfig::default();
        assert_eq!(context.text_char_limit, 1000);
        assert!(context.table_char_limit.is_none());

        let sessions = SessionConfig::default();
        assert_eq!(sessions.max_sessions, 256);
        assert_eq!(sessions.idle_timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn test_optional_var_parses_and_ignores_blank() {
        env::set_var("RAGADATA_TEST_OPTIONAL", "42");
        assert_eq!(optional_var::<u64>("RAGADATA_TEST_OPTIONAL").unwrap(), Some(42));

        env::set_var("RAGADATA_TEST_OPTIONAL", "  ");
        assert_eq!(optional_var::<u64>("RAGADATA_TEST_OPTIONAL").unwrap(), None);

        env::set_var("RAGADATA_TEST_OPTIONAL", "abc");
        assert!(optional_var::<u64>("RAGADATA_TEST_OPTIONAL").is_err());
        env::remove_var("RAGADATA_TEST_OPTIONAL");
    }
}
