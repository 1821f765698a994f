//! API token loading.
//!
//! The chat-completion token comes from an injected [`CredentialSource`] so the
//! rest of the application never reads secrets directly.

use std::env;

use crate::types::{AppError, AppResult};

pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

pub trait CredentialSource: Send + Sync {
    fn load_credential(&self) -> AppResult<String>;
}

/// Reads the token from an environment variable (after loading `.env`).
pub struct EnvCredentialSource {
    var: String,
}

impl EnvCredentialSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentialSource {
    fn default() -> Self {
        Self::new(TOKEN_ENV_VAR)
    }
}

impl CredentialSource for EnvCredentialSource {
    fn load_credential(&self) -> AppResult<String> {
        dotenvy::dotenv().ok();
        match env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(AppError::MissingCredential(format!(
                "{} must be set to a GitHub Models access token",
                self.var
            ))),
        }
    }
}

/// Fixed token, for tests and embedding
pub struct StaticCredential(pub String);

impl CredentialSource for StaticCredential {
    fn load_credential(&self) -> AppResult<String> {
        Ok(self.0.clone())
    }
}
