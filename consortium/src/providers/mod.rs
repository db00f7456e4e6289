//! Completion boundary — uniform invocation of any responder role.
//!
//! A role is addressed as `provider/model` (e.g. `anthropic/claude-3-5-sonnet-latest`).
//! The [`ProviderRouter`] splits the role, picks the matching HTTP adapter,
//! and returns the raw completion text. Everything above this boundary is
//! provider-agnostic: the orchestrator only sees [`Completion::invoke`].

pub mod anthropic;
pub mod gemini;
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chat role for a single prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One role-tagged message in an ordered prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Identity of one responder role: a provider plus a concrete model.
///
/// Parsed from the `provider/model` form used throughout configuration.
/// Ordered so it can key the per-iteration answer map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleId {
    provider: String,
    model: String,
}

/// Error for a role string that is not `provider/model`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid role id `{0}`: expected `provider/model`")]
pub struct InvalidRoleId(pub String);

impl RoleId {
    /// Build a role id from already-split parts.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::str::FromStr for RoleId {
    type Err = InvalidRoleId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, model) = s
            .split_once('/')
            .ok_or_else(|| InvalidRoleId(s.to_string()))?;
        if provider.is_empty() || model.is_empty() {
            return Err(InvalidRoleId(s.to_string()));
        }
        Ok(Self::new(provider, model))
    }
}

impl TryFrom<String> for RoleId {
    type Error = InvalidRoleId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RoleId> for String {
    fn from(role: RoleId) -> Self {
        role.to_string()
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Failure surfaced from a completion call.
///
/// All variants abort the run; each carries enough provider/model context
/// for diagnosis. Retry, where wanted, belongs to a layer above this one.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API key not configured for provider `{provider}`")]
    MissingApiKey { provider: String },

    #[error("unknown provider `{provider}`")]
    UnknownProvider { provider: String },

    #[error("connection to `{provider}` failed for model `{model}`: {reason}")]
    Connection {
        provider: String,
        model: String,
        reason: String,
    },

    #[error("provider `{provider}` error for model `{model}`: {message}")]
    Api {
        provider: String,
        model: String,
        message: String,
    },
}

impl ProviderError {
    /// Map a reqwest failure onto the taxonomy: transport problems are
    /// `Connection`, everything else is a provider-side `Api` error.
    pub(crate) fn from_reqwest(provider: &str, model: &str, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::Connection {
                provider: provider.to_string(),
                model: model.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::Api {
                provider: provider.to_string(),
                model: model.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Uniform interface to invoke any responder role with an ordered message
/// list and obtain raw completion text. May suspend on network I/O.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn invoke(
        &self,
        role: &RoleId,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError>;
}

/// Credentials and HTTP settings for the router.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub anthropic_key: Option<String>,
    pub openai_key: Option<String>,
    pub gemini_key: Option<String>,
    /// Per-request timeout; a provider-level timeout surfaces as `Connection`.
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            anthropic_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            openai_key: std::env::var("OPENAI_API_KEY").ok(),
            gemini_key: std::env::var("GEMINI_API_KEY").ok(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Dispatches completion calls to the adapter matching the role's provider.
pub struct ProviderRouter {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl ProviderRouter {
    pub fn from_config(config: ProviderConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .expect("Failed to create HTTP client"),
            config,
        }
    }

    /// Router with credentials from the environment.
    pub fn from_env() -> Self {
        Self::from_config(ProviderConfig::default())
    }

    fn key_for(&self, provider: &str) -> Result<&str, ProviderError> {
        let key = match provider {
            "anthropic" => self.config.anthropic_key.as_deref(),
            "openai" => self.config.openai_key.as_deref(),
            "google" => self.config.gemini_key.as_deref(),
            _ => None,
        };
        key.ok_or_else(|| ProviderError::MissingApiKey {
            provider: provider.to_string(),
        })
    }
}

#[async_trait]
impl Completion for ProviderRouter {
    async fn invoke(
        &self,
        role: &RoleId,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        match role.provider() {
            "anthropic" => {
                let key = self.key_for("anthropic")?;
                anthropic::complete(&self.http, key, role.model(), messages).await
            }
            "openai" => {
                let key = self.key_for("openai")?;
                openai::complete(&self.http, key, role.model(), messages).await
            }
            "google" => {
                let key = self.key_for("google")?;
                gemini::complete(&self.http, key, role.model(), messages).await
            }
            other => Err(ProviderError::UnknownProvider {
                provider: other.to_string(),
            }),
        }
    }
}
