//! Consortium roster configuration.

use serde::Deserialize;
use thiserror::Error;

use crate::providers::{InvalidRoleId, RoleId};

/// Error validating a consortium configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("at least one member is required")]
    NoMembers,

    #[error("duplicate member `{0}`: member identities must be unique")]
    DuplicateMember(String),

    #[error("max_iterations must be at least 1")]
    ZeroIterations,

    #[error(transparent)]
    InvalidRole(#[from] InvalidRoleId),

    #[error("invalid value for `{var}`: {reason}")]
    InvalidEnv { var: String, reason: String },
}

/// The fixed roster for a run: member panel, arbiter, iteration budget.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsortiumConfig {
    /// Responder roles queried every iteration, in dispatch order.
    pub members: Vec<RoleId>,
    /// The role that synthesizes consensus and decides on iteration.
    pub arbiter: RoleId,
    /// Hard bound on fan-out cycles.
    pub max_iterations: u32,
}

impl ConsortiumConfig {
    /// Build and validate a configuration.
    ///
    /// Duplicate members are rejected: answers are keyed by member identity,
    /// so a duplicated entry could never complete a collection cycle.
    pub fn new(
        members: Vec<RoleId>,
        arbiter: RoleId,
        max_iterations: u32,
    ) -> Result<Self, ConfigError> {
        if members.is_empty() {
            return Err(ConfigError::NoMembers);
        }
        let mut seen = std::collections::BTreeSet::new();
        for member in &members {
            if !seen.insert(member) {
                return Err(ConfigError::DuplicateMember(member.to_string()));
            }
        }
        if max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(Self {
            members,
            arbiter,
            max_iterations,
        })
    }

    /// Configuration from the environment, falling back to the default
    /// panel: `CONSORTIUM_MEMBERS` (comma-separated role ids),
    /// `CONSORTIUM_ARBITER`, `CONSORTIUM_MAX_ITERATIONS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let members = match std::env::var("CONSORTIUM_MEMBERS") {
            Ok(raw) => parse_roster(&raw)?,
            Err(_) => default_members(),
        };
        let arbiter = match std::env::var("CONSORTIUM_ARBITER") {
            Ok(raw) => raw.trim().parse()?,
            Err(_) => default_arbiter(),
        };
        let max_iterations = match std::env::var("CONSORTIUM_MAX_ITERATIONS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::InvalidEnv {
                    var: "CONSORTIUM_MAX_ITERATIONS".to_string(),
                    reason: e.to_string(),
                })?,
            Err(_) => DEFAULT_MAX_ITERATIONS,
        };
        Self::new(members, arbiter, max_iterations)
    }
}

impl Default for ConsortiumConfig {
    fn default() -> Self {
        Self {
            members: default_members(),
            arbiter: default_arbiter(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

fn default_members() -> Vec<RoleId> {
    vec![
        RoleId::new("anthropic", "claude-3-5-sonnet-latest"),
        RoleId::new("openai", "gpt-4o-mini"),
        RoleId::new("google", "gemini-2.0-flash-001"),
    ]
}

fn default_arbiter() -> RoleId {
    RoleId::new("anthropic", "claude-3-5-sonnet-latest")
}

/// Parse a comma-separated roster, ignoring empty segments.
pub fn parse_roster(raw: &str) -> Result<Vec<RoleId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(ConfigError::from))
        .collect()
}
