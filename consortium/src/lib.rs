//! Model consortium orchestrator.
//!
//! Fans one analytical query out to a panel of independent language-model
//! members, aggregates their structured answers, and lets a distinguished
//! arbiter synthesize a consensus — iterating with refinement guidance until
//! the arbiter is satisfied or the iteration budget runs out.
//!
//! # Components
//!
//! - **[`consortium`]**: the scatter-gather-arbitrate state machine, the
//!   tolerant tag parser, and the run data model
//! - **[`providers`]**: the completion boundary — `provider/model` role ids
//!   routed to Anthropic, OpenAI, or Gemini HTTP adapters
//! - **[`prompts`]**: pure construction of member and arbiter message lists
//! - **[`config`]**: the fixed roster (members, arbiter, iteration budget)
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use consortium::{Consortium, ConsortiumConfig, ProviderRouter};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConsortiumConfig::from_env()?;
//! let router = Arc::new(ProviderRouter::from_env());
//! let report = Consortium::new(config, router)
//!     .run("What is driving semiconductor capex this cycle?")
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod consortium;
pub mod prompts;
pub mod providers;

pub use config::{ConfigError, ConsortiumConfig};
pub use consortium::{
    ArbiterVerdict, Consortium, ConsortiumError, MemberAnswer, RunOutcome, RunReport,
    TranscriptWriter,
};
pub use providers::{
    ChatMessage, Completion, ProviderConfig, ProviderError, ProviderRouter, Role, RoleId,
};
