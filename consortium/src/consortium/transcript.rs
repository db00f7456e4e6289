//! Raw-response transcript — an optional side channel, never load-bearing.
//!
//! Each member response, arbiter prompt, and arbiter response is written to
//! its own timestamped file. A failed write is logged at warn level and
//! otherwise ignored: the run's correctness does not depend on this.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::warn;

use crate::providers::{ChatMessage, RoleId};

/// Appends raw run artifacts to a directory.
#[derive(Debug, Clone)]
pub struct TranscriptWriter {
    dir: PathBuf,
}

impl TranscriptWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record one member's raw response for one iteration.
    pub fn record_member(&self, member: &RoleId, iteration: u32, raw: &str) {
        let name = format!(
            "member_{}_iter{}_{}.log",
            sanitize(&member.to_string()),
            iteration,
            timestamp()
        );
        let body = format!(
            "Member: {}\nIteration: {}\nTimestamp: {}\n\nResponse:\n{}\n",
            member,
            iteration,
            Utc::now().to_rfc3339(),
            raw
        );
        self.write(&name, &body);
    }

    /// Record the full prompt sent to the arbiter.
    pub fn record_arbiter_prompt(&self, iteration: u32, messages: &[ChatMessage]) {
        let name = format!("arbiter_prompt_iter{}_{}.log", iteration, timestamp());
        let rendered = messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        let body = format!(
            "Iteration: {}\nTimestamp: {}\n\nPrompt sent to arbiter:\n{}\n",
            iteration,
            Utc::now().to_rfc3339(),
            rendered
        );
        self.write(&name, &body);
    }

    /// Record the arbiter's raw response for one iteration.
    pub fn record_arbiter(&self, iteration: u32, raw: &str) {
        let name = format!("arbiter_response_iter{}_{}.log", iteration, timestamp());
        let body = format!(
            "Iteration: {}\nTimestamp: {}\n\nResponse:\n{}\n",
            iteration,
            Utc::now().to_rfc3339(),
            raw
        );
        self.write(&name, &body);
    }

    fn write(&self, name: &str, body: &str) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), "transcript dir unavailable: {}", e);
            return;
        }
        let path = self.dir.join(name);
        if let Err(e) = fs::write(&path, body) {
            warn!(path = %path.display(), "transcript write failed: {}", e);
        }
    }
}

fn sanitize(s: &str) -> String {
    s.replace(['/', ':'], "_")
}

fn timestamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%S%3f").to_string()
}
