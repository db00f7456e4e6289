//! Run state machine — phases, transition validation, and the shared context.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::answer::{ArbiterVerdict, MemberAnswer};
use crate::providers::RoleId;

/// Phase of a consortium run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    /// Building member prompts and fanning the query out.
    Dispatching,
    /// Awaiting member answers; aggregation happens per arrival.
    Collecting,
    /// All members answered; the arbiter is judging the cycle.
    Arbitrating,
    /// Terminal: a verdict was accepted or the budget ran out.
    Done,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }

    /// Valid transitions from this phase.
    pub fn valid_transitions(self) -> &'static [RunPhase] {
        match self {
            Self::Dispatching => &[Self::Collecting],
            Self::Collecting => &[Self::Arbitrating],
            Self::Arbitrating => &[Self::Dispatching, Self::Done],
            Self::Done => &[],
        }
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dispatching => write!(f, "dispatching"),
            Self::Collecting => write!(f, "collecting"),
            Self::Arbitrating => write!(f, "arbitrating"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// A recorded phase transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: RunPhase,
    pub to: RunPhase,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Error for an illegal phase transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: RunPhase,
    pub to: RunPhase,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid transition {} → {} (allowed: {:?})",
            self.from,
            self.to,
            self.from.valid_transitions()
        )
    }
}

impl std::error::Error for TransitionError {}

/// The single mutable state object for one consortium run.
///
/// Created at run start, dropped when the run returns; the orchestrator's
/// transition handlers are the only mutators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    /// Unique run identifier.
    pub id: String,
    /// The original query. Set once, never rewritten.
    pub query: String,
    /// Current phase.
    pub phase: RunPhase,
    /// Current iteration, 1-based and monotonically increasing.
    pub iteration: u32,
    /// Iteration budget, fixed at construction.
    pub max_iterations: u32,
    /// Member answers for the current collection cycle, keyed by role.
    /// Cleared when a new iteration begins.
    pub answers: BTreeMap<RoleId, MemberAnswer>,
    /// Synthesis carried from the previous iteration's verdict.
    pub synthesis: Option<String>,
    /// Refinement guidance carried from the previous iteration's verdict.
    pub refinement_areas: Option<String>,
    /// Transition history.
    pub transitions: Vec<PhaseTransition>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new(query: impl Into<String>, max_iterations: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            query: query.into(),
            phase: RunPhase::Dispatching,
            iteration: 1,
            max_iterations,
            answers: BTreeMap::new(),
            synthesis: None,
            refinement_areas: None,
            transitions: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Transition to a new phase, recording it.
    pub fn transition(&mut self, to: RunPhase, reason: &str) -> Result<(), TransitionError> {
        if !self.phase.valid_transitions().contains(&to) {
            return Err(TransitionError {
                from: self.phase,
                to,
            });
        }
        self.transitions.push(PhaseTransition {
            from: self.phase,
            to,
            timestamp: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;
        Ok(())
    }

    /// Store one member's parsed answer, replacing any earlier answer the
    /// same member gave this cycle.
    pub fn record_answer(&mut self, member: RoleId, answer: MemberAnswer) {
        self.answers.insert(member, answer);
    }

    /// Begin the next refinement iteration: carry the verdict's synthesis
    /// and refinement guidance forward, reset the answer map, and return to
    /// dispatch.
    pub fn begin_iteration(&mut self, verdict: &ArbiterVerdict) -> Result<(), TransitionError> {
        self.transition(RunPhase::Dispatching, "arbiter requested refinement")?;
        self.iteration += 1;
        self.synthesis = Some(verdict.synthesis.clone());
        self.refinement_areas = Some(verdict.refinement_areas.clone());
        self.answers.clear();
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Whether the iteration budget still allows another cycle.
    pub fn budget_remaining(&self) -> bool {
        self.iteration < self.max_iterations
    }
}
