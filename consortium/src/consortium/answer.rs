//! Structured results — member answers, arbiter verdicts, terminal outcomes.

use serde::{Deserialize, Serialize};

/// One member's structured answer for one iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAnswer {
    /// The member's reasoning before it committed to an analysis.
    pub thought_process: String,
    /// The member's final analysis of the query.
    pub analysis: String,
    /// Self-reported confidence in [0, 1]; 0 when unparseable.
    pub confidence: f64,
}

/// The arbiter's structured judgment of one collection cycle.
///
/// Serializes to the `{synthesis, confidence, analysis, dissent,
/// needsIteration, refinementAreas}` shape downstream consumers expect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbiterVerdict {
    /// Consensus view synthesized from all member answers.
    pub synthesis: String,
    /// Arbiter confidence in the synthesis, in [0, 1].
    pub confidence: f64,
    /// How the arbiter arrived at the synthesis.
    pub analysis: String,
    /// Notable dissenting views not folded into the synthesis.
    pub dissent: String,
    /// Whether the arbiter wants another refinement round. Advisory — the
    /// iteration budget is authoritative.
    pub needs_iteration: bool,
    /// Guidance for the next round; empty when none was given.
    pub refinement_areas: String,
}

/// Terminal result of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The arbiter produced a final verdict.
    Verdict { verdict: ArbiterVerdict },
    /// The iteration budget ran out with the arbiter still unsatisfied.
    NoConsensus { iterations: u32 },
}

impl RunOutcome {
    pub fn is_consensus(&self) -> bool {
        matches!(self, Self::Verdict { .. })
    }

    pub fn verdict(&self) -> Option<&ArbiterVerdict> {
        match self {
            Self::Verdict { verdict } => Some(verdict),
            Self::NoConsensus { .. } => None,
        }
    }
}

/// What a completed run hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Run identifier, matching the transcript side channel.
    pub run_id: String,
    /// Fan-out cycles performed.
    pub iterations: u32,
    /// The terminal outcome.
    pub outcome: RunOutcome,
}

impl RunReport {
    /// Compact summary line for logs.
    pub fn summary_line(&self) -> String {
        match &self.outcome {
            RunOutcome::Verdict { verdict } => format!(
                "[verdict] {} iterations | confidence {:.2}",
                self.iterations, verdict.confidence
            ),
            RunOutcome::NoConsensus { iterations } => {
                format!("[no_consensus] {} iterations", iterations)
            }
        }
    }
}
