//! Consortium orchestrator — drives the scatter-gather-arbitrate loop.
//!
//! One run: fan the query out to every member concurrently, aggregate their
//! parsed answers as they arrive, hand the full cycle to the arbiter, then
//! either accept its verdict or start a refinement iteration. Bounded by the
//! configured iteration budget.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::answer::{RunOutcome, RunReport};
use super::parser;
use super::state::{RunContext, RunPhase, TransitionError};
use super::transcript::TranscriptWriter;
use crate::config::ConsortiumConfig;
use crate::prompts;
use crate::providers::{Completion, ProviderError, RoleId};

/// Error aborting a consortium run.
#[derive(Debug, Error)]
pub enum ConsortiumError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// The consortium — a configured panel of members plus an arbiter, invoked
/// through a single [`Completion`] boundary.
///
/// Each call to [`Consortium::run`] is an independent, stateless invocation:
/// the [`RunContext`] lives exactly as long as the run.
pub struct Consortium {
    config: ConsortiumConfig,
    completion: Arc<dyn Completion>,
    transcript: Option<TranscriptWriter>,
}

impl Consortium {
    pub fn new(config: ConsortiumConfig, completion: Arc<dyn Completion>) -> Self {
        Self {
            config,
            completion,
            transcript: None,
        }
    }

    /// Attach a raw-response transcript side channel.
    pub fn with_transcript(mut self, transcript: TranscriptWriter) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn config(&self) -> &ConsortiumConfig {
        &self.config
    }

    /// Run the full workflow for one query.
    ///
    /// Returns the terminal [`RunReport`]; any member or arbiter failure
    /// aborts the run without retry.
    pub async fn run(&self, query: impl Into<String>) -> Result<RunReport, ConsortiumError> {
        let mut ctx = RunContext::new(query, self.config.max_iterations);
        info!(
            run_id = %ctx.id,
            members = self.config.members.len(),
            arbiter = %self.config.arbiter,
            max_iterations = ctx.max_iterations,
            "consortium run started"
        );

        let outcome = loop {
            self.dispatch_and_collect(&mut ctx).await?;
            if let Some(outcome) = self.arbitrate(&mut ctx).await? {
                break outcome;
            }
        };

        let reason = match &outcome {
            RunOutcome::Verdict { .. } => "verdict accepted",
            RunOutcome::NoConsensus { .. } => "iteration budget exhausted",
        };
        ctx.transition(RunPhase::Done, reason)?;
        info!(run_id = %ctx.id, iterations = ctx.iteration, outcome = reason, "consortium run finished");

        Ok(RunReport {
            run_id: ctx.id.clone(),
            iterations: ctx.iteration,
            outcome,
        })
    }

    /// Fan the current iteration's prompt out to all members and aggregate
    /// their answers as they arrive.
    ///
    /// The network calls overlap; aggregation is serialized on this task, so
    /// the Nth arrival — whichever member it is — triggers arbitration.
    async fn dispatch_and_collect(&self, ctx: &mut RunContext) -> Result<(), ConsortiumError> {
        let messages = prompts::member_messages(ctx);

        let mut in_flight: FuturesUnordered<_> = self
            .config
            .members
            .iter()
            .map(|member| {
                let messages = messages.clone();
                debug!(member = %member, iteration = ctx.iteration, "dispatching member request");
                async move {
                    let result = self.completion.invoke(member, &messages).await;
                    (member.clone(), result)
                }
            })
            .collect();

        ctx.transition(RunPhase::Collecting, "members dispatched")?;

        while let Some((member, result)) = in_flight.next().await {
            let raw = result?;
            self.on_member_responded(ctx, member, &raw)?;
        }

        Ok(())
    }

    /// Store one member's answer; the Nth stored answer completes the cycle.
    fn on_member_responded(
        &self,
        ctx: &mut RunContext,
        member: RoleId,
        raw: &str,
    ) -> Result<(), ConsortiumError> {
        if let Some(ref transcript) = self.transcript {
            transcript.record_member(&member, ctx.iteration, raw);
        }

        let answer = parser::parse_member_answer(raw);
        info!(
            member = %member,
            iteration = ctx.iteration,
            confidence = answer.confidence,
            "member answered"
        );
        ctx.record_answer(member, answer);

        if ctx.answers.len() == self.config.members.len() {
            ctx.transition(RunPhase::Arbitrating, "all members answered")?;
        }
        Ok(())
    }

    /// Invoke the arbiter on the completed cycle and decide: iterate again,
    /// accept the verdict, or stop on an exhausted budget.
    ///
    /// `Ok(None)` means a new iteration has begun; `Ok(Some(_))` is terminal.
    async fn arbitrate(&self, ctx: &mut RunContext) -> Result<Option<RunOutcome>, ConsortiumError> {
        let messages = prompts::arbiter_messages(ctx);
        if let Some(ref transcript) = self.transcript {
            transcript.record_arbiter_prompt(ctx.iteration, &messages);
        }

        let raw = self.completion.invoke(&self.config.arbiter, &messages).await?;
        if let Some(ref transcript) = self.transcript {
            transcript.record_arbiter(ctx.iteration, &raw);
        }

        let verdict = parser::parse_arbiter_verdict(&raw);
        info!(
            iteration = ctx.iteration,
            confidence = verdict.confidence,
            needs_iteration = verdict.needs_iteration,
            "arbiter verdict parsed"
        );

        if verdict.needs_iteration {
            if ctx.budget_remaining() {
                ctx.begin_iteration(&verdict)?;
                return Ok(None);
            }
            // The iteration flag is advisory; the budget is authoritative.
            warn!(
                iteration = ctx.iteration,
                "arbiter requested another round but the iteration budget is exhausted"
            );
            return Ok(Some(RunOutcome::NoConsensus {
                iterations: ctx.iteration,
            }));
        }

        Ok(Some(RunOutcome::Verdict { verdict }))
    }
}
