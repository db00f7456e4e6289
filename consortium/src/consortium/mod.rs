//! Consortium Orchestration — Scatter-Gather-Arbitrate Loop
//!
//! One query goes out to every member of a heterogeneous model panel; their
//! structured answers are aggregated and judged by a distinguished arbiter,
//! which either accepts the synthesis or sends the panel back for another
//! bounded refinement round.
//!
//! # Run Flow
//!
//! ```text
//! Dispatching → Collecting → Arbitrating → [verdict?]
//!      ▲                          │            │
//!      │                          │            ├─ accepted → Done (verdict)
//!      └──────────────────────────┘            ├─ refine, budget left → Dispatching
//!               (iterate)                      └─ refine, budget spent → Done (no consensus)
//! ```

pub mod answer;
pub mod orchestrator;
pub mod parser;
pub mod state;
pub mod transcript;

pub use answer::{ArbiterVerdict, MemberAnswer, RunOutcome, RunReport};
pub use orchestrator::{Consortium, ConsortiumError};
pub use parser::{parse_arbiter_verdict, parse_member_answer};
pub use state::{PhaseTransition, RunContext, RunPhase, TransitionError};
pub use transcript::TranscriptWriter;
