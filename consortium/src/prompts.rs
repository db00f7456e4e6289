//! Prompt construction for members and the arbiter.
//!
//! Pure functions of the run context: the orchestrator hands over state and
//! gets an ordered message list back, without knowing the message format.
//! The preambles pin the tag contract the parser relies on
//! (`consortium::parser`), so the two must evolve together.

use crate::consortium::state::RunContext;
use crate::providers::ChatMessage;

/// System preamble sent to every consortium member.
pub const MEMBER_PREAMBLE: &str = "\
You are one member of a model consortium that solves complex analytical \
problems through an iterative process. Your task is to answer the query \
independently, considering any previous consortium work and the refinement \
areas it highlighted.

Work through the problem before answering: list the aspects relevant to the \
query, identify challenges or limitations, and explore different angles \
step by step.

Your response MUST use exactly these tags:

<thought_process>
[Your detailed reasoning, exploring the problem from several angles]
</thought_process>

<analysis>
[Your final, well-considered answer to the query]
</analysis>

<confidence>
[Your confidence from 0 to 1, e.g. 0.85]
</confidence>

Be thorough in your reasoning, clear in your explanation, and precise in \
your confidence assessment. Always return all three tags.";

/// System preamble sent to the arbiter.
pub const ARBITER_PREAMBLE: &str = "\
You are the arbiter of a model consortium. The members have each answered \
the same query independently; your task is to judge their responses and \
synthesize the best consensus.

Steps: extract the key points of each response, compare them, evaluate \
relevance to the original query, identify agreement and disagreement, \
synthesize a consensus answer, estimate your confidence in it, record any \
important dissenting views, and decide whether another refinement round is \
needed. If it is, name the specific areas to refine.

Your response MUST use exactly these tags:

<synthesis>
[The consensus answer, combining the best elements of the member responses]
</synthesis>

<confidence>
[Your confidence in the synthesis as a decimal between 0 and 1]
</confidence>

<analysis>
[How you arrived at the synthesis and confidence]
</analysis>

<dissent>
[Notable dissenting views not folded into the synthesis; may be empty]
</dissent>

<needs_iteration>
[\"true\" if more refinement is necessary, otherwise \"false\"]
</needs_iteration>

<refinement_areas>
[If needs_iteration is true, the specific areas to refine next round]
</refinement_areas>

Stay objective and weigh all perspectives fairly.";

/// Messages for one member for the current iteration.
///
/// From the second iteration on, the previous verdict's synthesis and
/// refinement areas are embedded verbatim so members can converge.
pub fn member_messages(ctx: &RunContext) -> Vec<ChatMessage> {
    let mut user = String::new();

    if ctx.iteration > 1 {
        user.push_str(
            "We need to iterate to reach consensus among the consortium members. \
             Review the previous iteration and pay attention to the refinement areas:\n\n",
        );
        user.push_str("<previous_iteration>\n");
        user.push_str(&format!(
            "  <iteration_number>{}</iteration_number>\n",
            ctx.iteration
        ));
        user.push_str(&format!(
            "  <synthesis>{}</synthesis>\n",
            ctx.synthesis.as_deref().unwrap_or("")
        ));
        user.push_str(&format!(
            "  <refinement_areas>{}</refinement_areas>\n",
            ctx.refinement_areas.as_deref().unwrap_or("")
        ));
        user.push_str("</previous_iteration>\n\n");
    }

    user.push_str("This is the original prompt you are addressing:\n\n");
    user.push_str(&format!("<original_prompt>{}</original_prompt>", ctx.query));

    vec![
        ChatMessage::system(MEMBER_PREAMBLE),
        ChatMessage::user(user),
    ]
}

/// Messages for the arbiter, embedding every member answer of the cycle.
pub fn arbiter_messages(ctx: &RunContext) -> Vec<ChatMessage> {
    let mut user = String::new();

    user.push_str(&format!(
        "<original_prompt>{}</original_prompt>\n\n",
        ctx.query
    ));

    user.push_str("<model_responses>\n");
    for (member, answer) in &ctx.answers {
        user.push_str("  <model_response>\n");
        user.push_str(&format!("    <model>{}</model>\n", member));
        user.push_str(&format!(
            "    <confidence>{}</confidence>\n",
            answer.confidence
        ));
        user.push_str(&format!(
            "    <response>{}</response>\n",
            answer.analysis
        ));
        user.push_str(&format!(
            "    <thought_process>{}</thought_process>\n",
            answer.thought_process
        ));
        user.push_str("  </model_response>\n");
    }
    user.push_str("</model_responses>");

    vec![
        ChatMessage::system(ARBITER_PREAMBLE),
        ChatMessage::user(user),
    ]
}
