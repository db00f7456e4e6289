//! End-to-end runs of the consortium against a scripted completion stub:
//! termination scenarios, the iteration budget, arrival-order independence,
//! and refinement-guidance threading.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use consortium::{
    ChatMessage, Completion, Consortium, ConsortiumConfig, ConsortiumError, ProviderError, RoleId,
    RunOutcome,
};

#[derive(Clone)]
enum Scripted {
    Text(String),
    Fail,
}

struct RoleScript {
    responses: Vec<Scripted>,
    served: usize,
    delay: Duration,
}

/// Completion stub that replays scripted responses per role and records
/// every invocation for later assertions. The last scripted response
/// repeats once the sequence is exhausted.
#[derive(Default)]
struct ScriptedCompletion {
    scripts: Mutex<HashMap<String, RoleScript>>,
    calls: Mutex<Vec<(RoleId, Vec<ChatMessage>)>>,
}

impl ScriptedCompletion {
    fn new() -> Self {
        Self::default()
    }

    fn script(self, role: &RoleId, texts: &[&str]) -> Self {
        self.script_with_delay(role, texts, Duration::ZERO)
    }

    fn script_with_delay(self, role: &RoleId, texts: &[&str], delay: Duration) -> Self {
        assert!(!texts.is_empty());
        self.scripts.lock().unwrap().insert(
            role.to_string(),
            RoleScript {
                responses: texts.iter().map(|t| Scripted::Text(t.to_string())).collect(),
                served: 0,
                delay,
            },
        );
        self
    }

    fn failing(self, role: &RoleId) -> Self {
        self.scripts.lock().unwrap().insert(
            role.to_string(),
            RoleScript {
                responses: vec![Scripted::Fail],
                served: 0,
                delay: Duration::ZERO,
            },
        );
        self
    }

    fn call_count(&self, role: &RoleId) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == role)
            .count()
    }

    fn calls_for(&self, role: &RoleId) -> Vec<Vec<ChatMessage>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == role)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl Completion for ScriptedCompletion {
    async fn invoke(
        &self,
        role: &RoleId,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let (delay, response) = {
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts
                .get_mut(&role.to_string())
                .unwrap_or_else(|| panic!("no script for role {}", role));
            let idx = script.served.min(script.responses.len() - 1);
            script.served += 1;
            (script.delay, script.responses[idx].clone())
        };
        self.calls
            .lock()
            .unwrap()
            .push((role.clone(), messages.to_vec()));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match response {
            Scripted::Text(text) => Ok(text),
            Scripted::Fail => Err(ProviderError::Connection {
                provider: role.provider().to_string(),
                model: role.model().to_string(),
                reason: "scripted failure".to_string(),
            }),
        }
    }
}

fn member(name: &str) -> RoleId {
    RoleId::new("test", name)
}

fn arbiter() -> RoleId {
    RoleId::new("test", "arbiter")
}

fn panel(max_iterations: u32) -> ConsortiumConfig {
    ConsortiumConfig::new(
        vec![member("alpha"), member("beta"), member("gamma")],
        arbiter(),
        max_iterations,
    )
    .unwrap()
}

fn member_text(analysis: &str, confidence: f64) -> String {
    format!(
        "<thought_process>thinking about it</thought_process>\
         <analysis>{analysis}</analysis>\
         <confidence>{confidence}</confidence>"
    )
}

fn arbiter_accept(synthesis: &str) -> String {
    format!(
        "<synthesis>{synthesis}</synthesis>\
         <confidence>0.9</confidence>\
         <analysis>members agree</analysis>\
         <dissent></dissent>\
         <needs_iteration>false</needs_iteration>\
         <refinement_areas></refinement_areas>"
    )
}

fn arbiter_iterate(synthesis: &str, refinement: &str) -> String {
    format!(
        "<synthesis>{synthesis}</synthesis>\
         <confidence>0.5</confidence>\
         <analysis>still diverging</analysis>\
         <dissent>beta disagrees</dissent>\
         <needs_iteration>true</needs_iteration>\
         <refinement_areas>{refinement}</refinement_areas>"
    )
}

fn scripted_panel_members(stub: ScriptedCompletion) -> ScriptedCompletion {
    stub.script(&member("alpha"), &[&member_text("alpha view", 0.8)])
        .script(&member("beta"), &[&member_text("beta view", 0.6)])
        .script(&member("gamma"), &[&member_text("gamma view", 0.7)])
}

#[tokio::test]
async fn scenario_a_unanimous_first_pass() {
    let stub = Arc::new(
        scripted_panel_members(ScriptedCompletion::new())
            .script(&arbiter(), &[&arbiter_accept("the consensus")]),
    );
    let report = Consortium::new(panel(3), stub.clone())
        .run("the query")
        .await
        .unwrap();

    assert_eq!(report.iterations, 1);
    let verdict = report.outcome.verdict().unwrap();
    assert_eq!(verdict.synthesis, "the consensus");
    assert!((verdict.confidence - 0.9).abs() < 1e-9);
    assert!(!verdict.needs_iteration);

    for m in [member("alpha"), member("beta"), member("gamma")] {
        assert_eq!(stub.call_count(&m), 1);
    }
    assert_eq!(stub.call_count(&arbiter()), 1);
}

#[tokio::test]
async fn scenario_b_two_refinements_then_verdict() {
    let stub = Arc::new(scripted_panel_members(ScriptedCompletion::new()).script(
        &arbiter(),
        &[
            &arbiter_iterate("round one synthesis", "dig into rates"),
            &arbiter_iterate("round two synthesis", "quantify exposure"),
            &arbiter_accept("final synthesis"),
        ],
    ));
    let report = Consortium::new(panel(3), stub.clone())
        .run("the query")
        .await
        .unwrap();

    assert_eq!(report.iterations, 3);
    assert_eq!(report.outcome.verdict().unwrap().synthesis, "final synthesis");
    assert_eq!(stub.call_count(&arbiter()), 3);
    assert_eq!(stub.call_count(&member("alpha")), 3);
}

#[tokio::test]
async fn scenario_c_budget_exhaustion_forces_stop() {
    let stub = Arc::new(
        scripted_panel_members(ScriptedCompletion::new())
            .script(&arbiter(), &[&arbiter_iterate("never enough", "everything")]),
    );
    let report = Consortium::new(panel(3), stub.clone())
        .run("the query")
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::NoConsensus { iterations: 3 });
    assert_eq!(report.iterations, 3);
    // Three fan-out cycles, three arbitrations, never a fourth of either.
    assert_eq!(stub.call_count(&arbiter()), 3);
    for m in [member("alpha"), member("beta"), member("gamma")] {
        assert_eq!(stub.call_count(&m), 3);
    }
}

#[tokio::test]
async fn scenario_d_member_failure_aborts_before_arbitration() {
    let stub = Arc::new(
        ScriptedCompletion::new()
            .script(&member("alpha"), &[&member_text("alpha view", 0.8)])
            .failing(&member("beta"))
            .script(&member("gamma"), &[&member_text("gamma view", 0.7)])
            .script(&arbiter(), &[&arbiter_accept("unused")]),
    );
    let err = Consortium::new(panel(3), stub.clone())
        .run("the query")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ConsortiumError::Provider(ProviderError::Connection { .. })
    ));
    assert_eq!(stub.call_count(&arbiter()), 0);
}

#[tokio::test]
async fn budget_of_one_means_one_fan_out() {
    let stub = Arc::new(
        scripted_panel_members(ScriptedCompletion::new())
            .script(&arbiter(), &[&arbiter_iterate("partial", "more work")]),
    );
    let report = Consortium::new(panel(1), stub.clone())
        .run("the query")
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::NoConsensus { iterations: 1 });
    assert_eq!(stub.call_count(&member("alpha")), 1);
    assert_eq!(stub.call_count(&arbiter()), 1);
}

async fn arbiter_prompt_with_delays(
    alpha_ms: u64,
    beta_ms: u64,
    gamma_ms: u64,
) -> String {
    let stub = Arc::new(
        ScriptedCompletion::new()
            .script_with_delay(
                &member("alpha"),
                &[&member_text("alpha view", 0.8)],
                Duration::from_millis(alpha_ms),
            )
            .script_with_delay(
                &member("beta"),
                &[&member_text("beta view", 0.6)],
                Duration::from_millis(beta_ms),
            )
            .script_with_delay(
                &member("gamma"),
                &[&member_text("gamma view", 0.7)],
                Duration::from_millis(gamma_ms),
            )
            .script(&arbiter(), &[&arbiter_accept("done")]),
    );
    Consortium::new(panel(3), stub.clone())
        .run("the query")
        .await
        .unwrap();

    let calls = stub.calls_for(&arbiter());
    assert_eq!(calls.len(), 1);
    calls[0][1].content.clone()
}

#[tokio::test(start_paused = true)]
async fn arrival_order_does_not_change_aggregation() {
    let fast_first = arbiter_prompt_with_delays(30, 20, 10).await;
    let slow_first = arbiter_prompt_with_delays(10, 20, 30).await;

    assert_eq!(fast_first, slow_first);
    for view in ["alpha view", "beta view", "gamma view"] {
        assert!(fast_first.contains(view));
    }
}

#[tokio::test]
async fn second_iteration_threads_guidance_into_member_prompts() {
    let stub = Arc::new(scripted_panel_members(ScriptedCompletion::new()).script(
        &arbiter(),
        &[
            &arbiter_iterate("carried synthesis", "carried refinement"),
            &arbiter_accept("done"),
        ],
    ));
    Consortium::new(panel(3), stub.clone())
        .run("the query")
        .await
        .unwrap();

    let calls = stub.calls_for(&member("alpha"));
    assert_eq!(calls.len(), 2);

    let first_user = &calls[0][1].content;
    assert!(!first_user.contains("<previous_iteration>"));
    assert!(first_user.contains("<original_prompt>the query</original_prompt>"));

    let second_user = &calls[1][1].content;
    assert!(second_user.contains("<previous_iteration>"));
    assert!(second_user.contains("<synthesis>carried synthesis</synthesis>"));
    assert!(second_user.contains("<refinement_areas>carried refinement</refinement_areas>"));
    assert!(second_user.contains("<original_prompt>the query</original_prompt>"));
}

#[tokio::test]
async fn untagged_member_output_degrades_to_defaults() {
    let stub = Arc::new(
        ScriptedCompletion::new()
            .script(&member("alpha"), &["no tags here at all"])
            .script(&member("beta"), &[&member_text("beta view", 0.6)])
            .script(&member("gamma"), &[&member_text("gamma view", 0.7)])
            .script(&arbiter(), &[&arbiter_accept("done")]),
    );
    let report = Consortium::new(panel(3), stub.clone())
        .run("the query")
        .await
        .unwrap();

    assert!(report.outcome.is_consensus());
    // The degraded answer still reaches the arbiter, zeroed.
    let prompt = &stub.calls_for(&arbiter())[0][1].content;
    assert!(prompt.contains("<model>test/alpha</model>"));
    assert!(prompt.contains("<confidence>0</confidence>"));
}
