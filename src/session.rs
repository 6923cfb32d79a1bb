//! Conversation surface tying the router, executor and decision log
//! together.
//!
//! Safety contract: `process_prompt` only ever routes; nothing moves value
//! until the caller explicitly passes the returned decision to
//! `execute_approved`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{info, warn};

use crate::chain::ChainClient;
use crate::constants::events;
use crate::decision_log::{DecisionLog, EntryDraft, LogStatus, LogUpdate, Phase, Visibility};
use crate::error::ExecError;
use crate::executor::{ExecCall, ExecOptions, ToolExecutor};
use crate::registry::{ToolKind, ToolRegistry};
use crate::router::{Decision, IntentRouter, RouteContext};

/// Outcome of one routed prompt: the decision awaiting approval, plus the
/// id of the log entry that recorded the routing.
#[derive(Clone, Debug)]
pub struct RoutedTurn {
    pub decision: Decision,
    pub log_id: Option<u64>,
}

pub struct AgentSession {
    router: IntentRouter,
    executor: ToolExecutor,
    registry: Arc<ToolRegistry>,
    chain: Arc<dyn ChainClient>,
    log: Arc<DecisionLog>,
    agent_name: String,
    network_label: String,
    thinking: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl AgentSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        router: IntentRouter,
        executor: ToolExecutor,
        registry: Arc<ToolRegistry>,
        chain: Arc<dyn ChainClient>,
        log: Arc<DecisionLog>,
        agent_name: impl Into<String>,
        network_label: impl Into<String>,
    ) -> Self {
        Self {
            router,
            executor,
            registry,
            chain,
            log,
            agent_name: agent_name.into(),
            network_label: network_label.into(),
            thinking: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    pub fn log(&self) -> &Arc<DecisionLog> {
        &self.log
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking.load(Ordering::SeqCst)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    /// Route one prompt to a plan. Rejects overlapping calls: a second
    /// prompt while one is in flight comes back as an error decision
    /// without touching the router.
    pub async fn process_prompt(&self, prompt: &str) -> RoutedTurn {
        if self.thinking.swap(true, Ordering::SeqCst) {
            return RoutedTurn {
                decision: Decision::failed("Agent is busy processing another prompt."),
                log_id: None,
            };
        }

        info!("🤖 [{}] Processing prompt: {}", self.agent_name, prompt);
        let log_id = self.log.append(
            EntryDraft::new(&self.agent_name, "THINKING")
                .console_line(format!("Prompt: \"{}\"", prompt))
                .console_line("Consulting language model..."),
        );

        let ctx = RouteContext {
            wallet_address: self.chain.signer_address(),
            network: self.network_label.clone(),
        };
        let decision = self.router.route(prompt, &ctx).await;

        if let Some(error) = &decision.error {
            *self.last_error.lock().unwrap() = Some(error.clone());
            self.log.update(
                log_id,
                LogUpdate::status(LogStatus::Reverted)
                    .console_line(format!("Routing failed: {}", error)),
            );
        } else {
            let plan = match &decision.tool {
                Some(tool) => format!("Plan: Execute {}", tool),
                None => "Plan: No tool needed.".to_string(),
            };
            self.log.update(
                log_id,
                LogUpdate::status(LogStatus::Success)
                    .console_line(format!("Reasoning: {}", decision.thought))
                    .console_line(plan),
            );
        }

        self.thinking.store(false, Ordering::SeqCst);
        RoutedTurn {
            decision,
            log_id: Some(log_id),
        }
    }

    /// Execute a decision the caller has approved. A decision with no tool
    /// short-circuits to its explanation; everything else gets its own log
    /// entry that transitions Processing -> Success/Reverted.
    pub async fn execute_approved(
        &self,
        decision: &Decision,
        simulate: bool,
    ) -> Result<String, ExecError> {
        let Some(tool_id) = decision.tool.as_deref() else {
            return Ok(decision.explanation.clone());
        };

        let amount = decision
            .param_str("amount")
            .or_else(|| decision.param_str("value"))
            .unwrap_or("N/A")
            .to_string();
        let visibility = match self.registry.get(tool_id).map(|t| t.kind) {
            Some(ToolKind::Private) => Visibility::Confidential,
            _ => Visibility::Public,
        };

        let mut draft = EntryDraft::new(&self.agent_name, tool_id.replace('_', " ").to_uppercase())
            .amount(amount)
            .visibility(visibility)
            .console_line(format!("Executing {}...", tool_id));
        if simulate {
            draft = draft.console_line("Simulation mode: no state will change.");
        }
        let log_id = self.log.append(draft);

        let call = ExecCall {
            tool_id: tool_id.to_string(),
            params: decision.params.clone(),
            thought: Some(decision.thought.clone()),
        };
        let started = Instant::now();
        match self.executor.execute(&call, ExecOptions { simulate }).await {
            Ok(result) => {
                let headline = result.lines().next().unwrap_or_default().to_string();
                self.log.update(
                    log_id,
                    LogUpdate::status(LogStatus::Success)
                        .console_line(result.clone())
                        .phase(Phase {
                            title: "SETTLED".to_string(),
                            offset: phase_offset(started),
                            status: LogStatus::Success,
                            detail: headline,
                        }),
                );
                Ok(result)
            }
            Err(e) => {
                warn!(event = events::TOOL_REVERTED, tool = tool_id, "{}", e);
                *self.last_error.lock().unwrap() = Some(e.to_string());
                self.log.update(
                    log_id,
                    LogUpdate::status(LogStatus::Reverted)
                        .console_line(format!("Execution failed: {}", e))
                        .phase(Phase {
                            title: "REVERTED".to_string(),
                            offset: phase_offset(started),
                            status: LogStatus::Reverted,
                            detail: e.to_string(),
                        }),
                );
                Err(e)
            }
        }
    }
}

fn phase_offset(started: Instant) -> String {
    format!("+{:.1}s", started.elapsed().as_secs_f64())
}
