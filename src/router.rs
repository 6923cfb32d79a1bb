//! Maps a free-text user prompt to a candidate tool.
//!
//! Primary path: an LLM call with a system instruction embedding the full
//! tool registry, expecting a strict JSON decision object. Degrades to raw
//! text capture on parse failure, and to deterministic keyword matching
//! when the collaborator is unreachable. Never returns an error across its
//! boundary; failures come back as error-shaped Decisions.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::chain::types::looks_like_address;
use crate::constants::events;
use crate::error::LlmError;
use crate::llm::LlmQueue;
use crate::registry::{ids, ToolRegistry};

/// Structured routing decision for one user turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Decision {
    pub thought: String,
    pub tool: Option<String>,
    #[serde(default)]
    pub params: Map<String, Value>,
    pub explanation: String,
    /// Set when routing itself failed; the caller renders a failure state
    /// instead of a plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Decision {
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            thought: String::new(),
            tool: None,
            params: Map::new(),
            explanation: message.clone(),
            error: Some(message),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }
}

/// Per-turn context injected ahead of the user prompt.
#[derive(Clone, Debug)]
pub struct RouteContext {
    pub wallet_address: Option<String>,
    pub network: String,
}

/// Raw LLM reply, classified by the tolerant parser.
pub(crate) enum LlmReply {
    Json(Value),
    Raw(String),
}

pub struct IntentRouter {
    llm: LlmQueue,
    registry: Arc<ToolRegistry>,
    timeout: Duration,
    system_prompt: String,
}

impl IntentRouter {
    pub fn new(llm: LlmQueue, registry: Arc<ToolRegistry>, timeout_secs: u64) -> Self {
        let system_prompt = build_system_prompt(&registry);
        Self {
            llm,
            registry,
            timeout: Duration::from_secs(timeout_secs),
            system_prompt,
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub async fn route(&self, prompt: &str, ctx: &RouteContext) -> Decision {
        let user_input = format!(
            "Context:\n- User's Wallet Address: {}\n- Current Network: {}\n\n{}",
            ctx.wallet_address.as_deref().unwrap_or("unknown"),
            ctx.network,
            prompt
        );

        let raw = match timeout(self.timeout, self.llm.chat(&self.system_prompt, &user_input)).await
        {
            Err(_) => {
                let err = LlmError::Timeout {
                    secs: self.timeout.as_secs(),
                };
                warn!(event = events::ROUTING_FAILED, "{}", err);
                return Decision::failed(err.to_string());
            }
            Ok(Err(e)) if e.is_unreachable() => {
                warn!(
                    event = events::ROUTING_FALLBACK,
                    "LLM unreachable ({}), using local keyword routing", e
                );
                return self.fallback_decision(prompt);
            }
            Ok(Err(e)) => {
                warn!(event = events::ROUTING_FAILED, "{}", e);
                return Decision::failed(e.to_string());
            }
            Ok(Ok(raw)) => raw,
        };

        let mut decision = match parse_reply(&raw) {
            LlmReply::Json(value) => decision_from_value(value),
            LlmReply::Raw(text) => Decision {
                thought: "Raw reasoning captured".to_string(),
                tool: None,
                params: Map::new(),
                explanation: text,
                error: None,
            },
        };

        self.enforce_privacy(prompt, &mut decision);
        info!(
            event = events::PROMPT_ROUTED,
            tool = decision.tool.as_deref().unwrap_or("none"),
            "Routed prompt"
        );
        decision
    }

    /// Fully local routing used when the LLM collaborator is unreachable:
    /// keyword matching over the registry plus amount/address extraction
    /// from the prompt text.
    pub fn fallback_decision(&self, prompt: &str) -> Decision {
        let tool = if has_privacy_signal(prompt) && has_transfer_intent(prompt) {
            // A privacy-signaling transfer must never take the public path.
            self.registry.get(ids::CONFIDENTIAL_EXECUTE).unwrap()
        } else {
            self.registry.interpret_prompt(prompt)
        };

        let mut params = Map::new();
        if let Some(address) = extract_address(prompt) {
            params.insert("to".to_string(), Value::String(address));
        }
        if let Some(amount) = extract_amount(prompt) {
            let key = if tool.id == ids::CONFIDENTIAL_EXECUTE || tool.id == ids::ENCRYPT_INPUT {
                "value"
            } else {
                "amount"
            };
            params.insert(key.to_string(), Value::String(amount));
        }

        let mut decision = Decision {
            thought: format!("Local keyword routing selected {}", tool.id),
            tool: Some(tool.id.to_string()),
            params,
            explanation: format!("Matched \"{}\" without LLM assistance.", tool.name),
            error: None,
        };
        self.enforce_privacy(prompt, &mut decision);
        decision
    }

    /// The public transfer tool must never be chosen for a prompt that
    /// signals privacy, regardless of what the model returned.
    fn enforce_privacy(&self, prompt: &str, decision: &mut Decision) {
        if !has_privacy_signal(prompt) {
            return;
        }
        if decision.tool.as_deref() == Some(ids::SEND_TRANSACTION) {
            warn!("Privacy signal in prompt; rerouting public transfer to confidential path");
            decision.tool = Some(ids::CONFIDENTIAL_EXECUTE.to_string());
            if let Some(amount) = decision.params.remove("amount") {
                decision.params.entry("value".to_string()).or_insert(amount);
            }
        }
    }
}

fn build_system_prompt(registry: &ToolRegistry) -> String {
    let tools: Vec<Value> = registry.list().iter().map(|t| t.prompt_summary()).collect();
    format!(
        r#"You are AgentChain, an advanced AI trading assistant.
Your goal is to help the user interact with the blockchain.
You have access to tools via the Model Context Protocol (MCP).

IMPORTANT - PUBLIC VS PRIVATE:
- Standard "send_transaction" is PUBLIC. Everything is visible on the explorer.
- "confidential_execute" is PRIVATE. Use this if the user says "private", "hidden", "secret", or "stealth".
- NEVER use "send_transaction" if the user asks for a PRIVATE transaction.

CRITICAL: Return your response ONLY as a strict JSON object.
DO NOT include any conversational filler.
Return purely the JSON block:
{{
  "thought": "Your reasoning process here. Explicitly state if you are using a public or private tool.",
  "tool": "tool_id",
  "params": {{ ...tool parameters... }},
  "explanation": "Explanation for the user"
}}
If no tool is needed, set tool to null.
Available Tools:
{}"#,
        serde_json::to_string(&tools).unwrap_or_else(|_| "[]".to_string())
    )
}

/// Classify the raw reply: the first balanced `{{...}}` block parses as the
/// decision (the model may wrap it in prose); anything else is raw text.
pub(crate) fn parse_reply(raw: &str) -> LlmReply {
    if let Some(block) = extract_json_block(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(block) {
            if value.is_object() {
                return LlmReply::Json(value);
            }
        }
    }
    LlmReply::Raw(raw.to_string())
}

/// Find the first balanced top-level `{...}` block, tolerating string
/// literals containing braces.
pub(crate) fn extract_json_block(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Build a Decision from parsed JSON, tolerating missing fields.
fn decision_from_value(value: Value) -> Decision {
    let thought = value
        .get("thought")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let tool = value
        .get("tool")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty() && *s != "null")
        .map(|s| s.to_string());
    let params = value
        .get("params")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();
    let explanation = value
        .get("explanation")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Decision {
        thought,
        tool,
        params,
        explanation,
        error: None,
    }
}

const PRIVACY_SIGNALS: &[&str] = &[
    "private",
    "privately",
    "secret",
    "secretly",
    "hidden",
    "stealth",
    "confidential",
];

pub(crate) fn has_privacy_signal(prompt: &str) -> bool {
    let p = prompt.to_lowercase();
    PRIVACY_SIGNALS.iter().any(|s| p.contains(s))
}

const TRANSFER_SIGNALS: &[&str] = &["send", "transfer", "pay", "give", "move"];

pub(crate) fn has_transfer_intent(prompt: &str) -> bool {
    let p = prompt.to_lowercase();
    TRANSFER_SIGNALS.iter().any(|s| p.contains(s))
}

/// First numeric token in the prompt ("send 5 to ..." -> "5").
pub(crate) fn extract_amount(prompt: &str) -> Option<String> {
    prompt
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_ascii_digit() && c != '.'))
        .find(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit() || c == '.'))
        .map(|t| t.to_string())
}

/// First address-shaped token in the prompt.
pub(crate) fn extract_address(prompt: &str) -> Option<String> {
    prompt
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| c == ',' || c == '.' || c == ')' || c == '('))
        .find(|t| looks_like_address(t))
        .map(|t| t.to_string())
}
