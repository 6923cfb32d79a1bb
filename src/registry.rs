//! Static catalog of invocable agent tools.
//!
//! The registry is built once at startup, never mutated, and iterates in
//! declaration order. It feeds the router's system prompt, the keyword
//! fallback matcher, and the executor's dispatch table.

use serde::Serialize;
use serde_json::{json, Value};

/// Tool ids referenced directly by routing and execution logic.
pub mod ids {
    pub const GET_WALLET_ADDRESS: &str = "get_wallet_address";
    pub const GET_BALANCE: &str = "get_balance";
    pub const GET_NETWORK: &str = "get_network";
    pub const ESTIMATE_GAS: &str = "estimate_gas";
    pub const SEND_TRANSACTION: &str = "send_transaction";
    pub const GET_TRANSACTION_STATUS: &str = "get_transaction_status";
    pub const GENERATE_TOKEN_CONTRACT: &str = "generate_token_contract";
    pub const ESTIMATE_DEPLOY_COST: &str = "estimate_deploy_cost";
    pub const DEPLOY_CONTRACT: &str = "deploy_contract";
    pub const ANALYZE_PROMPT: &str = "analyze_prompt";
    pub const VALIDATE_CONSTRAINTS: &str = "validate_constraints";
    pub const GENERATE_EXPLANATION: &str = "generate_explanation";
    pub const ENCRYPT_INPUT: &str = "encrypt_input";
    pub const CONFIDENTIAL_EXECUTE: &str = "confidential_execute";
    pub const SELECTIVE_DISCLOSURE: &str = "selective_disclosure";
    pub const SUBMIT_AGENT_PROFILE: &str = "submit_agent_profile";
    pub const LIST_APPROVED_AGENTS: &str = "list_approved_agents";
    pub const GET_TOKEN_PRICE: &str = "get_token_price";
    pub const CHECK_LIQUIDITY: &str = "check_liquidity";
}

/// Tool classification: read-only query, value-moving write, or
/// privacy-preserving write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Read,
    Write,
    Private,
}

#[derive(Clone, Debug)]
pub struct Tool {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ToolKind,
    pub keywords: &'static [&'static str],
    /// Parameter name -> human description, empty when context dependent
    pub params: &'static [(&'static str, &'static str)],
}

impl Tool {
    /// Compact JSON summary embedded into the router's system prompt.
    pub fn prompt_summary(&self) -> Value {
        let params: Value = if self.params.is_empty() {
            json!("context dependent")
        } else {
            let map: serde_json::Map<String, Value> = self
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), json!(v)))
                .collect();
            Value::Object(map)
        };
        json!({ "id": self.id, "description": self.description, "params": params })
    }
}

pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: catalog(),
        }
    }

    /// All tools, in declaration order.
    pub fn list(&self) -> &[Tool] {
        &self.tools
    }

    pub fn get(&self, id: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Deterministic keyword matcher used when the LLM collaborator is
    /// unreachable. Tools with narrow, specific keywords are checked first
    /// so "deploy my token" does not land on a general match; the public
    /// transfer tool is the final default.
    pub fn interpret_prompt(&self, prompt: &str) -> &Tool {
        let p = prompt.to_lowercase();

        const SPECIFIC_FIRST: &[&str] = &[
            ids::DEPLOY_CONTRACT,
            ids::GENERATE_TOKEN_CONTRACT,
            ids::ENCRYPT_INPUT,
            ids::CONFIDENTIAL_EXECUTE,
            ids::SUBMIT_AGENT_PROFILE,
        ];
        for id in SPECIFIC_FIRST {
            if let Some(tool) = self.get(id) {
                if tool.keywords.iter().any(|k| p.contains(k)) {
                    return tool;
                }
            }
        }

        for tool in &self.tools {
            if tool.keywords.iter().any(|k| p.contains(k)) {
                return tool;
            }
        }

        if p.contains("balance") {
            return self.get(ids::GET_BALANCE).unwrap();
        }
        if p.contains("price") {
            return self.get(ids::GET_TOKEN_PRICE).unwrap();
        }
        if p.contains("liquidity") {
            return self.get(ids::CHECK_LIQUIDITY).unwrap();
        }

        self.get(ids::SEND_TRANSACTION).unwrap()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn catalog() -> Vec<Tool> {
    vec![
        Tool {
            id: ids::GET_WALLET_ADDRESS,
            name: "Get Wallet",
            description: "Get connected wallet address",
            kind: ToolKind::Read,
            keywords: &["wallet address", "my address", "who am i"],
            params: &[],
        },
        Tool {
            id: ids::GET_BALANCE,
            name: "Check Balance",
            description: "Check SHM/ETH balance",
            kind: ToolKind::Read,
            keywords: &["balance", "how much", "funds", "shm", "money"],
            params: &[],
        },
        Tool {
            id: ids::GET_NETWORK,
            name: "Check Network",
            description: "Check chain",
            kind: ToolKind::Read,
            keywords: &["network", "chain", "which network", "connected to"],
            params: &[],
        },
        Tool {
            id: ids::ESTIMATE_GAS,
            name: "Estimate Gas",
            description: "Estimate tx cost",
            kind: ToolKind::Read,
            keywords: &["gas", "cost", "fee", "estimate gas"],
            params: &[],
        },
        Tool {
            id: ids::SEND_TRANSACTION,
            name: "Send SHM",
            description: "Send SHM/ETH",
            kind: ToolKind::Write,
            keywords: &["send", "transfer", "pay", "give"],
            params: &[
                ("to", "Recipient Address (0x...)"),
                ("amount", "Amount to send"),
            ],
        },
        Tool {
            id: ids::GET_TRANSACTION_STATUS,
            name: "Tx Status",
            description: "Check tx status",
            kind: ToolKind::Read,
            keywords: &["confirmed", "status", "track", "tx", "receipt"],
            params: &[],
        },
        Tool {
            id: ids::GENERATE_TOKEN_CONTRACT,
            name: "Draft Token",
            description: "Draft token contract",
            kind: ToolKind::Write,
            keywords: &["draft", "template", "token code"],
            params: &[],
        },
        Tool {
            id: ids::ESTIMATE_DEPLOY_COST,
            name: "Deploy Cost",
            description: "Estimate deployment cost",
            kind: ToolKind::Read,
            keywords: &["cost to deploy", "deployment price"],
            params: &[],
        },
        Tool {
            id: ids::DEPLOY_CONTRACT,
            name: "Deploy Token",
            description: "Deploy token to chain",
            kind: ToolKind::Write,
            keywords: &["deploy", "launch", "create token"],
            params: &[],
        },
        Tool {
            id: ids::ANALYZE_PROMPT,
            name: "Analyze Intent",
            description: "Understand prompt intent",
            kind: ToolKind::Read,
            keywords: &["if gas <", "explain intent", "analyze"],
            params: &[],
        },
        Tool {
            id: ids::VALIDATE_CONSTRAINTS,
            name: "Validate",
            description: "Check limits/constraints",
            kind: ToolKind::Read,
            keywords: &["if balance ok", "validate", "check limits"],
            params: &[],
        },
        Tool {
            id: ids::GENERATE_EXPLANATION,
            name: "Explain Why",
            description: "Explain decision logic",
            kind: ToolKind::Read,
            keywords: &["why", "explain decision", "reasoning"],
            params: &[],
        },
        Tool {
            id: ids::ENCRYPT_INPUT,
            name: "Encrypt Input",
            description: "Secure a value with confidential-compute encryption",
            kind: ToolKind::Private,
            keywords: &["privately", "secretly", "hidden", "encrypt"],
            params: &[
                ("value", "The number or value to encrypt"),
                ("type", "Type (uint8/16/32/64/128/256/bool)"),
            ],
        },
        Tool {
            id: ids::CONFIDENTIAL_EXECUTE,
            name: "Private Exec",
            description: "Private execution via confidential compute. Use this for ANY request labeled private or secret.",
            kind: ToolKind::Private,
            keywords: &[
                "confidential",
                "privacy level",
                "private transaction",
                "secretly execute",
                "stealth",
            ],
            params: &[("to", "Recipient Address"), ("value", "Amount to send")],
        },
        Tool {
            id: ids::SELECTIVE_DISCLOSURE,
            name: "Disclosure",
            description: "Reveal result only",
            kind: ToolKind::Private,
            keywords: &["hide inputs", "reveal only"],
            params: &[],
        },
        Tool {
            id: ids::SUBMIT_AGENT_PROFILE,
            name: "Submit Profile",
            description: "Add agent to DAO",
            kind: ToolKind::Write,
            keywords: &["submit agent", "add to dao", "register agent"],
            params: &[],
        },
        Tool {
            id: ids::LIST_APPROVED_AGENTS,
            name: "List Agents",
            description: "Show available agents",
            kind: ToolKind::Read,
            keywords: &["show agents", "list available", "active agents"],
            params: &[],
        },
        Tool {
            id: ids::GET_TOKEN_PRICE,
            name: "Check Price",
            description: "Get token price via Coinbase",
            kind: ToolKind::Read,
            keywords: &["price", "how much is", "value of", "rate"],
            params: &[("symbol", "Ticker symbol (e.g., BTC, ETH, SHM)")],
        },
        Tool {
            id: ids::CHECK_LIQUIDITY,
            name: "Check Liquidity",
            description: "Check pool liquidity",
            kind: ToolKind::Read,
            keywords: &["liquidity", "depth", "pool size", "slippage"],
            params: &[("pool", "Pool pair (e.g., SHM-USDT)")],
        },
    ]
}
