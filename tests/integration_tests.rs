//! Integration tests for the agent pipeline.
//! These tests wire the router, executor, log and session together against
//! mock chain / oracle / confidential collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use agentchain::chain::types::{NetworkInfo, TxReceipt};
use agentchain::chain::{ChainClient, ChainResult};
use agentchain::confidential::{ConfidentialClient, ConfidentialResult, HandleType};
use agentchain::decision_log::{DecisionLog, LogStatus};
use agentchain::error::{ExecError, LlmError, OracleError};
use agentchain::executor::{ExecCall, ExecOptions, ExecutorSettings, ToolExecutor};
use agentchain::llm::{ChatBackend, LlmQueue};
use agentchain::oracle::{MarketOracle, PoolStats, PriceQuote};
use agentchain::registry::{ids, ToolRegistry};
use agentchain::router::IntentRouter;
use agentchain::session::AgentSession;

const SIGNER: &str = "0x1111111111111111111111111111111111111111";
const RECIPIENT: &str = "0xAbC0000000000000000000000000000000000123";

// ============= Mock collaborators =============

#[derive(Default)]
struct MockChain {
    signer: Option<String>,
    /// Every state-mutating call, in order
    mutations: Mutex<Vec<String>>,
}

impl MockChain {
    fn with_signer() -> Self {
        Self {
            signer: Some(SIGNER.to_string()),
            mutations: Mutex::new(Vec::new()),
        }
    }

    fn mutations(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn signer_address(&self) -> Option<String> {
        self.signer.clone()
    }

    async fn network(&self) -> ChainResult<NetworkInfo> {
        Ok(NetworkInfo {
            name: "Mocknet".to_string(),
            chain_id: 8082,
        })
    }

    async fn balance_of(&self, _address: &str) -> ChainResult<u128> {
        Ok(5 * 10u128.pow(18))
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        Ok(2 * 10u128.pow(9))
    }

    async fn transaction_receipt(&self, hash: &str) -> ChainResult<Option<TxReceipt>> {
        if hash == "0xpending" {
            return Ok(None);
        }
        Ok(Some(TxReceipt {
            success: true,
            block_number: 42,
        }))
    }

    async fn send_transfer(&self, to: &str, value_wei: u128, data: &[u8]) -> ChainResult<String> {
        self.mutations.lock().unwrap().push(format!(
            "transfer:{}:{}:{}",
            to,
            value_wei,
            String::from_utf8_lossy(data)
        ));
        Ok("0xpublichash".to_string())
    }

    async fn log_confidential(&self, ciphertext: &[u8], value_wei: u128) -> ChainResult<String> {
        self.mutations
            .lock()
            .unwrap()
            .push(format!("confidential:{}:{}", ciphertext.len(), value_wei));
        Ok("0xstealthhash".to_string())
    }
}

struct MockOracle;

#[async_trait]
impl MarketOracle for MockOracle {
    async fn price_quote(&self, symbol: &str) -> Result<PriceQuote, OracleError> {
        Ok(PriceQuote {
            symbol: symbol.to_uppercase(),
            spot: "100.00".to_string(),
            buy: "100.50".to_string(),
            sell: "99.50".to_string(),
        })
    }

    async fn pool_liquidity(&self, query: &str) -> Result<Option<PoolStats>, OracleError> {
        if query == "ZZZZ" {
            return Ok(None);
        }
        Ok(Some(PoolStats {
            dex: "mockswap".to_string(),
            base: query.to_string(),
            quote: "USDT".to_string(),
            liquidity_usd: 1_000_000.0,
            price_usd: "1.00".to_string(),
            volume_h24: 50_000.0,
            url: "https://dexscreener.example/pool".to_string(),
        }))
    }
}

struct MockConfidential;

#[async_trait]
impl ConfidentialClient for MockConfidential {
    async fn encrypt(
        &self,
        value: &str,
        _handle: HandleType,
        _account_address: Option<&str>,
        _dapp_address: &str,
    ) -> ConfidentialResult<Vec<u8>> {
        let mut out = vec![0xc1, 0x9e]; // fake ciphertext header
        out.extend_from_slice(value.as_bytes());
        Ok(out)
    }
}

/// Chat backend scripted per test: a fixed reply, an error, or a delay.
enum Script {
    Reply(String),
    Unreachable,
    Hang,
}

struct ScriptedBackend {
    script: Script,
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Unreachable => {
                // A connect failure to a port nothing listens on
                let err = reqwest::Client::new()
                    .get("http://127.0.0.1:1/_down")
                    .send()
                    .await
                    .expect_err("connect should fail");
                Err(LlmError::Network(err))
            }
            Script::Hang => {
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                Ok(String::new())
            }
        }
    }
}

// ============= Harness =============

fn executor_with(chain: Arc<MockChain>) -> (Arc<ToolRegistry>, ToolExecutor) {
    let registry = Arc::new(ToolRegistry::new());
    let executor = ToolExecutor::new(
        registry.clone(),
        chain,
        Arc::new(MockOracle),
        Arc::new(MockConfidential),
        ExecutorSettings {
            explorer_url: "https://explorer.example".to_string(),
            dapp_address: "0x2222222222222222222222222222222222222222".to_string(),
        },
    );
    (registry, executor)
}

fn session_with(script: Script, chain: Arc<MockChain>, timeout_secs: u64) -> AgentSession {
    let (registry, executor) = executor_with(chain.clone());
    let backend = Arc::new(ScriptedBackend { script });
    let queue = LlmQueue::new(backend, 1, 16);
    let router = IntentRouter::new(queue, registry.clone(), timeout_secs);
    AgentSession::new(
        router,
        executor,
        registry,
        chain,
        Arc::new(DecisionLog::in_memory()),
        "TestAgent",
        "Mocknet",
    )
}

fn call(tool: &str, params: serde_json::Value, thought: Option<&str>) -> ExecCall {
    ExecCall {
        tool_id: tool.to_string(),
        params: params.as_object().cloned().unwrap_or_default(),
        thought: thought.map(|s| s.to_string()),
    }
}

// ============= Executor behavior =============

#[tokio::test]
async fn test_unknown_tool_returns_sentinel() {
    let (_, executor) = executor_with(Arc::new(MockChain::with_signer()));

    let result = executor
        .execute(
            &call("teleport_funds", serde_json::json!({}), None),
            ExecOptions { simulate: false },
        )
        .await
        .unwrap();

    assert_eq!(result, "Tool not implemented yet.");
}

#[tokio::test]
async fn test_simulation_never_mutates_state() {
    let chain = Arc::new(MockChain::with_signer());
    let (_, executor) = executor_with(chain.clone());

    let result = executor
        .execute(
            &call(
                ids::SEND_TRANSACTION,
                serde_json::json!({"to": RECIPIENT, "amount": "5"}),
                Some("move funds"),
            ),
            ExecOptions { simulate: true },
        )
        .await
        .unwrap();

    assert!(result.contains("[SIMULATION]"));
    assert!(result.contains("Switch to LIVE to confirm."));
    assert!(chain.mutations().is_empty());
}

#[tokio::test]
async fn test_send_transaction_without_wallet_fails() {
    let (_, executor) = executor_with(Arc::new(MockChain::default()));

    let err = executor
        .execute(
            &call(
                ids::SEND_TRANSACTION,
                serde_json::json!({"to": RECIPIENT, "amount": "5"}),
                None,
            ),
            ExecOptions { simulate: false },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExecError::WalletNotConnected { .. }));
}

#[tokio::test]
async fn test_send_transaction_requires_recipient_and_amount() {
    let chain = Arc::new(MockChain::with_signer());
    let (_, executor) = executor_with(chain.clone());

    let err = executor
        .execute(
            &call(ids::SEND_TRANSACTION, serde_json::json!({"amount": "5"}), None),
            ExecOptions { simulate: false },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ExecError::RecipientNotFound { .. }));

    // An amount that sanitizes to nothing is an error, not a zero transfer
    let err = executor
        .execute(
            &call(
                ids::SEND_TRANSACTION,
                serde_json::json!({"to": RECIPIENT, "amount": "lots"}),
                None,
            ),
            ExecOptions { simulate: false },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ExecError::MissingAmount { .. }));
    assert!(chain.mutations().is_empty());
}

#[tokio::test]
async fn test_public_transfer_carries_intent_in_calldata() {
    let chain = Arc::new(MockChain::with_signer());
    let (_, executor) = executor_with(chain.clone());

    let result = executor
        .execute(
            &call(
                ids::SEND_TRANSACTION,
                serde_json::json!({"to": RECIPIENT, "amount": "1,000 SHM"}),
                Some("rebalancing"),
            ),
            ExecOptions { simulate: false },
        )
        .await
        .unwrap();

    assert!(result.contains("0xpublichash"));
    assert!(result.contains("1000 SHM"));
    let mutations = chain.mutations();
    assert_eq!(mutations.len(), 1);
    assert!(mutations[0].starts_with(&format!("transfer:{}", RECIPIENT)));
    assert!(mutations[0].ends_with("rebalancing"));
}

#[tokio::test]
async fn test_confidential_execute_hides_reasoning() {
    let chain = Arc::new(MockChain::with_signer());
    let (_, executor) = executor_with(chain.clone());

    let thought = "buying before the announcement";
    let result = executor
        .execute(
            &call(
                ids::CONFIDENTIAL_EXECUTE,
                serde_json::json!({"to": RECIPIENT, "value": "10"}),
                Some(thought),
            ),
            ExecOptions { simulate: false },
        )
        .await
        .unwrap();

    assert!(result.contains("0xstealthhash"));
    assert!(result.contains("10 SHM"));
    assert!(result.contains("https://explorer.example/tx/0xstealthhash"));
    // The plaintext reasoning never appears in the user-facing result
    assert!(!result.contains(thought));

    let mutations = chain.mutations();
    assert_eq!(mutations.len(), 1);
    assert!(mutations[0].starts_with("confidential:"));
    assert!(mutations[0].ends_with(&format!(":{}", 10 * 10u128.pow(18))));
}

#[tokio::test]
async fn test_read_tools_run_even_in_simulation() {
    let chain = Arc::new(MockChain::with_signer());
    let (_, executor) = executor_with(chain.clone());

    let balance = executor
        .execute(
            &call(ids::GET_BALANCE, serde_json::json!({}), None),
            ExecOptions { simulate: true },
        )
        .await
        .unwrap();
    assert_eq!(balance, "5.0 SHM");

    let network = executor
        .execute(
            &call(ids::GET_NETWORK, serde_json::json!({}), None),
            ExecOptions { simulate: true },
        )
        .await
        .unwrap();
    assert_eq!(network, "Mocknet (Chain ID: 8082)");
    assert!(chain.mutations().is_empty());
}

#[tokio::test]
async fn test_liquidity_no_pools_message() {
    let (_, executor) = executor_with(Arc::new(MockChain::with_signer()));

    let result = executor
        .execute(
            &call(ids::CHECK_LIQUIDITY, serde_json::json!({"pool": "zzzz"}), None),
            ExecOptions { simulate: false },
        )
        .await
        .unwrap();

    assert!(result.contains("No liquidity pools found for \"ZZZZ\""));
}

#[tokio::test]
async fn test_transaction_status_variants() {
    let (_, executor) = executor_with(Arc::new(MockChain::with_signer()));

    let missing = executor
        .execute(
            &call(ids::GET_TRANSACTION_STATUS, serde_json::json!({}), None),
            ExecOptions { simulate: false },
        )
        .await
        .unwrap();
    assert_eq!(missing, "Please provide a transaction hash.");

    let pending = executor
        .execute(
            &call(
                ids::GET_TRANSACTION_STATUS,
                serde_json::json!({"hash": "0xpending"}),
                None,
            ),
            ExecOptions { simulate: false },
        )
        .await
        .unwrap();
    assert_eq!(pending, "Transaction Pending or Not Found");

    let confirmed = executor
        .execute(
            &call(
                ids::GET_TRANSACTION_STATUS,
                serde_json::json!({"hash": "0xdone"}),
                None,
            ),
            ExecOptions { simulate: false },
        )
        .await
        .unwrap();
    assert!(confirmed.contains("Success"));
    assert!(confirmed.contains("42"));
}

// ============= Routing behavior =============

#[tokio::test]
async fn test_route_parses_strict_json_reply() {
    let reply = r#"{"thought":"read-only query","tool":"get_balance","params":{},"explanation":"Checking your balance."}"#;
    let session = session_with(
        Script::Reply(reply.to_string()),
        Arc::new(MockChain::with_signer()),
        5,
    );

    let turn = session.process_prompt("what is my balance?").await;
    assert_eq!(turn.decision.tool.as_deref(), Some(ids::GET_BALANCE));
    assert!(!turn.decision.is_error());
}

#[tokio::test]
async fn test_route_captures_raw_reasoning() {
    let session = session_with(
        Script::Reply("The market looks quiet today, nothing to do.".to_string()),
        Arc::new(MockChain::with_signer()),
        5,
    );

    let turn = session.process_prompt("anything interesting?").await;
    assert_eq!(turn.decision.thought, "Raw reasoning captured");
    assert!(turn.decision.tool.is_none());
    assert!(turn.decision.explanation.contains("market looks quiet"));
}

#[tokio::test]
async fn test_privacy_prompt_overrides_public_tool_choice() {
    // The model wrongly picks the public transfer for a privacy prompt
    let reply = format!(
        r#"{{"thought":"sending funds","tool":"send_transaction","params":{{"to":"{}","amount":"10"}},"explanation":"Sending."}}"#,
        RECIPIENT
    );
    let session = session_with(Script::Reply(reply), Arc::new(MockChain::with_signer()), 5);

    let turn = session.process_prompt("privately send 10 to a friend").await;
    assert_eq!(turn.decision.tool.as_deref(), Some(ids::CONFIDENTIAL_EXECUTE));
    // The amount moves with the tool's parameter name
    assert_eq!(turn.decision.param_str("value"), Some("10"));
    assert!(turn.decision.param_str("amount").is_none());
}

#[tokio::test]
async fn test_unreachable_llm_falls_back_to_keywords() {
    let session = session_with(
        Script::Unreachable,
        Arc::new(MockChain::with_signer()),
        5,
    );

    let turn = session
        .process_prompt(&format!("send 5 to {}", RECIPIENT))
        .await;
    assert!(!turn.decision.is_error());
    assert_eq!(turn.decision.tool.as_deref(), Some(ids::SEND_TRANSACTION));
    assert_eq!(turn.decision.param_str("to"), Some(RECIPIENT));
    assert_eq!(turn.decision.param_str("amount"), Some("5"));
}

#[tokio::test]
async fn test_fallback_privacy_transfer_takes_confidential_path() {
    let session = session_with(
        Script::Unreachable,
        Arc::new(MockChain::with_signer()),
        5,
    );

    let turn = session
        .process_prompt(&format!("privately send 10 to {}", RECIPIENT))
        .await;
    assert_eq!(turn.decision.tool.as_deref(), Some(ids::CONFIDENTIAL_EXECUTE));
    assert_eq!(turn.decision.param_str("value"), Some("10"));
}

#[tokio::test]
async fn test_llm_timeout_yields_error_decision() {
    let session = session_with(Script::Hang, Arc::new(MockChain::with_signer()), 1);

    let turn = session.process_prompt("what is my balance?").await;
    assert!(turn.decision.is_error());
    assert!(turn.decision.tool.is_none());

    // The routing log entry ends Reverted
    let entries = session.log().list();
    assert_eq!(entries[0].status, LogStatus::Reverted);
}

// ============= Session / log behavior =============

#[tokio::test]
async fn test_routing_and_execution_get_separate_log_entries() {
    let reply = format!(
        r#"{{"thought":"sending funds","tool":"send_transaction","params":{{"to":"{}","amount":"5"}},"explanation":"Sending."}}"#,
        RECIPIENT
    );
    let session = session_with(Script::Reply(reply), Arc::new(MockChain::with_signer()), 5);

    let turn = session.process_prompt("send 5 to my friend").await;
    let result = session.execute_approved(&turn.decision, false).await.unwrap();
    assert!(result.contains("0xpublichash"));

    let entries = session.log().list();
    assert_eq!(entries.len(), 2);
    // Newest first: execution entry, then the routing entry
    assert_eq!(entries[0].action, "SEND TRANSACTION");
    assert_eq!(entries[0].amount, "5");
    assert_eq!(entries[0].status, LogStatus::Success);
    assert_eq!(entries[0].phases.len(), 1);
    assert_eq!(entries[0].phases[0].title, "SETTLED");
    assert_eq!(entries[1].action, "THINKING");
    assert_eq!(entries[1].status, LogStatus::Success);
}

#[tokio::test]
async fn test_failed_execution_reverts_its_entry() {
    let reply = format!(
        r#"{{"thought":"sending funds","tool":"send_transaction","params":{{"to":"{}","amount":"5"}},"explanation":"Sending."}}"#,
        RECIPIENT
    );
    // No wallet connected: routing succeeds, execution fails
    let session = session_with(Script::Reply(reply), Arc::new(MockChain::default()), 5);

    let turn = session.process_prompt("send 5 to my friend").await;
    let err = session.execute_approved(&turn.decision, false).await.unwrap_err();
    assert!(matches!(err, ExecError::WalletNotConnected { .. }));

    let entries = session.log().list();
    assert_eq!(entries[0].status, LogStatus::Reverted);
    assert!(session.last_error().unwrap().contains("Wallet not connected"));
}

#[tokio::test]
async fn test_decision_without_tool_returns_explanation() {
    let session = session_with(
        Script::Reply(
            r#"{"thought":"just a question","tool":null,"params":{},"explanation":"SHM is Shardeum's native token."}"#
                .to_string(),
        ),
        Arc::new(MockChain::with_signer()),
        5,
    );

    let turn = session.process_prompt("what is SHM?").await;
    let result = session.execute_approved(&turn.decision, false).await.unwrap();
    assert_eq!(result, "SHM is Shardeum's native token.");
    // No execution entry for a no-tool decision
    assert_eq!(session.log().list().len(), 1);
}

#[tokio::test]
async fn test_overlapping_prompts_are_rejected() {
    let session = Arc::new(session_with(
        Script::Hang,
        Arc::new(MockChain::with_signer()),
        2,
    ));

    let busy = session.clone();
    let first = tokio::spawn(async move { busy.process_prompt("first prompt").await });
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let second = session.process_prompt("second prompt").await;
    assert!(second.decision.is_error());
    assert!(second
        .decision
        .error
        .as_deref()
        .unwrap()
        .contains("busy"));
    assert!(second.log_id.is_none());

    // The first prompt still completes (here: with a timeout decision)
    let first = first.await.unwrap();
    assert!(first.log_id.is_some());
}
