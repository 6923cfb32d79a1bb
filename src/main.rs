use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use agentchain::chain::{ChainClient, JsonRpcChain};
use agentchain::confidential::LightningClient;
use agentchain::decision_log::DecisionLog;
use agentchain::executor::{ExecutorSettings, ToolExecutor};
use agentchain::llm::{build_backend, LlmQueue};
use agentchain::oracle::HttpOracle;
use agentchain::registry::ToolRegistry;
use agentchain::router::IntentRouter;
use agentchain::session::AgentSession;
use agentchain::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Setup Logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    dotenvy::dotenv().ok();

    info!("Starting AgentChain...");

    // Load Configuration
    let config = AppConfig::load();
    info!("Loaded Configuration: {:?}", config);

    // Initialize Collaborators
    let registry = Arc::new(ToolRegistry::new());
    let chain: Arc<dyn ChainClient> = Arc::new(JsonRpcChain::new(config.chain.clone()));
    let oracle = Arc::new(HttpOracle::new(config.oracle.clone()));
    let confidential = Arc::new(LightningClient::new(&config.confidential));

    info!(
        "📬 Initializing LLM Queue (backend: {}, max concurrent: {}, size: {})...",
        config.llm.backend, config.llm.max_concurrent, config.llm.queue_size
    );
    let backend = build_backend(&config.llm);
    let llm_queue = LlmQueue::new(backend, config.llm.max_concurrent, config.llm.queue_size);

    let router = IntentRouter::new(llm_queue, registry.clone(), config.llm.timeout_secs);
    let executor = ToolExecutor::new(
        registry.clone(),
        chain.clone(),
        oracle,
        confidential,
        ExecutorSettings {
            explorer_url: config.chain.explorer_url.clone(),
            dapp_address: config.confidential.dapp_address.clone(),
        },
    );
    let log = Arc::new(DecisionLog::open(&config.log.path));

    let session = AgentSession::new(
        router,
        executor,
        registry,
        chain,
        log,
        config.agent_name.clone(),
        config.chain.network_name.clone(),
    );

    let mut simulate = config.simulate_default;
    info!(
        "🤖 [{}] Ready on {} [Simulation Mode: {}]",
        config.agent_name, config.chain.network_name, simulate
    );

    run_repl(&session, &mut simulate).await?;
    Ok(())
}

/// Line-oriented operator loop: prompts route to a plan, and nothing
/// executes until the operator approves it.
async fn run_repl(
    session: &AgentSession,
    simulate: &mut bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("Commands: /log /clear /live /simulate /quit — anything else is routed.");
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "/quit" | "/exit" => break,
            "/log" => {
                for entry in session.log().list() {
                    println!(
                        "#{} [{}] {} {} — {:?}",
                        entry.id, entry.time, entry.action, entry.amount, entry.status
                    );
                    for line in &entry.console {
                        println!("    {}", line);
                    }
                }
            }
            "/clear" => {
                session.log().clear();
                println!("Activity log cleared.");
            }
            "/live" => {
                *simulate = false;
                println!("Simulation mode OFF: approved transactions will move funds.");
            }
            "/simulate" => {
                *simulate = true;
                println!("Simulation mode ON.");
            }
            prompt => {
                let turn = session.process_prompt(prompt).await;
                let decision = &turn.decision;

                if let Some(error) = &decision.error {
                    println!("Routing failed: {}", error);
                } else if decision.tool.is_none() {
                    println!("{}", decision.explanation);
                } else {
                    println!("Thought: {}", decision.thought);
                    println!(
                        "Plan: {} {}",
                        decision.tool.as_deref().unwrap_or("none"),
                        serde_json::to_string(&decision.params).unwrap_or_default()
                    );
                    println!("{}", decision.explanation);
                    stdout
                        .write_all(b"Approve? [y]es / [s]imulate once / [n]o: ")
                        .await?;
                    stdout.flush().await?;

                    if let Some(answer) = lines.next_line().await? {
                        let answer = answer.trim().to_lowercase();
                        let run = match answer.as_str() {
                            "y" | "yes" => Some(*simulate),
                            "s" | "sim" => Some(true),
                            _ => None,
                        };
                        match run {
                            None => println!("Skipped."),
                            Some(simulate_once) => {
                                match session.execute_approved(decision, simulate_once).await {
                                    Ok(result) => println!("{}", result),
                                    Err(e) => println!("Execution failed: {}", e),
                                }
                            }
                        }
                    }
                }
            }
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    Ok(())
}
