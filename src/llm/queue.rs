use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::info;

use crate::error::LlmError;

use super::ChatBackend;

/// A request waiting for LLM processing
struct QueuedRequest {
    system_prompt: String,
    user_input: String,
    response_tx: oneshot::Sender<Result<String, LlmError>>,
}

/// Bounded queue in front of the chat backend. Routing calls are serialized
/// up to `max_concurrent` (normally 1) so overlapping prompts queue instead
/// of interleaving.
#[derive(Clone)]
pub struct LlmQueue {
    tx: mpsc::Sender<QueuedRequest>,
}

impl LlmQueue {
    pub fn new(backend: Arc<dyn ChatBackend>, max_concurrent: usize, queue_size: usize) -> Self {
        let (tx, rx) = mpsc::channel::<QueuedRequest>(queue_size);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        tokio::spawn(Self::process_queue(backend, semaphore, rx));

        Self { tx }
    }

    async fn process_queue(
        backend: Arc<dyn ChatBackend>,
        semaphore: Arc<Semaphore>,
        mut rx: mpsc::Receiver<QueuedRequest>,
    ) {
        info!(
            "📬 [QUEUE] LLM queue processor started (backend: {}, max concurrent: {})",
            backend.name(),
            semaphore.available_permits()
        );

        while let Some(request) = rx.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    let _ = request
                        .response_tx
                        .send(Err(LlmError::Queue("semaphore closed".to_string())));
                    continue;
                }
            };

            let backend = backend.clone();
            tokio::spawn(async move {
                let result = backend
                    .generate(&request.system_prompt, &request.user_input)
                    .await;
                let _ = request.response_tx.send(result);
                drop(permit);
            });
        }

        info!("📬 [QUEUE] Channel closed, shutting down");
    }

    pub async fn chat(&self, system_prompt: &str, user_input: &str) -> Result<String, LlmError> {
        let (response_tx, response_rx) = oneshot::channel();

        let request = QueuedRequest {
            system_prompt: system_prompt.to_string(),
            user_input: user_input.to_string(),
            response_tx,
        };

        if self.tx.send(request).await.is_err() {
            return Err(LlmError::Queue("failed to queue LLM request".to_string()));
        }

        match response_rx.await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Queue("LLM request was cancelled".to_string())),
        }
    }
}
