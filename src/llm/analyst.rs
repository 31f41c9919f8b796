use crate::llm::client::GeminiClient;
use crate::llm::prompts::{analysis_request, ANALYST_PERSONA};
use crate::llm::types::Content;
use crate::pipeline::SpendingAnalyst;
use async_trait::async_trait;
use log::error;
use tokio::sync::mpsc;

pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.5-flash-lite";

/// Appended after whatever partial output already went out when the stream
/// dies mid-flight. Partial commentary beats a blank screen.
pub const ANALYSIS_INTERRUPTED_NOTICE: &str = "\n\n[analysis interrupted]";

/// Streams a narrative spending commentary for a flattened report.
pub struct GeminiAnalyst {
    client: GeminiClient,
    model: String,
}

impl GeminiAnalyst {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_ANALYSIS_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl SpendingAnalyst for GeminiAnalyst {
    async fn analyze(&self, report_json: String) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(32);

        let client = self.client.clone();
        let model = self.model.clone();

        tokio::spawn(async move {
            let messages = vec![Content::user(analysis_request(&report_json))];

            let mut chunks = match client
                .stream_generate_content(&model, ANALYST_PERSONA, messages)
                .await
            {
                Ok(chunks) => chunks,
                Err(e) => {
                    error!("analysis request failed: {}", e);
                    let _ = tx.send(ANALYSIS_INTERRUPTED_NOTICE.to_string()).await;
                    return;
                }
            };

            while let Some(item) = chunks.recv().await {
                match item {
                    Ok(text) => {
                        if tx.send(text).await.is_err() {
                            // Consumer disconnected; dropping `chunks` stops
                            // the upstream producer too.
                            return;
                        }
                    }
                    Err(e) => {
                        error!("analysis stream broke: {}", e);
                        let _ = tx.send(ANALYSIS_INTERRUPTED_NOTICE.to_string()).await;
                        return;
                    }
                }
            }
        });

        rx
    }
}
