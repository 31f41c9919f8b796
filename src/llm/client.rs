use crate::error::{ExpenseTrackerError, Result};
use crate::llm::types::*;
use futures::StreamExt;
use log::{debug, error};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// How long a single-shot generation may take before it is abandoned. The
/// call gates a user-visible HTTP response, so it has to be bounded.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);

const STREAM_CHANNEL_CAPACITY: usize = 32;

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Points the client at a different endpoint, for tests against a local
    /// stand-in server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Single-shot strict-JSON generation. Deterministic sampling; the
    /// response schema, when given, is enforced server-side by the API.
    pub async fn generate_content(
        &self,
        model: &str,
        system_prompt: &str,
        messages: Vec<Content>,
        response_schema: Option<serde_json::Value>,
    ) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: messages,
            system_instruction: Some(Content::user(system_prompt)),
            generation_config: GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema,
                temperature: 0.0,
            },
        };

        let res = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            return Err(ExpenseTrackerError::ExtractionUnavailable(format!(
                "Gemini API error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await?;
        body.first_text().ok_or_else(|| {
            ExpenseTrackerError::ExtractionUnavailable("model returned no text".to_string())
        })
    }

    /// Streaming generation over SSE. Text chunks arrive on the returned
    /// channel as the model produces them; a transport failure mid-stream is
    /// delivered as a final `Err` item. Dropping the receiver stops the
    /// producer and releases the connection.
    pub async fn stream_generate_content(
        &self,
        model: &str,
        system_prompt: &str,
        messages: Vec<Content>,
    ) -> Result<mpsc::Receiver<Result<String>>> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, model, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: messages,
            system_instruction: Some(Content::user(system_prompt)),
            generation_config: GenerationConfig {
                response_mime_type: None,
                response_schema: None,
                temperature: 0.0,
            },
        };

        let res = self.client.post(&url).json(&payload).send().await?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            return Err(ExpenseTrackerError::ExtractionUnavailable(format!(
                "Gemini API error (status {}): {}",
                status, err_text
            )));
        }

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut bytes = res.bytes_stream();
            // Byte buffer: a multi-byte character may straddle two network
            // chunks, so decoding only happens on complete lines.
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(item) = bytes.next().await {
                let chunk = match item {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        error!("SSE transport error: {}", e);
                        let _ = tx.send(Err(ExpenseTrackerError::HttpError(e))).await;
                        return;
                    }
                };

                buffer.extend_from_slice(&chunk);

                while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                    let line = String::from_utf8_lossy(&buffer[..newline])
                        .trim()
                        .to_string();
                    buffer.drain(..=newline);

                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data.is_empty() || data == "[DONE]" {
                        continue;
                    }

                    match serde_json::from_str::<GenerateContentResponse>(data) {
                        Ok(event) => {
                            if let Some(text) = event.first_text() {
                                if tx.send(Ok(text)).await.is_err() {
                                    // Receiver gone: the caller disconnected.
                                    debug!("stream consumer dropped, stopping producer");
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            error!("unparseable SSE event: {}", e);
                            let _ = tx
                                .send(Err(ExpenseTrackerError::SerializationError(e)))
                                .await;
                            return;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}
