use crate::llm::client::GeminiClient;
use crate::llm::prompts::extraction_prompt;
use crate::llm::types::Content;
use crate::model::CandidateExpense;
use crate::pipeline::ExpenseParser;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use schemars::schema_for;
use serde_json::Value;

pub const DEFAULT_EXTRACTION_MODEL: &str = "gemini-2.5-flash-lite";

/// Turns a free-form utterance into a [`CandidateExpense`] via one structured
/// extraction call.
///
/// This is a soft-failure component: transport errors, unusable JSON and a
/// missing amount all come back as `None`. The caller owns turning that into
/// a user-facing message.
pub struct ExpenseExtractor {
    client: GeminiClient,
    model: String,
}

impl ExpenseExtractor {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            model: DEFAULT_EXTRACTION_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The response schema sent with the request, derived from the candidate
    /// type and rewritten into the subset Gemini accepts.
    pub(crate) fn response_schema() -> Value {
        let mut schema =
            serde_json::to_value(schema_for!(CandidateExpense)).unwrap_or_else(|_| Value::Null);
        to_gemini_schema(&mut schema);
        schema
    }
}

/// Rewrites a schemars document in place into Gemini's OpenAPI-style schema
/// dialect: no meta keys, and `["T", "null"]` type unions become a single
/// type with `nullable: true`.
fn to_gemini_schema(value: &mut Value) {
    match value {
        Value::Object(obj) => {
            obj.remove("$schema");
            obj.remove("title");
            obj.remove("definitions");
            obj.remove("format");
            obj.remove("additionalProperties");

            let union = obj.get("type").and_then(Value::as_array).cloned();
            if let Some(types) = union {
                let mut concrete: Vec<Value> = types
                    .into_iter()
                    .filter(|t| t.as_str() != Some("null"))
                    .collect();
                if concrete.len() == 1 {
                    obj.insert("type".to_string(), concrete.remove(0));
                    obj.insert("nullable".to_string(), Value::Bool(true));
                }
            }

            for child in obj.values_mut() {
                to_gemini_schema(child);
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                to_gemini_schema(child);
            }
        }
        _ => {}
    }
}

#[async_trait]
impl ExpenseParser for ExpenseExtractor {
    async fn parse(&self, text: &str, reference_date: NaiveDate) -> Option<CandidateExpense> {
        let system_prompt = extraction_prompt(reference_date);
        let messages = vec![Content::user(format!("Sentence: \"{}\"", text))];

        let raw = match self
            .client
            .generate_content(
                &self.model,
                &system_prompt,
                messages,
                Some(Self::response_schema()),
            )
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("extraction call failed: {}", e);
                return None;
            }
        };

        let candidate: CandidateExpense = match serde_json::from_str(&raw) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("extraction returned unusable JSON: {}", e);
                return None;
            }
        };

        if candidate.amount_cents.is_none() {
            warn!("extraction found no amount in utterance");
            return None;
        }

        debug!(
            "extracted candidate: {} cents on {}",
            candidate.amount_cents.unwrap_or_default(),
            candidate.date
        );
        Some(candidate)
    }
}
