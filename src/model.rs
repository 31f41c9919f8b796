use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel used when the speaker never mentioned how they paid.
pub const PAYMENT_METHOD_UNKNOWN: &str = "Not informed";

/// A persisted expense. Created exactly once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: String,
    /// Whole minor-currency units. Never floating point.
    pub amount_cents: i64,
    pub description: String,
    pub payment_method: String,
    /// Calendar date of the expense; no time-of-day semantics.
    pub date: NaiveDate,
    /// Original utterance, kept for auditing the extraction step.
    pub raw_text: Option<String>,
}

/// The shape the extraction model is asked to return, decoded strictly at the
/// collaborator boundary. Nothing here persists until it passes validation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CandidateExpense {
    #[schemars(
        description = "Amount in integer cents, e.g. 18,70 becomes 1870. Null when no amount was found."
    )]
    pub amount_cents: Option<i64>,

    #[schemars(
        description = "What was bought, with merchant or context when available, e.g. \"Handbag at Shein\". \"No description\" when nothing was said."
    )]
    pub description: String,

    #[schemars(description = "Purchase date in YYYY-MM-DD. Today's date when no date was spoken.")]
    pub date: String,

    #[schemars(
        description = "How it was paid: Credit, Debit, Pix, Cash, etc. Omit when not mentioned."
    )]
    pub payment_method: Option<String>,
}

/// A candidate that passed validation and is bound to its owner. This is the
/// only input the store accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub user_id: String,
    pub amount_cents: i64,
    pub description: String,
    pub payment_method: String,
    pub date: NaiveDate,
    pub raw_text: Option<String>,
}
