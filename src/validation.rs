//! Gate between extraction and persistence.
//!
//! The model's output is untrusted input. Every candidate is re-checked here
//! before it is allowed anywhere near the store, and rejections enumerate the
//! offending fields so callers can report precisely what went wrong.

use crate::model::{CandidateExpense, NewExpense, PAYMENT_METHOD_UNKNOWN};
use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").unwrap())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: String,
}

/// A structured rejection: one issue per failed rule, never an exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<FieldIssue>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.issues.iter().map(|i| i.field).collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .issues
            .iter()
            .map(|i| format!("{}: {}", i.field, i.message))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

/// Validates a candidate and binds it to its owner.
///
/// The payment method is the one lenient field: a missing or blank value is
/// substituted with the "Not informed" sentinel rather than rejected.
pub fn validate(
    candidate: &CandidateExpense,
    user_id: &str,
    raw_text: Option<String>,
) -> Result<NewExpense, ValidationReport> {
    let mut issues = Vec::new();

    let amount_cents = match candidate.amount_cents {
        None => {
            issues.push(FieldIssue {
                field: "amount_cents",
                message: "amount is missing".to_string(),
            });
            0
        }
        Some(cents) if cents < 0 => {
            issues.push(FieldIssue {
                field: "amount_cents",
                message: format!("must be a non-negative integer, got {}", cents),
            });
            0
        }
        Some(cents) => cents,
    };

    let description = candidate.description.trim().to_string();
    if description.is_empty() {
        issues.push(FieldIssue {
            field: "description",
            message: "description is required".to_string(),
        });
    }

    let payment_method = match candidate.payment_method.as_deref().map(str::trim) {
        Some(method) if !method.is_empty() => method.to_string(),
        _ => PAYMENT_METHOD_UNKNOWN.to_string(),
    };

    let mut date = NaiveDate::default();
    if !date_pattern().is_match(&candidate.date) {
        issues.push(FieldIssue {
            field: "date",
            message: format!("'{}' does not match YYYY-MM-DD", candidate.date),
        });
    } else {
        match NaiveDate::parse_from_str(&candidate.date, "%Y-%m-%d") {
            Ok(parsed) => date = parsed,
            Err(_) => issues.push(FieldIssue {
                field: "date",
                message: format!("'{}' is not a real calendar date", candidate.date),
            }),
        }
    }

    if Uuid::parse_str(user_id).is_err() {
        issues.push(FieldIssue {
            field: "user_id",
            message: "not a valid user identifier".to_string(),
        });
    }

    if !issues.is_empty() {
        return Err(ValidationReport { issues });
    }

    Ok(NewExpense {
        user_id: user_id.to_string(),
        amount_cents,
        description,
        payment_method,
        date,
        raw_text,
    })
}
