//! # Despesa
//!
//! Voice-first expense tracking core: free-form utterances are turned into
//! validated monetary records, persisted, and later bucketed into calendar
//! months for export and narrative analysis.
//!
//! ## Core Concepts
//!
//! - **Cents**: every amount is an integer of minor-currency units; floats
//!   never touch monetary storage.
//! - **Candidate expense**: the unvalidated shape extracted from text by the
//!   model. It only becomes an [`model::Expense`] after validation.
//! - **Month key**: a `YYYY-MM` string naming a calendar-month bucket.
//! - **Half-open range**: reports cover `[start, end)` — the first day of the
//!   starting month up to, excluding, the first day after the ending month.
//!
//! The deterministic core (money, validation, period, report, store,
//! pipeline) builds with no network stack. The `gemini` feature adds the
//! hosted-model collaborators; `server` adds the axum HTTP surface.
//!
//! ## Example
//!
//! ```rust,ignore
//! use despesa::pipeline::ExpenseTracker;
//! use despesa::llm::{ExpenseExtractor, GeminiAnalyst, GeminiClient};
//! use despesa::store::MemoryStore;
//! use std::sync::Arc;
//!
//! let client = GeminiClient::new(std::env::var("GEMINI_API_KEY")?);
//! let tracker = ExpenseTracker::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(ExpenseExtractor::new(client.clone())),
//!     Arc::new(GeminiAnalyst::new(client)),
//! );
//!
//! let recorded = tracker
//!     .record(user_id, "lunch at the bakery 18,70 on pix", despesa::period::DEFAULT_TIME_ZONE)
//!     .await?;
//! println!("this month so far: {}", recorded.monthly_total_display);
//! ```

pub mod error;
pub mod model;
pub mod money;
pub mod period;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod validation;

#[cfg(feature = "gemini")]
pub mod llm;

#[cfg(feature = "server")]
pub mod server;

pub use error::{ExpenseTrackerError, Result};
pub use model::{CandidateExpense, Expense, NewExpense, PAYMENT_METHOD_UNKNOWN};
pub use money::{cents_to_display, parse_amount_from_text};
pub use period::{resolve_range, DateRange, DEFAULT_TIME_ZONE};
pub use pipeline::{AnalysisOutcome, ExpenseParser, ExpenseTracker, SpendingAnalyst};
pub use report::{filter_by_range, monthly_total, render_csv, to_report_rows, ReportRow};
pub use store::{ExpenseStore, MemoryStore, UserIdAliases};
pub use validation::{validate, FieldIssue, ValidationReport};
