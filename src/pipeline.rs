//! Request-level orchestration: record, export, analyze.
//!
//! The tracker wires the deterministic core to its three collaborators (the
//! store and the two model seams). Each request works on its own data; there
//! is no shared mutable state here beyond what the store guards itself.

use crate::error::{ExpenseTrackerError, Result};
use crate::model::{CandidateExpense, Expense};
use crate::money::cents_to_display;
use crate::period::{month_key_of, reference_date, resolve_range};
use crate::report::{
    filter_by_range, format_display_date, monthly_total, render_csv, to_compact_json,
    to_report_rows,
};
use crate::store::ExpenseStore;
use crate::validation::validate;
use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use uuid::Uuid;

/// Shown instead of invoking the analyst when a period has no expenses.
pub const EMPTY_PERIOD_MESSAGE: &str =
    "You have no recorded expenses in this period to analyze. At least you spent nothing! 🎉";

/// Extraction-model seam. Implementations must never fail hard: any model or
/// transport problem is reported as `None` and the caller turns that into a
/// user-facing error.
#[async_trait]
pub trait ExpenseParser: Send + Sync {
    async fn parse(&self, text: &str, reference_date: NaiveDate) -> Option<CandidateExpense>;
}

/// Summary-model seam. The returned channel yields commentary chunks as they
/// arrive; dropping the receiver cancels the producer.
#[async_trait]
pub trait SpendingAnalyst: Send + Sync {
    async fn analyze(&self, report_json: String) -> Receiver<String>;
}

/// The expense as handed back to callers after a successful recording.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseView {
    pub id: Uuid,
    /// `DD/MM/YYYY`
    pub date: String,
    pub amount_cents: i64,
    pub amount_display: String,
    pub description: String,
    pub payment_method: String,
}

impl From<&Expense> for ExpenseView {
    fn from(expense: &Expense) -> Self {
        Self {
            id: expense.id,
            date: format_display_date(expense.date),
            amount_cents: expense.amount_cents,
            amount_display: cents_to_display(expense.amount_cents),
            description: expense.description.clone(),
            payment_method: expense.payment_method.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedExpense {
    pub event: ExpenseView,
    pub monthly_total_display: String,
}

/// Either the fixed empty-period message or a live commentary stream.
pub enum AnalysisOutcome {
    EmptyPeriod,
    Stream(Receiver<String>),
}

pub struct ExpenseTracker {
    store: Arc<dyn ExpenseStore>,
    parser: Arc<dyn ExpenseParser>,
    analyst: Arc<dyn SpendingAnalyst>,
}

impl ExpenseTracker {
    pub fn new(
        store: Arc<dyn ExpenseStore>,
        parser: Arc<dyn ExpenseParser>,
        analyst: Arc<dyn SpendingAnalyst>,
    ) -> Self {
        Self {
            store,
            parser,
            analyst,
        }
    }

    /// Extracts, validates and persists one expense from free-form text, then
    /// reads back the running total for the current month.
    ///
    /// The reference date ("today") is derived from the caller's zone at call
    /// time and is used both as the extraction context and to pick the month
    /// for the total readback, so the two can never disagree.
    pub async fn record(&self, user_id: &str, text: &str, tz: Tz) -> Result<RecordedExpense> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ExpenseTrackerError::EmptyText);
        }

        let today = reference_date(tz);
        debug!("parsing expense text ({} chars), reference date {}", trimmed.len(), today);

        let candidate = self
            .parser
            .parse(trimmed, today)
            .await
            .ok_or(ExpenseTrackerError::ExtractionFailed)?;

        let new_expense = validate(&candidate, user_id, Some(trimmed.to_string()))
            .map_err(|report| {
                warn!("extracted expense rejected: {}", report);
                ExpenseTrackerError::Validation(report)
            })?;

        let saved = self.store.create(new_expense).await?;
        info!(
            "recorded expense {} ({} cents) on {}",
            saved.id, saved.amount_cents, saved.date
        );

        let all = self.store.find_all_for_user(user_id).await?;
        let current_month = month_key_of(today);
        let total = monthly_total(&all, &current_month);

        Ok(RecordedExpense {
            event: ExpenseView::from(&saved),
            monthly_total_display: cents_to_display(total),
        })
    }

    /// Renders the user's expenses for `[from, to]` as a semicolon-delimited
    /// CSV document. An empty period yields a header-only document.
    pub async fn export_csv(
        &self,
        user_id: &str,
        from: &str,
        to: Option<&str>,
    ) -> Result<String> {
        let range = resolve_range(from, to)?;
        let all = self.store.find_all_for_user(user_id).await?;
        let selected = filter_by_range(&all, &range);
        debug!(
            "exporting {} of {} expenses for {}..{}",
            selected.len(),
            all.len(),
            range.start,
            range.end
        );
        render_csv(&to_report_rows(&selected))
    }

    /// Streams a narrative analysis of the user's expenses for `[from, to]`,
    /// or short-circuits with the empty-period message without touching the
    /// model.
    pub async fn analyze(
        &self,
        user_id: &str,
        from: &str,
        to: Option<&str>,
    ) -> Result<AnalysisOutcome> {
        let range = resolve_range(from, to)?;
        let all = self.store.find_all_for_user(user_id).await?;
        let selected = filter_by_range(&all, &range);

        if selected.is_empty() {
            info!("nothing to analyze in {}..{}", range.start, range.end);
            return Ok(AnalysisOutcome::EmptyPeriod);
        }

        let payload = to_compact_json(&to_report_rows(&selected))?;
        let receiver = self.analyst.analyze(payload).await;
        Ok(AnalysisOutcome::Stream(receiver))
    }
}
