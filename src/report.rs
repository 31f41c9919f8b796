//! Period aggregation: filtering, monthly totals and flattened report views.
//!
//! The same flattened rows feed both the CSV export and the analysis input,
//! so what a user downloads is exactly what the model gets to comment on.

use crate::error::Result;
use crate::model::Expense;
use crate::money::cents_to_display;
use crate::period::{month_key_of, DateRange};
use chrono::NaiveDate;
use serde::Serialize;

/// Byte-order mark prepended to exports so spreadsheet apps pick up UTF-8
/// accents correctly.
const UTF8_BOM: &str = "\u{feff}";

const CSV_HEADER: [&str; 4] = ["Date", "Amount", "Description", "PaymentMethod"];

/// Keeps the expenses falling inside the half-open range, ascending by date.
/// Ties are broken by id so the ordering is deterministic regardless of the
/// order the store returned them in.
pub fn filter_by_range(expenses: &[Expense], range: &DateRange) -> Vec<Expense> {
    let mut selected: Vec<Expense> = expenses
        .iter()
        .filter(|e| range.contains(e.date))
        .cloned()
        .collect();
    selected.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    selected
}

/// Sum of `amount_cents` over the expenses dated inside the given `YYYY-MM`
/// bucket.
pub fn monthly_total(expenses: &[Expense], month_key: &str) -> i64 {
    expenses
        .iter()
        .filter(|e| month_key_of(e.date) == month_key)
        .map(|e| e.amount_cents)
        .sum()
}

/// One flattened report line. Short serialized keys keep the analysis payload
/// small.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// `DD/MM/YYYY`
    pub date: String,
    pub amount: String,
    pub desc: String,
    pub method: String,
}

pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Flattens expenses into report rows. Input order is preserved; callers are
/// expected to pass the output of [`filter_by_range`].
pub fn to_report_rows(expenses: &[Expense]) -> Vec<ReportRow> {
    expenses
        .iter()
        .map(|e| ReportRow {
            date: format_display_date(e.date),
            amount: cents_to_display(e.amount_cents),
            desc: e.description.clone(),
            method: e.payment_method.clone(),
        })
        .collect()
}

/// Renders rows as a semicolon-delimited CSV document with a UTF-8 BOM.
/// Zero rows still produce the header line.
pub fn render_csv(rows: &[ReportRow]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.write_record([&row.date, &row.amount, &row.desc, &row.method])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let body = String::from_utf8(bytes).map_err(|e| std::io::Error::other(e.to_string()))?;

    Ok(format!("{}{}", UTF8_BOM, body))
}

/// Serializes rows as the compact JSON document handed to the analysis model.
/// Bit-reproducible from the same stored data.
pub fn to_compact_json(rows: &[ReportRow]) -> Result<String> {
    Ok(serde_json::to_string(rows)?)
}
