use async_trait::async_trait;
use chrono::NaiveDate;
use despesa::model::{CandidateExpense, NewExpense};
use despesa::period::{reference_date, resolve_range, DEFAULT_TIME_ZONE};
use despesa::pipeline::{
    AnalysisOutcome, ExpenseParser, ExpenseTracker, SpendingAnalyst, EMPTY_PERIOD_MESSAGE,
};
use despesa::store::{ExpenseStore, MemoryStore};
use despesa::{parse_amount_from_text, ExpenseTrackerError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const USER: &str = "550e8400-e29b-41d4-a716-446655440000";
const OTHER_USER: &str = "650e8400-e29b-41d4-a716-446655440111";

/// Deterministic stand-in for the extraction model: amount from the fallback
/// token parser, date from the reference date, description from the text.
struct StubParser {
    fixed: Option<CandidateExpense>,
    fail: bool,
}

impl StubParser {
    fn new() -> Self {
        Self {
            fixed: None,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fixed: None,
            fail: true,
        }
    }

    fn returning(candidate: CandidateExpense) -> Self {
        Self {
            fixed: Some(candidate),
            fail: false,
        }
    }
}

#[async_trait]
impl ExpenseParser for StubParser {
    async fn parse(&self, text: &str, reference_date: NaiveDate) -> Option<CandidateExpense> {
        if self.fail {
            return None;
        }
        if let Some(fixed) = &self.fixed {
            return Some(fixed.clone());
        }
        Some(CandidateExpense {
            amount_cents: parse_amount_from_text(text),
            description: text.to_string(),
            date: reference_date.format("%Y-%m-%d").to_string(),
            payment_method: None,
        })
    }
}

/// Records whether it was invoked and what payload it saw, then streams two
/// fixed chunks.
struct StubAnalyst {
    called: AtomicBool,
    last_payload: Mutex<Option<String>>,
}

impl StubAnalyst {
    fn new() -> Self {
        Self {
            called: AtomicBool::new(false),
            last_payload: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SpendingAnalyst for StubAnalyst {
    async fn analyze(&self, report_json: String) -> mpsc::Receiver<String> {
        self.called.store(true, Ordering::SeqCst);
        *self.last_payload.lock().unwrap() = Some(report_json);

        let (tx, rx) = mpsc::channel(8);
        tx.try_send("You spent ".to_string()).unwrap();
        tx.try_send("wisely this month.".to_string()).unwrap();
        rx
    }
}

fn tracker_with(
    store: Arc<MemoryStore>,
    parser: StubParser,
    analyst: Arc<StubAnalyst>,
) -> ExpenseTracker {
    ExpenseTracker::new(store, Arc::new(parser), analyst)
}

fn seed(user_id: &str, cents: i64, date: (i32, u32, u32), description: &str) -> NewExpense {
    NewExpense {
        user_id: user_id.to_string(),
        amount_cents: cents,
        description: description.to_string(),
        payment_method: "Pix".to_string(),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        raw_text: None,
    }
}

#[tokio::test]
async fn test_record_pipeline_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    let tracker = tracker_with(store.clone(), StubParser::new(), Arc::new(StubAnalyst::new()));

    let recorded = tracker
        .record(USER, "  mercado 45,90  ", DEFAULT_TIME_ZONE)
        .await
        .unwrap();

    assert_eq!(recorded.event.amount_cents, 4590);
    assert_eq!(recorded.event.amount_display, "45,90");
    assert_eq!(recorded.event.description, "mercado 45,90");
    assert_eq!(recorded.event.payment_method, "Not informed");
    assert_eq!(recorded.monthly_total_display, "45,90");

    // A second expense in the same month accumulates in the readback.
    let recorded = tracker
        .record(USER, "padaria 10", DEFAULT_TIME_ZONE)
        .await
        .unwrap();
    assert_eq!(recorded.monthly_total_display, "55,90");

    let stored = store.find_all_for_user(USER).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].raw_text.as_deref(), Some("mercado 45,90"));
}

#[tokio::test]
async fn test_record_rejects_empty_text() {
    let tracker = tracker_with(
        Arc::new(MemoryStore::new()),
        StubParser::new(),
        Arc::new(StubAnalyst::new()),
    );

    let err = tracker.record(USER, "   ", DEFAULT_TIME_ZONE).await;
    assert!(matches!(err, Err(ExpenseTrackerError::EmptyText)));
}

#[tokio::test]
async fn test_extraction_failure_is_user_actionable() {
    let store = Arc::new(MemoryStore::new());
    let tracker = tracker_with(store.clone(), StubParser::failing(), Arc::new(StubAnalyst::new()));

    let err = tracker
        .record(USER, "something unintelligible", DEFAULT_TIME_ZONE)
        .await;
    assert!(matches!(err, Err(ExpenseTrackerError::ExtractionFailed)));

    // Soft failure must not leave a partial record behind.
    assert!(store.find_all_for_user(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_candidate_never_persists() {
    let store = Arc::new(MemoryStore::new());
    let bad_candidate = CandidateExpense {
        amount_cents: Some(-5),
        description: "".to_string(),
        date: "2025-06-15".to_string(),
        payment_method: None,
    };
    let tracker = tracker_with(
        store.clone(),
        StubParser::returning(bad_candidate),
        Arc::new(StubAnalyst::new()),
    );

    let err = tracker.record(USER, "whatever", DEFAULT_TIME_ZONE).await;
    match err {
        Err(ExpenseTrackerError::Validation(report)) => {
            assert_eq!(report.fields(), vec!["amount_cents", "description"]);
        }
        other => panic!("expected validation rejection, got {:?}", other),
    }

    assert!(store.find_all_for_user(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_export_csv_orders_and_filters() {
    let store = Arc::new(MemoryStore::new());
    store.create(seed(USER, 999, (2025, 7, 1), "July rent")).await.unwrap();
    store.create(seed(USER, 500, (2025, 6, 15), "Groceries")).await.unwrap();
    store.create(seed(USER, 1000, (2025, 6, 1), "Internet")).await.unwrap();
    store.create(seed(USER, 123, (2025, 5, 31), "May coffee")).await.unwrap();
    store.create(seed(OTHER_USER, 7777, (2025, 6, 10), "Not mine")).await.unwrap();

    let tracker = tracker_with(store, StubParser::new(), Arc::new(StubAnalyst::new()));

    let csv = tracker.export_csv(USER, "2025-06", None).await.unwrap();
    assert!(csv.starts_with('\u{feff}'));

    let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();
    assert_eq!(
        lines,
        vec![
            "Date;Amount;Description;PaymentMethod",
            "01/06/2025;10,00;Internet;Pix",
            "15/06/2025;5,00;Groceries;Pix",
        ]
    );
}

#[tokio::test]
async fn test_export_half_open_boundaries() {
    let store = Arc::new(MemoryStore::new());
    store.create(seed(USER, 100, (2025, 3, 1), "On start")).await.unwrap();
    store.create(seed(USER, 200, (2025, 5, 31), "Last inside")).await.unwrap();
    store.create(seed(USER, 300, (2025, 6, 1), "On end")).await.unwrap();

    let tracker = tracker_with(store, StubParser::new(), Arc::new(StubAnalyst::new()));
    let csv = tracker.export_csv(USER, "2025-03", Some("2025-05")).await.unwrap();

    assert!(csv.contains("On start"));
    assert!(csv.contains("Last inside"));
    assert!(!csv.contains("On end"));
}

#[tokio::test]
async fn test_export_rejects_bad_month() {
    let tracker = tracker_with(
        Arc::new(MemoryStore::new()),
        StubParser::new(),
        Arc::new(StubAnalyst::new()),
    );

    let err = tracker.export_csv(USER, "June 2025", None).await;
    assert!(matches!(err, Err(ExpenseTrackerError::InvalidMonth(_))));
}

#[tokio::test]
async fn test_empty_export_is_header_only() {
    let tracker = tracker_with(
        Arc::new(MemoryStore::new()),
        StubParser::new(),
        Arc::new(StubAnalyst::new()),
    );

    let csv = tracker.export_csv(USER, "2025-06", None).await.unwrap();
    assert_eq!(csv, "\u{feff}Date;Amount;Description;PaymentMethod\n");
}

#[tokio::test]
async fn test_analyze_empty_period_skips_the_model() {
    let analyst = Arc::new(StubAnalyst::new());
    let tracker = tracker_with(Arc::new(MemoryStore::new()), StubParser::new(), analyst.clone());

    let outcome = tracker.analyze(USER, "2025-06", None).await.unwrap();
    assert!(matches!(outcome, AnalysisOutcome::EmptyPeriod));
    assert!(!analyst.called.load(Ordering::SeqCst));
    assert!(!EMPTY_PERIOD_MESSAGE.is_empty());
}

#[tokio::test]
async fn test_analyze_streams_over_flattened_report() {
    let store = Arc::new(MemoryStore::new());
    store.create(seed(USER, 1870, (2025, 6, 5), "Bakery")).await.unwrap();

    let analyst = Arc::new(StubAnalyst::new());
    let tracker = tracker_with(store, StubParser::new(), analyst.clone());

    let outcome = tracker.analyze(USER, "2025-06", None).await.unwrap();
    let mut receiver = match outcome {
        AnalysisOutcome::Stream(receiver) => receiver,
        AnalysisOutcome::EmptyPeriod => panic!("expected a stream"),
    };

    let mut collected = String::new();
    while let Some(chunk) = receiver.recv().await {
        collected.push_str(&chunk);
    }
    assert_eq!(collected, "You spent wisely this month.");

    // The analyst input is the same flattening the export uses.
    let payload = analyst.last_payload.lock().unwrap().clone().unwrap();
    assert_eq!(
        payload,
        r#"[{"date":"05/06/2025","amount":"18,70","desc":"Bakery","method":"Pix"}]"#
    );
}

#[tokio::test]
async fn test_reversed_range_yields_empty_report() {
    let store = Arc::new(MemoryStore::new());
    store.create(seed(USER, 100, (2025, 4, 10), "April")).await.unwrap();

    let tracker = tracker_with(store, StubParser::new(), Arc::new(StubAnalyst::new()));

    let csv = tracker.export_csv(USER, "2025-05", Some("2025-03")).await.unwrap();
    assert_eq!(csv, "\u{feff}Date;Amount;Description;PaymentMethod\n");

    let outcome = tracker.analyze(USER, "2025-05", Some("2025-03")).await.unwrap();
    assert!(matches!(outcome, AnalysisOutcome::EmptyPeriod));
}

#[test]
fn test_month_keys_match_resolved_range() {
    let range = resolve_range("2025-03", Some("2025-05")).unwrap();
    assert_eq!(range.month_keys(), vec!["2025-03", "2025-04", "2025-05"]);

    let december = resolve_range("2025-12", None).unwrap();
    assert_eq!(december.month_keys(), vec!["2025-12"]);
    assert_eq!(
        december.end,
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    );
}

#[test]
fn test_reference_date_is_zone_sensitive() {
    // Both calls happen "now"; the dates can differ by at most one day and
    // must both be valid calendar dates.
    let sao_paulo = reference_date(DEFAULT_TIME_ZONE);
    let tokyo = reference_date(chrono_tz::Asia::Tokyo);
    let gap = (tokyo - sao_paulo).num_days().abs();
    assert!(gap <= 1);
}
