use despesa::llm::{ExpenseExtractor, GeminiAnalyst, GeminiClient};
use despesa::pipeline::ExpenseTracker;
use despesa::server::{router, AppState};
use despesa::store::{MemoryStore, UserIdAliases};
use log::info;
use std::collections::HashMap;
use std::sync::Arc;

/// Parses `DESPESA_USER_ALIASES`, a comma-separated list of `legacy=current`
/// pairs migrating old user ids onto their current ones.
fn aliases_from_env() -> UserIdAliases {
    let raw = std::env::var("DESPESA_USER_ALIASES").unwrap_or_default();
    let pairs: HashMap<String, String> = raw
        .split(',')
        .filter_map(|pair| {
            let (legacy, current) = pair.split_once('=')?;
            Some((legacy.trim().to_string(), current.trim().to_string()))
        })
        .collect();
    UserIdAliases::new(pairs)
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let api_key = match std::env::var("GEMINI_API_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("GEMINI_API_KEY is not set");
            std::process::exit(1);
        }
    };

    let client = GeminiClient::new(api_key);
    let tracker = ExpenseTracker::new(
        Arc::new(MemoryStore::new()),
        Arc::new(ExpenseExtractor::new(client.clone())),
        Arc::new(GeminiAnalyst::new(client)),
    );

    let state = AppState {
        tracker: Arc::new(tracker),
        aliases: Arc::new(aliases_from_env()),
    };

    let addr = std::env::var("DESPESA_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    info!("listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .expect("server error");
}
