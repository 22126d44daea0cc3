use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use millionaire::{
    api,
    bank::InMemoryQuestionBank,
    config::GameConfig,
    phrasebook::Phrasebook,
    state::AppState,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "millionaire=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Millionaire...");

    let config = GameConfig::from_env();
    let rules = config.rules();
    let phrasebook = Phrasebook::from_env();
    tracing::info!(
        "Time limit {} minutes, grand prize {}",
        config.time_limit_minutes,
        rules.prizes.grand_prize()
    );

    let state = match &config.questions_path {
        Some(path) => match InMemoryQuestionBank::from_json_file(path) {
            Ok(bank) => AppState::new(rules, Arc::new(bank), phrasebook),
            Err(e) => {
                tracing::error!("Cannot load questions from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("QUESTIONS_PATH not set, using generated placeholder questions");
            AppState::with_generated_questions(rules, phrasebook)
        }
    };

    if config.state_routes_enabled {
        tracing::warn!("State export/import endpoints are enabled");
    }
    let app = api::router(Arc::new(state), &config);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Cannot bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on http://{}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
