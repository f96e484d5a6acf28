use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Datelike;
use clap::Parser;
use common::Config;
use database::Database;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transactions::{TransactionController, TransactionRepository, handler::transactions_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // 2. Initialize Logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 3. Load Config from CLI args
    let config = Config::parse();

    // 4. Initialize Database; the single handle is owned here and passed down
    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    let repo = TransactionRepository::new(db.clone()).with_timeout(config.store_timeout());
    let controller = Arc::new(TransactionController::start(repo).await?);

    let ledger = controller.ledger().await;
    tracing::info!(
        "Loaded {} income and {} expense transactions",
        ledger.income.len(),
        ledger.expense.len()
    );

    // 5. Routing
    let app = Router::new()
        .route("/", get(root_redirect))
        .nest("/api", transactions_router(controller))
        .layer(TraceLayer::new_for_http());

    // 6. Start Server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Database closed");
    Ok(())
}

async fn root_redirect() -> Response {
    let now = chrono::Local::now();
    Redirect::to(&format!("/api/summary?month={}&year={}", now.month(), now.year())).into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
