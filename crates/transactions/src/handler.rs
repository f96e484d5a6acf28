use crate::controller::TransactionController;
use crate::filter::{Filter, Period, Summary};
use crate::models::{
    DeleteSelectedRequest, NewTransaction, RawTransactionRequest, Transaction, TransactionType,
};
use crate::repository::TransactionError;
use crate::selection::Selection;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for TransactionError {
    fn into_response(self) -> Response {
        let error = |msg: &str| json!({ "error": msg });

        let (status, body) = match self {
            TransactionError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, error(&msg)),
            TransactionError::NotFound => (StatusCode::NOT_FOUND, error("Transaction not found")),
            TransactionError::TimedOut => (
                StatusCode::GATEWAY_TIMEOUT,
                error("Storage did not respond in time; nothing was saved"),
            ),
            // The write went through and only the refresh failed, so a retry would duplicate it.
            TransactionError::Stale(_) => (
                StatusCode::ACCEPTED,
                json!({
                    "saved": true,
                    "warning": "Change saved, but the lists could not be refreshed",
                }),
            ),
            TransactionError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error("Internal server error"))
            }
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
pub struct SummaryQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: Period,
    pub month: Option<String>,
    pub year: Option<String>,
}

#[derive(Serialize)]
pub struct TransactionListResponse {
    pub filter: Filter,
    pub transactions: Vec<Transaction>,
    pub total: f64,
}

pub fn transactions_router(controller: Arc<TransactionController>) -> Router {
    Router::new()
        // Specific routes first
        .route("/summary", get(get_summary))
        .route("/delete", post(delete_selected))
        .route("/refresh", post(refresh))
        .route(
            "/transaction/{id}",
            get(get_transaction).put(update_transaction).delete(delete_transaction),
        )
        // Then parameterized routes
        .route("/{kind}", get(list_transactions).post(create_transaction))
        .with_state(controller)
}

async fn get_summary(
    State(controller): State<Arc<TransactionController>>,
    Query(params): Query<SummaryQuery>,
) -> Json<Summary> {
    let year = params.year.unwrap_or_else(|| Local::now().year());
    let filter = Filter::by_month(params.month.unwrap_or(0), year);

    Json(controller.summary(&filter).await)
}

async fn list_transactions(
    State(controller): State<Arc<TransactionController>>,
    Path(kind): Path<TransactionType>,
    Query(params): Query<ListQuery>,
) -> Json<TransactionListResponse> {
    let filter = params.filter.resolve(
        params.month.as_deref(),
        params.year.as_deref(),
        Local::now().date_naive(),
    );
    tracing::info!("Listing {} transactions for {:?}", kind, filter);

    let (mut transactions, total) = controller.list(kind, &filter).await;
    // Newest first
    transactions.reverse();

    Json(TransactionListResponse {
        filter,
        transactions,
        total,
    })
}

async fn create_transaction(
    State(controller): State<Arc<TransactionController>>,
    Path(kind): Path<TransactionType>,
    Json(payload): Json<RawTransactionRequest>,
) -> Result<impl IntoResponse, TransactionError> {
    let amount = payload.amount.parse().map_err(TransactionError::InvalidInput)?;
    let new = NewTransaction::today(&payload.name, amount, kind).map_err(TransactionError::InvalidInput)?;

    let saved = controller.add(new).await.map_err(|e| {
        tracing::error!("create_transaction error: {:?}", e);
        e
    })?;

    Ok((StatusCode::CREATED, Json(saved)))
}

async fn get_transaction(
    State(controller): State<Arc<TransactionController>>,
    Path(id): Path<i64>,
) -> Result<Json<Transaction>, TransactionError> {
    Ok(Json(controller.get(id).await?))
}

async fn update_transaction(
    State(controller): State<Arc<TransactionController>>,
    Path(id): Path<i64>,
    Json(payload): Json<RawTransactionRequest>,
) -> Result<Json<Transaction>, TransactionError> {
    let amount = payload.amount.parse().map_err(TransactionError::InvalidInput)?;
    let current = controller.get(id).await?;
    let updated = current
        .edited(&payload.name, amount)
        .map_err(TransactionError::InvalidInput)?;

    let transaction = controller.update(updated).await.map_err(|e| {
        tracing::error!("update_transaction error: {:?}", e);
        e
    })?;

    Ok(Json(transaction))
}

async fn delete_transaction(
    State(controller): State<Arc<TransactionController>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, TransactionError> {
    controller.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_selected(
    State(controller): State<Arc<TransactionController>>,
    Json(payload): Json<DeleteSelectedRequest>,
) -> Result<impl IntoResponse, TransactionError> {
    let selection: Selection = payload.ids.into_iter().collect();

    let deleted = controller.delete_selected(&selection).await.map_err(|e| {
        tracing::error!("delete_selected error: {:?}", e);
        e
    })?;

    Ok(Json(json!({ "deleted": deleted })))
}

async fn refresh(
    State(controller): State<Arc<TransactionController>>,
) -> Result<impl IntoResponse, TransactionError> {
    let ledger = controller.load().await?;
    Ok(Json(json!({
        "income": ledger.income.len(),
        "expense": ledger.expense.len(),
    })))
}
