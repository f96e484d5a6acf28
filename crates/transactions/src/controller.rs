use crate::filter::{Filter, Summary, total};
use crate::models::{NewTransaction, Transaction, TransactionType};
use crate::repository::{TransactionError, TransactionRepository};
use crate::selection::Selection;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// In-memory copy of both transaction lists, rebuilt from the store after every change.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Ledger {
    pub income: Vec<Transaction>,
    pub expense: Vec<Transaction>,
}

impl Ledger {
    pub fn list(&self, kind: TransactionType) -> &[Transaction] {
        match kind {
            TransactionType::Income => &self.income,
            TransactionType::Expense => &self.expense,
        }
    }

    pub fn summary(&self, filter: &Filter) -> Summary {
        Summary::of(&self.income, &self.expense, filter)
    }
}

/// Owns the income/expense snapshots and funnels every change through the repository.
///
/// Mutations and reloads take turns on a single queue, so they reach the store in
/// the order they were issued and a reload never installs state older than one
/// that finished before it. Readers get the latest installed snapshot, which can
/// lag behind a mutation that is still in flight.
pub struct TransactionController {
    repo: TransactionRepository,
    ledger: RwLock<Arc<Ledger>>,
    queue: Mutex<()>,
}

impl TransactionController {
    /// Creates a controller with empty lists. Call [`load`](Self::load) before use,
    /// or use [`start`](Self::start).
    pub fn new(repo: TransactionRepository) -> Self {
        Self {
            repo,
            ledger: RwLock::new(Arc::new(Ledger::default())),
            queue: Mutex::new(()),
        }
    }

    pub async fn start(repo: TransactionRepository) -> Result<Self, TransactionError> {
        let controller = Self::new(repo);
        controller.load().await?;
        Ok(controller)
    }

    pub async fn ledger(&self) -> Arc<Ledger> {
        self.ledger.read().await.clone()
    }

    /// Replaces both lists with what the store holds now. On failure the previous
    /// lists stay in place.
    pub async fn load(&self) -> Result<Arc<Ledger>, TransactionError> {
        let _turn = self.queue.lock().await;
        self.reload().await
    }

    pub async fn add(&self, new: NewTransaction) -> Result<Transaction, TransactionError> {
        let pending = new.into_transaction();
        pending.check().map_err(TransactionError::InvalidInput)?;

        let saved = self.apply(self.repo.add_transaction(&pending)).await?;
        tracing::info!("Added {} transaction {}", saved.kind, saved.id);
        Ok(saved)
    }

    pub async fn update(&self, transaction: Transaction) -> Result<Transaction, TransactionError> {
        transaction.check().map_err(TransactionError::InvalidInput)?;

        self.apply(self.repo.update_transaction(&transaction)).await?;
        tracing::info!("Updated transaction {}", transaction.id);
        Ok(transaction)
    }

    pub async fn delete(&self, transaction: &Transaction) -> Result<(), TransactionError> {
        self.delete_by_id(transaction.id).await
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), TransactionError> {
        self.apply(self.repo.delete_by_id(id)).await?;
        tracing::info!("Deleted transaction {}", id);
        Ok(())
    }

    /// Deletes every selected transaction in one step and reloads once.
    pub async fn delete_selected(&self, selection: &Selection) -> Result<usize, TransactionError> {
        if selection.is_empty() {
            return Ok(0);
        }
        let ids: Vec<i64> = selection.ids().collect();

        let deleted = self.apply(self.repo.delete_many(&ids)).await?;
        tracing::info!("Deleted {} selected transactions", deleted);
        Ok(deleted)
    }

    /// Removes every transaction of `kind`.
    pub async fn clear(&self, kind: TransactionType) -> Result<u64, TransactionError> {
        let removed = self.apply(self.repo.clear_transactions(kind)).await?;
        tracing::info!("Cleared {} {} transactions", removed, kind);
        Ok(removed)
    }

    /// Reads one transaction straight from the store.
    pub async fn get(&self, id: i64) -> Result<Transaction, TransactionError> {
        self.repo.get_transaction(id).await
    }

    /// Filtered view of one list from the current snapshot, with its total.
    pub async fn list(&self, kind: TransactionType, filter: &Filter) -> (Vec<Transaction>, f64) {
        let ledger = self.ledger().await;
        let transactions = filter.apply(ledger.list(kind));
        let sum = total(&transactions);
        (transactions, sum)
    }

    pub async fn summary(&self, filter: &Filter) -> Summary {
        self.ledger().await.summary(filter)
    }

    /// Runs one store mutation on the queue, then reloads. A failed mutation
    /// (including one that timed out in the repository) leaves the lists untouched.
    async fn apply<T, F>(&self, op: F) -> Result<T, TransactionError>
    where
        F: Future<Output = Result<T, TransactionError>>,
    {
        let _turn = self.queue.lock().await;

        let value = op.await.map_err(|e| {
            tracing::error!("Store mutation failed: {}", e);
            e
        })?;

        self.reload()
            .await
            .map_err(|e| TransactionError::Stale(e.to_string()))?;
        Ok(value)
    }

    async fn reload(&self) -> Result<Arc<Ledger>, TransactionError> {
        let fetched = async {
            let income = self.repo.get_income_transactions().await?;
            let expense = self.repo.get_expense_transactions().await?;
            Ok::<_, TransactionError>(Ledger { income, expense })
        }
        .await;

        match fetched {
            Ok(ledger) => {
                let ledger = Arc::new(ledger);
                *self.ledger.write().await = ledger.clone();
                tracing::debug!(
                    "Loaded {} income and {} expense transactions",
                    ledger.income.len(),
                    ledger.expense.len()
                );
                Ok(ledger)
            }
            Err(e) => {
                tracing::error!("Reloading transactions failed, keeping previous lists: {}", e);
                Err(e)
            }
        }
    }
}
