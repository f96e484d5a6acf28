use crate::models::{Transaction, TransactionType};
use crate::store::TransactionStore;
use database::{Database, RepositoryError};
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    Infrastructure(String),
    #[error("Transaction not found")]
    NotFound,
    #[error("Store call timed out")]
    TimedOut,
    #[error("Saved, but refreshing the lists failed: {0}")]
    Stale(String),
}

impl From<RepositoryError> for TransactionError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => TransactionError::NotFound,
            RepositoryError::Infrastructure(e) => TransactionError::Infrastructure(e.to_string()),
            _ => TransactionError::Infrastructure(err.to_string()),
        }
    }
}

/// Domain-level access to stored transactions. Each call runs in its own unit of work.
///
/// The optional timeout covers everything up to the commit. Once a commit has
/// started it runs to completion, so a `TimedOut` result always means nothing was written.
#[derive(Clone)]
pub struct TransactionRepository {
    db: Database,
    timeout: Option<Duration>,
}

impl TransactionRepository {
    pub fn new(db: Database) -> Self {
        Self { db, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Inserts `transaction`, replacing the row with the same id if there is one.
    /// A replacement may not change the stored type.
    #[instrument(skip(self))]
    pub async fn add_transaction(&self, transaction: &Transaction) -> Result<Transaction, TransactionError> {
        let (uow, saved) = self
            .bounded(async {
                let mut uow = self.db.begin().await?;
                let mut store = TransactionStore::new(uow.connection());

                if transaction.is_persisted() {
                    if let Some(existing) = store.find_by_id(transaction.id).await? {
                        ensure_same_kind(&existing, transaction)?;
                    }
                }
                let saved = store.insert(transaction).await?;

                Ok::<_, TransactionError>((uow, saved))
            })
            .await?;

        uow.commit().await?;
        Ok(saved)
    }

    /// Replaces the stored fields of `transaction.id` wholesale, except its type.
    #[instrument(skip(self))]
    pub async fn update_transaction(&self, transaction: &Transaction) -> Result<(), TransactionError> {
        let uow = self
            .bounded(async {
                let mut uow = self.db.begin().await?;
                let mut store = TransactionStore::new(uow.connection());

                let existing = store
                    .find_by_id(transaction.id)
                    .await?
                    .ok_or(TransactionError::NotFound)?;
                ensure_same_kind(&existing, transaction)?;
                store.update(transaction).await?;

                Ok::<_, TransactionError>(uow)
            })
            .await?;

        uow.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_transaction(&self, transaction: &Transaction) -> Result<(), TransactionError> {
        self.delete_by_id(transaction.id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: i64) -> Result<(), TransactionError> {
        let uow = self
            .bounded(async {
                let mut uow = self.db.begin().await?;
                TransactionStore::new(uow.connection()).delete(id).await?;
                Ok::<_, TransactionError>(uow)
            })
            .await?;

        uow.commit().await?;
        Ok(())
    }

    /// Deletes all `ids` or none of them. Repeated ids count once.
    #[instrument(skip(self))]
    pub async fn delete_many(&self, ids: &[i64]) -> Result<usize, TransactionError> {
        let unique: BTreeSet<i64> = ids.iter().copied().collect();

        let uow = self
            .bounded(async {
                let mut uow = self.db.begin().await?;
                let mut store = TransactionStore::new(uow.connection());
                for id in &unique {
                    store.delete(*id).await?;
                }
                Ok::<_, TransactionError>(uow)
            })
            .await?;

        uow.commit().await?;
        Ok(unique.len())
    }

    #[instrument(skip(self))]
    pub async fn get_transaction(&self, id: i64) -> Result<Transaction, TransactionError> {
        self.bounded(async {
            let mut uow = self.db.begin().await?;
            let mut store = TransactionStore::new(uow.connection());

            let transaction = store.find_by_id(id).await?.ok_or(TransactionError::NotFound)?;
            Ok(transaction)
        })
        .await
    }

    pub async fn get_income_transactions(&self) -> Result<Vec<Transaction>, TransactionError> {
        self.get_transactions(TransactionType::Income).await
    }

    pub async fn get_expense_transactions(&self) -> Result<Vec<Transaction>, TransactionError> {
        self.get_transactions(TransactionType::Expense).await
    }

    #[instrument(skip(self))]
    pub async fn get_transactions(&self, kind: TransactionType) -> Result<Vec<Transaction>, TransactionError> {
        self.bounded(async {
            let mut uow = self.db.begin().await?;
            let mut store = TransactionStore::new(uow.connection());

            let transactions = store.get_by_type(kind).await?;
            Ok(transactions)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn clear_transactions(&self, kind: TransactionType) -> Result<u64, TransactionError> {
        let (uow, removed) = self
            .bounded(async {
                let mut uow = self.db.begin().await?;
                let removed = TransactionStore::new(uow.connection()).clear_by_type(kind).await?;
                Ok::<_, TransactionError>((uow, removed))
            })
            .await?;

        uow.commit().await?;
        Ok(removed)
    }

    async fn bounded<T, F>(&self, work: F) -> Result<T, TransactionError>
    where
        F: Future<Output = Result<T, TransactionError>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| TransactionError::TimedOut)?,
            None => work.await,
        }
    }
}

fn ensure_same_kind(existing: &Transaction, incoming: &Transaction) -> Result<(), TransactionError> {
    if existing.kind != incoming.kind {
        return Err(TransactionError::InvalidInput(format!(
            "Transaction {} is {} and cannot become {}",
            incoming.id, existing.kind, incoming.kind
        )));
    }
    Ok(())
}
