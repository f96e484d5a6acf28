use crate::models::{Transaction, TransactionType};
use database::{self, RepositoryError};
use sqlx::FromRow;

#[derive(FromRow)]
struct TransactionRecord {
    id: i64,
    name: String,
    amount: f64,
    date: String,
    day: i64,
    month: i64,
    year: i64,
    kind: String,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = RepositoryError;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        let kind = record.kind.parse::<TransactionType>().map_err(decode_error)?;
        let day = u32::try_from(record.day)
            .map_err(|_| decode_error(format!("Invalid day {}", record.day)))?;
        let month = u32::try_from(record.month)
            .map_err(|_| decode_error(format!("Invalid month {}", record.month)))?;
        let year = i32::try_from(record.year)
            .map_err(|_| decode_error(format!("Invalid year {}", record.year)))?;

        Ok(Transaction {
            id: record.id,
            name: record.name,
            amount: record.amount,
            date: record.date,
            day,
            month,
            year,
            kind,
        })
    }
}

fn decode_error(msg: String) -> RepositoryError {
    RepositoryError::Infrastructure(sqlx::Error::Decode(msg.into()))
}

/// Durable CRUD over the `transactions` table, bound to one connection.
pub(crate) struct TransactionStore<'a> {
    conn: &'a mut database::Connection,
}

impl<'a> TransactionStore<'a> {
    pub fn new(conn: &'a mut database::Connection) -> Self {
        Self { conn }
    }

    /// Writes `transaction`, replacing any row with the same id. An id of `0`
    /// lets SQLite assign the next one.
    pub async fn insert(&mut self, transaction: &Transaction) -> Result<Transaction, RepositoryError> {
        let id = transaction.is_persisted().then_some(transaction.id);

        let id: i64 = sqlx::query_scalar(
            "INSERT OR REPLACE INTO transactions (id, name, amount, date, day, month, year, type) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
        )
        .bind(id)
        .bind(&transaction.name)
        .bind(transaction.amount)
        .bind(&transaction.date)
        .bind(i64::from(transaction.day))
        .bind(i64::from(transaction.month))
        .bind(i64::from(transaction.year))
        .bind(transaction.kind.as_str())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(Transaction {
            id,
            ..transaction.clone()
        })
    }

    /// Rewrites every mutable column of the row with `transaction.id`. The type column is left alone.
    pub async fn update(&mut self, transaction: &Transaction) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE transactions SET name = $1, amount = $2, date = $3, day = $4, month = $5, year = $6 WHERE id = $7",
        )
        .bind(&transaction.name)
        .bind(transaction.amount)
        .bind(&transaction.date)
        .bind(i64::from(transaction.day))
        .bind(i64::from(transaction.month))
        .bind(i64::from(transaction.year))
        .bind(transaction.id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<Transaction>, RepositoryError> {
        let record = sqlx::query_as::<_, TransactionRecord>(
            "SELECT id, name, amount, date, day, month, year, type AS kind FROM transactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        record.map(Transaction::try_from).transpose()
    }

    /// All transactions of `kind` in insertion order.
    pub async fn get_by_type(&mut self, kind: TransactionType) -> Result<Vec<Transaction>, RepositoryError> {
        let records = sqlx::query_as::<_, TransactionRecord>(
            "SELECT id, name, amount, date, day, month, year, type AS kind FROM transactions WHERE type = $1 ORDER BY id ASC",
        )
        .bind(kind.as_str())
        .fetch_all(&mut *self.conn)
        .await?;

        records.into_iter().map(Transaction::try_from).collect()
    }

    /// Deletes every transaction of `kind` and returns how many went.
    pub async fn clear_by_type(&mut self, kind: TransactionType) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM transactions WHERE type = $1")
            .bind(kind.as_str())
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }
}
