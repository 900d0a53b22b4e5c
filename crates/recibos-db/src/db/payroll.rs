use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use recibos_core::models::PayrollLineRecord;
use recibos_import::{PayrollStore, StoreError};

/// Repository for imported payroll lines, tagged by import job id so a
/// cancelled job can be rolled back with a single delete.
#[derive(Clone)]
pub struct PayrollRepository {
    pool: PgPool,
}

impl PayrollRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Connectivity-class failures make the whole import job fatal; everything
/// else degrades to row-level errors for the chunk.
fn classify(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Rejected(err.to_string()),
    }
}

#[async_trait]
impl PayrollStore for PayrollRepository {
    /// Persist one chunk as a unit: all rows in one transaction.
    #[tracing::instrument(
        skip(self, records),
        fields(db.table = "payroll_lines", db.operation = "insert", chunk_len = records.len())
    )]
    async fn save_chunk(
        &self,
        job_id: Uuid,
        records: &[PayrollLineRecord],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO payroll_lines
                    (id, import_job_id, legajo_id, period_month, period_year,
                     liquidation_type, payment_date, concept, gross, deductions, net)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(job_id)
            .bind(record.legajo_id)
            .bind(record.period.month as i32)
            .bind(record.period.year)
            .bind(record.liquidation_type.to_string())
            .bind(record.payment_date)
            .bind(&record.concept)
            .bind(record.gross)
            .bind(record.deductions)
            .bind(record.net)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        }

        tx.commit().await.map_err(classify)
    }

    #[tracing::instrument(
        skip(self),
        fields(db.table = "payroll_lines", db.operation = "delete", job_id = %job_id)
    )]
    async fn delete_all_for_job(&self, job_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM payroll_lines WHERE import_job_id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        tracing::info!(rows = result.rows_affected(), "Deleted payroll lines for cancelled job");
        Ok(())
    }
}
