use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use recibos_core::models::{Period, PeriodGroupKey, Signature};
use recibos_core::AppError;
use recibos_services::SignatureStore;

/// Repository for signing events. The unique index on
/// `(legajo_id, period_year, period_month, liquidation_type)` plus
/// `ON CONFLICT DO NOTHING` serializes concurrent first signs per key.
#[derive(Clone)]
pub struct SignatureRepository {
    pool: PgPool,
}

impl SignatureRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn signature_from_row(row: &PgRow) -> Result<Signature, sqlx::Error> {
    let month: i32 = row.try_get("period_month")?;
    let year: i32 = row.try_get("period_year")?;
    let period = Period::new(month as u32, year)
        .map_err(|e| sqlx::Error::Decode(format!("invalid stored period: {}", e).into()))?;
    let liquidation_type = row
        .try_get::<String, _>("liquidation_type")?
        .parse()
        .map_err(|e| sqlx::Error::Decode(format!("invalid liquidation type: {}", e).into()))?;
    Ok(Signature {
        legajo_id: row.try_get("legajo_id")?,
        period,
        liquidation_type,
        signed_at: row.try_get("signed_at")?,
        credential_verified: row.try_get("credential_verified")?,
    })
}

const SELECT_COLUMNS: &str =
    "legajo_id, period_month, period_year, liquidation_type, signed_at, credential_verified";

#[async_trait]
impl SignatureStore for SignatureRepository {
    #[tracing::instrument(skip(self), fields(db.table = "signatures", db.operation = "select"))]
    async fn find(
        &self,
        legajo_id: Uuid,
        key: PeriodGroupKey,
    ) -> Result<Option<Signature>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM signatures \
             WHERE legajo_id = $1 AND period_month = $2 AND period_year = $3 AND liquidation_type = $4",
            SELECT_COLUMNS
        ))
        .bind(legajo_id)
        .bind(key.period.month as i32)
        .bind(key.period.year)
        .bind(key.liquidation_type.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(signature_from_row).transpose().map_err(Into::into)
    }

    #[tracing::instrument(skip(self, legajo_ids), fields(db.table = "signatures", db.operation = "select"))]
    async fn for_legajos(&self, legajo_ids: &[Uuid]) -> Result<Vec<Signature>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM signatures WHERE legajo_id = ANY($1)",
            SELECT_COLUMNS
        ))
        .bind(legajo_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(signature_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    #[tracing::instrument(skip(self, signature), fields(db.table = "signatures", db.operation = "insert"))]
    async fn insert_if_absent(&self, signature: Signature) -> Result<Signature, AppError> {
        sqlx::query(
            r#"
            INSERT INTO signatures
                (legajo_id, period_month, period_year, liquidation_type, signed_at, credential_verified)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (legajo_id, period_year, period_month, liquidation_type) DO NOTHING
            "#,
        )
        .bind(signature.legajo_id)
        .bind(signature.period.month as i32)
        .bind(signature.period.year)
        .bind(signature.liquidation_type.to_string())
        .bind(signature.signed_at)
        .bind(signature.credential_verified)
        .execute(&self.pool)
        .await?;

        // Re-read so a concurrent winner's signature is what we return.
        self.find(signature.legajo_id, signature.group_key())
            .await?
            .ok_or_else(|| AppError::Internal("signature vanished after insert".to_string()))
    }
}
