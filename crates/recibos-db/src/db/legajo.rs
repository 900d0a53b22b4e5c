use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;

use recibos_core::models::{Legajo, Period, PeriodGroupKey};
use recibos_core::AppError;
use recibos_services::LegajoDirectory;

/// Repository for legajos and the period groups their payroll lines span.
#[derive(Clone)]
pub struct LegajoRepository {
    pool: PgPool,
}

impl LegajoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LegajoDirectory for LegajoRepository {
    #[tracing::instrument(skip(self), fields(db.table = "legajos", db.operation = "select", db.record_id = %legajo_id))]
    async fn legajo(&self, legajo_id: Uuid) -> Result<Option<Legajo>, AppError> {
        let legajo = sqlx::query_as::<Postgres, Legajo>(
            "SELECT id, employee_id, company_name, active FROM legajos WHERE id = $1",
        )
        .bind(legajo_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(legajo)
    }

    #[tracing::instrument(skip(self), fields(db.table = "legajos", db.operation = "select"))]
    async fn active_legajos_for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<Legajo>, AppError> {
        let legajos = sqlx::query_as::<Postgres, Legajo>(
            "SELECT id, employee_id, company_name, active FROM legajos \
             WHERE employee_id = $1 AND active ORDER BY company_name ASC",
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(legajos)
    }

    #[tracing::instrument(skip(self, legajo_ids), fields(db.table = "payroll_lines", db.operation = "select"))]
    async fn period_groups_for_legajos(
        &self,
        legajo_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, PeriodGroupKey)>, AppError> {
        let rows = sqlx::query(
            "SELECT DISTINCT legajo_id, period_month, period_year, liquidation_type \
             FROM payroll_lines WHERE legajo_id = ANY($1)",
        )
        .bind(legajo_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in rows {
            let legajo_id: Uuid = row.try_get("legajo_id").map_err(AppError::from)?;
            let month: i32 = row.try_get("period_month").map_err(AppError::from)?;
            let year: i32 = row.try_get("period_year").map_err(AppError::from)?;
            let period = Period::new(month as u32, year)
                .map_err(|e| AppError::Internal(format!("invalid stored period: {}", e)))?;
            let liquidation_type = row
                .try_get::<String, _>("liquidation_type")
                .map_err(AppError::from)?
                .parse()
                .map_err(|e| AppError::Internal(format!("invalid liquidation type: {}", e)))?;
            pairs.push((legajo_id, PeriodGroupKey::new(period, liquidation_type)));
        }

        Ok(pairs)
    }
}
