//! Storage seams consumed by the signing services.

use async_trait::async_trait;
use uuid::Uuid;

use recibos_core::models::{Legajo, PeriodGroupKey, Signature};
use recibos_core::AppError;

/// Source of truth for signing events. Writes must be serialized per
/// `(legajo, period, liquidation_type)` key: two concurrent first signs for
/// the same key yield exactly one stored signature.
#[async_trait]
pub trait SignatureStore: Send + Sync {
    async fn find(
        &self,
        legajo_id: Uuid,
        key: PeriodGroupKey,
    ) -> Result<Option<Signature>, AppError>;

    async fn for_legajos(&self, legajo_ids: &[Uuid]) -> Result<Vec<Signature>, AppError>;

    /// Insert unless a signature for the key already exists; returns the
    /// stored signature either way.
    async fn insert_if_absent(&self, signature: Signature) -> Result<Signature, AppError>;
}

/// Directory of legajos and the period groups their payroll lines span.
#[async_trait]
pub trait LegajoDirectory: Send + Sync {
    async fn legajo(&self, legajo_id: Uuid) -> Result<Option<Legajo>, AppError>;

    async fn active_legajos_for_employee(&self, employee_id: Uuid)
        -> Result<Vec<Legajo>, AppError>;

    /// Distinct `(legajo, period group)` pairs over persisted payroll lines.
    async fn period_groups_for_legajos(
        &self,
        legajo_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, PeriodGroupKey)>, AppError>;
}
