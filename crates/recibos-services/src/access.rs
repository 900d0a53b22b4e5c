//! Accessible-period listing for one employee.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use recibos_core::models::{PeriodGroupAccess, PeriodGroupKey};
use recibos_core::AppError;

use crate::gate::{self, GroupSigningState};
use crate::stores::{LegajoDirectory, SignatureStore};

/// Computes, per employee, the ordered period groups with signed/accessible
/// flags. The multi-legajo signed aggregate is recomputed from the signature
/// set on every call so a legajo added later is picked up immediately.
pub struct PeriodAccessService {
    legajos: Arc<dyn LegajoDirectory>,
    signatures: Arc<dyn SignatureStore>,
}

impl PeriodAccessService {
    pub fn new(legajos: Arc<dyn LegajoDirectory>, signatures: Arc<dyn SignatureStore>) -> Self {
        Self {
            legajos,
            signatures,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn accessible_periods(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<PeriodGroupAccess>, AppError> {
        let states = self.signing_states(employee_id).await?;
        Ok(gate::evaluate(states))
    }

    /// Whether `key` is inside the employee's accessible frontier. `None`
    /// when the employee has no such group.
    pub async fn group_accessible(
        &self,
        employee_id: Uuid,
        key: PeriodGroupKey,
    ) -> Result<Option<bool>, AppError> {
        let states = self.signing_states(employee_id).await?;
        Ok(gate::is_accessible(states, key))
    }

    async fn signing_states(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<GroupSigningState>, AppError> {
        let legajos = self
            .legajos
            .active_legajos_for_employee(employee_id)
            .await?;
        if legajos.is_empty() {
            return Ok(Vec::new());
        }
        let legajo_ids: Vec<Uuid> = legajos.iter().map(|l| l.id).collect();

        let pairs = self.legajos.period_groups_for_legajos(&legajo_ids).await?;
        let signatures = self.signatures.for_legajos(&legajo_ids).await?;

        let mut states: HashMap<PeriodGroupKey, GroupSigningState> = HashMap::new();
        for (legajo_id, key) in pairs {
            states
                .entry(key)
                .or_insert_with(|| GroupSigningState::new(key, Vec::new()))
                .required_legajos
                .push(legajo_id);
        }
        for signature in signatures {
            if let Some(state) = states.get_mut(&signature.group_key()) {
                state.signed_legajos.insert(signature.legajo_id);
            }
        }

        Ok(states.into_values().collect())
    }
}
