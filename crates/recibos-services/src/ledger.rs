//! Signature ledger.
//!
//! The only writer of signing events. Every sign performs the step-up
//! credential check and consults the release gate; an existing signature
//! short-circuits the gate (a granted signature is never revoked by a later
//! gate recomputation). The gate verdict is reported without revealing
//! whether the password would have been accepted.

use std::sync::Arc;

use uuid::Uuid;

use recibos_core::models::{PeriodGroupKey, Signature};
use recibos_core::AppError;

use crate::access::PeriodAccessService;
use crate::credential::CredentialChecker;
use crate::stores::{LegajoDirectory, SignatureStore};

pub struct SignatureLedger {
    signatures: Arc<dyn SignatureStore>,
    legajos: Arc<dyn LegajoDirectory>,
    credentials: Arc<dyn CredentialChecker>,
    access: Arc<PeriodAccessService>,
}

impl SignatureLedger {
    pub fn new(
        signatures: Arc<dyn SignatureStore>,
        legajos: Arc<dyn LegajoDirectory>,
        credentials: Arc<dyn CredentialChecker>,
        access: Arc<PeriodAccessService>,
    ) -> Self {
        Self {
            signatures,
            legajos,
            credentials,
            access,
        }
    }

    /// Sign one period group for one legajo. Callers orchestrating "sign
    /// everything for this period" issue one call per legajo.
    #[tracing::instrument(skip(self, password), fields(legajo_id = %legajo_id, group = %key))]
    pub async fn sign(
        &self,
        user_id: Uuid,
        password: &str,
        legajo_id: Uuid,
        key: PeriodGroupKey,
    ) -> Result<Signature, AppError> {
        // Idempotent path: re-signing succeeds without a gate re-check and
        // without creating a duplicate.
        if let Some(existing) = self.signatures.find(legajo_id, key).await? {
            if !self.credentials.verify(user_id, password).await? {
                return Err(AppError::Credential);
            }
            tracing::debug!("Period group already signed, returning existing signature");
            return Ok(existing);
        }

        let legajo = self
            .legajos
            .legajo(legajo_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("legajo {} not found", legajo_id)))?;

        // Both checks always run; the gate verdict is reported first so a
        // denial does not leak whether the credential was valid.
        let credential_ok = self.credentials.verify(user_id, password).await?;
        let accessible = self
            .access
            .group_accessible(legajo.employee_id, key)
            .await?;

        match accessible {
            None => {
                return Err(AppError::NotFound(format!(
                    "no payroll document for {} on legajo {}",
                    key, legajo_id
                )))
            }
            Some(false) => {
                return Err(AppError::GateDenied(format!(
                    "period {} is not released for signing yet",
                    key
                )))
            }
            Some(true) => {}
        }
        if !credential_ok {
            return Err(AppError::Credential);
        }

        let signature = self
            .signatures
            .insert_if_absent(Signature::new(legajo_id, key))
            .await?;
        tracing::info!("Period group signed");
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        FixedPasswordChecker, InMemoryLegajoDirectory, InMemorySignatureStore,
    };
    use recibos_core::models::{LiquidationType, Period};

    fn key(month: u32, year: i32) -> PeriodGroupKey {
        PeriodGroupKey::new(Period::new(month, year).unwrap(), LiquidationType::Monthly)
    }

    struct Fixture {
        ledger: SignatureLedger,
        access: Arc<PeriodAccessService>,
        signatures: Arc<InMemorySignatureStore>,
        employee: Uuid,
        user: Uuid,
        legajo_a: Uuid,
    }

    /// One employee, one legajo, periods 03-05/2024 unsigned.
    fn fixture() -> Fixture {
        let employee = Uuid::new_v4();
        let user = employee;
        let directory = Arc::new(InMemoryLegajoDirectory::new());
        let legajo_a = directory.add_legajo(employee, "Acme SA");
        for month in 3..=5 {
            directory.add_period_group(legajo_a, key(month, 2024));
        }
        let signatures = Arc::new(InMemorySignatureStore::new());
        let access = Arc::new(PeriodAccessService::new(
            directory.clone(),
            signatures.clone(),
        ));
        let ledger = SignatureLedger::new(
            signatures.clone(),
            directory,
            Arc::new(FixedPasswordChecker::new("hunter2")),
            access.clone(),
        );
        Fixture {
            ledger,
            access,
            signatures,
            employee,
            user,
            legajo_a,
        }
    }

    #[tokio::test]
    async fn test_signing_in_order_extends_the_frontier() {
        let f = fixture();

        // 03/2024 unsigned: 04/2024 is not viewable.
        let before = f.access.accessible_periods(f.employee).await.unwrap();
        assert!(before[0].accessible);
        assert!(!before[1].accessible);

        f.ledger
            .sign(f.user, "hunter2", f.legajo_a, key(3, 2024))
            .await
            .unwrap();

        let after = f.access.accessible_periods(f.employee).await.unwrap();
        assert!(after[0].signed);
        assert!(after[1].accessible);
        assert!(!after[2].accessible);
    }

    #[tokio::test]
    async fn test_sign_outside_frontier_is_gate_denied() {
        let f = fixture();
        let err = f
            .ledger
            .sign(f.user, "hunter2", f.legajo_a, key(4, 2024))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GateDenied(_)));
        assert_eq!(f.signatures.count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_password_on_accessible_period_is_credential_error() {
        let f = fixture();
        let err = f
            .ledger
            .sign(f.user, "wrong", f.legajo_a, key(3, 2024))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Credential));
        assert_eq!(f.signatures.count(), 0);
    }

    #[tokio::test]
    async fn test_gate_denied_masks_credential_validity() {
        // Wrong password on an inaccessible period: the caller sees the same
        // GateDenied a correct password would get.
        let f = fixture();
        let err = f
            .ledger
            .sign(f.user, "wrong", f.legajo_a, key(4, 2024))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GateDenied(_)));
        assert_eq!(f.signatures.count(), 0);
    }

    #[tokio::test]
    async fn test_re_sign_is_idempotent_without_gate_recheck() {
        let f = fixture();
        let first = f
            .ledger
            .sign(f.user, "hunter2", f.legajo_a, key(3, 2024))
            .await
            .unwrap();

        let gate_checks_before = f.signatures.find_calls();
        let second = f
            .ledger
            .sign(f.user, "hunter2", f.legajo_a, key(3, 2024))
            .await
            .unwrap();

        assert_eq!(first.signed_at, second.signed_at);
        assert_eq!(f.signatures.count(), 1);
        // The idempotent path touched the store once (the find), nothing else.
        assert_eq!(f.signatures.find_calls(), gate_checks_before + 1);
        assert_eq!(f.signatures.insert_calls(), 1);
    }

    #[tokio::test]
    async fn test_multi_legajo_group_requires_each_legajo_to_sign() {
        let f = fixture();
        // Second company: legajo B also owns 04/2024 (and its own 03/2024 so
        // the frontier lines up).
        let directory = Arc::new(InMemoryLegajoDirectory::new());
        let legajo_a = directory.add_legajo(f.employee, "Acme SA");
        let legajo_b = directory.add_legajo(f.employee, "Beta SRL");
        directory.add_period_group(legajo_a, key(4, 2024));
        directory.add_period_group(legajo_b, key(4, 2024));
        directory.add_period_group(legajo_a, key(5, 2024));

        let signatures = Arc::new(InMemorySignatureStore::new());
        let access = Arc::new(PeriodAccessService::new(
            directory.clone(),
            signatures.clone(),
        ));
        let ledger = SignatureLedger::new(
            signatures.clone(),
            directory,
            Arc::new(FixedPasswordChecker::new("hunter2")),
            access.clone(),
        );

        // Sign legajo A's copy only.
        ledger
            .sign(f.user, "hunter2", legajo_a, key(4, 2024))
            .await
            .unwrap();

        let periods = access.accessible_periods(f.employee).await.unwrap();
        // 04/2024 still not fully signed; 05/2024 stays inaccessible.
        assert!(!periods[0].signed);
        assert!(!periods[1].accessible);

        ledger
            .sign(f.user, "hunter2", legajo_b, key(4, 2024))
            .await
            .unwrap();
        let periods = access.accessible_periods(f.employee).await.unwrap();
        assert!(periods[0].signed);
        assert!(periods[1].accessible);
    }

    #[tokio::test]
    async fn test_unknown_legajo_is_not_found() {
        let f = fixture();
        let err = f
            .ledger
            .sign(f.user, "hunter2", Uuid::new_v4(), key(3, 2024))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sign_nonexistent_group_is_not_found() {
        let f = fixture();
        let err = f
            .ledger
            .sign(f.user, "hunter2", f.legajo_a, key(9, 2024))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_employee_with_no_periods_has_empty_frontier() {
        let directory = Arc::new(InMemoryLegajoDirectory::new());
        let signatures = Arc::new(InMemorySignatureStore::new());
        let access = PeriodAccessService::new(directory, signatures);
        let periods = access.accessible_periods(Uuid::new_v4()).await.unwrap();
        assert!(periods.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_first_signs_store_one_signature() {
        let f = fixture();
        let ledger = Arc::new(f.ledger);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            let legajo = f.legajo_a;
            let user = f.user;
            handles.push(tokio::spawn(async move {
                ledger.sign(user, "hunter2", legajo, key(3, 2024)).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(f.signatures.count(), 1);
    }
}
