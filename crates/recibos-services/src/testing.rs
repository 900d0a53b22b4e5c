//! In-memory fakes for the signing seams, shared by this crate's unit tests
//! and downstream integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use recibos_core::models::{Legajo, PeriodGroupKey, Signature};
use recibos_core::AppError;

use crate::credential::CredentialChecker;
use crate::stores::{LegajoDirectory, SignatureStore};

/// In-memory [`SignatureStore`]. The map mutex serializes writes per key,
/// which is what gives insert-if-absent its idempotence under concurrency.
pub struct InMemorySignatureStore {
    signatures: Mutex<HashMap<(Uuid, PeriodGroupKey), Signature>>,
    find_calls: AtomicUsize,
    insert_calls: AtomicUsize,
}

impl InMemorySignatureStore {
    pub fn new() -> Self {
        Self {
            signatures: Mutex::new(HashMap::new()),
            find_calls: AtomicUsize::new(0),
            insert_calls: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.signatures.lock().unwrap().len()
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

impl Default for InMemorySignatureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignatureStore for InMemorySignatureStore {
    async fn find(
        &self,
        legajo_id: Uuid,
        key: PeriodGroupKey,
    ) -> Result<Option<Signature>, AppError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .signatures
            .lock()
            .unwrap()
            .get(&(legajo_id, key))
            .cloned())
    }

    async fn for_legajos(&self, legajo_ids: &[Uuid]) -> Result<Vec<Signature>, AppError> {
        Ok(self
            .signatures
            .lock()
            .unwrap()
            .values()
            .filter(|s| legajo_ids.contains(&s.legajo_id))
            .cloned()
            .collect())
    }

    async fn insert_if_absent(&self, signature: Signature) -> Result<Signature, AppError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let mut map = self.signatures.lock().unwrap();
        let entry = map
            .entry((signature.legajo_id, signature.group_key()))
            .or_insert(signature);
        Ok(entry.clone())
    }
}

/// In-memory [`LegajoDirectory`] built up by tests.
pub struct InMemoryLegajoDirectory {
    legajos: Mutex<Vec<Legajo>>,
    groups: Mutex<Vec<(Uuid, PeriodGroupKey)>>,
}

impl InMemoryLegajoDirectory {
    pub fn new() -> Self {
        Self {
            legajos: Mutex::new(Vec::new()),
            groups: Mutex::new(Vec::new()),
        }
    }

    pub fn add_legajo(&self, employee_id: Uuid, company_name: &str) -> Uuid {
        let legajo = Legajo {
            id: Uuid::new_v4(),
            employee_id,
            company_name: company_name.to_string(),
            active: true,
        };
        let id = legajo.id;
        self.legajos.lock().unwrap().push(legajo);
        id
    }

    pub fn add_period_group(&self, legajo_id: Uuid, key: PeriodGroupKey) {
        self.groups.lock().unwrap().push((legajo_id, key));
    }
}

impl Default for InMemoryLegajoDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LegajoDirectory for InMemoryLegajoDirectory {
    async fn legajo(&self, legajo_id: Uuid) -> Result<Option<Legajo>, AppError> {
        Ok(self
            .legajos
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == legajo_id)
            .cloned())
    }

    async fn active_legajos_for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<Legajo>, AppError> {
        Ok(self
            .legajos
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.employee_id == employee_id && l.active)
            .cloned()
            .collect())
    }

    async fn period_groups_for_legajos(
        &self,
        legajo_ids: &[Uuid],
    ) -> Result<Vec<(Uuid, PeriodGroupKey)>, AppError> {
        Ok(self
            .groups
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| legajo_ids.contains(l))
            .cloned()
            .collect())
    }
}

/// Accepts one fixed password for every user.
pub struct FixedPasswordChecker {
    password: String,
}

impl FixedPasswordChecker {
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
        }
    }
}

#[async_trait]
impl CredentialChecker for FixedPasswordChecker {
    async fn verify(&self, _user_id: Uuid, password: &str) -> Result<bool, AppError> {
        Ok(password == self.password)
    }
}
