//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::Result;
use recibos_core::Config;
use recibos_db::{LegajoRepository, PayrollRepository, SignatureRepository, UserRepository};
use recibos_import::{ImportJobManager, ImportJobManagerConfig};
use recibos_services::{
    BcryptCredentialChecker, CredentialChecker, LegajoDirectory, PasswordHashSource,
    PeriodAccessService, SignatureLedger, SignatureStore,
};

use crate::normalizer::TemplateRowNormalizer;
use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();
    tracing::info!("Configuration loaded");

    let pool = database::setup_database(&config).await?;

    let payroll = Arc::new(PayrollRepository::new(pool.clone()));
    let signatures: Arc<dyn SignatureStore> = Arc::new(SignatureRepository::new(pool.clone()));
    let legajos: Arc<dyn LegajoDirectory> = Arc::new(LegajoRepository::new(pool.clone()));
    let users: Arc<dyn PasswordHashSource> = Arc::new(UserRepository::new(pool));
    let credentials: Arc<dyn CredentialChecker> = Arc::new(BcryptCredentialChecker::new(users));

    let access = Arc::new(PeriodAccessService::new(
        legajos.clone(),
        signatures.clone(),
    ));
    let ledger = Arc::new(SignatureLedger::new(
        signatures,
        legajos,
        credentials,
        access.clone(),
    ));
    let imports = Arc::new(ImportJobManager::new(
        payroll,
        Arc::new(TemplateRowNormalizer::new()),
        ImportJobManagerConfig {
            chunk_size: config.import_chunk_size,
        },
    ));

    let state = Arc::new(AppState::new(config.clone(), imports, ledger, access));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
