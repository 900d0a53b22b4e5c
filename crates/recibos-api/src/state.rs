//! Application state shared across handlers.

use std::sync::Arc;

use recibos_core::Config;
use recibos_import::ImportJobManager;
use recibos_services::{PeriodAccessService, SignatureLedger};

pub struct AppState {
    pub config: Config,
    pub imports: Arc<ImportJobManager>,
    pub ledger: Arc<SignatureLedger>,
    pub access: Arc<PeriodAccessService>,
}

impl AppState {
    pub fn new(
        config: Config,
        imports: Arc<ImportJobManager>,
        ledger: Arc<SignatureLedger>,
        access: Arc<PeriodAccessService>,
    ) -> Self {
        Self {
            config,
            imports,
            ledger,
            access,
        }
    }
}
