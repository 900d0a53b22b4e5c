//! OpenAPI documentation.
//! API version is in `crate::constants::API_VERSION`.
//! Paths in handler annotations use placeholder /api/v0; they are transformed at runtime to the actual version.

use utoipa::OpenApi;

use crate::constants::API_VERSION;
use crate::error;
use crate::handlers;
use recibos_core::models;

/// Placeholder version used in handler path annotations (utoipa requires compile-time literals).
/// Replaced at runtime in the served OpenAPI spec with API_VERSION.
const OPENAPI_PATH_PLACEHOLDER: &str = "/api/v0";

/// Transforms path keys in the OpenAPI spec from placeholder to actual API version.
fn transform_openapi_paths(spec: &mut utoipa::openapi::OpenApi, version: &str) {
    let replacement = format!("/api/{}", version);
    if OPENAPI_PATH_PLACEHOLDER == replacement {
        return;
    }
    let path_map = std::mem::take(&mut spec.paths.paths);
    for (key, item) in path_map {
        let new_key = key.replacen(OPENAPI_PATH_PLACEHOLDER, &replacement, 1);
        spec.paths.paths.insert(new_key, item);
    }
}

/// Returns the OpenAPI spec with path placeholders replaced by the current API version.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    transform_openapi_paths(&mut spec, API_VERSION);
    spec
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Recibos API",
        version = "0.1.0",
        description = "Payroll document portal API (v0): bulk spreadsheet import with chunked progress and cancellation, ordered period release, and password-verified period signing. All endpoints are versioned under /api/v0/."
    ),
    paths(
        // Imports
        handlers::imports::submit_import,
        handlers::imports::current_import,
        handlers::imports::cancel_current_import,
        // Signing
        handlers::signing::sign_period,
        handlers::signing::employee_periods,
    ),
    components(
        schemas(
            models::Period,
            models::LiquidationType,
            models::PeriodGroupKey,
            models::PeriodMeta,
            models::ImportJobStatus,
            models::RowError,
            models::RowWarning,
            models::ProgressSnapshot,
            models::PayrollLineRecord,
            models::Signature,
            models::PeriodGroupAccess,
            handlers::imports::ImportAccepted,
            handlers::imports::CancelResponse,
            handlers::signing::SignRequest,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "imports", description = "Bulk payroll import jobs"),
        (name = "signing", description = "Period release and signing")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_contains_all_routes() {
        let spec = get_openapi_spec();
        for path in [
            "/api/v0/imports",
            "/api/v0/imports/current",
            "/api/v0/imports/current/cancel",
            "/api/v0/periods/sign",
            "/api/v0/employees/{employee_id}/periods",
        ] {
            assert!(
                spec.paths.paths.contains_key(path),
                "missing path: {}",
                path
            );
        }
    }
}
