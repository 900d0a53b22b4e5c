//! Signing handlers: sign a period group, list an employee's periods.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use recibos_core::models::{
    LiquidationType, Period, PeriodGroupAccess, PeriodGroupKey, Signature,
};
use recibos_core::AppError;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignRequest {
    pub user_id: Uuid,
    pub password: String,
    pub legajo_id: Uuid,
    /// `MM/YYYY`
    pub period: String,
    pub liquidation_type: LiquidationType,
}

/// Sign one period group for one legajo
///
/// Performs the step-up password check and consults the release gate; a
/// denial by the gate is reported before any hint about the credential.
/// Re-signing an already signed group succeeds idempotently.
#[utoipa::path(
    post,
    path = "/api/v0/periods/sign",
    tag = "signing",
    request_body = SignRequest,
    responses(
        (status = 200, description = "Signature recorded (or already present)", body = Signature),
        (status = 401, description = "Password verification failed", body = ErrorResponse),
        (status = 403, description = "Period not released for signing", body = ErrorResponse),
        (status = 404, description = "Unknown legajo or period group", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(legajo_id = %request.legajo_id, period = %request.period))]
pub async fn sign_period(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SignRequest>,
) -> Result<Json<Signature>, HttpAppError> {
    let period: Period = request
        .period
        .parse()
        .map_err(|e| AppError::InvalidInput(format!("{}", e)))?;
    let key = PeriodGroupKey::new(period, request.liquidation_type);

    let signature = state
        .ledger
        .sign(request.user_id, &request.password, request.legajo_id, key)
        .await?;

    Ok(Json(signature))
}

/// List an employee's period groups with signed/accessible flags
#[utoipa::path(
    get,
    path = "/api/v0/employees/{employee_id}/periods",
    tag = "signing",
    params(
        ("employee_id" = Uuid, Path, description = "Employee identifier")
    ),
    responses(
        (status = 200, description = "Ordered period groups", body = [PeriodGroupAccess])
    )
)]
#[tracing::instrument(skip(state))]
pub async fn employee_periods(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<Uuid>,
) -> Result<Json<Vec<PeriodGroupAccess>>, HttpAppError> {
    let periods = state.access.accessible_periods(employee_id).await?;
    Ok(Json(periods))
}
