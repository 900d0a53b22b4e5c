//! Import job handlers: submit, poll, cancel.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use recibos_core::models::{LiquidationType, Period, PeriodMeta, ProgressSnapshot, RawRow};
use recibos_core::AppError;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportAccepted {
    pub job_id: Uuid,
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// Fields collected from the multipart submission before decoding the file.
#[derive(Default)]
struct SubmitFields {
    month: Option<u32>,
    year: Option<i32>,
    payment_date: Option<NaiveDate>,
    liquidation_type: Option<LiquidationType>,
    file: Option<Vec<u8>>,
}

impl SubmitFields {
    fn into_meta_and_file(self) -> Result<(PeriodMeta, Vec<u8>), AppError> {
        let month = self
            .month
            .ok_or_else(|| AppError::InvalidInput("missing field: month".to_string()))?;
        let year = self
            .year
            .ok_or_else(|| AppError::InvalidInput("missing field: year".to_string()))?;
        let period = Period::new(month, year).map_err(AppError::InvalidInput)?;
        let meta = PeriodMeta {
            period,
            payment_date: self.payment_date.ok_or_else(|| {
                AppError::InvalidInput("missing field: payment_date".to_string())
            })?,
            liquidation_type: self.liquidation_type.ok_or_else(|| {
                AppError::InvalidInput("missing field: liquidation_type".to_string())
            })?,
        };
        let file = self
            .file
            .ok_or_else(|| AppError::InvalidInput("missing field: file".to_string()))?;
        Ok((meta, file))
    }
}

async fn collect_fields(mut multipart: Multipart) -> Result<SubmitFields, AppError> {
    let mut fields = SubmitFields::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("failed to read file: {}", e)))?;
                fields.file = Some(bytes.to_vec());
            }
            "month" => {
                let text = field_text(field).await?;
                fields.month = Some(
                    text.parse()
                        .map_err(|_| AppError::InvalidInput(format!("invalid month: {}", text)))?,
                );
            }
            "year" => {
                let text = field_text(field).await?;
                fields.year = Some(
                    text.parse()
                        .map_err(|_| AppError::InvalidInput(format!("invalid year: {}", text)))?,
                );
            }
            "payment_date" => {
                let text = field_text(field).await?;
                fields.payment_date = Some(NaiveDate::from_str(&text).map_err(|_| {
                    AppError::InvalidInput(format!("invalid payment_date: {}", text))
                })?);
            }
            "liquidation_type" => {
                let text = field_text(field).await?;
                fields.liquidation_type = Some(
                    text.parse()
                        .map_err(|e| AppError::InvalidInput(format!("{}", e)))?,
                );
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }
    Ok(fields)
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("malformed multipart field: {}", e)))
}

/// Decode the uploaded CSV into raw rows, skipping the header row. Rows are
/// 1-based by data position, matching what the user sees in a spreadsheet.
fn decode_csv(bytes: &[u8]) -> Result<Vec<RawRow>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| format!("file is not readable as CSV: {}", e))?;
        let cells = record.iter().map(|c| c.to_string()).collect();
        rows.push(RawRow::new(i + 1, cells));
    }
    Ok(rows)
}

/// Submit a payroll spreadsheet for import
///
/// Accepts a CSV file plus the period metadata, decodes it and starts the
/// asynchronous import job. The single job slot means a running import causes
/// a 409; an unreadable file still occupies the slot as a fast-failed job so
/// its error is visible through polling.
#[utoipa::path(
    post,
    path = "/api/v0/imports",
    tag = "imports",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Import job accepted", body = ImportAccepted),
        (status = 400, description = "Invalid metadata fields", body = ErrorResponse),
        (status = 409, description = "An import job is already running", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "submit_import"))]
pub async fn submit_import(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ImportAccepted>), HttpAppError> {
    let fields = collect_fields(multipart).await?;
    let (meta, file) = fields.into_meta_and_file()?;

    let (job_id, total) = match decode_csv(&file) {
        Ok(rows) => {
            let total = rows.len();
            let job_id = state.imports.submit(meta, rows).await?;
            (job_id, total)
        }
        Err(reason) => {
            let job_id = state.imports.submit_unreadable(meta, reason).await?;
            (job_id, 0)
        }
    };

    Ok((StatusCode::ACCEPTED, Json(ImportAccepted { job_id, total })))
}

/// Progress of the current import job
#[utoipa::path(
    get,
    path = "/api/v0/imports/current",
    tag = "imports",
    responses(
        (status = 200, description = "Progress snapshot", body = ProgressSnapshot),
        (status = 404, description = "No import job has been submitted", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn current_import(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProgressSnapshot>, HttpAppError> {
    match state.imports.progress().await {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err(AppError::NotFound("no import job has been submitted".to_string()).into()),
    }
}

/// Request cancellation of the current import job
///
/// Idempotent: with no running job this reports `cancelled: false`. Observed
/// rows are rolled back by the processor before the job finishes.
#[utoipa::path(
    post,
    path = "/api/v0/imports/current/cancel",
    tag = "imports",
    responses(
        (status = 200, description = "Cancellation flag state", body = CancelResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn cancel_current_import(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CancelResponse>, HttpAppError> {
    let cancelled = state.imports.cancel().await;
    Ok(Json(CancelResponse { cancelled }))
}
