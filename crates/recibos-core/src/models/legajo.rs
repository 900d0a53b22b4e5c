use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// An employee's administrative record within one employing company. One
/// employee may hold several legajos concurrently (multi-company case); the
/// release gate ANDs signatures across all of them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Legajo {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub company_name: String,
    pub active: bool,
}
