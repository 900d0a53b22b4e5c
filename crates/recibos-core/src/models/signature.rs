use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::period::{LiquidationType, Period, PeriodGroupKey};

/// A recorded signing event for one legajo and one period group. Created only
/// through a successful step-up credential check; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Signature {
    pub legajo_id: Uuid,
    pub period: Period,
    pub liquidation_type: LiquidationType,
    pub signed_at: DateTime<Utc>,
    pub credential_verified: bool,
}

impl Signature {
    pub fn new(legajo_id: Uuid, key: PeriodGroupKey) -> Self {
        Self {
            legajo_id,
            period: key.period,
            liquidation_type: key.liquidation_type,
            signed_at: Utc::now(),
            credential_verified: true,
        }
    }

    pub fn group_key(&self) -> PeriodGroupKey {
        PeriodGroupKey::new(self.period, self.liquidation_type)
    }
}

/// One period group with its computed signed/accessible flags, as returned by
/// the accessible-periods query. Ordered by period ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PeriodGroupAccess {
    pub period: Period,
    pub liquidation_type: LiquidationType,
    pub signed: bool,
    pub accessible: bool,
}
