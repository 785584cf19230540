use chrono::Weekday;
use ulid::Ulid;

use crate::model::{FixedReservation, ReservationInstance};

use super::{Engine, EngineError};

impl Engine {
    pub async fn get_fixed_reservation(&self, id: Ulid) -> Result<FixedReservation, EngineError> {
        self.store
            .fixed_reservation(id)
            .await?
            .ok_or(EngineError::NotFound(id))
    }

    /// List fixed reservations, optionally narrowed to a complex and/or a
    /// weekday.
    pub async fn list_fixed_reservations(
        &self,
        complex_id: Option<Ulid>,
        weekday: Option<Weekday>,
    ) -> Result<Vec<FixedReservation>, EngineError> {
        Ok(self
            .store
            .list_fixed_reservations(complex_id, weekday)
            .await?)
    }

    /// Instances a fixed reservation has produced, oldest first.
    pub async fn get_instances(&self, id: Ulid) -> Result<Vec<ReservationInstance>, EngineError> {
        self.store
            .fixed_reservation(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        Ok(self.store.instances_for_fixed(id).await?)
    }
}
