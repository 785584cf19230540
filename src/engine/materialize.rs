use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::{
    DiscountKind, InstanceStatus, Promotion, Rate, ReservationInstance, ReservationKind,
    ResolvedFixedReservation, TimeRange,
};
use crate::observability::INSTANCES_MATERIALIZED_TOTAL;

use super::overlap::detect_overlap;
use super::{Engine, EngineError};

pub(super) struct Materialized {
    pub instance: ReservationInstance,
    pub created: bool,
}

/// Total price for one occurrence: hourly rate, reduced by an active
/// percentage promotion, times the midnight-adjusted duration.
pub fn instance_price(range: &TimeRange, rate: &Rate, promotion: Option<&Promotion>) -> f64 {
    let mut per_hour = rate.price;
    if let Some(promo) = promotion
        && promo.active
        && promo.kind == DiscountKind::Percentage
    {
        per_hour *= 1.0 - promo.value / 100.0;
    }
    per_hour * range.duration_hours()
}

impl Engine {
    /// Create the concrete instance of a fixed reservation on `date`.
    ///
    /// Idempotent: an instance already materialized for this
    /// date/schedule/court is returned as-is. The caller must hold the
    /// court's advisory lock.
    pub(super) async fn materialize(
        &self,
        resolved: &ResolvedFixedReservation,
        date: NaiveDate,
    ) -> Result<Materialized, EngineError> {
        let fixed = &resolved.fixed;
        let schedule = fixed.schedule();

        if let Some(existing) = self
            .store
            .find_materialized_instance(fixed.id, date, &schedule, fixed.court_id)
            .await?
        {
            return Ok(Materialized {
                instance: existing,
                created: false,
            });
        }

        // Checked against every booking on the court that day, not just
        // this fixed reservation's own output.
        let bookings = self.store.bookings_on(fixed.court_id, date).await?;
        detect_overlap(&fixed.range, &bookings)?;

        let instance = ReservationInstance {
            id: Ulid::new(),
            date,
            schedule,
            price: instance_price(&fixed.range, &resolved.rate, resolved.promotion.as_ref()),
            reservation_amount: 0.0,
            // Fixed-reservation instances are auto-approved.
            status: InstanceStatus::Approved,
            kind: ReservationKind::Fixed,
            court_id: fixed.court_id,
            user_id: fixed.user_id,
            complex_id: fixed.complex_id,
            promotion_id: fixed.promotion_id,
            fixed_reservation_id: Some(fixed.id),
            client_name: resolved.user.name.clone(),
        };
        self.store.insert_instance(instance.clone()).await?;
        metrics::counter!(INSTANCES_MATERIALIZED_TOTAL).increment(1);

        Ok(Materialized {
            instance,
            created: true,
        })
    }
}
