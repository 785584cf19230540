use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};
use ulid::Ulid;

use crate::model::{
    FixedReservation, ReservationInstance, ResolvedFixedReservation, TimeRange,
};
use crate::observability::{INSTANCES_PURGED_TOTAL, INSTANCES_REPRICED_TOTAL};

use super::store::InstanceReprice;
use super::{Engine, EngineError};

/// Input for creating a fixed reservation. Times are `"HH:MM"` as they
/// arrive from the request layer.
#[derive(Debug, Clone)]
pub struct NewFixedReservation {
    pub start_time: String,
    pub end_time: String,
    pub is_active: bool,
    pub schedule_day_id: Ulid,
    pub court_id: Ulid,
    pub rate_id: Ulid,
    pub user_id: Ulid,
    pub complex_id: Ulid,
    pub promotion_id: Option<Ulid>,
}

/// Partial update. `promotion_id` is doubly optional: `Some(None)` clears
/// the promotion, `None` leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct FixedReservationUpdate {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub court_id: Option<Ulid>,
    pub rate_id: Option<Ulid>,
    pub user_id: Option<Ulid>,
    pub promotion_id: Option<Option<Ulid>>,
}

/// Result of Create. Same-day materialization failures are reported here
/// as a soft error instead of failing the call.
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub reservation: FixedReservation,
    pub instance_created: bool,
    pub instance_error: Option<String>,
}

/// Result of ToggleStatus, for both directions of the flip.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub reservation: FixedReservation,
    pub instance_created: bool,
    pub instance_error: Option<String>,
    /// Future non-completed instances deleted by a deactivation.
    pub purged_instances: usize,
}

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub reservation: FixedReservation,
    /// Future pending instances repriced by the cascading update.
    pub repriced_instances: usize,
}

impl Engine {
    /// Create a fixed reservation after validating it against the horizon
    /// (`force` skips the horizon loop, never the definition check). When
    /// today already falls on the reservation's weekday and the reservation
    /// is active, today's instance is materialized best-effort.
    pub async fn create(
        &self,
        req: NewFixedReservation,
        force: bool,
    ) -> Result<CreateOutcome, EngineError> {
        let range = TimeRange::parse(&req.start_time, &req.end_time).ok_or_else(|| {
            EngineError::InvalidTimeRange(format!("{} - {}", req.start_time, req.end_time))
        })?;

        let day = self
            .store
            .schedule_day(req.schedule_day_id)
            .await?
            .ok_or(EngineError::NotFound(req.schedule_day_id))?;
        let weekday = day.day_of_week;
        let court = self
            .store
            .court(req.court_id)
            .await?
            .ok_or(EngineError::NotFound(req.court_id))?;
        let rate = self
            .store
            .rate(req.rate_id)
            .await?
            .ok_or(EngineError::NotFound(req.rate_id))?;
        let user = self
            .store
            .user(req.user_id)
            .await?
            .ok_or(EngineError::NotFound(req.user_id))?;
        let complex = self
            .store
            .complex(req.complex_id)
            .await?
            .ok_or(EngineError::NotFound(req.complex_id))?;
        let promotion = match req.promotion_id {
            Some(pid) => Some(
                self.store
                    .promotion(pid)
                    .await?
                    .ok_or(EngineError::NotFound(pid))?,
            ),
            None => None,
        };

        let today = self.today();
        let lock = self.court_lock(req.court_id);
        let _guard = lock.lock().await;

        self.check_definitions(req.court_id, weekday, &range, None)
            .await?;
        if !force {
            self.validate_horizon(req.court_id, weekday, &range, today)
                .await?;
        }

        let fixed = FixedReservation {
            id: Ulid::new(),
            range,
            is_active: req.is_active,
            schedule_day_id: req.schedule_day_id,
            court_id: req.court_id,
            rate_id: req.rate_id,
            user_id: req.user_id,
            complex_id: req.complex_id,
            promotion_id: req.promotion_id,
        };
        self.store.insert_fixed_reservation(fixed.clone()).await?;
        info!(id = %fixed.id, court = %fixed.court_id, %weekday, "fixed reservation created");

        let mut outcome = CreateOutcome {
            reservation: fixed.clone(),
            instance_created: false,
            instance_error: None,
        };
        if fixed.is_active && today.weekday() == weekday {
            let resolved = ResolvedFixedReservation {
                fixed,
                weekday,
                court,
                rate,
                user,
                complex,
                promotion,
            };
            (outcome.instance_created, outcome.instance_error) =
                self.materialize_today_soft(&resolved, today).await;
        }
        Ok(outcome)
    }

    /// Flip the active flag. Activation re-validates like Create (with the
    /// reservation itself excluded from the definition check) and
    /// best-effort materializes today's instance; deactivation bulk-purges
    /// future non-completed instances.
    pub async fn toggle_status(&self, id: Ulid, force: bool) -> Result<ToggleOutcome, EngineError> {
        let fixed = self
            .store
            .fixed_reservation(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        let today = self.today();

        if fixed.is_active {
            let mut updated = fixed;
            updated.is_active = false;
            self.store.update_fixed_reservation(updated.clone()).await?;
            let purged = self.store.purge_instances(id, today).await?;
            metrics::counter!(INSTANCES_PURGED_TOTAL).increment(purged as u64);
            info!(%id, purged, "fixed reservation deactivated");
            return Ok(ToggleOutcome {
                reservation: updated,
                instance_created: false,
                instance_error: None,
                purged_instances: purged,
            });
        }

        let resolved = self
            .store
            .resolve_fixed_reservation(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        let weekday = resolved.weekday;
        let court_id = resolved.fixed.court_id;
        let lock = self.court_lock(court_id);
        let _guard = lock.lock().await;

        self.check_definitions(court_id, weekday, &resolved.fixed.range, Some(id))
            .await?;
        if !force {
            self.validate_horizon(court_id, weekday, &resolved.fixed.range, today)
                .await?;
        }

        let mut updated = resolved.fixed.clone();
        updated.is_active = true;
        self.store.update_fixed_reservation(updated.clone()).await?;
        info!(%id, "fixed reservation activated");

        let mut outcome = ToggleOutcome {
            reservation: updated.clone(),
            instance_created: false,
            instance_error: None,
            purged_instances: 0,
        };
        if today.weekday() == weekday {
            let resolved = ResolvedFixedReservation {
                fixed: updated,
                ..resolved
            };
            (outcome.instance_created, outcome.instance_error) =
                self.materialize_today_soft(&resolved, today).await;
        }
        Ok(outcome)
    }

    /// Apply attribute changes, then cascade the new schedule, price,
    /// court, user, and client name onto every future pending instance in
    /// one bulk conditional update.
    pub async fn update(
        &self,
        id: Ulid,
        patch: FixedReservationUpdate,
    ) -> Result<UpdateOutcome, EngineError> {
        let mut updated = self
            .store
            .fixed_reservation(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;

        if patch.start_time.is_some() || patch.end_time.is_some() {
            let start = patch
                .start_time
                .unwrap_or_else(|| updated.range.start_hhmm());
            let end = patch.end_time.unwrap_or_else(|| updated.range.end_hhmm());
            updated.range = TimeRange::parse(&start, &end)
                .ok_or_else(|| EngineError::InvalidTimeRange(format!("{start} - {end}")))?;
        }
        if let Some(court_id) = patch.court_id {
            self.store
                .court(court_id)
                .await?
                .ok_or(EngineError::NotFound(court_id))?;
            updated.court_id = court_id;
        }
        if let Some(rate_id) = patch.rate_id {
            self.store
                .rate(rate_id)
                .await?
                .ok_or(EngineError::NotFound(rate_id))?;
            updated.rate_id = rate_id;
        }
        if let Some(user_id) = patch.user_id {
            self.store
                .user(user_id)
                .await?
                .ok_or(EngineError::NotFound(user_id))?;
            updated.user_id = user_id;
        }
        if let Some(promotion_id) = patch.promotion_id {
            if let Some(pid) = promotion_id {
                self.store
                    .promotion(pid)
                    .await?
                    .ok_or(EngineError::NotFound(pid))?;
            }
            updated.promotion_id = promotion_id;
        }

        self.store.update_fixed_reservation(updated.clone()).await?;

        let resolved = self
            .store
            .resolve_fixed_reservation(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        // Repricing uses the plain hourly rate; promotions only apply at
        // materialization time.
        let price = updated.range.duration_hours() * resolved.rate.price;
        let repriced = self
            .store
            .reprice_instances(
                id,
                self.today(),
                InstanceReprice {
                    schedule: updated.schedule(),
                    price,
                    court_id: updated.court_id,
                    user_id: updated.user_id,
                    client_name: resolved.user.name.clone(),
                },
            )
            .await?;
        metrics::counter!(INSTANCES_REPRICED_TOTAL).increment(repriced as u64);
        info!(%id, repriced, "fixed reservation updated");

        Ok(UpdateOutcome {
            reservation: updated,
            repriced_instances: repriced,
        })
    }

    /// Delete the fixed reservation row. Linked instances are retained as
    /// independent records; their back-reference is informational only.
    pub async fn remove(&self, id: Ulid) -> Result<(), EngineError> {
        if !self.store.delete_fixed_reservation(id).await? {
            return Err(EngineError::NotFound(id));
        }
        info!(%id, "fixed reservation removed");
        Ok(())
    }

    /// Explicitly materialize an instance for `date`, regardless of the
    /// active flag. Unlike same-day materialization during Create and
    /// activation, conflicts are not downgraded — they fail the call.
    pub async fn create_instance(
        &self,
        id: Ulid,
        date: NaiveDate,
    ) -> Result<ReservationInstance, EngineError> {
        let resolved = self
            .store
            .resolve_fixed_reservation(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        if date.weekday() != resolved.weekday {
            return Err(EngineError::WeekdayMismatch {
                expected: resolved.weekday,
                actual: date.weekday(),
            });
        }

        let lock = self.court_lock(resolved.fixed.court_id);
        let _guard = lock.lock().await;

        let materialized = self.materialize(&resolved, date).await?;
        if materialized.created {
            info!(fixed = %id, %date, "instance materialized on request");
        }
        Ok(materialized.instance)
    }

    async fn materialize_today_soft(
        &self,
        resolved: &ResolvedFixedReservation,
        today: NaiveDate,
    ) -> (bool, Option<String>) {
        match self.materialize(resolved, today).await {
            Ok(_) => (true, None),
            Err(e) => {
                warn!(fixed = %resolved.fixed.id, error = %e, "same-day materialization failed");
                (false, Some(e.to_string()))
            }
        }
    }
}
