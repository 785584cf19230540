use chrono::{NaiveDate, Weekday};
use tracing::debug;
use ulid::Ulid;

use crate::model::TimeRange;
use crate::observability::{CONFLICTS_DETECTED_TOTAL, HORIZON_PROBES_TOTAL};

use super::occurrence::project_occurrences;
use super::overlap::detect_overlap;
use super::{Engine, EngineError};

impl Engine {
    /// Definition-level exclusion: the candidate slot against every other
    /// fixed reservation on the same court and weekday. Runs on every
    /// create and activation; `force` never bypasses it.
    pub(super) async fn check_definitions(
        &self,
        court_id: Ulid,
        weekday: Weekday,
        range: &TimeRange,
        exclude: Option<Ulid>,
    ) -> Result<(), EngineError> {
        let defined = self
            .store
            .fixed_reservations_for_slot(court_id, weekday)
            .await?;
        for other in defined {
            if Some(other.id) == exclude {
                continue;
            }
            if range.overlaps(&other.range) {
                metrics::counter!(CONFLICTS_DETECTED_TOTAL).increment(1);
                return Err(EngineError::DefinitionOverlap {
                    other: other.id,
                    schedule: other.schedule(),
                    weekday,
                });
            }
        }
        Ok(())
    }

    /// Probe the next `horizon_weeks` occurrences for booking collisions,
    /// in order, aborting on the first conflict. Later weeks are not
    /// checked once one fails.
    pub(super) async fn validate_horizon(
        &self,
        court_id: Ulid,
        weekday: Weekday,
        range: &TimeRange,
        reference: NaiveDate,
    ) -> Result<(), EngineError> {
        for date in project_occurrences(reference, weekday, self.config.horizon_weeks) {
            metrics::counter!(HORIZON_PROBES_TOTAL).increment(1);
            debug!(%court_id, %date, "horizon probe");
            let bookings = self.store.bookings_on(court_id, date).await?;
            if let Err(e) = detect_overlap(range, &bookings) {
                metrics::counter!(CONFLICTS_DETECTED_TOTAL).increment(1);
                return Err(e);
            }
        }
        Ok(())
    }
}
