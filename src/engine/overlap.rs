use crate::model::{ReservationInstance, TimeRange};

use super::error::{EngineError, OverlapInfo};

/// Check a candidate time range against the bookings of one court/date.
///
/// Cancelled and rejected bookings do not occupy the court and are skipped.
/// The first qualifying collision wins; the error carries the offending
/// booking's status, schedule string, and date.
pub fn detect_overlap(
    candidate: &TimeRange,
    existing: &[ReservationInstance],
) -> Result<(), EngineError> {
    for booking in existing {
        if !booking.status.blocks_court() {
            continue;
        }
        let Some(range) = TimeRange::from_schedule(&booking.schedule) else {
            continue;
        };
        if candidate.overlaps(&range) {
            return Err(EngineError::Overlap(OverlapInfo {
                status: booking.status,
                schedule: booking.schedule.clone(),
                date: booking.date,
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InstanceStatus, ReservationKind};
    use chrono::NaiveDate;
    use ulid::Ulid;

    fn booking(schedule: &str, status: InstanceStatus) -> ReservationInstance {
        ReservationInstance {
            id: Ulid::new(),
            date: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            schedule: schedule.into(),
            price: 100.0,
            reservation_amount: 0.0,
            status,
            kind: ReservationKind::Regular,
            court_id: Ulid::new(),
            user_id: Ulid::new(),
            complex_id: Ulid::new(),
            promotion_id: None,
            fixed_reservation_id: None,
            client_name: "Luis Ponce".into(),
        }
    }

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::parse(start, end).unwrap()
    }

    #[test]
    fn reports_first_collision_with_details() {
        let existing = vec![
            booking("10:00 - 11:00", InstanceStatus::Approved),
            booking("18:30 - 19:30", InstanceStatus::Pending),
            booking("18:00 - 20:00", InstanceStatus::Approved),
        ];
        let err = detect_overlap(&range("18:00", "19:00"), &existing).unwrap_err();
        match err {
            EngineError::Overlap(info) => {
                assert_eq!(info.schedule, "18:30 - 19:30");
                assert_eq!(info.status, InstanceStatus::Pending);
                assert_eq!(info.date, NaiveDate::from_ymd_opt(2026, 8, 10).unwrap());
            }
            other => panic!("expected overlap, got {other:?}"),
        }
    }

    #[test]
    fn cancelled_and_rejected_do_not_block() {
        let existing = vec![
            booking("18:00 - 19:00", InstanceStatus::Cancelled),
            booking("18:00 - 19:00", InstanceStatus::Rejected),
        ];
        assert!(detect_overlap(&range("18:00", "19:00"), &existing).is_ok());
    }

    #[test]
    fn touching_boundaries_are_free() {
        let existing = vec![booking("17:00 - 18:00", InstanceStatus::Approved)];
        assert!(detect_overlap(&range("18:00", "19:00"), &existing).is_ok());
    }

    #[test]
    fn completed_bookings_still_block() {
        let existing = vec![booking("18:00 - 19:00", InstanceStatus::Completed)];
        assert!(detect_overlap(&range("18:30", "19:30"), &existing).is_err());
    }

    #[test]
    fn midnight_crossing_candidate_hits_early_morning_booking() {
        let existing = vec![booking("00:00 - 01:00", InstanceStatus::Approved)];
        assert!(detect_overlap(&range("23:30", "00:30"), &existing).is_err());
    }

    #[test]
    fn empty_set_never_conflicts() {
        assert!(detect_overlap(&range("00:00", "00:00"), &[]).is_ok());
    }
}
