use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Minutes since local midnight — the only time-of-day unit.
pub type Minutes = i32;

pub const DAY_MINUTES: Minutes = 24 * 60;

/// A court slot within a day, half-open `[start, end)` in minutes.
///
/// `end` numerically ≤ `start` means the slot crosses midnight; the
/// effective end is then `end + 1440`. An equal pair is a full-day slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Minutes,
    pub end: Minutes,
}

impl TimeRange {
    /// Parse a `"HH:MM"`/`"HH:MM"` pair. `None` if either bound is not a
    /// valid minute-of-day.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        Some(Self {
            start: parse_hhmm(start)?,
            end: parse_hhmm(end)?,
        })
    }

    /// Parse a schedule string, `"HH:MM - HH:MM"`.
    pub fn from_schedule(schedule: &str) -> Option<Self> {
        let (start, end) = schedule.split_once(" - ")?;
        Self::parse(start.trim(), end.trim())
    }

    /// End bound with the midnight adjustment applied.
    pub fn adjusted_end(&self) -> Minutes {
        if self.end <= self.start {
            self.end + DAY_MINUTES
        } else {
            self.end
        }
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end <= self.start
    }

    pub fn duration_minutes(&self) -> Minutes {
        self.adjusted_end() - self.start
    }

    pub fn duration_hours(&self) -> f64 {
        f64::from(self.duration_minutes()) / 60.0
    }

    /// Half-open overlap on the 24h circle. Touching boundaries never
    /// conflict. A range whose tail wraps past midnight is compared both
    /// in place and shifted back one day, so a 23:30–00:30 slot collides
    /// with a 00:00–01:00 booking recorded on the same date.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        let (a0, a1) = (self.start, self.adjusted_end());
        let (b0, b1) = (other.start, other.adjusted_end());
        intersects(a0, a1, b0, b1)
            || intersects(a0 - DAY_MINUTES, a1 - DAY_MINUTES, b0, b1)
            || intersects(a0, a1, b0 - DAY_MINUTES, b1 - DAY_MINUTES)
    }

    pub fn start_hhmm(&self) -> String {
        format_hhmm(self.start)
    }

    pub fn end_hhmm(&self) -> String {
        format_hhmm(self.end)
    }

    /// Render as the schedule string stored on instances, `"HH:MM - HH:MM"`.
    pub fn schedule(&self) -> String {
        format!("{} - {}", format_hhmm(self.start), format_hhmm(self.end))
    }
}

fn intersects(s1: Minutes, e1: Minutes, s2: Minutes, e2: Minutes) -> bool {
    s1 < e2 && e1 > s2
}

fn parse_hhmm(s: &str) -> Option<Minutes> {
    let (h, m) = s.split_once(':')?;
    let h: i32 = h.parse().ok()?;
    let m: i32 = m.parse().ok()?;
    if !(0..24).contains(&h) || !(0..60).contains(&m) {
        return None;
    }
    Some(h * 60 + m)
}

fn format_hhmm(minutes: Minutes) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

// ── Weekday wire ordinal ─────────────────────────────────────────

/// Wire ordinal used by schedule days: 0 = Sunday .. 6 = Saturday.
pub fn weekday_from_ordinal(ordinal: u8) -> Option<Weekday> {
    match ordinal {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

pub fn weekday_ordinal(day: Weekday) -> u8 {
    day.num_days_from_sunday() as u8
}

mod weekday_ord {
    use chrono::Weekday;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(day: &Weekday, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u8(super::weekday_ordinal(*day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Weekday, D::Error> {
        let ordinal = u8::deserialize(de)?;
        super::weekday_from_ordinal(ordinal)
            .ok_or_else(|| D::Error::custom(format!("weekday ordinal out of range: {ordinal}")))
    }
}

// ── Statuses and kinds ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

impl InstanceStatus {
    /// Whether a booking in this status occupies the court.
    pub fn blocks_court(&self) -> bool {
        !matches!(self, InstanceStatus::Cancelled | InstanceStatus::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Pending => "PENDING",
            InstanceStatus::Approved => "APPROVED",
            InstanceStatus::Rejected => "REJECTED",
            InstanceStatus::Cancelled => "CANCELLED",
            InstanceStatus::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a reservation instance came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationKind {
    /// Materialized from a fixed reservation.
    Fixed,
    /// Booked ad hoc.
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    Percentage,
    FixedAmount,
}

// ── Entities ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complex {
    pub id: Ulid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Court {
    pub id: Ulid,
    pub name: String,
    pub complex_id: Ulid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Ulid,
    pub name: String,
}

/// Price per hour of court time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub id: Ulid,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Ulid,
    pub kind: DiscountKind,
    pub value: f64,
    pub active: bool,
}

/// A weekday slot a complex offers for recurring bookings. Fixed
/// reservations reference one of these to pin their weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub id: Ulid,
    #[serde(with = "weekday_ord")]
    pub day_of_week: Weekday,
    pub complex_id: Ulid,
}

/// A weekly recurring booking template — not itself a calendar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedReservation {
    pub id: Ulid,
    pub range: TimeRange,
    pub is_active: bool,
    pub schedule_day_id: Ulid,
    pub court_id: Ulid,
    pub rate_id: Ulid,
    pub user_id: Ulid,
    pub complex_id: Ulid,
    pub promotion_id: Option<Ulid>,
}

impl FixedReservation {
    pub fn schedule(&self) -> String {
        self.range.schedule()
    }
}

/// A concrete, dated booking on a court. Once created it survives
/// independently of the fixed reservation that produced it — the
/// back-reference is informational, not ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationInstance {
    pub id: Ulid,
    /// Calendar day, midnight-normalized.
    pub date: NaiveDate,
    /// `"HH:MM - HH:MM"`.
    pub schedule: String,
    pub price: f64,
    pub reservation_amount: f64,
    pub status: InstanceStatus,
    pub kind: ReservationKind,
    pub court_id: Ulid,
    pub user_id: Ulid,
    pub complex_id: Ulid,
    pub promotion_id: Option<Ulid>,
    pub fixed_reservation_id: Option<Ulid>,
    /// Denormalized renter name, kept in sync by cascading updates.
    pub client_name: String,
}

// ── Resolved aggregate ───────────────────────────────────────────

/// A fixed reservation with every referenced entity fetched, as the
/// materializer consumes it.
#[derive(Debug, Clone)]
pub struct ResolvedFixedReservation {
    pub fixed: FixedReservation,
    pub weekday: Weekday,
    pub court: Court,
    pub rate: Rate,
    pub user: User,
    pub complex: Complex,
    pub promotion: Option<Promotion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_times() {
        let r = TimeRange::parse("18:00", "19:30").unwrap();
        assert_eq!(r.start, 18 * 60);
        assert_eq!(r.end, 19 * 60 + 30);
        assert!(!r.crosses_midnight());
        assert_eq!(r.duration_minutes(), 90);
    }

    #[test]
    fn parse_rejects_bad_times() {
        assert!(TimeRange::parse("24:00", "01:00").is_none());
        assert!(TimeRange::parse("12:60", "13:00").is_none());
        assert!(TimeRange::parse("noon", "13:00").is_none());
        assert!(TimeRange::parse("12", "13:00").is_none());
    }

    #[test]
    fn midnight_crossing_duration() {
        let r = TimeRange::parse("23:30", "00:30").unwrap();
        assert!(r.crosses_midnight());
        assert_eq!(r.adjusted_end(), DAY_MINUTES + 30);
        assert_eq!(r.duration_minutes(), 60);
        assert_eq!(r.duration_hours(), 1.0);
    }

    #[test]
    fn equal_bounds_is_full_day() {
        let r = TimeRange::parse("08:00", "08:00").unwrap();
        assert_eq!(r.duration_minutes(), DAY_MINUTES);
    }

    #[test]
    fn overlap_basics() {
        let a = TimeRange::parse("18:00", "19:00").unwrap();
        let b = TimeRange::parse("18:30", "19:30").unwrap();
        let c = TimeRange::parse("19:00", "20:00").unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // touching, not overlapping
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn overlap_across_midnight() {
        let late = TimeRange::parse("23:30", "00:30").unwrap();
        let early = TimeRange::parse("00:00", "01:00").unwrap();
        assert!(late.overlaps(&early));
        assert!(early.overlaps(&late));

        let other_crosser = TimeRange::parse("23:00", "01:00").unwrap();
        assert!(late.overlaps(&other_crosser));
    }

    #[test]
    fn overlap_midnight_touching_is_free() {
        let late = TimeRange::parse("23:00", "00:30").unwrap();
        let after = TimeRange::parse("00:30", "01:30").unwrap();
        assert!(!late.overlaps(&after));
    }

    #[test]
    fn full_day_overlaps_everything() {
        let day = TimeRange::parse("00:00", "00:00").unwrap();
        let slot = TimeRange::parse("10:00", "11:00").unwrap();
        assert!(day.overlaps(&slot));
        assert!(slot.overlaps(&day));
    }

    #[test]
    fn disjoint_slots_do_not_overlap() {
        let morning = TimeRange::parse("08:00", "09:00").unwrap();
        let evening = TimeRange::parse("20:00", "21:00").unwrap();
        assert!(!morning.overlaps(&evening));
        assert!(!evening.overlaps(&morning));
    }

    #[test]
    fn schedule_string_roundtrip() {
        let r = TimeRange::parse("09:05", "10:00").unwrap();
        assert_eq!(r.schedule(), "09:05 - 10:00");
        assert_eq!(TimeRange::from_schedule("09:05 - 10:00"), Some(r));
        assert!(TimeRange::from_schedule("garbage").is_none());
    }

    #[test]
    fn weekday_ordinals() {
        assert_eq!(weekday_from_ordinal(0), Some(Weekday::Sun));
        assert_eq!(weekday_from_ordinal(6), Some(Weekday::Sat));
        assert_eq!(weekday_from_ordinal(7), None);
        assert_eq!(weekday_ordinal(Weekday::Mon), 1);
        assert_eq!(weekday_ordinal(Weekday::Sun), 0);
    }

    #[test]
    fn status_blocking() {
        assert!(InstanceStatus::Pending.blocks_court());
        assert!(InstanceStatus::Approved.blocks_court());
        assert!(InstanceStatus::Completed.blocks_court());
        assert!(!InstanceStatus::Cancelled.blocks_court());
        assert!(!InstanceStatus::Rejected.blocks_court());
    }

    #[test]
    fn instance_serialization_roundtrip() {
        let instance = ReservationInstance {
            id: Ulid::new(),
            date: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            schedule: "18:00 - 19:00".into(),
            price: 100.0,
            reservation_amount: 0.0,
            status: InstanceStatus::Approved,
            kind: ReservationKind::Fixed,
            court_id: Ulid::new(),
            user_id: Ulid::new(),
            complex_id: Ulid::new(),
            promotion_id: None,
            fixed_reservation_id: Some(Ulid::new()),
            client_name: "Ana Reyes".into(),
        };
        let json = serde_json::to_string(&instance).unwrap();
        assert!(json.contains("\"APPROVED\""));
        let decoded: ReservationInstance = serde_json::from_str(&json).unwrap();
        assert_eq!(instance, decoded);
    }

    #[test]
    fn schedule_day_serializes_sunday_based_ordinal() {
        let day = ScheduleDay {
            id: Ulid::new(),
            day_of_week: Weekday::Mon,
            complex_id: Ulid::new(),
        };
        let json = serde_json::to_string(&day).unwrap();
        assert!(json.contains("\"day_of_week\":1"));
        let decoded: ScheduleDay = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.day_of_week, Weekday::Mon);
    }
}
