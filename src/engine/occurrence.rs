use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Project the next `count` calendar dates falling on `weekday`, starting
/// from `reference`. The reference date itself counts when it already falls
/// on the target weekday.
pub fn project_occurrences(reference: NaiveDate, weekday: Weekday, count: u32) -> Vec<NaiveDate> {
    let mut offset = i64::from(weekday.num_days_from_sunday())
        - i64::from(reference.weekday().num_days_from_sunday());
    if offset < 0 {
        offset += 7;
    }
    let first = reference + Days::new(offset as u64);
    (0..count)
        .map(|week| first + Days::new(7 * u64::from(week)))
        .collect()
}
