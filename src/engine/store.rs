use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::*;

/// Failure surfaced by a store backend (connection loss, broken reference,
/// constraint violation). The in-memory store only produces the broken
/// reference case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

/// Field set applied to future pending instances by a cascading update.
#[derive(Debug, Clone)]
pub struct InstanceReprice {
    pub schedule: String,
    pub price: f64,
    pub court_id: Ulid,
    pub user_id: Ulid,
    pub client_name: String,
}

/// Persistence collaborator. Date-valued fields are midnight-normalized
/// `NaiveDate`s, so same-calendar-day comparisons are exact.
#[async_trait]
pub trait Store: Send + Sync {
    // ── By-id lookups ────────────────────────────────────────────
    async fn court(&self, id: Ulid) -> StoreResult<Option<Court>>;
    async fn user(&self, id: Ulid) -> StoreResult<Option<User>>;
    async fn complex(&self, id: Ulid) -> StoreResult<Option<Complex>>;
    async fn rate(&self, id: Ulid) -> StoreResult<Option<Rate>>;
    async fn promotion(&self, id: Ulid) -> StoreResult<Option<Promotion>>;
    async fn schedule_day(&self, id: Ulid) -> StoreResult<Option<ScheduleDay>>;
    async fn fixed_reservation(&self, id: Ulid) -> StoreResult<Option<FixedReservation>>;

    /// Fetch a fixed reservation with all referenced entities in one round
    /// trip. `Ok(None)` when the reservation itself is absent; a missing
    /// related row is a broken reference and errs.
    async fn resolve_fixed_reservation(
        &self,
        id: Ulid,
    ) -> StoreResult<Option<ResolvedFixedReservation>>;

    // ── Fixed reservations ───────────────────────────────────────
    /// Every fixed reservation defined for the given court and weekday.
    async fn fixed_reservations_for_slot(
        &self,
        court_id: Ulid,
        weekday: Weekday,
    ) -> StoreResult<Vec<FixedReservation>>;

    async fn list_fixed_reservations(
        &self,
        complex_id: Option<Ulid>,
        weekday: Option<Weekday>,
    ) -> StoreResult<Vec<FixedReservation>>;

    async fn insert_fixed_reservation(&self, fixed: FixedReservation) -> StoreResult<()>;
    async fn update_fixed_reservation(&self, fixed: FixedReservation) -> StoreResult<()>;
    /// Returns false when no row existed.
    async fn delete_fixed_reservation(&self, id: Ulid) -> StoreResult<bool>;

    // ── Reservation instances ────────────────────────────────────
    /// All instances booked on the given court and calendar day, any status.
    async fn bookings_on(
        &self,
        court_id: Ulid,
        date: NaiveDate,
    ) -> StoreResult<Vec<ReservationInstance>>;

    async fn insert_instance(&self, instance: ReservationInstance) -> StoreResult<()>;

    /// Idempotency probe: the instance a fixed reservation already
    /// materialized for this date/schedule/court, if any.
    async fn find_materialized_instance(
        &self,
        fixed_id: Ulid,
        date: NaiveDate,
        schedule: &str,
        court_id: Ulid,
    ) -> StoreResult<Option<ReservationInstance>>;

    async fn instances_for_fixed(&self, fixed_id: Ulid) -> StoreResult<Vec<ReservationInstance>>;

    /// Delete every instance linked to `fixed_id` with `date >= from` and
    /// status other than Completed. Returns how many rows went away.
    async fn purge_instances(&self, fixed_id: Ulid, from: NaiveDate) -> StoreResult<usize>;

    /// Bulk conditional update: apply `patch` to every instance linked to
    /// `fixed_id` with `date >= from` and status outside
    /// {Completed, Cancelled}. Returns how many rows changed.
    async fn reprice_instances(
        &self,
        fixed_id: Ulid,
        from: NaiveDate,
        patch: InstanceReprice,
    ) -> StoreResult<usize>;
}

// ── In-memory implementation ─────────────────────────────────────

/// DashMap-backed store. Stands in for the platform database in tests and
/// single-process deployments.
#[derive(Default)]
pub struct MemoryStore {
    courts: DashMap<Ulid, Court>,
    users: DashMap<Ulid, User>,
    complexes: DashMap<Ulid, Complex>,
    rates: DashMap<Ulid, Rate>,
    promotions: DashMap<Ulid, Promotion>,
    schedule_days: DashMap<Ulid, ScheduleDay>,
    fixed: DashMap<Ulid, FixedReservation>,
    instances: DashMap<Ulid, ReservationInstance>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding ──────────────────────────────────────────────────

    pub fn seed_complex(&self, complex: Complex) {
        self.complexes.insert(complex.id, complex);
    }

    pub fn seed_court(&self, court: Court) {
        self.courts.insert(court.id, court);
    }

    pub fn seed_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn seed_rate(&self, rate: Rate) {
        self.rates.insert(rate.id, rate);
    }

    pub fn seed_promotion(&self, promotion: Promotion) {
        self.promotions.insert(promotion.id, promotion);
    }

    pub fn seed_schedule_day(&self, day: ScheduleDay) {
        self.schedule_days.insert(day.id, day);
    }

    pub fn seed_instance(&self, instance: ReservationInstance) {
        self.instances.insert(instance.id, instance);
    }

    pub fn instance(&self, id: Ulid) -> Option<ReservationInstance> {
        self.instances.get(&id).map(|e| e.value().clone())
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn broken_ref(kind: &str, id: Ulid) -> StoreError {
        StoreError(format!("dangling {kind} reference: {id}"))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn court(&self, id: Ulid) -> StoreResult<Option<Court>> {
        Ok(self.courts.get(&id).map(|e| e.value().clone()))
    }

    async fn user(&self, id: Ulid) -> StoreResult<Option<User>> {
        Ok(self.users.get(&id).map(|e| e.value().clone()))
    }

    async fn complex(&self, id: Ulid) -> StoreResult<Option<Complex>> {
        Ok(self.complexes.get(&id).map(|e| e.value().clone()))
    }

    async fn rate(&self, id: Ulid) -> StoreResult<Option<Rate>> {
        Ok(self.rates.get(&id).map(|e| e.value().clone()))
    }

    async fn promotion(&self, id: Ulid) -> StoreResult<Option<Promotion>> {
        Ok(self.promotions.get(&id).map(|e| e.value().clone()))
    }

    async fn schedule_day(&self, id: Ulid) -> StoreResult<Option<ScheduleDay>> {
        Ok(self.schedule_days.get(&id).map(|e| *e.value()))
    }

    async fn fixed_reservation(&self, id: Ulid) -> StoreResult<Option<FixedReservation>> {
        Ok(self.fixed.get(&id).map(|e| e.value().clone()))
    }

    async fn resolve_fixed_reservation(
        &self,
        id: Ulid,
    ) -> StoreResult<Option<ResolvedFixedReservation>> {
        let Some(fixed) = self.fixed.get(&id).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        let day = self
            .schedule_days
            .get(&fixed.schedule_day_id)
            .map(|e| *e.value())
            .ok_or_else(|| Self::broken_ref("schedule day", fixed.schedule_day_id))?;
        let court = self
            .courts
            .get(&fixed.court_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| Self::broken_ref("court", fixed.court_id))?;
        let rate = self
            .rates
            .get(&fixed.rate_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| Self::broken_ref("rate", fixed.rate_id))?;
        let user = self
            .users
            .get(&fixed.user_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| Self::broken_ref("user", fixed.user_id))?;
        let complex = self
            .complexes
            .get(&fixed.complex_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| Self::broken_ref("complex", fixed.complex_id))?;
        let promotion = match fixed.promotion_id {
            Some(pid) => Some(
                self.promotions
                    .get(&pid)
                    .map(|e| e.value().clone())
                    .ok_or_else(|| Self::broken_ref("promotion", pid))?,
            ),
            None => None,
        };
        Ok(Some(ResolvedFixedReservation {
            weekday: day.day_of_week,
            fixed,
            court,
            rate,
            user,
            complex,
            promotion,
        }))
    }

    async fn fixed_reservations_for_slot(
        &self,
        court_id: Ulid,
        weekday: Weekday,
    ) -> StoreResult<Vec<FixedReservation>> {
        let mut out = Vec::new();
        for entry in self.fixed.iter() {
            let fixed = entry.value();
            if fixed.court_id != court_id {
                continue;
            }
            let day_matches = self
                .schedule_days
                .get(&fixed.schedule_day_id)
                .is_some_and(|d| d.day_of_week == weekday);
            if day_matches {
                out.push(fixed.clone());
            }
        }
        Ok(out)
    }

    async fn list_fixed_reservations(
        &self,
        complex_id: Option<Ulid>,
        weekday: Option<Weekday>,
    ) -> StoreResult<Vec<FixedReservation>> {
        let mut out = Vec::new();
        for entry in self.fixed.iter() {
            let fixed = entry.value();
            if let Some(cid) = complex_id
                && fixed.complex_id != cid
            {
                continue;
            }
            if let Some(day) = weekday {
                let matches = self
                    .schedule_days
                    .get(&fixed.schedule_day_id)
                    .is_some_and(|d| d.day_of_week == day);
                if !matches {
                    continue;
                }
            }
            out.push(fixed.clone());
        }
        out.sort_by_key(|f| f.id);
        Ok(out)
    }

    async fn insert_fixed_reservation(&self, fixed: FixedReservation) -> StoreResult<()> {
        self.fixed.insert(fixed.id, fixed);
        Ok(())
    }

    async fn update_fixed_reservation(&self, fixed: FixedReservation) -> StoreResult<()> {
        self.fixed.insert(fixed.id, fixed);
        Ok(())
    }

    async fn delete_fixed_reservation(&self, id: Ulid) -> StoreResult<bool> {
        Ok(self.fixed.remove(&id).is_some())
    }

    async fn bookings_on(
        &self,
        court_id: Ulid,
        date: NaiveDate,
    ) -> StoreResult<Vec<ReservationInstance>> {
        let mut out: Vec<ReservationInstance> = self
            .instances
            .iter()
            .filter(|e| e.court_id == court_id && e.date == date)
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(|i| i.id);
        Ok(out)
    }

    async fn insert_instance(&self, instance: ReservationInstance) -> StoreResult<()> {
        self.instances.insert(instance.id, instance);
        Ok(())
    }

    async fn find_materialized_instance(
        &self,
        fixed_id: Ulid,
        date: NaiveDate,
        schedule: &str,
        court_id: Ulid,
    ) -> StoreResult<Option<ReservationInstance>> {
        Ok(self
            .instances
            .iter()
            .find(|e| {
                e.fixed_reservation_id == Some(fixed_id)
                    && e.date == date
                    && e.schedule == schedule
                    && e.court_id == court_id
            })
            .map(|e| e.value().clone()))
    }

    async fn instances_for_fixed(&self, fixed_id: Ulid) -> StoreResult<Vec<ReservationInstance>> {
        let mut out: Vec<ReservationInstance> = self
            .instances
            .iter()
            .filter(|e| e.fixed_reservation_id == Some(fixed_id))
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(|i| i.date);
        Ok(out)
    }

    async fn purge_instances(&self, fixed_id: Ulid, from: NaiveDate) -> StoreResult<usize> {
        let doomed: Vec<Ulid> = self
            .instances
            .iter()
            .filter(|e| {
                e.fixed_reservation_id == Some(fixed_id)
                    && e.date >= from
                    && e.status != InstanceStatus::Completed
            })
            .map(|e| *e.key())
            .collect();
        for id in &doomed {
            self.instances.remove(id);
        }
        Ok(doomed.len())
    }

    async fn reprice_instances(
        &self,
        fixed_id: Ulid,
        from: NaiveDate,
        patch: InstanceReprice,
    ) -> StoreResult<usize> {
        let mut changed = 0;
        for mut entry in self.instances.iter_mut() {
            let instance = entry.value_mut();
            if instance.fixed_reservation_id != Some(fixed_id)
                || instance.date < from
                || matches!(
                    instance.status,
                    InstanceStatus::Completed | InstanceStatus::Cancelled
                )
            {
                continue;
            }
            instance.schedule = patch.schedule.clone();
            instance.price = patch.price;
            instance.court_id = patch.court_id;
            instance.user_id = patch.user_id;
            instance.client_name = patch.client_name.clone();
            changed += 1;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instance(
        fixed_id: Ulid,
        court_id: Ulid,
        on: NaiveDate,
        status: InstanceStatus,
    ) -> ReservationInstance {
        ReservationInstance {
            id: Ulid::new(),
            date: on,
            schedule: "18:00 - 19:00".into(),
            price: 80.0,
            reservation_amount: 0.0,
            status,
            kind: ReservationKind::Fixed,
            court_id,
            user_id: Ulid::new(),
            complex_id: Ulid::new(),
            promotion_id: None,
            fixed_reservation_id: Some(fixed_id),
            client_name: "Marta Vela".into(),
        }
    }

    #[tokio::test]
    async fn purge_respects_date_and_status_bounds() {
        let store = MemoryStore::new();
        let fixed_id = Ulid::new();
        let court_id = Ulid::new();
        let today = date(2026, 8, 10);

        store.seed_instance(instance(fixed_id, court_id, date(2026, 8, 3), InstanceStatus::Completed));
        store.seed_instance(instance(fixed_id, court_id, date(2026, 8, 3), InstanceStatus::Pending));
        store.seed_instance(instance(fixed_id, court_id, today, InstanceStatus::Pending));
        store.seed_instance(instance(fixed_id, court_id, date(2026, 8, 17), InstanceStatus::Approved));
        store.seed_instance(instance(fixed_id, court_id, date(2026, 8, 17), InstanceStatus::Completed));
        // Unlinked row on the same court is never touched.
        store.seed_instance(instance(Ulid::new(), court_id, date(2026, 8, 17), InstanceStatus::Pending));

        let purged = store.purge_instances(fixed_id, today).await.unwrap();
        assert_eq!(purged, 2);
        assert_eq!(store.instance_count(), 4);
    }

    #[tokio::test]
    async fn reprice_skips_completed_and_cancelled() {
        let store = MemoryStore::new();
        let fixed_id = Ulid::new();
        let court_id = Ulid::new();
        let user_id = Ulid::new();
        let today = date(2026, 8, 10);

        let pending = instance(fixed_id, court_id, date(2026, 8, 17), InstanceStatus::Pending);
        let cancelled = instance(fixed_id, court_id, date(2026, 8, 17), InstanceStatus::Cancelled);
        let past = instance(fixed_id, court_id, date(2026, 8, 3), InstanceStatus::Pending);
        let pending_id = pending.id;
        let cancelled_id = cancelled.id;
        let past_id = past.id;
        store.seed_instance(pending);
        store.seed_instance(cancelled);
        store.seed_instance(past);

        let changed = store
            .reprice_instances(
                fixed_id,
                today,
                InstanceReprice {
                    schedule: "19:00 - 21:00".into(),
                    price: 160.0,
                    court_id,
                    user_id,
                    client_name: "Marta Vela".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(changed, 1);
        let repriced = store.instance(pending_id).unwrap();
        assert_eq!(repriced.price, 160.0);
        assert_eq!(repriced.schedule, "19:00 - 21:00");
        assert_eq!(store.instance(cancelled_id).unwrap().price, 80.0);
        assert_eq!(store.instance(past_id).unwrap().price, 80.0);
    }

    #[tokio::test]
    async fn resolve_reports_broken_reference() {
        let store = MemoryStore::new();
        let fixed = FixedReservation {
            id: Ulid::new(),
            range: TimeRange::parse("18:00", "19:00").unwrap(),
            is_active: true,
            schedule_day_id: Ulid::new(),
            court_id: Ulid::new(),
            rate_id: Ulid::new(),
            user_id: Ulid::new(),
            complex_id: Ulid::new(),
            promotion_id: None,
        };
        let id = fixed.id;
        store.insert_fixed_reservation(fixed).await.unwrap();
        let err = store.resolve_fixed_reservation(id).await.unwrap_err();
        assert!(err.0.contains("schedule day"));
    }
}
