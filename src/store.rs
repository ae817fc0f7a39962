use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::{Account, Booking, BookingStatus, Closure, Department, TimeSlot};

/// Failure from the storage collaborator. The scheduler maps this to
/// `ScheduleError::Unavailable`; retry policy belongs to the backend.
#[derive(Debug)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage consumed by the scheduler. Bookings are owned here; departments,
/// accounts and closures are read-mostly reference data owned by the
/// surrounding application.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// All bookings on `date` whose slot overlaps `slot` and whose status is
    /// in `statuses`, minus the excluded id. Same-date scope only —
    /// cross-midnight meetings never reach storage.
    async fn find_overlapping(
        &self,
        date: NaiveDate,
        slot: TimeSlot,
        statuses: &[BookingStatus],
        exclude: Option<Ulid>,
    ) -> StoreResult<Vec<Booking>>;

    /// Approved bookings for the department with dates in
    /// `[week_start, week_end]` inclusive, minus the excluded id.
    async fn count_approved_in_week(
        &self,
        department_id: Ulid,
        week_start: NaiveDate,
        week_end: NaiveDate,
        exclude: Option<Ulid>,
    ) -> StoreResult<u32>;

    async fn department(&self, id: Ulid) -> StoreResult<Option<Department>>;

    async fn list_active_accounts(&self) -> StoreResult<Vec<Account>>;

    async fn list_active_closures(&self) -> StoreResult<Vec<Closure>>;

    async fn get(&self, id: Ulid) -> StoreResult<Option<Booking>>;

    async fn insert(&self, booking: Booking) -> StoreResult<()>;

    async fn update(&self, booking: Booking) -> StoreResult<()>;

    /// External occurrence ids of every stored booking, for import dedup.
    async fn external_occurrence_ids(&self) -> StoreResult<HashSet<String>>;
}

/// Reference in-memory store backed by dashmap, with a per-date index so
/// overlap scans touch only same-date bookings.
pub struct MemoryStore {
    bookings: DashMap<Ulid, Booking>,
    by_date: DashMap<NaiveDate, Vec<Ulid>>,
    departments: DashMap<Ulid, Department>,
    accounts: DashMap<Ulid, Account>,
    closures: DashMap<Ulid, Closure>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            bookings: DashMap::new(),
            by_date: DashMap::new(),
            departments: DashMap::new(),
            accounts: DashMap::new(),
            closures: DashMap::new(),
        }
    }

    // Reference-data seeding. Writes to these sets are the surrounding
    // application's concern; the scheduler only reads them.

    pub fn put_department(&self, department: Department) {
        self.departments.insert(department.id, department);
    }

    pub fn put_account(&self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    pub fn put_closure(&self, closure: Closure) {
        self.closures.insert(closure.id, closure);
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    fn same_date(&self, date: NaiveDate) -> Vec<Booking> {
        let Some(ids) = self.by_date.get(&date) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| self.bookings.get(id).map(|b| b.value().clone()))
            .collect()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_overlapping(
        &self,
        date: NaiveDate,
        slot: TimeSlot,
        statuses: &[BookingStatus],
        exclude: Option<Ulid>,
    ) -> StoreResult<Vec<Booking>> {
        Ok(self
            .same_date(date)
            .into_iter()
            .filter(|b| {
                statuses.contains(&b.status)
                    && exclude != Some(b.id)
                    && b.slot.overlaps(&slot)
            })
            .collect())
    }

    async fn count_approved_in_week(
        &self,
        department_id: Ulid,
        week_start: NaiveDate,
        week_end: NaiveDate,
        exclude: Option<Ulid>,
    ) -> StoreResult<u32> {
        let mut count = 0u32;
        let mut day = week_start;
        while day <= week_end {
            count += self
                .same_date(day)
                .iter()
                .filter(|b| {
                    b.department_id == department_id
                        && b.status == BookingStatus::Approved
                        && exclude != Some(b.id)
                })
                .count() as u32;
            day = day.succ_opt().ok_or_else(|| StoreError("date overflow".into()))?;
        }
        Ok(count)
    }

    async fn department(&self, id: Ulid) -> StoreResult<Option<Department>> {
        Ok(self.departments.get(&id).map(|d| d.value().clone()))
    }

    async fn list_active_accounts(&self) -> StoreResult<Vec<Account>> {
        Ok(self
            .accounts
            .iter()
            .filter(|a| a.is_active())
            .map(|a| a.value().clone())
            .collect())
    }

    async fn list_active_closures(&self) -> StoreResult<Vec<Closure>> {
        Ok(self
            .closures
            .iter()
            .filter(|c| c.active)
            .map(|c| c.value().clone())
            .collect())
    }

    async fn get(&self, id: Ulid) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.get(&id).map(|b| b.value().clone()))
    }

    async fn insert(&self, booking: Booking) -> StoreResult<()> {
        self.by_date.entry(booking.date).or_default().push(booking.id);
        self.bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn update(&self, booking: Booking) -> StoreResult<()> {
        if !self.bookings.contains_key(&booking.id) {
            return Err(StoreError(format!("unknown booking {}", booking.id)));
        }
        // The date never changes after creation, so the by_date index holds.
        self.bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn external_occurrence_ids(&self) -> StoreResult<HashSet<String>> {
        Ok(self
            .bookings
            .iter()
            .filter_map(|b| b.external_occurrence_id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountStatus, BookingRequest, LIVE_STATUSES};
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn request(date: NaiveDate, s: (u32, u32), e: (u32, u32)) -> BookingRequest {
        BookingRequest {
            user_id: Ulid::new(),
            department_id: Ulid::new(),
            date,
            slot: TimeSlot::new(t(s.0, s.1), t(e.0, e.1)),
            room_id: None,
            series_id: None,
            external_occurrence_id: None,
            external_series_id: None,
        }
    }

    #[tokio::test]
    async fn find_overlapping_scoped_to_date() {
        let store = MemoryStore::new();
        store
            .insert(Booking::pending(Ulid::new(), request(d(2025, 6, 10), (9, 0), (10, 0))))
            .await
            .unwrap();
        store
            .insert(Booking::pending(Ulid::new(), request(d(2025, 6, 11), (9, 0), (10, 0))))
            .await
            .unwrap();

        let slot = TimeSlot::new(t(9, 30), t(10, 30));
        let hits = store
            .find_overlapping(d(2025, 6, 10), slot, LIVE_STATUSES, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].date, d(2025, 6, 10));
    }

    #[tokio::test]
    async fn count_approved_in_week_counts_only_approved() {
        let store = MemoryStore::new();
        let dept = Ulid::new();

        let mut approved = Booking::pending(Ulid::new(), request(d(2025, 6, 10), (9, 0), (10, 0)));
        approved.department_id = dept;
        approved.status = BookingStatus::Approved;
        store.insert(approved.clone()).await.unwrap();

        let mut pending = Booking::pending(Ulid::new(), request(d(2025, 6, 12), (9, 0), (10, 0)));
        pending.department_id = dept;
        store.insert(pending).await.unwrap();

        let count = store
            .count_approved_in_week(dept, d(2025, 6, 9), d(2025, 6, 15), None)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let excluded = store
            .count_approved_in_week(dept, d(2025, 6, 9), d(2025, 6, 15), Some(approved.id))
            .await
            .unwrap();
        assert_eq!(excluded, 0);
    }

    #[tokio::test]
    async fn inactive_reference_data_filtered() {
        let store = MemoryStore::new();
        store.put_account(Account {
            id: Ulid::new(),
            status: AccountStatus::Inactive,
            max_concurrent: 10,
        });
        store.put_closure(Closure {
            id: Ulid::new(),
            start_date: d(2025, 7, 1),
            end_date: d(2025, 7, 2),
            active: false,
        });
        assert!(store.list_active_accounts().await.unwrap().is_empty());
        assert!(store.list_active_closures().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_unknown_booking_fails() {
        let store = MemoryStore::new();
        let b = Booking::pending(Ulid::new(), request(d(2025, 6, 10), (9, 0), (10, 0)));
        assert!(store.update(b).await.is_err());
    }

    #[tokio::test]
    async fn external_ids_collected() {
        let store = MemoryStore::new();
        let mut req = request(d(2025, 6, 10), (9, 0), (10, 0));
        req.external_occurrence_id = Some("series#3".into());
        store.insert(Booking::pending(Ulid::new(), req)).await.unwrap();

        let ids = store.external_occurrence_ids().await.unwrap();
        assert!(ids.contains("series#3"));
        assert_eq!(ids.len(), 1);
    }
}
