use chrono::NaiveDate;
use tracing::debug;

use crate::model::{Account, APPROVED_ONLY, TimeSlot};
use crate::store::BookingStore;

use super::conflict::account_conflict;
use super::ScheduleError;

/// Rank candidates: higher declared capacity first, so high-capacity
/// accounts absorb load by default. Id ascending breaks ties to keep
/// allocation deterministic. Declared capacity is a ranking hint only —
/// the actual guarantee is no time-overlap per account.
pub fn rank_candidates(mut candidates: Vec<Account>) -> Vec<Account> {
    candidates.retain(|a| a.is_active());
    candidates.sort_by(|a, b| {
        b.max_concurrent
            .cmp(&a.max_concurrent)
            .then(a.id.cmp(&b.id))
    });
    candidates
}

/// Pick the first ranked active account with no approved booking
/// overlapping the window. `Ok(None)` is the normal none-available
/// outcome; the coordinator decides what to do with it. Selection never
/// mutates state.
pub async fn allocate(
    store: &dyn BookingStore,
    candidates: Vec<Account>,
    date: NaiveDate,
    slot: TimeSlot,
) -> Result<Option<Account>, ScheduleError> {
    let ranked = rank_candidates(candidates);
    if ranked.is_empty() {
        return Ok(None);
    }

    let existing = store
        .find_overlapping(date, slot, APPROVED_ONLY, None)
        .await
        .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;

    let mut probes = 0u32;
    for account in ranked {
        probes += 1;
        if account_conflict(&existing, account.id, &slot, None).is_none() {
            debug!(account = %account.id, probes, "allocated account");
            metrics::histogram!(crate::observability::ALLOCATION_PROBES).record(probes as f64);
            return Ok(Some(account));
        }
    }

    metrics::histogram!(crate::observability::ALLOCATION_PROBES).record(probes as f64);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountStatus, Booking, BookingRequest, BookingStatus};
    use crate::store::MemoryStore;
    use chrono::NaiveTime;
    use ulid::Ulid;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(s: (u32, u32), e: (u32, u32)) -> TimeSlot {
        TimeSlot::new(t(s.0, s.1), t(e.0, e.1))
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn account(max_concurrent: u32, status: AccountStatus) -> Account {
        Account {
            id: Ulid::new(),
            status,
            max_concurrent,
        }
    }

    async fn approved_on(store: &MemoryStore, account: Ulid, date: NaiveDate, sl: TimeSlot) {
        let mut b = Booking::pending(
            Ulid::new(),
            BookingRequest {
                user_id: Ulid::new(),
                department_id: Ulid::new(),
                date,
                slot: sl,
                room_id: None,
                series_id: None,
                external_occurrence_id: None,
                external_series_id: None,
            },
        );
        b.status = BookingStatus::Approved;
        b.account_id = Some(account);
        store.insert(b).await.unwrap();
    }

    #[test]
    fn ranking_prefers_capacity_then_id() {
        let small = account(1, AccountStatus::Active);
        let big = account(10, AccountStatus::Active);
        let inactive = account(100, AccountStatus::Inactive);
        let ranked = rank_candidates(vec![small.clone(), inactive, big.clone()]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, big.id);
        assert_eq!(ranked[1].id, small.id);
    }

    #[test]
    fn equal_capacity_ties_break_by_id() {
        let a = account(5, AccountStatus::Active);
        let b = account(5, AccountStatus::Active);
        let lo = if a.id < b.id { a.id } else { b.id };
        let ranked = rank_candidates(vec![a, b]);
        assert_eq!(ranked[0].id, lo);
    }

    #[tokio::test]
    async fn empty_pool_returns_none() {
        let store = MemoryStore::new();
        let got = allocate(&store, vec![], d(2025, 6, 10), slot((9, 0), (10, 0)))
            .await
            .unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn busy_account_skipped_for_free_one() {
        let store = MemoryStore::new();
        let p1 = account(10, AccountStatus::Active);
        let p2 = account(1, AccountStatus::Active);
        approved_on(&store, p1.id, d(2025, 6, 10), slot((9, 0), (10, 0))).await;

        // P1 ranks first but is busy 09:00–10:00; 09:30–10:30 must land on P2.
        let got = allocate(
            &store,
            vec![p1.clone(), p2.clone()],
            d(2025, 6, 10),
            slot((9, 30), (10, 30)),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(got.id, p2.id);
    }

    #[tokio::test]
    async fn back_to_back_reuses_top_account() {
        let store = MemoryStore::new();
        let p1 = account(10, AccountStatus::Active);
        let p2 = account(1, AccountStatus::Active);
        approved_on(&store, p1.id, d(2025, 6, 10), slot((9, 0), (10, 0))).await;

        let got = allocate(
            &store,
            vec![p1.clone(), p2],
            d(2025, 6, 10),
            slot((10, 0), (11, 0)),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(got.id, p1.id);
    }

    #[tokio::test]
    async fn all_busy_returns_none() {
        let store = MemoryStore::new();
        let p1 = account(10, AccountStatus::Active);
        let p2 = account(5, AccountStatus::Active);
        approved_on(&store, p1.id, d(2025, 6, 10), slot((9, 0), (10, 0))).await;
        approved_on(&store, p2.id, d(2025, 6, 10), slot((9, 0), (10, 0))).await;

        let got = allocate(&store, vec![p1, p2], d(2025, 6, 10), slot((9, 30), (10, 30)))
            .await
            .unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn allocation_is_deterministic() {
        let store = MemoryStore::new();
        let pool = vec![
            account(5, AccountStatus::Active),
            account(5, AccountStatus::Active),
            account(5, AccountStatus::Active),
        ];
        let first = allocate(&store, pool.clone(), d(2025, 6, 10), slot((9, 0), (10, 0)))
            .await
            .unwrap()
            .unwrap();
        for _ in 0..5 {
            let again = allocate(&store, pool.clone(), d(2025, 6, 10), slot((9, 0), (10, 0)))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(again.id, first.id);
        }
    }
}
