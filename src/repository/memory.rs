//! In-process backend for tests. One mutex guards every table, which gives
//! `commit_approval` the same all-or-nothing behaviour as a transaction.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{AllocationRepository, ApprovalCommit, Entity, LeaveRequestRepository, Repository};
use crate::error::AppError;
use crate::model::{
    employee::Employee,
    leave_allocation::LeaveAllocation,
    leave_request::{ApprovalStatus, LeaveRequest},
    leave_type::LeaveType,
};

#[derive(Default)]
pub struct Tables {
    employees: BTreeMap<u64, Employee>,
    leave_types: BTreeMap<u64, LeaveType>,
    allocations: BTreeMap<u64, LeaveAllocation>,
    requests: BTreeMap<u64, LeaveRequest>,
    next_id: u64,
}

/// Per-entity hooks standing in for the table constraints of the SQL schema.
pub trait Table: Entity {
    fn table(tables: &mut Tables) -> &mut BTreeMap<u64, Self>;

    /// Unique-key check against an existing row.
    fn collides_with(&self, _other: &Self) -> bool {
        false
    }

    /// Applies an update onto the stored row, or refuses it.
    fn apply_update(stored: &mut Self, incoming: &Self) -> bool {
        *stored = incoming.clone();
        true
    }
}

impl Table for Employee {
    fn table(tables: &mut Tables) -> &mut BTreeMap<u64, Self> {
        &mut tables.employees
    }
}

impl Table for LeaveType {
    fn table(tables: &mut Tables) -> &mut BTreeMap<u64, Self> {
        &mut tables.leave_types
    }

    fn collides_with(&self, other: &Self) -> bool {
        self.id != other.id && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Table for LeaveAllocation {
    fn table(tables: &mut Tables) -> &mut BTreeMap<u64, Self> {
        &mut tables.allocations
    }

    fn collides_with(&self, other: &Self) -> bool {
        self.id != other.id
            && self.employee_id == other.employee_id
            && self.leave_type_id == other.leave_type_id
            && self.period == other.period
    }

    fn apply_update(stored: &mut Self, incoming: &Self) -> bool {
        if stored.version != incoming.version {
            return false;
        }
        stored.number_of_days = incoming.number_of_days;
        stored.version += 1;
        true
    }
}

impl Table for LeaveRequest {
    fn table(tables: &mut Tables) -> &mut BTreeMap<u64, Self> {
        &mut tables.requests
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.tables.lock().expect("memory store poisoned");
        f(&mut tables)
    }
}

#[async_trait]
impl<E: Table> Repository<E> for MemoryStore {
    async fn create(&self, mut entity: E) -> Result<E, AppError> {
        self.with_tables(|tables| {
            let rows = E::table(tables);
            if rows.contains_key(&entity.id())
                || rows.values().any(|row| row.collides_with(&entity))
            {
                return Err(AppError::Conflict(E::NAME));
            }
            // an explicit id is kept, like an explicit AUTO_INCREMENT value
            if entity.id() == 0 {
                tables.next_id += 1;
                entity.set_id(tables.next_id);
            } else {
                tables.next_id = tables.next_id.max(entity.id());
            }
            E::table(tables).insert(entity.id(), entity.clone());
            Ok(entity)
        })
    }

    async fn update(&self, entity: &E) -> Result<bool, AppError> {
        self.with_tables(|tables| {
            let rows = E::table(tables);
            if rows.values().any(|row| row.collides_with(entity)) {
                return Err(AppError::Conflict(E::NAME));
            }
            Ok(match rows.get_mut(&entity.id()) {
                Some(stored) => E::apply_update(stored, entity),
                None => false,
            })
        })
    }

    async fn delete(&self, id: u64) -> Result<bool, AppError> {
        Ok(self.with_tables(|tables| E::table(tables).remove(&id).is_some()))
    }

    async fn find_all(&self) -> Result<Vec<E>, AppError> {
        Ok(self.with_tables(|tables| E::table(tables).values().cloned().collect()))
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<E>, AppError> {
        Ok(self.with_tables(|tables| E::table(tables).get(&id).cloned()))
    }
}

#[async_trait]
impl AllocationRepository for MemoryStore {
    async fn find_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveAllocation>, AppError> {
        Ok(self.with_tables(|tables| {
            tables
                .allocations
                .values()
                .filter(|a| a.employee_id == employee_id)
                .cloned()
                .collect()
        }))
    }

    async fn find_for(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        period: i32,
    ) -> Result<Option<LeaveAllocation>, AppError> {
        let found = self.with_tables(|tables| {
            tables
                .allocations
                .values()
                .find(|a| {
                    a.employee_id == employee_id
                        && a.leave_type_id == leave_type_id
                        && a.period == period
                })
                .cloned()
        });
        // Suspend like a database round trip would, so concurrent callers
        // interleave between reading a balance and writing it back.
        actix_web::rt::task::yield_now().await;
        Ok(found)
    }

    async fn any_with_leave_type(&self, leave_type_id: u64) -> Result<bool, AppError> {
        Ok(self.with_tables(|tables| {
            tables.allocations.values().any(|a| a.leave_type_id == leave_type_id)
        }))
    }
}

#[async_trait]
impl LeaveRequestRepository for MemoryStore {
    async fn find_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveRequest>, AppError> {
        Ok(self.with_tables(|tables| {
            tables
                .requests
                .values()
                .filter(|r| r.requesting_employee_id == employee_id)
                .cloned()
                .collect()
        }))
    }

    async fn commit_approval(&self, commit: &ApprovalCommit) -> Result<(), AppError> {
        self.with_tables(|tables| {
            let request_open = tables.requests.get(&commit.request_id).is_some_and(|r| {
                r.status == ApprovalStatus::Pending && !r.cancelled
            });

            let allocation = tables
                .allocations
                .get_mut(&commit.allocation_id)
                .filter(|a| a.version == commit.allocation_version)
                .ok_or(AppError::Conflict(LeaveAllocation::NAME))?;
            if !allocation.covers(commit.days) {
                return Err(AppError::Conflict(LeaveAllocation::NAME));
            }
            if !request_open {
                return Err(AppError::Conflict(LeaveRequest::NAME));
            }
            allocation.debit(commit.days);

            if let Some(request) = tables.requests.get_mut(&commit.request_id) {
                request.approve(commit.actioned_by_id, commit.actioned_at);
            }
            Ok(())
        })
    }

    async fn record_rejection(
        &self,
        request_id: u64,
        actioned_by_id: u64,
        actioned_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        Ok(self.with_tables(|tables| match tables.requests.get_mut(&request_id) {
            Some(r) if r.status == ApprovalStatus::Pending && !r.cancelled => {
                r.reject(actioned_by_id, actioned_at);
                true
            }
            _ => false,
        }))
    }

    async fn mark_cancelled(&self, request_id: u64) -> Result<bool, AppError> {
        Ok(self.with_tables(|tables| match tables.requests.get_mut(&request_id) {
            Some(r) => {
                r.cancelled = true;
                true
            }
            None => false,
        }))
    }

    async fn any_with_leave_type(&self, leave_type_id: u64) -> Result<bool, AppError> {
        Ok(self.with_tables(|tables| {
            tables.requests.values().any(|r| r.leave_type_id == leave_type_id)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seeded(store: &MemoryStore, days: i32) -> (LeaveAllocation, LeaveRequest) {
        let allocation = Repository::<LeaveAllocation>::create(
            store,
            LeaveAllocation::new(7, 1, days, 2024),
        )
        .await
        .unwrap();
        let request = Repository::<LeaveRequest>::create(
            store,
            LeaveRequest::new(7, 1, date(2024, 1, 1), date(2024, 1, 6), None),
        )
        .await
        .unwrap();
        (allocation, request)
    }

    fn commit_for(allocation: &LeaveAllocation, request: &LeaveRequest) -> ApprovalCommit {
        ApprovalCommit {
            request_id: request.id,
            allocation_id: allocation.id,
            allocation_version: allocation.version,
            days: request.day_count(),
            actioned_by_id: 1,
            actioned_at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn crud_contract_round_trip() {
        let store = MemoryStore::default();
        let mut annual = Repository::<LeaveType>::create(&store, LeaveType::new("Annual", 20))
            .await
            .unwrap();
        assert!(annual.id > 0);

        annual.name = "Annual leave".to_string();
        assert!(Repository::<LeaveType>::update(&store, &annual).await.unwrap());

        let all = Repository::<LeaveType>::find_all(&store).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Annual leave");

        assert!(Repository::<LeaveType>::delete(&store, annual.id).await.unwrap());
        assert!(!Repository::<LeaveType>::delete(&store, annual.id).await.unwrap());
        assert!(
            Repository::<LeaveType>::find_by_id(&store, annual.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[actix_web::test]
    async fn duplicate_leave_type_names_conflict() {
        let store = MemoryStore::default();
        Repository::<LeaveType>::create(&store, LeaveType::new("Sick", 5))
            .await
            .unwrap();
        let err = Repository::<LeaveType>::create(&store, LeaveType::new("sick", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict("Leave type")));
    }

    #[actix_web::test]
    async fn allocation_update_is_optimistic() {
        let store = MemoryStore::default();
        let (allocation, _) = seeded(&store, 10).await;

        let mut first = allocation.clone();
        first.number_of_days = 12;
        assert!(Repository::<LeaveAllocation>::update(&store, &first).await.unwrap());

        let mut stale = allocation.clone();
        stale.number_of_days = 3;
        assert!(!Repository::<LeaveAllocation>::update(&store, &stale).await.unwrap());

        let stored = Repository::<LeaveAllocation>::find_by_id(&store, allocation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.number_of_days, 12);
        assert_eq!(stored.version, 1);
    }

    #[actix_web::test]
    async fn stale_approval_commit_changes_nothing() {
        let store = MemoryStore::default();
        let (allocation, request) = seeded(&store, 6).await;
        let second = Repository::<LeaveRequest>::create(
            &store,
            LeaveRequest::new(7, 1, date(2024, 2, 1), date(2024, 2, 6), None),
        )
        .await
        .unwrap();

        store
            .commit_approval(&commit_for(&allocation, &request))
            .await
            .unwrap();
        let err = store
            .commit_approval(&commit_for(&allocation, &second))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict("Leave allocation")));

        let stored = store.find_for(7, 1, 2024).await.unwrap().unwrap();
        assert_eq!(stored.number_of_days, 1);
        let untouched = Repository::<LeaveRequest>::find_by_id(&store, second.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.status, ApprovalStatus::Pending);
    }

    #[actix_web::test]
    async fn approval_commit_refuses_cancelled_request() {
        let store = MemoryStore::default();
        let (allocation, request) = seeded(&store, 10).await;
        assert!(store.mark_cancelled(request.id).await.unwrap());

        let err = store
            .commit_approval(&commit_for(&allocation, &request))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict("Leave request")));

        let stored = store.find_for(7, 1, 2024).await.unwrap().unwrap();
        assert_eq!(stored.number_of_days, 10);
        assert_eq!(stored.version, 0);
    }

    #[actix_web::test]
    async fn rejection_only_applies_to_pending_requests() {
        let store = MemoryStore::default();
        let (_, request) = seeded(&store, 10).await;

        assert!(store.record_rejection(request.id, 1, Utc::now()).await.unwrap());
        assert!(!store.record_rejection(request.id, 1, Utc::now()).await.unwrap());
        assert!(!store.record_rejection(999, 1, Utc::now()).await.unwrap());
    }

    #[actix_web::test]
    async fn leave_type_references_are_found_per_table() {
        let store = MemoryStore::default();
        let (allocation, _) = seeded(&store, 10).await;

        assert!(AllocationRepository::any_with_leave_type(&store, 1).await.unwrap());
        assert!(LeaveRequestRepository::any_with_leave_type(&store, 1).await.unwrap());
        assert!(!AllocationRepository::any_with_leave_type(&store, 2).await.unwrap());

        assert!(Repository::<LeaveAllocation>::delete(&store, allocation.id).await.unwrap());
        assert!(!AllocationRepository::any_with_leave_type(&store, 1).await.unwrap());
        assert!(LeaveRequestRepository::any_with_leave_type(&store, 1).await.unwrap());
    }
}
