//! Persistence adapters.
//!
//! Every entity goes through the same `Repository<E>` contract. The two
//! entities with extra queries extend it; nothing in here applies business
//! rules beyond the guards that keep concurrent writes honest.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::error::AppError;
use crate::model::{
    employee::Employee, leave_allocation::LeaveAllocation, leave_request::LeaveRequest,
    leave_type::LeaveType,
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub trait Entity: Clone + Send + Sync + 'static {
    /// Human readable name used in error messages.
    const NAME: &'static str;

    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
}

macro_rules! impl_entity {
    ($ty:ty, $name:literal) => {
        impl Entity for $ty {
            const NAME: &'static str = $name;

            fn id(&self) -> u64 {
                self.id
            }

            fn set_id(&mut self, id: u64) {
                self.id = id;
            }
        }
    };
}

impl_entity!(Employee, "Employee");
impl_entity!(LeaveType, "Leave type");
impl_entity!(LeaveAllocation, "Leave allocation");
impl_entity!(LeaveRequest, "Leave request");

#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Inserts the entity and returns it with its assigned id.
    async fn create(&self, entity: E) -> Result<E, AppError>;

    /// Returns `false` when no row was changed.
    async fn update(&self, entity: &E) -> Result<bool, AppError>;

    async fn delete(&self, id: u64) -> Result<bool, AppError>;

    async fn find_all(&self) -> Result<Vec<E>, AppError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<E>, AppError>;
}

/// `update` on allocations is optimistic: it only applies when the stored
/// version equals the entity's version, and bumps it.
#[async_trait]
pub trait AllocationRepository: Repository<LeaveAllocation> {
    async fn find_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveAllocation>, AppError>;

    async fn find_for(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        period: i32,
    ) -> Result<Option<LeaveAllocation>, AppError>;

    async fn any_with_leave_type(&self, leave_type_id: u64) -> Result<bool, AppError>;
}

/// Everything an approval writes, applied as one unit.
#[derive(Debug, Clone)]
pub struct ApprovalCommit {
    pub request_id: u64,
    pub allocation_id: u64,
    /// Version the caller read; the debit is refused if it moved.
    pub allocation_version: u64,
    pub days: i64,
    pub actioned_by_id: u64,
    pub actioned_at: DateTime<Utc>,
}

#[async_trait]
pub trait LeaveRequestRepository: Repository<LeaveRequest> {
    async fn find_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveRequest>, AppError>;

    /// Debits the allocation and marks the request approved, or changes
    /// nothing and returns `AppError::Conflict`.
    async fn commit_approval(&self, commit: &ApprovalCommit) -> Result<(), AppError>;

    /// Marks a pending, non-cancelled request rejected. Returns `false` if
    /// the request was no longer in that state.
    async fn record_rejection(
        &self,
        request_id: u64,
        actioned_by_id: u64,
        actioned_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    async fn mark_cancelled(&self, request_id: u64) -> Result<bool, AppError>;

    async fn any_with_leave_type(&self, leave_type_id: u64) -> Result<bool, AppError>;
}

/// The set of repositories handed to services and handlers.
#[derive(Clone)]
pub struct Store {
    pub employees: Arc<dyn Repository<Employee>>,
    pub leave_types: Arc<dyn Repository<LeaveType>>,
    pub allocations: Arc<dyn AllocationRepository>,
    pub requests: Arc<dyn LeaveRequestRepository>,
}

impl Store {
    pub fn mysql(pool: MySqlPool) -> Self {
        let db = Arc::new(mysql::MySqlStore::new(pool));
        Self {
            employees: db.clone(),
            leave_types: db.clone(),
            allocations: db.clone(),
            requests: db,
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> (Self, Arc<memory::MemoryStore>) {
        let db = Arc::new(memory::MemoryStore::default());
        let store = Self {
            employees: db.clone(),
            leave_types: db.clone(),
            allocations: db.clone(),
            requests: db.clone(),
        };
        (store, db)
    }
}
