use chrono::{Datelike, Utc};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::mapper::LeaveAllocationView;
use crate::model::{employee::Employee, leave_allocation::LeaveAllocation, leave_type::LeaveType};
use crate::repository::{Entity, Store};
use crate::service::{load_lookup, lookup_for};

#[derive(Debug, Clone)]
pub struct ProvisionAllocation {
    pub employee_id: u64,
    pub leave_type_id: u64,
    /// Falls back to the leave type's default.
    pub number_of_days: Option<i32>,
    /// Falls back to the current year.
    pub period: Option<i32>,
}

fn ensure_non_negative(number_of_days: i32) -> Result<(), AppError> {
    if number_of_days < 0 {
        return Err(AppError::Validation(
            "number_of_days may not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Administrator bookkeeping of allocation balances.
pub struct AllocationService<'a> {
    store: &'a Store,
}

impl<'a> AllocationService<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        employee_id: Option<u64>,
    ) -> Result<Vec<LeaveAllocationView>, AppError> {
        let lookup = load_lookup(self.store).await?;
        let allocations = match employee_id {
            Some(id) => self.store.allocations.find_by_employee(id).await?,
            None => self.store.allocations.find_all().await?,
        };
        Ok(allocations.into_iter().map(|a| lookup.allocation(a)).collect())
    }

    async fn view(&self, allocation: LeaveAllocation) -> Result<LeaveAllocationView, AppError> {
        let lookup =
            lookup_for(self.store, allocation.leave_type_id, allocation.employee_id).await?;
        Ok(lookup.allocation(allocation))
    }

    #[instrument(name = "allocation_provision", skip(self))]
    pub async fn provision(
        &self,
        input: ProvisionAllocation,
    ) -> Result<LeaveAllocationView, AppError> {
        self.store
            .employees
            .find_by_id(input.employee_id)
            .await?
            .ok_or(AppError::NotFound(Employee::NAME))?;
        let leave_type = self
            .store
            .leave_types
            .find_by_id(input.leave_type_id)
            .await?
            .ok_or(AppError::NotFound(LeaveType::NAME))?;

        let number_of_days = input.number_of_days.unwrap_or(leave_type.default_days);
        ensure_non_negative(number_of_days)?;
        let period = input.period.unwrap_or_else(|| Utc::now().year());

        let created = self
            .store
            .allocations
            .create(LeaveAllocation::new(
                input.employee_id,
                input.leave_type_id,
                number_of_days,
                period,
            ))
            .await?;

        info!(allocation_id = created.id, number_of_days, period, "Leave allocation provisioned");
        self.view(created).await
    }

    /// Overwrites a balance. `version` must be the one the caller last read.
    #[instrument(name = "allocation_adjust", skip(self))]
    pub async fn adjust(
        &self,
        allocation_id: u64,
        number_of_days: i32,
        version: u64,
    ) -> Result<LeaveAllocationView, AppError> {
        ensure_non_negative(number_of_days)?;

        let mut allocation = self
            .store
            .allocations
            .find_by_id(allocation_id)
            .await?
            .ok_or(AppError::NotFound(LeaveAllocation::NAME))?;
        allocation.number_of_days = number_of_days;
        allocation.version = version;

        if !self.store.allocations.update(&allocation).await? {
            return Err(AppError::Conflict(LeaveAllocation::NAME));
        }

        let updated = self
            .store
            .allocations
            .find_by_id(allocation_id)
            .await?
            .ok_or(AppError::NotFound(LeaveAllocation::NAME))?;
        info!(number_of_days, "Leave allocation adjusted");
        self.view(updated).await
    }
}
