use chrono::{NaiveDate, Utc};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::mapper::{AdminDashboard, LeaveRequestView, MyLeave};
use crate::model::{
    leave_allocation::LeaveAllocation,
    leave_request::{LeaveRequest, requested_days},
    leave_type::LeaveType,
};
use crate::repository::{ApprovalCommit, Entity, Store};
use crate::service::{load_lookup, lookup_for};

const MAX_COMMENT_LEN: usize = 500;

#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub leave_type_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub comments: Option<String>,
}

/// Submission, approval, rejection and cancellation of leave requests.
pub struct LeaveRequestService<'a> {
    store: &'a Store,
}

impl<'a> LeaveRequestService<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub async fn find(&self, request_id: u64) -> Result<LeaveRequest, AppError> {
        self.store
            .requests
            .find_by_id(request_id)
            .await?
            .ok_or(AppError::NotFound(LeaveRequest::NAME))
    }

    pub async fn view(&self, request: LeaveRequest) -> Result<LeaveRequestView, AppError> {
        let lookup =
            lookup_for(self.store, request.leave_type_id, request.requesting_employee_id).await?;
        Ok(lookup.request(request))
    }

    /// Every request with counts per status.
    pub async fn dashboard(&self) -> Result<AdminDashboard, AppError> {
        let lookup = load_lookup(self.store).await?;
        let requests = self.store.requests.find_all().await?;
        Ok(AdminDashboard::new(
            requests.into_iter().map(|r| lookup.request(r)).collect(),
        ))
    }

    pub async fn my_leave(&self, employee_id: u64) -> Result<MyLeave, AppError> {
        let lookup = load_lookup(self.store).await?;
        let allocations = self.store.allocations.find_by_employee(employee_id).await?;
        let requests = self.store.requests.find_by_employee(employee_id).await?;

        Ok(MyLeave {
            leave_allocations: allocations
                .into_iter()
                .map(|a| lookup.allocation(a))
                .collect(),
            leave_requests: requests.into_iter().map(|r| lookup.request(r)).collect(),
        })
    }

    async fn allocation_for(&self, request: &LeaveRequest) -> Result<LeaveAllocation, AppError> {
        self.store
            .allocations
            .find_for(
                request.requesting_employee_id,
                request.leave_type_id,
                request.period(),
            )
            .await?
            .ok_or(AppError::NotFound(LeaveAllocation::NAME))
    }

    #[instrument(
        name = "leave_create",
        skip(self, input),
        fields(leave_type_id = input.leave_type_id)
    )]
    pub async fn create(
        &self,
        employee_id: u64,
        input: NewLeaveRequest,
    ) -> Result<LeaveRequest, AppError> {
        let days = requested_days(input.start_date, input.end_date)?;

        let comments = input
            .comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if comments.as_ref().is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN) {
            return Err(AppError::Validation(format!(
                "Comments may not exceed {} characters",
                MAX_COMMENT_LEN
            )));
        }

        self.store
            .leave_types
            .find_by_id(input.leave_type_id)
            .await?
            .ok_or(AppError::NotFound(LeaveType::NAME))?;

        let request = LeaveRequest::new(
            employee_id,
            input.leave_type_id,
            input.start_date,
            input.end_date,
            comments,
        );

        let allocation = self.allocation_for(&request).await?;
        if !allocation.covers(days) {
            info!(
                employee_id,
                requested = days,
                available = allocation.number_of_days,
                "Leave request exceeds allocation"
            );
            return Err(AppError::InsufficientAllocation {
                requested: days,
                available: allocation.number_of_days,
            });
        }

        let created = self.store.requests.create(request).await?;
        info!(leave_id = created.id, employee_id, days, "Leave request submitted");
        Ok(created)
    }

    #[instrument(name = "leave_approve", skip(self))]
    pub async fn approve(&self, request_id: u64, admin_id: u64) -> Result<LeaveRequest, AppError> {
        let mut request = self.find(request_id).await?;
        request.ensure_actionable()?;

        let days = request.day_count();
        let allocation = self.allocation_for(&request).await?;
        if !allocation.covers(days) {
            return Err(AppError::InsufficientAllocation {
                requested: days,
                available: allocation.number_of_days,
            });
        }

        let now = Utc::now();
        self.store
            .requests
            .commit_approval(&ApprovalCommit {
                request_id,
                allocation_id: allocation.id,
                allocation_version: allocation.version,
                days,
                actioned_by_id: admin_id,
                actioned_at: now,
            })
            .await?;

        request.approve(admin_id, now);
        info!(
            allocation_id = allocation.id,
            days,
            remaining = allocation.number_of_days - days as i32,
            "Leave request approved"
        );
        Ok(request)
    }

    #[instrument(name = "leave_reject", skip(self))]
    pub async fn reject(&self, request_id: u64, admin_id: u64) -> Result<LeaveRequest, AppError> {
        let mut request = self.find(request_id).await?;
        request.ensure_actionable()?;

        let now = Utc::now();
        if !self
            .store
            .requests
            .record_rejection(request_id, admin_id, now)
            .await?
        {
            warn!("Leave request changed state before rejection");
            return Err(AppError::Conflict(LeaveRequest::NAME));
        }

        request.reject(admin_id, now);
        info!("Leave request rejected");
        Ok(request)
    }

    /// Cancelling does not return days already drawn by an approval.
    #[instrument(name = "leave_cancel", skip(self))]
    pub async fn cancel(&self, request_id: u64, owner_id: u64) -> Result<LeaveRequest, AppError> {
        let mut request = self.find(request_id).await?;
        if !request.is_owned_by(owner_id) {
            return Err(AppError::Forbidden(
                "Only the requesting employee may cancel a leave request",
            ));
        }
        if request.cancelled {
            return Ok(request);
        }

        if !self.store.requests.mark_cancelled(request_id).await? {
            return Err(AppError::PersistenceFailure(LeaveRequest::NAME));
        }

        request.cancelled = true;
        info!(status = request.status.as_ref(), "Leave request cancelled");
        Ok(request)
    }
}
