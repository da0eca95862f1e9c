//! Field-to-field conversions between stored rows, domain entities and the
//! JSON shapes the API returns.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::{
    employee::Employee,
    leave_allocation::LeaveAllocation,
    leave_request::{ApprovalStatus, LeaveRequest},
    leave_type::LeaveType,
};

/// `leave_requests` row as MySQL returns it; the status column is text.
#[derive(sqlx::FromRow)]
pub struct LeaveRequestRow {
    pub id: u64,
    pub requesting_employee_id: u64,
    pub leave_type_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub comments: Option<String>,
    pub approval: String,
    pub actioned_by_id: Option<u64>,
    pub cancelled: bool,
    pub date_requested: DateTime<Utc>,
    pub date_actioned: Option<DateTime<Utc>>,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = AppError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        let status = ApprovalStatus::from_str(&row.approval).map_err(|_| AppError::InvalidRow {
            entity: "Leave request",
            reason: format!("unknown approval status {:?} on id {}", row.approval, row.id),
        })?;

        Ok(LeaveRequest {
            id: row.id,
            requesting_employee_id: row.requesting_employee_id,
            leave_type_id: row.leave_type_id,
            start_date: row.start_date,
            end_date: row.end_date,
            comments: row.comments,
            status,
            actioned_by_id: row.actioned_by_id,
            cancelled: row.cancelled,
            date_requested: row.date_requested,
            date_actioned: row.date_actioned,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveTypeView {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Annual")]
    pub name: String,
    #[schema(example = 20)]
    pub default_days: i32,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub date_created: DateTime<Utc>,
}

impl From<LeaveType> for LeaveTypeView {
    fn from(leave_type: LeaveType) -> Self {
        Self {
            id: leave_type.id,
            name: leave_type.name,
            default_days: leave_type.default_days,
            date_created: leave_type.date_created,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveAllocationView {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "Annual", nullable = true)]
    pub leave_type_name: Option<String>,
    /// remaining days
    #[schema(example = 10)]
    pub number_of_days: i32,
    #[schema(example = 2026)]
    pub period: i32,
    /// send this back when adjusting the balance
    #[schema(example = 0)]
    pub version: u64,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveRequestView {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub requesting_employee_id: u64,
    #[schema(example = "John Doe", nullable = true)]
    pub requesting_employee_name: Option<String>,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "Annual", nullable = true)]
    pub leave_type_name: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 4)]
    pub days_requested: i64,
    #[schema(example = "Family trip", nullable = true)]
    pub comments: Option<String>,
    pub status: ApprovalStatus,
    #[schema(example = false)]
    pub cancelled: bool,
    #[schema(example = 1, nullable = true)]
    pub actioned_by_id: Option<u64>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub date_requested: DateTime<Utc>,
    #[schema(example = "2026-01-02T00:00:00Z", format = "date-time", value_type = Option<String>)]
    pub date_actioned: Option<DateTime<Utc>>,
}

/// Name lookups used to decorate views.
#[derive(Default)]
pub struct Lookup {
    leave_types: HashMap<u64, String>,
    employees: HashMap<u64, String>,
}

impl Lookup {
    pub fn new(leave_types: &[LeaveType], employees: &[Employee]) -> Self {
        Self {
            leave_types: leave_types
                .iter()
                .map(|t| (t.id, t.name.clone()))
                .collect(),
            employees: employees.iter().map(|e| (e.id, e.full_name())).collect(),
        }
    }

    pub fn request(&self, request: LeaveRequest) -> LeaveRequestView {
        LeaveRequestView {
            id: request.id,
            requesting_employee_id: request.requesting_employee_id,
            requesting_employee_name: self.employees.get(&request.requesting_employee_id).cloned(),
            leave_type_id: request.leave_type_id,
            leave_type_name: self.leave_types.get(&request.leave_type_id).cloned(),
            days_requested: request.day_count(),
            start_date: request.start_date,
            end_date: request.end_date,
            comments: request.comments,
            status: request.status,
            cancelled: request.cancelled,
            actioned_by_id: request.actioned_by_id,
            date_requested: request.date_requested,
            date_actioned: request.date_actioned,
        }
    }

    pub fn allocation(&self, allocation: LeaveAllocation) -> LeaveAllocationView {
        LeaveAllocationView {
            id: allocation.id,
            employee_id: allocation.employee_id,
            leave_type_id: allocation.leave_type_id,
            leave_type_name: self.leave_types.get(&allocation.leave_type_id).cloned(),
            number_of_days: allocation.number_of_days,
            period: allocation.period,
            version: allocation.version,
            date_created: allocation.date_created,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboard {
    #[schema(example = 12)]
    pub total_requests: usize,
    #[schema(example = 7)]
    pub approved_requests: usize,
    #[schema(example = 3)]
    pub pending_requests: usize,
    #[schema(example = 2)]
    pub rejected_requests: usize,
    /// counted independently of the approval status
    #[schema(example = 1)]
    pub cancelled_requests: usize,
    pub leave_requests: Vec<LeaveRequestView>,
}

impl AdminDashboard {
    pub fn new(leave_requests: Vec<LeaveRequestView>) -> Self {
        let count = |status: ApprovalStatus| {
            leave_requests
                .iter()
                .filter(|r| r.status == status)
                .count()
        };

        Self {
            total_requests: leave_requests.len(),
            approved_requests: count(ApprovalStatus::Approved),
            pending_requests: count(ApprovalStatus::Pending),
            rejected_requests: count(ApprovalStatus::Rejected),
            cancelled_requests: leave_requests.iter().filter(|r| r.cancelled).count(),
            leave_requests,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyLeave {
    pub leave_allocations: Vec<LeaveAllocationView>,
    pub leave_requests: Vec<LeaveRequestView>,
}
