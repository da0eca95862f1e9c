use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaveRequest {
    pub id: u64,
    pub requesting_employee_id: u64,
    pub leave_type_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub comments: Option<String>,
    pub status: ApprovalStatus,
    pub actioned_by_id: Option<u64>,
    pub cancelled: bool,
    pub date_requested: DateTime<Utc>,
    pub date_actioned: Option<DateTime<Utc>>,
}

/// Whole days between the two dates. A start after the end is rejected.
pub fn requested_days(start_date: NaiveDate, end_date: NaiveDate) -> Result<i64, AppError> {
    if start_date > end_date {
        return Err(AppError::InvalidDateRange);
    }
    Ok((end_date - start_date).num_days())
}

impl LeaveRequest {
    pub fn new(
        requesting_employee_id: u64,
        leave_type_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        comments: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            requesting_employee_id,
            leave_type_id,
            start_date,
            end_date,
            comments,
            status: ApprovalStatus::Pending,
            actioned_by_id: None,
            cancelled: false,
            date_requested: Utc::now(),
            date_actioned: None,
        }
    }

    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// The allocation period this request draws from.
    pub fn period(&self) -> i32 {
        self.start_date.year()
    }

    pub fn is_owned_by(&self, employee_id: u64) -> bool {
        self.requesting_employee_id == employee_id
    }

    /// Only a pending, non-cancelled request may be approved or rejected.
    pub fn ensure_actionable(&self) -> Result<(), AppError> {
        if self.cancelled {
            return Err(AppError::Cancelled);
        }
        if self.status != ApprovalStatus::Pending {
            return Err(AppError::AlreadyActioned);
        }
        Ok(())
    }

    pub fn approve(&mut self, actioned_by_id: u64, at: DateTime<Utc>) {
        self.status = ApprovalStatus::Approved;
        self.actioned_by_id = Some(actioned_by_id);
        self.date_actioned = Some(at);
    }

    pub fn reject(&mut self, actioned_by_id: u64, at: DateTime<Utc>) {
        self.status = ApprovalStatus::Rejected;
        self.actioned_by_id = Some(actioned_by_id);
        self.date_actioned = Some(at);
    }
}
