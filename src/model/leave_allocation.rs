use chrono::{DateTime, Utc};

/// Remaining leave days of one employee for one leave type in one period.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LeaveAllocation {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub number_of_days: i32,
    /// Calendar year the balance belongs to.
    pub period: i32,
    pub date_created: DateTime<Utc>,
    /// Optimistic concurrency token, bumped on every write.
    pub version: u64,
}

impl LeaveAllocation {
    pub fn new(employee_id: u64, leave_type_id: u64, number_of_days: i32, period: i32) -> Self {
        Self {
            id: 0,
            employee_id,
            leave_type_id,
            number_of_days,
            period,
            date_created: Utc::now(),
            version: 0,
        }
    }

    pub fn covers(&self, days: i64) -> bool {
        days <= i64::from(self.number_of_days)
    }

    /// Subtracts `days` from the balance. Returns `false` and leaves the
    /// allocation untouched when that would drive the balance negative.
    pub fn debit(&mut self, days: i64) -> bool {
        if days < 0 || !self.covers(days) {
            return false;
        }
        // covers() bounds days by number_of_days, so the cast cannot truncate
        self.number_of_days -= days as i32;
        self.version += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_decrements_and_bumps_version() {
        let mut allocation = LeaveAllocation::new(1, 1, 10, 2024);
        assert!(allocation.debit(4));
        assert_eq!(allocation.number_of_days, 6);
        assert_eq!(allocation.version, 1);
    }

    #[test]
    fn debit_never_goes_negative() {
        let mut allocation = LeaveAllocation::new(1, 1, 6, 2024);
        assert!(!allocation.debit(8));
        assert_eq!(allocation.number_of_days, 6);
        assert_eq!(allocation.version, 0);

        assert!(allocation.debit(6));
        assert_eq!(allocation.number_of_days, 0);
    }

    #[test]
    fn zero_day_requests_are_covered_by_an_empty_balance() {
        let allocation = LeaveAllocation::new(1, 1, 0, 2024);
        assert!(allocation.covers(0));
        assert!(!allocation.covers(1));
    }
}
