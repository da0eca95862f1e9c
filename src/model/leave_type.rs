use chrono::{DateTime, Utc};

/// A named category of leave, e.g. "Annual" or "Sick".
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LeaveType {
    pub id: u64,
    pub name: String,
    /// Balance handed out when an allocation is provisioned without an explicit day count.
    pub default_days: i32,
    pub date_created: DateTime<Utc>,
}

impl LeaveType {
    pub fn new(name: &str, default_days: i32) -> Self {
        Self {
            id: 0,
            name: name.trim().to_string(),
            default_days,
            date_created: Utc::now(),
        }
    }
}
