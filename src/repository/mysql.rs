use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, mysql::MySqlQueryResult};

use super::{AllocationRepository, ApprovalCommit, Entity, LeaveRequestRepository, Repository};
use crate::error::AppError;
use crate::mapper::LeaveRequestRow;
use crate::model::{
    employee::Employee,
    leave_allocation::LeaveAllocation,
    leave_request::{ApprovalStatus, LeaveRequest},
    leave_type::LeaveType,
};

const LEAVE_REQUEST_COLUMNS: &str = r#"
    id, requesting_employee_id, leave_type_id, start_date, end_date, comments,
    approval, actioned_by_id, cancelled, date_requested, date_actioned
"#;

const ALLOCATION_COLUMNS: &str = r#"
    id, employee_id, leave_type_id, number_of_days, `period`, date_created, version
"#;

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Turns an INSERT outcome into the assigned id. Unique-key violations
/// (SQLSTATE 23000) become conflicts.
fn inserted_id<E: Entity>(result: Result<MySqlQueryResult, sqlx::Error>) -> Result<u64, AppError> {
    match result {
        Ok(done) if done.rows_affected() == 0 => Err(AppError::PersistenceFailure(E::NAME)),
        Ok(done) => Ok(done.last_insert_id()),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
            tracing::info!(entity = E::NAME, error = %db_err, "Duplicate row rejected");
            Err(AppError::Conflict(E::NAME))
        }
        Err(e) => Err(e.into()),
    }
}

/// Deletes by id. A row still referenced by a foreign key is a conflict.
async fn delete_row<E: Entity>(pool: &MySqlPool, table: &str, id: u64) -> Result<bool, AppError> {
    let sql = format!("DELETE FROM {} WHERE id = ?", table);
    match sqlx::query(&sql).bind(id).execute(pool).await {
        Ok(done) => Ok(done.rows_affected() > 0),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
            tracing::info!(
                entity = E::NAME,
                id,
                error = %db_err,
                "Delete of referenced row rejected"
            );
            Err(AppError::Conflict(E::NAME))
        }
        Err(e) => Err(e.into()),
    }
}

/// True if `sql` (taking one id parameter) yields at least one row.
async fn row_exists(pool: &MySqlPool, sql: &str, id: u64) -> Result<bool, AppError> {
    let row = sqlx::query(sql).bind(id).fetch_optional(pool).await?;
    Ok(row.is_some())
}

/* =========================
Employees
========================= */
#[async_trait]
impl Repository<Employee> for MySqlStore {
    async fn create(&self, mut entity: Employee) -> Result<Employee, AppError> {
        // ids handed out by the identity provider are kept; 0 lets MySQL pick one
        let result = sqlx::query(
            r#"
            INSERT INTO employees (id, first_name, last_name, email)
            VALUES (NULLIF(?, 0), ?, ?, ?)
            "#,
        )
        .bind(entity.id)
        .bind(&entity.first_name)
        .bind(&entity.last_name)
        .bind(&entity.email)
        .execute(&self.pool)
        .await;

        let assigned = inserted_id::<Employee>(result)?;
        if entity.id == 0 {
            entity.set_id(assigned);
        }
        Ok(entity)
    }

    async fn update(&self, entity: &Employee) -> Result<bool, AppError> {
        let done = sqlx::query(
            r#"
            UPDATE employees
            SET first_name = ?, last_name = ?, email = ?
            WHERE id = ?
            "#,
        )
        .bind(&entity.first_name)
        .bind(&entity.last_name)
        .bind(&entity.email)
        .bind(entity.id)
        .execute(&self.pool)
        .await?;

        Ok(done.rows_affected() > 0)
    }

    async fn delete(&self, id: u64) -> Result<bool, AppError> {
        delete_row::<Employee>(&self.pool, "employees", id).await
    }

    async fn find_all(&self) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query_as::<_, Employee>(
            "SELECT id, first_name, last_name, email FROM employees ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>, AppError> {
        let row = sqlx::query_as::<_, Employee>(
            "SELECT id, first_name, last_name, email FROM employees WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

/* =========================
Leave types
========================= */
#[async_trait]
impl Repository<LeaveType> for MySqlStore {
    async fn create(&self, mut entity: LeaveType) -> Result<LeaveType, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_types (name, default_days, date_created)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&entity.name)
        .bind(entity.default_days)
        .bind(entity.date_created)
        .execute(&self.pool)
        .await;

        entity.set_id(inserted_id::<LeaveType>(result)?);
        Ok(entity)
    }

    async fn update(&self, entity: &LeaveType) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE leave_types SET name = ?, default_days = ? WHERE id = ?")
            .bind(&entity.name)
            .bind(entity.default_days)
            .bind(entity.id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
                Err(AppError::Conflict(LeaveType::NAME))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: u64) -> Result<bool, AppError> {
        delete_row::<LeaveType>(&self.pool, "leave_types", id).await
    }

    async fn find_all(&self) -> Result<Vec<LeaveType>, AppError> {
        let rows = sqlx::query_as::<_, LeaveType>(
            "SELECT id, name, default_days, date_created FROM leave_types ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveType>, AppError> {
        let row = sqlx::query_as::<_, LeaveType>(
            "SELECT id, name, default_days, date_created FROM leave_types WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

/* =========================
Leave allocations
========================= */
#[async_trait]
impl Repository<LeaveAllocation> for MySqlStore {
    async fn create(&self, mut entity: LeaveAllocation) -> Result<LeaveAllocation, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_allocations
                (employee_id, leave_type_id, number_of_days, `period`, date_created, version)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entity.employee_id)
        .bind(entity.leave_type_id)
        .bind(entity.number_of_days)
        .bind(entity.period)
        .bind(entity.date_created)
        .bind(entity.version)
        .execute(&self.pool)
        .await;

        entity.set_id(inserted_id::<LeaveAllocation>(result)?);
        Ok(entity)
    }

    async fn update(&self, entity: &LeaveAllocation) -> Result<bool, AppError> {
        let done = sqlx::query(
            r#"
            UPDATE leave_allocations
            SET number_of_days = ?, version = version + 1
            WHERE id = ?
            AND version = ?
            "#,
        )
        .bind(entity.number_of_days)
        .bind(entity.id)
        .bind(entity.version)
        .execute(&self.pool)
        .await?;

        Ok(done.rows_affected() > 0)
    }

    async fn delete(&self, id: u64) -> Result<bool, AppError> {
        delete_row::<LeaveAllocation>(&self.pool, "leave_allocations", id).await
    }

    async fn find_all(&self) -> Result<Vec<LeaveAllocation>, AppError> {
        let sql = format!(
            "SELECT {} FROM leave_allocations ORDER BY employee_id, `period` DESC, leave_type_id",
            ALLOCATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, LeaveAllocation>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveAllocation>, AppError> {
        let sql = format!("SELECT {} FROM leave_allocations WHERE id = ?", ALLOCATION_COLUMNS);
        let row = sqlx::query_as::<_, LeaveAllocation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl AllocationRepository for MySqlStore {
    async fn find_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveAllocation>, AppError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM leave_allocations
            WHERE employee_id = ?
            ORDER BY `period` DESC, leave_type_id
            "#,
            ALLOCATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, LeaveAllocation>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_for(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        period: i32,
    ) -> Result<Option<LeaveAllocation>, AppError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM leave_allocations
            WHERE employee_id = ?
            AND leave_type_id = ?
            AND `period` = ?
            "#,
            ALLOCATION_COLUMNS
        );
        let row = sqlx::query_as::<_, LeaveAllocation>(&sql)
            .bind(employee_id)
            .bind(leave_type_id)
            .bind(period)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn any_with_leave_type(&self, leave_type_id: u64) -> Result<bool, AppError> {
        row_exists(
            &self.pool,
            "SELECT 1 FROM leave_allocations WHERE leave_type_id = ? LIMIT 1",
            leave_type_id,
        )
        .await
    }
}

/* =========================
Leave requests
========================= */
#[async_trait]
impl Repository<LeaveRequest> for MySqlStore {
    async fn create(&self, mut entity: LeaveRequest) -> Result<LeaveRequest, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (requesting_employee_id, leave_type_id, start_date, end_date, comments,
                 approval, actioned_by_id, cancelled, date_requested, date_actioned)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entity.requesting_employee_id)
        .bind(entity.leave_type_id)
        .bind(entity.start_date)
        .bind(entity.end_date)
        .bind(&entity.comments)
        .bind(entity.status.as_ref())
        .bind(entity.actioned_by_id)
        .bind(entity.cancelled)
        .bind(entity.date_requested)
        .bind(entity.date_actioned)
        .execute(&self.pool)
        .await;

        entity.set_id(inserted_id::<LeaveRequest>(result)?);
        Ok(entity)
    }

    async fn update(&self, entity: &LeaveRequest) -> Result<bool, AppError> {
        let done = sqlx::query(
            r#"
            UPDATE leave_requests
            SET start_date = ?, end_date = ?, comments = ?, approval = ?,
                actioned_by_id = ?, cancelled = ?, date_actioned = ?
            WHERE id = ?
            "#,
        )
        .bind(entity.start_date)
        .bind(entity.end_date)
        .bind(&entity.comments)
        .bind(entity.status.as_ref())
        .bind(entity.actioned_by_id)
        .bind(entity.cancelled)
        .bind(entity.date_actioned)
        .bind(entity.id)
        .execute(&self.pool)
        .await?;

        Ok(done.rows_affected() > 0)
    }

    async fn delete(&self, id: u64) -> Result<bool, AppError> {
        delete_row::<LeaveRequest>(&self.pool, "leave_requests", id).await
    }

    async fn find_all(&self) -> Result<Vec<LeaveRequest>, AppError> {
        let sql = format!(
            "SELECT {} FROM leave_requests ORDER BY date_requested DESC",
            LEAVE_REQUEST_COLUMNS
        );
        sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect()
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, AppError> {
        let sql = format!("SELECT {} FROM leave_requests WHERE id = ?", LEAVE_REQUEST_COLUMNS);
        sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }
}

#[async_trait]
impl LeaveRequestRepository for MySqlStore {
    async fn find_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveRequest>, AppError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM leave_requests
            WHERE requesting_employee_id = ?
            ORDER BY date_requested DESC
            "#,
            LEAVE_REQUEST_COLUMNS
        );
        sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect()
    }

    async fn commit_approval(&self, commit: &ApprovalCommit) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let debited = sqlx::query(
            r#"
            UPDATE leave_allocations
            SET number_of_days = number_of_days - ?, version = version + 1
            WHERE id = ?
            AND version = ?
            AND number_of_days >= ?
            "#,
        )
        .bind(commit.days)
        .bind(commit.allocation_id)
        .bind(commit.allocation_version)
        .bind(commit.days)
        .execute(&mut *tx)
        .await?;

        if debited.rows_affected() == 0 {
            tx.rollback().await?;
            tracing::warn!(
                allocation_id = commit.allocation_id,
                version = commit.allocation_version,
                "Allocation moved before approval could debit it"
            );
            return Err(AppError::Conflict(LeaveAllocation::NAME));
        }

        let approved = sqlx::query(
            r#"
            UPDATE leave_requests
            SET approval = ?, actioned_by_id = ?, date_actioned = ?
            WHERE id = ?
            AND approval = ?
            AND cancelled = FALSE
            "#,
        )
        .bind(ApprovalStatus::Approved.as_ref())
        .bind(commit.actioned_by_id)
        .bind(commit.actioned_at)
        .bind(commit.request_id)
        .bind(ApprovalStatus::Pending.as_ref())
        .execute(&mut *tx)
        .await?;

        if approved.rows_affected() == 0 {
            tx.rollback().await?;
            tracing::warn!(
                leave_id = commit.request_id,
                "Leave request left the pending state before approval committed"
            );
            return Err(AppError::Conflict(LeaveRequest::NAME));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn record_rejection(
        &self,
        request_id: u64,
        actioned_by_id: u64,
        actioned_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let done = sqlx::query(
            r#"
            UPDATE leave_requests
            SET approval = ?, actioned_by_id = ?, date_actioned = ?
            WHERE id = ?
            AND approval = ?
            AND cancelled = FALSE
            "#,
        )
        .bind(ApprovalStatus::Rejected.as_ref())
        .bind(actioned_by_id)
        .bind(actioned_at)
        .bind(request_id)
        .bind(ApprovalStatus::Pending.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(done.rows_affected() > 0)
    }

    async fn mark_cancelled(&self, request_id: u64) -> Result<bool, AppError> {
        let done = sqlx::query("UPDATE leave_requests SET cancelled = TRUE WHERE id = ?")
            .bind(request_id)
            .execute(&self.pool)
            .await?;

        Ok(done.rows_affected() > 0)
    }

    async fn any_with_leave_type(&self, leave_type_id: u64) -> Result<bool, AppError> {
        row_exists(
            &self.pool,
            "SELECT 1 FROM leave_requests WHERE leave_type_id = ? LIMIT 1",
            leave_type_id,
        )
        .await
    }
}
