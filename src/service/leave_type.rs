use tracing::info;

use crate::error::AppError;
use crate::model::leave_type::LeaveType;
use crate::repository::{Entity, Store};

const MAX_NAME_LEN: usize = 100;

fn validate(name: &str, default_days: i32) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "name must be between 1 and {} characters",
            MAX_NAME_LEN
        )));
    }
    if default_days < 0 {
        return Err(AppError::Validation(
            "default_days may not be negative".to_string(),
        ));
    }
    Ok(())
}

pub struct LeaveTypeService<'a> {
    store: &'a Store,
}

impl<'a> LeaveTypeService<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<LeaveType>, AppError> {
        self.store.leave_types.find_all().await
    }

    pub async fn get(&self, id: u64) -> Result<LeaveType, AppError> {
        self.store
            .leave_types
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(LeaveType::NAME))
    }

    pub async fn create(&self, name: &str, default_days: i32) -> Result<LeaveType, AppError> {
        validate(name, default_days)?;
        let created = self
            .store
            .leave_types
            .create(LeaveType::new(name, default_days))
            .await?;
        info!(leave_type_id = created.id, name = %created.name, "Leave type created");
        Ok(created)
    }

    pub async fn update(
        &self,
        id: u64,
        name: &str,
        default_days: i32,
    ) -> Result<LeaveType, AppError> {
        validate(name, default_days)?;
        let mut leave_type = self.get(id).await?;
        leave_type.name = name.trim().to_string();
        leave_type.default_days = default_days;

        if !self.store.leave_types.update(&leave_type).await? {
            return Err(AppError::PersistenceFailure(LeaveType::NAME));
        }
        Ok(leave_type)
    }

    /// Refuses to delete a type that allocations or requests still point at.
    pub async fn delete(&self, id: u64) -> Result<(), AppError> {
        self.get(id).await?;

        let in_use = self.store.allocations.any_with_leave_type(id).await?
            || self.store.requests.any_with_leave_type(id).await?;
        if in_use {
            return Err(AppError::Conflict(LeaveType::NAME));
        }

        if !self.store.leave_types.delete(id).await? {
            return Err(AppError::NotFound(LeaveType::NAME));
        }
        info!(leave_type_id = id, "Leave type deleted");
        Ok(())
    }
}
