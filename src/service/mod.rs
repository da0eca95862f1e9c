pub mod allocation;
pub mod leave_request;
pub mod leave_type;

use crate::{error::AppError, mapper::Lookup, repository::Store};

/// Loads the names views are decorated with.
pub(crate) async fn load_lookup(store: &Store) -> Result<Lookup, AppError> {
    let leave_types = store.leave_types.find_all().await?;
    let employees = store.employees.find_all().await?;
    Ok(Lookup::new(&leave_types, &employees))
}

/// Names for a single view: one leave type and one employee.
pub(crate) async fn lookup_for(
    store: &Store,
    leave_type_id: u64,
    employee_id: u64,
) -> Result<Lookup, AppError> {
    let leave_type = store.leave_types.find_by_id(leave_type_id).await?;
    let employee = store.employees.find_by_id(employee_id).await?;
    Ok(Lookup::new(leave_type.as_slice(), employee.as_slice()))
}


#[cfg(test)]
mod tests {
    use super::fixtures::{EMPLOYEE, annual_allocation};
    use super::*;
    use crate::model::leave_allocation::LeaveAllocation;

    #[actix_web::test]
    async fn single_lookup_names_only_what_was_asked_for() {
        let (store, _) = Store::in_memory();
        let (annual, allocation) = annual_allocation(&store, 10).await;

        let view = lookup_for(&store, annual.id, EMPLOYEE)
            .await
            .unwrap()
            .allocation(allocation);
        assert_eq!(view.leave_type_name.as_deref(), Some("Annual"));

        let orphan = LeaveAllocation::new(EMPLOYEE, 999, 1, 2024);
        let view = lookup_for(&store, 999, EMPLOYEE)
            .await
            .unwrap()
            .allocation(orphan);
        assert!(view.leave_type_name.is_none());
    }
}
