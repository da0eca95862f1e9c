use crate::api::leave_allocation::{AdjustAllocation, AllocationFilter, CreateAllocation};
use crate::api::leave_request::CreateLeave;
use crate::api::leave_type::LeaveTypePayload;
use crate::mapper::{
    AdminDashboard, LeaveAllocationView, LeaveRequestView, LeaveTypeView, MyLeave,
};
use crate::model::leave_request::ApprovalStatus;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management

Employees request time off against a yearly allocation per leave type.
Administrators approve or reject; an approval debits the allocation.

### Key Features
- **Leave requests**
  - Submit, view, and cancel your own requests
  - Admin dashboard with counts by status
  - Approve or reject pending requests
- **Leave types**
  - Named categories with a default number of days
- **Leave allocations**
  - Provision and adjust an employee's balance per leave type and year

### Security
Every endpoint requires a **JWT Bearer** access token.
Role 1 is an administrator, role 2 an employee.

### Errors
Failures return `{"message": "...", "code": "..."}`.
"#,
    ),
    paths(
        crate::api::leave_request::leave_dashboard,
        crate::api::leave_request::my_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,

        crate::api::leave_type::list_leave_types,
        crate::api::leave_type::get_leave_type,
        crate::api::leave_type::create_leave_type,
        crate::api::leave_type::update_leave_type,
        crate::api::leave_type::delete_leave_type,

        crate::api::leave_allocation::list_allocations,
        crate::api::leave_allocation::create_allocation,
        crate::api::leave_allocation::adjust_allocation
    ),
    components(
        schemas(
            CreateLeave,
            LeaveRequestView,
            AdminDashboard,
            MyLeave,
            ApprovalStatus,
            LeaveTypePayload,
            LeaveTypeView,
            AllocationFilter,
            CreateAllocation,
            AdjustAllocation,
            LeaveAllocationView
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Leave type", description = "Leave type APIs"),
        (name = "Leave allocation", description = "Leave allocation APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for path in [
            "/api/leave-requests",
            "/api/leave-requests/mine",
            "/api/leave-requests/{leave_id}/cancel",
            "/api/leave-types/{leave_type_id}",
            "/api/leave-allocations/{allocation_id}",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == path), "missing {}", path);
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
