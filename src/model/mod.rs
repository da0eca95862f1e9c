pub mod employee;
pub mod leave_allocation;
pub mod leave_request;
pub mod leave_type;
pub mod role;
