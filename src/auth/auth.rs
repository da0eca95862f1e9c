use crate::{error::AppError, model::role::Role};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

/// The authenticated principal, placed in request extensions by
/// `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("Missing token")),
        )
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only"))
        }
    }

    /// The employee record this user acts as.
    pub fn employee_id(&self) -> Result<u64, AppError> {
        self.employee_id
            .ok_or(AppError::Forbidden("No employee profile"))
    }

    /// Admins see everything; employees only what they requested.
    pub fn require_admin_or_owner(&self, owner_employee_id: u64) -> Result<(), AppError> {
        if self.is_admin() || self.employee_id == Some(owner_employee_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Not your leave request"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "tester".to_string(),
            role,
            employee_id,
        }
    }

    #[test]
    fn role_checks() {
        let admin = user(Role::Administrator, None);
        let employee = user(Role::Employee, Some(1000));

        assert!(admin.require_admin().is_ok());
        assert!(matches!(employee.require_admin(), Err(AppError::Forbidden(_))));

        assert!(admin.require_admin_or_owner(1000).is_ok());
        assert!(employee.require_admin_or_owner(1000).is_ok());
        assert!(employee.require_admin_or_owner(1001).is_err());

        assert_eq!(employee.employee_id().unwrap(), 1000);
        assert!(matches!(admin.employee_id(), Err(AppError::Forbidden(_))));
    }
}
