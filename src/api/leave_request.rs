use crate::auth::auth::AuthUser;
use crate::repository::Store;
use crate::service::leave_request::{LeaveRequestService, NewLeaveRequest};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[schema(example = "Family trip", nullable = true)]
    pub comments: Option<String>,
}

/* =========================
Admin dashboard
========================= */
/// All leave requests with counts by status
#[utoipa::path(
    get,
    path = "/api/leave-requests",
    responses(
        (status = 200, description = "All leave requests", body = AdminDashboard),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_dashboard(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let dashboard = LeaveRequestService::new(&store).dashboard().await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

/* =========================
Own allocations and requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-requests/mine",
    responses(
        (status = 200, description = "Allocations and requests of the caller", body = MyLeave),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leave(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    let mine = LeaveRequestService::new(&store).my_leave(employee_id).await?;
    Ok(HttpResponse::Ok().json(mine))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave-requests",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequestView),
        (status = 400, description = "Invalid date range or insufficient allocation", body = Object,
         example = json!({
            "message": "You do not have sufficient days for this request (8 requested, 6 remaining)",
            "code": "INSUFFICIENT_ALLOCATION"
         })
        ),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "Leave type or allocation not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let payload = payload.into_inner();

    let service = LeaveRequestService::new(&store);
    let created = service
        .create(
            employee_id,
            NewLeaveRequest {
                leave_type_id: payload.leave_type_id,
                start_date: payload.start_date,
                end_date: payload.end_date,
                comments: payload.comments,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(service.view(created).await?))
}

/* =========================
Leave request details
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-requests/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequestView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found",
            "code": "NOT_FOUND"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let service = LeaveRequestService::new(&store);
    let request = service.find(path.into_inner()).await?;
    auth.require_admin_or_owner(request.requesting_employee_id)?;

    Ok(HttpResponse::Ok().json(service.view(request).await?))
}

/* =========================
Approve leave (Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/leave-requests/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved, allocation debited", body = LeaveRequestView),
        (status = 400, description = "Allocation no longer covers the request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request or allocation not found"),
        (status = 409, description = "Already actioned, cancelled, or lost a concurrent update",
         body = Object, example = json!({
            "message": "Leave request has already been actioned",
            "code": "ALREADY_ACTIONED"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let service = LeaveRequestService::new(&store);
    let approved = service.approve(path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(service.view(approved).await?))
}

/* =========================
Reject leave (Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/leave-requests/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequestView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already actioned or cancelled")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let service = LeaveRequestService::new(&store);
    let rejected = service.reject(path.into_inner(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(service.view(rejected).await?))
}

/* =========================
Cancel own leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leave-requests/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveRequestView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the requesting employee"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    let service = LeaveRequestService::new(&store);
    let cancelled = service.cancel(path.into_inner(), employee_id).await?;
    Ok(HttpResponse::Ok().json(service.view(cancelled).await?))
}
