use crate::auth::auth::AuthUser;
use crate::repository::Store;
use crate::service::allocation::{AllocationService, ProvisionAllocation};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AllocationFilter {
    /// Only allocations of this employee
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateAllocation {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    /// defaults to the leave type's default_days
    #[schema(example = 20, nullable = true)]
    pub number_of_days: Option<i32>,
    /// defaults to the current year
    #[schema(example = 2026, nullable = true)]
    pub period: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct AdjustAllocation {
    #[schema(example = 12)]
    pub number_of_days: i32,
    /// version returned by the last read of this allocation
    #[schema(example = 0)]
    pub version: u64,
}

#[utoipa::path(
    get,
    path = "/api/leave-allocations",
    params(AllocationFilter),
    responses(
        (status = 200, description = "Leave allocations", body = [LeaveAllocationView]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave allocation"
)]
pub async fn list_allocations(
    auth: AuthUser,
    store: web::Data<Store>,
    query: web::Query<AllocationFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let data = AllocationService::new(&store).list(query.employee_id).await?;
    Ok(HttpResponse::Ok().json(data))
}

#[utoipa::path(
    post,
    path = "/api/leave-allocations",
    request_body = CreateAllocation,
    responses(
        (status = 201, description = "Allocation provisioned", body = LeaveAllocationView),
        (status = 400, description = "Negative day count"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee or leave type not found"),
        (status = 409, description = "Allocation already exists for this period")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave allocation"
)]
pub async fn create_allocation(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<CreateAllocation>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let payload = payload.into_inner();

    let created = AllocationService::new(&store)
        .provision(ProvisionAllocation {
            employee_id: payload.employee_id,
            leave_type_id: payload.leave_type_id,
            number_of_days: payload.number_of_days,
            period: payload.period,
        })
        .await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/api/leave-allocations/{allocation_id}",
    params(
        ("allocation_id" = u64, Path, description = "ID of the allocation")
    ),
    request_body = AdjustAllocation,
    responses(
        (status = 200, description = "Allocation adjusted", body = LeaveAllocationView),
        (status = 400, description = "Negative day count"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Allocation not found"),
        (status = 409, description = "Stale version")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave allocation"
)]
pub async fn adjust_allocation(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
    payload: web::Json<AdjustAllocation>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let adjusted = AllocationService::new(&store)
        .adjust(path.into_inner(), payload.number_of_days, payload.version)
        .await?;
    Ok(HttpResponse::Ok().json(adjusted))
}
