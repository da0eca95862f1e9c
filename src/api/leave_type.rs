use crate::auth::auth::AuthUser;
use crate::mapper::LeaveTypeView;
use crate::repository::Store;
use crate::service::leave_type::LeaveTypeService;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LeaveTypePayload {
    #[schema(example = "Annual")]
    pub name: String,
    #[schema(example = 20)]
    pub default_days: i32,
}

/// Leave types to choose from when submitting a request
#[utoipa::path(
    get,
    path = "/api/leave-types",
    responses(
        (status = 200, description = "All leave types", body = [LeaveTypeView]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave type"
)]
pub async fn list_leave_types(
    _auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    let leave_types = LeaveTypeService::new(&store).list().await?;
    let data: Vec<LeaveTypeView> = leave_types.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(data))
}

#[utoipa::path(
    get,
    path = "/api/leave-types/{leave_type_id}",
    params(
        ("leave_type_id" = u64, Path, description = "ID of the leave type")
    ),
    responses(
        (status = 200, description = "Leave type found", body = LeaveTypeView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave type not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave type"
)]
pub async fn get_leave_type(
    _auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_type = LeaveTypeService::new(&store).get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LeaveTypeView::from(leave_type)))
}

#[utoipa::path(
    post,
    path = "/api/leave-types",
    request_body = LeaveTypePayload,
    responses(
        (status = 201, description = "Leave type created", body = LeaveTypeView),
        (status = 400, description = "Invalid name or default days"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Name already taken")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave type"
)]
pub async fn create_leave_type(
    auth: AuthUser,
    store: web::Data<Store>,
    payload: web::Json<LeaveTypePayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let created = LeaveTypeService::new(&store)
        .create(&payload.name, payload.default_days)
        .await?;
    Ok(HttpResponse::Created().json(LeaveTypeView::from(created)))
}

#[utoipa::path(
    put,
    path = "/api/leave-types/{leave_type_id}",
    params(
        ("leave_type_id" = u64, Path, description = "ID of the leave type")
    ),
    request_body = LeaveTypePayload,
    responses(
        (status = 200, description = "Leave type updated", body = LeaveTypeView),
        (status = 400, description = "Invalid name or default days"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave type not found"),
        (status = 409, description = "Name already taken")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave type"
)]
pub async fn update_leave_type(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
    payload: web::Json<LeaveTypePayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let updated = LeaveTypeService::new(&store)
        .update(path.into_inner(), &payload.name, payload.default_days)
        .await?;
    Ok(HttpResponse::Ok().json(LeaveTypeView::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/leave-types/{leave_type_id}",
    params(
        ("leave_type_id" = u64, Path, description = "ID of the leave type")
    ),
    responses(
        (status = 204, description = "Leave type deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave type not found"),
        (status = 409, description = "Leave type still referenced")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave type"
)]
pub async fn delete_leave_type(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    LeaveTypeService::new(&store).delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
