//! Back-office order management and the dashboard.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::extractors::AuthUser;
use super::{blocking, ok, validated, AppState};
use crate::domain::order::{OrderFilter, OrderStatus, PaymentStatus};
use crate::domain::pagination::PageRequest;
use crate::domain::user::Permission;
use crate::errors::AppError;

const DEFAULT_REPORT_DAYS: i64 = 30;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminOrderQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalesQuery {
    /// Window length in days, 1 to 365 (default 30)
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    /// Stored when moving to `shipped`
    #[validate(length(max = 100))]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkStatusRequest {
    #[validate(length(min = 1, max = 100, message = "between 1 and 100 order ids are required"))]
    pub order_ids: Vec<Uuid>,
    pub status: OrderStatus,
    #[validate(length(max = 100))]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
}

/// GET /api/admin/dashboard
#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Store-wide counters and recent activity"),
        (status = 403, description = "Dashboard permission required"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn dashboard(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ViewDashboard)?;
    let stats = blocking(move || state.admin.dashboard()).await?;
    Ok(ok(stats))
}

/// GET /api/admin/analytics/sales
#[utoipa::path(
    get,
    path = "/api/admin/analytics/sales",
    params(SalesQuery),
    responses(
        (status = 200, description = "Daily sales and top products"),
        (status = 400, description = "days out of range"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn sales_report(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    query: web::Query<SalesQuery>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ViewDashboard)?;
    let days = query.days.unwrap_or(DEFAULT_REPORT_DAYS);
    let report = blocking(move || state.admin.sales_report(days)).await?;
    Ok(ok(report))
}

/// GET /api/admin/orders
#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(AdminOrderQuery),
    responses((status = 200, description = "All orders, newest first")),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    query: web::Query<AdminOrderQuery>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageOrders)?;
    let q = query.into_inner();
    let filter = OrderFilter {
        user_id: q.user_id,
        status: q.status,
        payment_status: q.payment_status,
    };
    let page = PageRequest::new(q.page, q.limit);
    let orders = blocking(move || state.orders.list_all(&filter, page)).await?;
    Ok(ok(orders))
}

/// GET /api/admin/orders/{id}
#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its items"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageOrders)?;
    let id = path.into_inner();
    let order = blocking(move || state.orders.get(id)).await?;
    Ok(ok(order))
}

/// PATCH /api/admin/orders/{id}/status
#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed"),
        (status = 400, description = "Transition not allowed"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order changed concurrently"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn update_status(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageOrders)?;
    let id = path.into_inner();
    let body = validated(body)?;
    let order =
        blocking(move || state.orders.transition(id, body.status, body.tracking_number)).await?;
    Ok(ok(order))
}

/// PATCH /api/admin/orders/bulk-status
///
/// Each order is moved independently; the response lists which ones failed
/// and why.
#[utoipa::path(
    patch,
    path = "/api/admin/orders/bulk-status",
    request_body = BulkStatusRequest,
    responses((status = 200, description = "Per-order outcome")),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn bulk_update_status(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<BulkStatusRequest>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageOrders)?;
    let body = validated(body)?;
    let result = web::block(move || {
        state
            .orders
            .bulk_update_status(&body.order_ids, body.status, body.tracking_number)
    })
    .await?;
    Ok(ok(result))
}

/// PATCH /api/admin/orders/{id}/payment
#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/payment",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Payment status changed"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn update_payment(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    user.require(Permission::ManageOrders)?;
    let id = path.into_inner();
    let body = validated(body)?;
    let order =
        blocking(move || state.orders.update_payment_status(id, body.payment_status)).await?;
    Ok(ok(order))
}
