use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::extractors::AuthUser;
use super::{blocking, ok, AppState};
use crate::domain::pagination::PageRequest;
use crate::domain::user::{Permission, Role, UserFilter, UserStatus};
use crate::errors::AppError;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    /// Matches email, first or last name
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    pub status: UserStatus,
}

/// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Paginated users"),
        (status = 403, description = "User management permission required"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn list_users(
    state: web::Data<AppState>,
    AuthUser(actor): AuthUser,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, AppError> {
    actor.require(Permission::ManageUsers)?;
    let q = query.into_inner();
    let filter = UserFilter {
        role: q.role,
        status: q.status,
        search: q.search.filter(|s| !s.trim().is_empty()),
    };
    let page = PageRequest::new(q.page, q.limit);
    let users = blocking(move || state.users.list(&filter, page)).await?;
    Ok(ok(users))
}

/// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_user(
    state: web::Data<AppState>,
    AuthUser(actor): AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    actor.require(Permission::ManageUsers)?;
    let id = path.into_inner();
    let user = blocking(move || state.users.get(id)).await?;
    Ok(ok(user))
}

/// PATCH /api/users/{id}/role
///
/// Only super admins may grant or revoke `super_admin`.
#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed"),
        (status = 403, description = "Not allowed to assign this role"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn change_role(
    state: web::Data<AppState>,
    AuthUser(actor): AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<ChangeRoleRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let role = body.into_inner().role;
    let user = blocking(move || state.users.change_role(&actor, id, role)).await?;
    Ok(ok(user))
}

/// PATCH /api/users/{id}/status
#[utoipa::path(
    patch,
    path = "/api/users/{id}/status",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn change_status(
    state: web::Data<AppState>,
    AuthUser(actor): AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<ChangeStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let status = body.into_inner().status;
    let user = blocking(move || state.users.change_status(&actor, id, status)).await?;
    Ok(ok(user))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::json;

    use crate::domain::user::Role;
    use crate::handlers::routes;
    use crate::handlers::test_support::{bearer, json, state};
    use crate::testing::MemoryStore;

    #[actix_web::test]
    async fn promotion_takes_effect_on_the_existing_token() {
        let store = MemoryStore::new();
        let admin = store.add_user("admin@example.test", Role::Admin);
        let customer = store.add_user("staff@example.test", Role::Customer);
        let customer_auth = bearer(&store, &customer);
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::get()
            .uri("/api/admin/dashboard")
            .insert_header(customer_auth.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/users/{}/role", customer.id))
            .insert_header(bearer(&store, &admin))
            .set_json(json!({ "role": "admin" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json(resp).await["data"]["role"], "admin");

        let req = test::TestRequest::get()
            .uri("/api/admin/dashboard")
            .insert_header(customer_auth)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn admins_cannot_mint_super_admins_or_edit_themselves() {
        let store = MemoryStore::new();
        let admin = store.add_user("admin@example.test", Role::Admin);
        let customer = store.add_user("c@example.test", Role::Customer);
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::patch()
            .uri(&format!("/api/users/{}/role", customer.id))
            .insert_header(bearer(&store, &admin))
            .set_json(json!({ "role": "super_admin" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/users/{}/status", admin.id))
            .insert_header(bearer(&store, &admin))
            .set_json(json!({ "status": "inactive" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn deactivated_users_lose_access() {
        let store = MemoryStore::new();
        let admin = store.add_user("admin@example.test", Role::Admin);
        let customer = store.add_user("c@example.test", Role::Customer);
        let customer_auth = bearer(&store, &customer);
        let (state, _rx) = state(&store);
        let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(routes)).await;

        let req = test::TestRequest::patch()
            .uri(&format!("/api/users/{}/status", customer.id))
            .insert_header(bearer(&store, &admin))
            .set_json(json!({ "status": "inactive" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(customer_auth)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/users?role=customer")
            .insert_header(bearer(&store, &admin))
            .to_request();
        let body = json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["pagination"]["total"], 1);
        assert_eq!(body["data"]["items"][0]["status"], "inactive");
    }
}
