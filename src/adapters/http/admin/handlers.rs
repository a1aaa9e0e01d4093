//! HTTP handlers for admin endpoints.

use axum::extract::{Json, State};

use super::dto::{AdminCheckResponse, AdminListResponse, UserListResponse, UserSummary};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::{OptionalAuth, RequireAuth};
use crate::adapters::http::state::AppState;
use crate::application::handlers::admin::{IsAdminQuery, ListUsersQuery};
use crate::domain::foundation::{DomainError, ErrorCode};

/// GET /api/admin/check - Whether the caller is an administrator
///
/// Anonymous callers get `{isAdmin: false}`, never an error.
pub async fn check_admin(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Json<AdminCheckResponse> {
    let is_admin = state
        .is_admin_handler()
        .handle(IsAdminQuery {
            external_id: user.map(|u| u.id),
        })
        .await;

    Json(AdminCheckResponse { is_admin })
}

/// GET /api/admin/list - The admin allow-list (admins only)
pub async fn list_admins(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<AdminListResponse>, ApiError> {
    let is_admin = state
        .is_admin_handler()
        .handle(IsAdminQuery {
            external_id: Some(user.id),
        })
        .await;
    if !is_admin {
        return Err(DomainError::new(ErrorCode::Forbidden, "Admin access required").into());
    }

    Ok(Json(AdminListResponse {
        admins: state.admins.emails(),
    }))
}

/// GET /api/admin/users - All accounts (admins only; anonymous callers get 403)
pub async fn list_users(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = state
        .list_users_handler()
        .handle(ListUsersQuery {
            external_id: user.map(|u| u.id),
        })
        .await?;

    Ok(Json(UserListResponse {
        users: users.into_iter().map(UserSummary::from).collect(),
    }))
}
