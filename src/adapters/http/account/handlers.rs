//! HTTP handlers for account endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::dto::{
    AddCreditsResponse, CheckAuthResponse, CreditsResponse, HistoryResponse, RecordSearchRequest,
    RecordSearchResponse, SearchResponse,
};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::{OptionalAuth, RequireAuth};
use crate::adapters::http::state::AppState;
use crate::application::handlers::account::{
    AddCreditsCommand, GetOrCreateUserCommand, ListHistoryQuery, RecordSearchCommand,
};

/// GET /api/checkauth - Report whether the request carries a valid session
pub async fn check_auth(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    match user {
        Some(user) => (
            StatusCode::OK,
            Json(CheckAuthResponse {
                authenticated: true,
                user_id: Some(user.id.to_string()),
            }),
        ),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(CheckAuthResponse {
                authenticated: false,
                user_id: None,
            }),
        ),
    }
}

/// GET /api/credits - Current balance, creating the account on first use
pub async fn get_credits(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CreditsResponse>, ApiError> {
    let user = state
        .get_or_create_user_handler()
        .handle(GetOrCreateUserCommand { caller: user })
        .await?;

    Ok(Json(CreditsResponse {
        credits: user.credits,
    }))
}

/// GET /api/credits/add - Grant the configured manual amount
pub async fn add_credits(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<AddCreditsResponse>, ApiError> {
    let user = state
        .get_or_create_user_handler()
        .handle(GetOrCreateUserCommand { caller: user })
        .await?;

    let updated = state
        .add_credits_handler()
        .handle(AddCreditsCommand {
            external_id: user.external_id,
            amount: state.settings.manual_grant,
        })
        .await?;

    Ok(Json(AddCreditsResponse {
        success: true,
        credits: updated.credits,
    }))
}

/// GET /api/history - The caller's searches, newest first
pub async fn get_history(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<HistoryResponse>, ApiError> {
    let searches = state
        .list_history_handler()
        .handle(ListHistoryQuery {
            external_id: user.id,
        })
        .await?;

    Ok(Json(HistoryResponse {
        searches: searches.into_iter().map(SearchResponse::from).collect(),
    }))
}

/// POST /api/search - Record a search and charge its cost
pub async fn record_search(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: Result<Json<RecordSearchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;

    let result = state
        .record_search_handler()
        .handle(RecordSearchCommand {
            caller: user,
            query: request.query,
            group_id: request.group_id,
        })
        .await?;

    let response = RecordSearchResponse {
        search: SearchResponse::from(result.search),
        credits: result.credits,
    };
    Ok((StatusCode::CREATED, Json(response)))
}
