// Inbound HTTP for the dispute surface, rider and admin.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::application::dispute_engine::{
    ADMIN_PAGE_MAX, FileDispute, PageParams, ResolveDispute, USER_PAGE_MAX,
};
use crate::application::errors::ApiError;
use crate::core::dispute::{DisputeReason, DisputeStatus, ResolutionType};
use crate::core::money::Money;
use crate::shell::auth::Principal;
use crate::shell::envelope::{ApiFailure, created, ok, ok_with_meta};
use crate::shell::state::AppState;

fn bad_body(_: JsonRejection) -> ApiFailure {
    ApiFailure(ApiError::bad_request("invalid request body"))
}

fn bad_query(_: QueryRejection) -> ApiFailure {
    ApiFailure(ApiError::bad_request("invalid query parameters"))
}

fn bad_path(_: PathRejection) -> ApiFailure {
    ApiFailure(ApiError::bad_request("invalid dispute id"))
}

#[derive(Deserialize)]
pub struct FileDisputeBody {
    pub ride_id: Uuid,
    pub reason: DisputeReason,
    pub description: String,
    pub disputed_amount: Money,
    #[serde(default)]
    pub evidence: Vec<String>,
}

pub async fn file(
    State(state): State<AppState>,
    principal: Principal,
    body: Result<Json<FileDisputeBody>, JsonRejection>,
) -> Result<Response, ApiFailure> {
    let Json(body) = body.map_err(bad_body)?;
    let dispute = state
        .disputes
        .file_dispute(
            principal.user_id,
            FileDispute {
                ride_id: body.ride_id,
                reason: body.reason,
                description: body.description,
                disputed_amount: body.disputed_amount,
                evidence: body.evidence,
            },
        )
        .await
        .map_err(|e| ApiFailure::opaque(e, "file dispute"))?;
    Ok(created(dispute))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<DisputeStatus>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

pub async fn list_mine(
    State(state): State<AppState>,
    principal: Principal,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, ApiFailure> {
    let Query(query) = query.map_err(bad_query)?;
    let page = PageParams::clamped(query.page, query.page_size, USER_PAGE_MAX);
    let (disputes, total) = state
        .disputes
        .my_disputes(principal.user_id, query.status, page)
        .await
        .map_err(|e| ApiFailure::opaque(e, "list disputes"))?;
    Ok(ok_with_meta(
        disputes,
        json!({ "total": total, "page": page.page, "page_size": page.page_size }),
    ))
}

/// Static catalogue of dispute reasons with rider-facing labels.
pub async fn reasons() -> Response {
    let catalogue: Vec<_> = DisputeReason::ALL
        .into_iter()
        .map(|r| json!({ "value": r.as_str(), "label": r.label() }))
        .collect();
    ok(catalogue)
}

pub async fn detail(
    State(state): State<AppState>,
    principal: Principal,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiFailure> {
    let Path(id) = id.map_err(bad_path)?;
    let detail = state
        .disputes
        .dispute_detail(id, principal.user_id)
        .await
        .map_err(|e| ApiFailure::opaque(e, "get dispute"))?;
    Ok(ok(detail))
}

#[derive(Deserialize)]
pub struct CommentBody {
    pub comment: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    principal: Principal,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CommentBody>, JsonRejection>,
) -> Result<Response, ApiFailure> {
    let Path(id) = id.map_err(bad_path)?;
    let Json(body) = body.map_err(bad_body)?;
    let comment = state
        .disputes
        .add_user_comment(id, principal.user_id, body.comment)
        .await
        .map_err(|e| ApiFailure::opaque(e, "add comment"))?;
    Ok(created(comment))
}

#[derive(Deserialize)]
pub struct AdminListQuery {
    pub status: Option<DisputeStatus>,
    pub reason: Option<DisputeReason>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

pub async fn admin_list(
    State(state): State<AppState>,
    principal: Principal,
    query: Result<Query<AdminListQuery>, QueryRejection>,
) -> Result<Response, ApiFailure> {
    principal.require_admin()?;
    let Query(query) = query.map_err(bad_query)?;
    let page = PageParams::clamped(query.page, query.page_size, ADMIN_PAGE_MAX);
    let (disputes, total) = state
        .disputes
        .admin_list(query.status, query.reason, page)
        .await
        .map_err(|e| ApiFailure::opaque(e, "list disputes"))?;
    Ok(ok_with_meta(
        disputes,
        json!({ "total": total, "page": page.page, "page_size": page.page_size }),
    ))
}

pub async fn admin_detail(
    State(state): State<AppState>,
    principal: Principal,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiFailure> {
    principal.require_admin()?;
    let Path(id) = id.map_err(bad_path)?;
    let detail = state
        .disputes
        .admin_detail(id)
        .await
        .map_err(|e| ApiFailure::opaque(e, "get dispute"))?;
    Ok(ok(detail))
}

#[derive(Deserialize)]
pub struct ResolveBody {
    pub resolution_type: ResolutionType,
    pub refund_amount: Option<Money>,
    pub note: String,
}

pub async fn admin_resolve(
    State(state): State<AppState>,
    principal: Principal,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ResolveBody>, JsonRejection>,
) -> Result<Response, ApiFailure> {
    principal.require_admin()?;
    let Path(id) = id.map_err(bad_path)?;
    let Json(body) = body.map_err(bad_body)?;
    let dispute = state
        .disputes
        .admin_resolve(
            id,
            principal.user_id,
            ResolveDispute {
                resolution_type: body.resolution_type,
                refund_amount: body.refund_amount,
                note: body.note,
            },
        )
        .await
        .map_err(|e| ApiFailure::opaque(e, "resolve dispute"))?;
    Ok(ok(dispute))
}

#[derive(Deserialize)]
pub struct AdminCommentBody {
    pub comment: String,
    #[serde(default)]
    pub is_internal: bool,
}

pub async fn admin_comment(
    State(state): State<AppState>,
    principal: Principal,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<AdminCommentBody>, JsonRejection>,
) -> Result<Response, ApiFailure> {
    principal.require_admin()?;
    let Path(id) = id.map_err(bad_path)?;
    let Json(body) = body.map_err(bad_body)?;
    let comment = state
        .disputes
        .admin_add_comment(id, principal.user_id, body.comment, body.is_internal)
        .await
        .map_err(|e| ApiFailure::opaque(e, "add comment"))?;
    Ok(created(comment))
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub from: NaiveDate,
    /// Inclusive; the window runs to the end of this calendar day.
    pub to: NaiveDate,
}

pub async fn admin_stats(
    State(state): State<AppState>,
    principal: Principal,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Response, ApiFailure> {
    principal.require_admin()?;
    let Query(query) = query.map_err(bad_query)?;
    let stats = state
        .disputes
        .admin_stats(query.from, query.to)
        .await
        .map_err(|e| ApiFailure::opaque(e, "compute dispute stats"))?;
    Ok(ok(stats))
}
