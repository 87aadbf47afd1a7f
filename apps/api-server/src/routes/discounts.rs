//! Discount routes. All require authentication.
//!
//! Codes are stored uppercased. A code created without `expiresAt` expires
//! at creation time and stays unusable until an expiry is set.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom_core::validation::{normalize_discount_code, validate_discount_percentage};
use stockroom_core::{Discount, ValidationError};
use stockroom_db::{DiscountUpdate, NewDiscount};
use tracing::info;

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::services::discount_service::{self, AppliedDiscount, ApplyDiscountRequest};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/create", post(create))
        .route("/apply", post(apply))
        .route("/update/{id}", put(update))
        .route("/delete/{id}", delete(remove))
        .route("/{id}", get(fetch))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub percentage: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

async fn find(state: &AppState, id: &str) -> ApiResult<Discount> {
    state
        .db
        .discounts()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Discount", id))
}

async fn list(_user: AuthUser, State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<Discount>>> {
    let discounts = state.db.discounts().list().await?;
    Ok(ApiResponse::ok(discounts, "All discounts fetched successfully"))
}

async fn create(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DiscountRequest>,
) -> ApiResult<ApiResponse<Discount>> {
    let (code, percentage) = match (body.code, body.percentage) {
        (Some(code), Some(pct)) => (normalize_discount_code(&code)?, pct),
        _ => return Err(ValidationError::MissingFields.into()),
    };
    validate_discount_percentage(percentage)?;

    let discount = state
        .db
        .discounts()
        .insert(&NewDiscount {
            code,
            percentage,
            is_active: body.is_active.unwrap_or(true),
            expires_at: body.expires_at.unwrap_or_else(Utc::now),
        })
        .await?;

    info!(discount_id = %discount.id, code = %discount.code, "Discount created");
    Ok(ApiResponse::created(discount, "Discount created successfully"))
}

async fn apply(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ApplyDiscountRequest>,
) -> ApiResult<ApiResponse<AppliedDiscount>> {
    let applied = discount_service::apply(&state.db, body).await?;
    Ok(ApiResponse::ok(applied, "Discount applied successfully"))
}

async fn update(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<DiscountRequest>,
) -> ApiResult<ApiResponse<Discount>> {
    let changes = DiscountUpdate {
        code: body.code.as_deref().map(normalize_discount_code).transpose()?,
        percentage: body.percentage,
        is_active: body.is_active,
        expires_at: body.expires_at,
    };
    if let Some(pct) = changes.percentage {
        validate_discount_percentage(pct)?;
    }

    let discount = state.db.discounts().update(&id, &changes).await?;
    Ok(ApiResponse::ok(discount, "Discount updated successfully"))
}

async fn remove(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Discount>> {
    let discount = find(&state, &id).await?;
    state.db.discounts().delete(&id).await?;
    info!(discount_id = %id, "Discount deleted");
    Ok(ApiResponse::ok(discount, "Discount deleted successfully"))
}

async fn fetch(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Discount>> {
    let discount = find(&state, &id).await?;
    Ok(ApiResponse::ok(discount, "Discount by Id fetched successfully"))
}
