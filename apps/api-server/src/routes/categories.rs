//! Category routes. All require authentication.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use stockroom_core::validation::validate_category_name;
use stockroom_core::Category;
use stockroom_db::DbError;

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/create-category", post(create))
        .route("/update-category/{id}", put(update))
        .route("/delete-category/{id}", delete(remove))
        .route("/{id}", get(fetch))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: Option<String>,
}

fn name_from(body: CategoryRequest) -> ApiResult<String> {
    Ok(validate_category_name(body.name.as_deref().unwrap_or_default())?)
}

async fn list(_user: AuthUser, State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<Category>>> {
    let categories = state.db.categories().list().await?;
    Ok(ApiResponse::ok(categories, "Categories fetched successfully"))
}

async fn create(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CategoryRequest>,
) -> ApiResult<ApiResponse<Category>> {
    let name = name_from(body)?;
    let category = state.db.categories().insert(&name).await?;
    Ok(ApiResponse::created(category, "Category created successfully"))
}

async fn update(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CategoryRequest>,
) -> ApiResult<ApiResponse<Category>> {
    let name = name_from(body)?;
    let category = state.db.categories().update(&id, &name).await?;
    Ok(ApiResponse::ok(category, "Category updated successfully"))
}

async fn remove(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Category>> {
    let category = state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", &id))?;

    state.db.categories().delete(&id).await.map_err(|e| match e {
        DbError::ForeignKeyViolation { .. } => {
            ApiError::validation("Category still has products")
        }
        other => ApiError::from(other),
    })?;

    Ok(ApiResponse::ok(category, "Category deleted successfully"))
}

async fn fetch(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Category>> {
    let category = state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", &id))?;
    Ok(ApiResponse::ok(category, "Category fetched successfully"))
}
