//! Product routes. Reads are public; writes require authentication.
//!
//! Images are hosted elsewhere; a product only stores the image URL.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use stockroom_core::validation::{
    validate_image_url, validate_price_cents, validate_product_name, validate_stock,
};
use stockroom_core::{CoreError, Product, ProductListing, ValidationError};
use stockroom_db::{DbError, NewProduct, ProductUpdate};
use tracing::info;

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult, PRODUCT_ORDERED};
use crate::response::ApiResponse;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/create-product", post(create))
        .route("/update-product/{id}", put(update))
        .route("/delete-product/{id}", delete(remove))
        .route("/category/{id}", get(list_by_category))
        .route("/{id}", get(fetch))
}

/// Body of create and update. Create needs every field; update applies the
/// ones present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub stock: Option<i64>,
}

async fn ensure_category(state: &AppState, id: &str) -> ApiResult<()> {
    match state.db.categories().get_by_id(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("Category", id)),
    }
}

async fn list(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<ProductListing>>> {
    let products = state.db.products().list().await?;
    Ok(ApiResponse::ok(products, "Products fetched"))
}

async fn list_by_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Vec<ProductListing>>> {
    ensure_category(&state, &id).await?;
    let products = state.db.products().list_by_category(&id).await?;
    Ok(ApiResponse::ok(products, "Products fetched"))
}

async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<ProductListing>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(id.clone()))?;

    let category_name = state
        .db
        .categories()
        .get_by_id(&product.category_id)
        .await?
        .map(|c| c.name);

    Ok(ApiResponse::ok(
        ProductListing {
            product,
            category_name,
        },
        "Product fetched",
    ))
}

async fn create(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ProductRequest>,
) -> ApiResult<ApiResponse<Product>> {
    let (name, category, image, price_cents, stock) =
        match (body.name, body.category, body.image, body.price_cents, body.stock) {
            (Some(n), Some(c), Some(i), Some(p), Some(s)) => (n, c, i, p, s),
            _ => return Err(ValidationError::MissingFields.into()),
        };

    let new = NewProduct {
        name: validate_product_name(&name)?,
        category_id: category,
        image_url: validate_image_url(&image)?,
        price_cents,
        stock,
    };
    validate_price_cents(new.price_cents)?;
    validate_stock(new.stock)?;
    ensure_category(&state, &new.category_id).await?;

    let product = state.db.products().insert(&new).await?;
    info!(product_id = %product.id, name = %product.name, stock = product.stock, "Product created");
    Ok(ApiResponse::created(product, "Product created"))
}

async fn update(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ProductRequest>,
) -> ApiResult<ApiResponse<Product>> {
    let changes = ProductUpdate {
        name: body.name.as_deref().map(validate_product_name).transpose()?,
        category_id: body.category,
        image_url: body.image.as_deref().map(validate_image_url).transpose()?,
        price_cents: body.price_cents,
        stock: body.stock,
    };
    if let Some(price) = changes.price_cents {
        validate_price_cents(price)?;
    }
    if let Some(stock) = changes.stock {
        validate_stock(stock)?;
    }
    if let Some(category) = &changes.category_id {
        ensure_category(&state, category).await?;
    }

    let product = state.db.products().update(&id, &changes).await?;
    info!(product_id = %product.id, stock = product.stock, "Product updated");
    Ok(ApiResponse::ok(product, "Product updated"))
}

async fn remove(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    // Order lines keep ordered items, and with them their product, alive
    state.db.products().delete(&id).await.map_err(|e| match e {
        DbError::ForeignKeyViolation { .. } => ApiError::validation(PRODUCT_ORDERED),
        other => ApiError::from(other),
    })?;
    info!(product_id = %id, "Product deleted");
    Ok(ApiResponse::ok(serde_json::json!({}), "Product deleted"))
}
