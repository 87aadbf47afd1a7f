//! User routes: register, login, me, logout.
//!
//! Login answers with the token in the body and as an `accessToken` cookie;
//! either can be sent back on later requests.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{get, post};
use axum::Router;
use stockroom_core::PublicUser;

use super::ApiJson;
use crate::auth::{AuthUser, ACCESS_TOKEN_COOKIE};
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::services::user_service::{self, LoginRequest, RegisterRequest};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", get(logout))
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{ACCESS_TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}")
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let user = user_service::register(&state.db, body).await?;
    Ok(ApiResponse::created(user, "User registered successfully"))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = user_service::login(&state.db, &state.jwt, body).await?;
    let cookie = session_cookie(&session.access_token, session.expires_in);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        ApiResponse::ok(session, "User logged in successfully"),
    ))
}

async fn me(user: AuthUser) -> ApiResponse<PublicUser> {
    ApiResponse::ok(user.0, "User details")
}

async fn logout(user: AuthUser) -> impl IntoResponse {
    tracing::info!(user_id = %user.id(), "User logged out");
    (
        AppendHeaders([(SET_COOKIE, session_cookie("", 0))]),
        ApiResponse::ok(serde_json::json!({}), "User logged out successfully"),
    )
}
