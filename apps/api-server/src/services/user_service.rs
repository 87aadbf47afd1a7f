//! # User Service
//!
//! Registration and login. Sessions are stateless: login issues an access
//! token, logout only clears the cookie.

use serde::{Deserialize, Serialize};
use stockroom_core::validation::{validate_email, validate_password, validate_username};
use stockroom_core::{PublicUser, ValidationError};
use stockroom_db::Database;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, JwtManager};
use crate::error::{ApiError, ApiResult, ErrorCode};

/// Body of `POST /users/register`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Body of `POST /users/login`. `email` also accepts a username.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Returned by login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

fn required(value: Option<String>) -> ApiResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ValidationError::MissingFields.into())
}

pub async fn register(db: &Database, request: RegisterRequest) -> ApiResult<PublicUser> {
    let username = required(request.username)?;
    let email = required(request.email)?;
    let password = required(request.password)?;

    let username = validate_username(&username)?;
    let email = validate_email(&email)?;
    validate_password(&password)?;

    let hash = hash_password(&password)?;
    let user = db.users().insert(&username, &email, &hash).await?;

    info!(user_id = %user.id, username = %user.username, "User registered");
    Ok(PublicUser::from(user))
}

pub async fn login(
    db: &Database,
    jwt: &JwtManager,
    request: LoginRequest,
) -> ApiResult<LoginResponse> {
    let login = required(request.email)?;
    let password = required(request.password)?;

    let invalid = || ApiError::new(ErrorCode::Unauthorized, "Invalid credentials");

    let user = db
        .users()
        .find_by_login(login.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&password, &user.password_hash) {
        warn!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    let access_token = jwt.generate_access_token(&user.id)?;
    info!(user_id = %user.id, "User logged in");

    Ok(LoginResponse {
        user: PublicUser::from(user),
        access_token,
        expires_in: jwt.access_lifetime_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    fn ada() -> RegisterRequest {
        RegisterRequest {
            username: Some("ada".to_string()),
            email: Some("Ada@Example.com".to_string()),
            password: Some("correct horse".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let db = test_support::db().await;
        let jwt = JwtManager::new("test-secret".to_string(), 3600);

        let user = register(&db, ada()).await.unwrap();
        assert_eq!(user.email, "ada@example.com");

        let session = login(
            &db,
            &jwt,
            LoginRequest {
                email: Some("ada@example.com".to_string()),
                password: Some("correct horse".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(jwt.validate_access_token(&session.access_token).unwrap().sub, user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_missing_and_duplicate() {
        let db = test_support::db().await;

        let err = register(&db, RegisterRequest::default()).await.unwrap_err();
        assert_eq!(err.message, "Please provide all required fields");

        register(&db, ada()).await.unwrap();
        let err = register(&db, ada()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Duplicate);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let db = test_support::db().await;
        let jwt = JwtManager::new("test-secret".to_string(), 3600);
        register(&db, ada()).await.unwrap();

        for (email, password) in [("ada@example.com", "wrong horse"), ("bob@example.com", "x")] {
            let err = login(
                &db,
                &jwt,
                LoginRequest {
                    email: Some(email.to_string()),
                    password: Some(password.to_string()),
                },
            )
            .await
            .unwrap_err();
            assert_eq!(err.code, ErrorCode::Unauthorized);
        }
    }
}
