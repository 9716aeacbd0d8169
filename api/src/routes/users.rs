use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use giftwise_core::auth;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;
use crate::store::NewUser;

const ACCESS_TOKEN_TTL_DAYS: i64 = 7;
const MIN_PASSWORD_LEN: usize = 8;

/// Signup and login. Both are rate limited as a group.
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(signup))
        .route("/api/auth", post(login))
}

pub fn me_router() -> Router<AppState> {
    Router::new().route("/api/users/me", get(me))
}

// ──────────────────────────────────────────────
// POST /api/users
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub user_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = SignupResponse),
        (status = 400, description = "Validation error", body = giftwise_core::error::ApiError),
        (status = 409, description = "Email already registered", body = giftwise_core::error::ApiError)
    ),
    tag = "users"
)]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let first_name = non_blank(req.first_name);
    let last_name = non_blank(req.last_name);
    let email = non_blank(req.email);
    let password = req.password.filter(|p| !p.is_empty());
    let missing: Vec<&str> = [
        ("firstName", first_name.is_none()),
        ("lastName", last_name.is_none()),
        ("email", email.is_none()),
        ("password", password.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();
    let (Some(first_name), Some(last_name), Some(email), Some(password)) =
        (first_name, last_name, email, password)
    else {
        return Err(AppError::missing_fields(&missing));
    };

    let email = auth::normalize_email(&email);
    if !email.contains('@') {
        return Err(AppError::Validation {
            message: "email must be a valid email address".to_string(),
            field: Some("email".to_string()),
        });
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation {
            message: format!("password must be at least {MIN_PASSWORD_LEN} characters"),
            field: Some("password".to_string()),
        });
    }

    let password_hash = auth::hash_password(&password).map_err(AppError::Internal)?;
    let user = state
        .store
        .create_user(NewUser {
            first_name,
            last_name,
            email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            success: true,
            message: "User created successfully".to_string(),
            user_id: user.id,
        }),
    ))
}

// ──────────────────────────────────────────────
// POST /api/auth
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    /// Bearer token, valid for 7 days
    pub token: String,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing email or password", body = giftwise_core::error::ApiError),
        (status = 401, description = "Invalid credentials", body = giftwise_core::error::ApiError)
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = non_blank(req.email);
    let password = req.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email.as_deref(), password.as_deref()) else {
        let missing: Vec<&str> = [("email", email.is_none()), ("password", password.is_none())]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
        return Err(AppError::missing_fields(&missing));
    };

    let credentials = state
        .store
        .find_credentials(&auth::normalize_email(email))
        .await?
        .ok_or_else(invalid_credentials)?;
    if !auth::verify_password(password, &credentials.password_hash).map_err(AppError::Internal)? {
        return Err(invalid_credentials());
    }

    let (token, token_hash) = auth::generate_access_token();
    let expires_at: DateTime<Utc> = Utc::now() + Duration::days(ACCESS_TOKEN_TTL_DAYS);
    state
        .store
        .insert_access_token(credentials.id, &token_hash, expires_at)
        .await?;

    tracing::info!(user_id = %credentials.id, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        token,
        message: "Logged in successfully".to_string(),
    }))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized {
        message: "Invalid Email or Password".to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ──────────────────────────────────────────────
// GET /api/users/me
// ──────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub success: bool,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The token's owner", body = MeResponse),
        (status = 401, description = "Missing, malformed or expired token", body = giftwise_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn me(auth: AuthenticatedUser) -> Json<MeResponse> {
    let user = auth.user;
    Json(MeResponse {
        success: true,
        user_id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        created_at: user.created_at,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::TestApp;

    fn signup_body(email: &str) -> serde_json::Value {
        json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": email,
            "password": "correct horse"
        })
    }

    #[tokio::test]
    async fn signup_then_login_then_me() {
        let app = TestApp::new();

        let (status, json) = app.post("/api/users", signup_body("Ada@Example.com")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["success"], true);
        let user_id = json["userId"].as_str().unwrap().to_string();

        let (status, json) = app
            .post(
                "/api/auth",
                json!({"email": "ada@example.com", "password": "correct horse"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = json["token"].as_str().unwrap().to_string();
        assert!(token.starts_with("gw_at_"));

        let (status, json) = app.get_with_token("/api/users/me", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["userId"], user_id);
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["firstName"], "Ada");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let app = TestApp::new();
        let (status, _) = app.post("/api/users", signup_body("ada@example.com")).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, json) = app.post("/api/users", signup_body("ADA@example.com ")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "conflict");
        assert_eq!(json["field"], "email");
    }

    #[tokio::test]
    async fn signup_validates_input() {
        let app = TestApp::new();

        let (status, json) = app
            .post("/api/users", json!({"firstName": "Ada", "password": "short"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing required fields: lastName, email");

        let mut body = signup_body("ada@example.com");
        body["password"] = json!("short");
        let (status, json) = app.post("/api/users", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["field"], "password");

        let (status, json) = app.post("/api/users", signup_body("not-an-email")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["field"], "email");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = TestApp::new();
        app.post("/api/users", signup_body("ada@example.com")).await;

        for body in [
            json!({"email": "ada@example.com", "password": "wrong horse"}),
            json!({"email": "nobody@example.com", "password": "correct horse"}),
        ] {
            let (status, json) = app.post("/api/auth", body).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(json["error"], "Invalid Email or Password");
        }
    }

    #[tokio::test]
    async fn me_rejects_missing_or_unknown_tokens() {
        let app = TestApp::new();

        let (status, _) = app.get("/api/users/me").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, json) = app
            .get_with_token("/api/users/me", "gw_at_0000")
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "unauthorized");
    }
}
