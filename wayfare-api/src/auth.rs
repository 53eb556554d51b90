use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wayfare_booking::{User, UserStore};

use crate::error::ApiError;
use crate::state::{AppState, AuthConfig};

pub const ROLE_CUSTOMER: &str = "CUSTOMER";
pub const ROLE_ADMIN: &str = "ADMIN";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
struct AdminLoginRequest {
    key: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/admin", post(admin_login))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest(format!(
            "invalid email address: {}",
            req.email
        )));
    }

    let user = User::new(req.name.trim().to_string(), req.email.trim().to_string());
    state.store.insert_user(&user).await?;
    tracing::info!(user_id = %user.id, "account registered");
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id: user.id })))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .store
        .user_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("unknown email address".to_string()))?;

    let token = issue_token(&state.auth, &user.id.to_string(), &user.email, ROLE_CUSTOMER)?;
    Ok(Json(AuthResponse { token }))
}

async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if req.key != state.auth.admin_key {
        return Err(ApiError::Unauthorized("invalid admin key".to_string()));
    }
    let token = issue_token(&state.auth, "back-office", "", ROLE_ADMIN)?;
    Ok(Json(AuthResponse { token }))
}

fn issue_token(auth: &AuthConfig, sub: &str, email: &str, role: &str) -> Result<String, ApiError> {
    let claims = TokenClaims {
        sub: sub.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token encoding failed: {e}")))
}

fn bearer_claims(auth: &AuthConfig, headers: &HeaderMap) -> Result<TokenClaims, ApiError> {
    let header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("invalid token".to_string()))?;
    Ok(data.claims)
}

pub async fn require_customer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_claims(&state.auth, req.headers())?;
    if claims.role != ROLE_CUSTOMER {
        return Err(ApiError::Forbidden("customer token required".to_string()));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_claims(&state.auth, req.headers())?;
    if claims.role != ROLE_ADMIN {
        return Err(ApiError::Forbidden("admin token required".to_string()));
    }
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// The account behind a customer token.
pub async fn current_user(state: &AppState, claims: &TokenClaims) -> Result<User, ApiError> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("invalid token subject".to_string()))?;
    state
        .store
        .user(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("unknown account".to_string()))
}
