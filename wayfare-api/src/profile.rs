use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wayfare_booking::{BookingStore, User, UserStore};

use crate::auth::{current_user, TokenClaims};
use crate::bookings::BookingResponse;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ProfileResponse {
    user: UserResponse,
    bookings: Vec<BookingResponse>,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    id: Uuid,
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    name: String,
    email: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/profile", get(view_profile).put(update_profile))
}

async fn view_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = current_user(&state, &claims).await?;
    let bookings = state.store.bookings_for_user(user.id).await?;
    Ok(Json(ProfileResponse {
        user: UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
        },
        bookings: bookings.iter().map(BookingResponse::from_domain).collect(),
    }))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest(format!(
            "invalid email address: {}",
            req.email
        )));
    }

    let user = current_user(&state, &claims).await?;
    let updated = User {
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        ..user
    };
    state.store.update_user(&updated).await?;
    tracing::info!(user_id = %updated.id, "profile updated");
    Ok(Json(UserResponse {
        id: updated.id,
        name: updated.name,
        email: updated.email,
    }))
}
