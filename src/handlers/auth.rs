use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::Result,
    models::user::{LoginRequest, RegisterRequest},
    state::AppState,
};

/// Handler for user registration
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    state
        .auth
        .register(&request.username, &request.password, request.role)
        .await?;

    Ok(StatusCode::CREATED)
}

/// Handler for login, answers with a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let response = state.auth.login(&request.username, &request.password).await?;
    Ok((StatusCode::OK, Json(response)))
}
