use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::api::error::ApiResult;
use crate::api::AppState;
use crate::auth::{LoginInput, RegisterInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[tracing::instrument(skip_all)]
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user_id = state.auth.register(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful.",
            "userId": user_id,
        })),
    ))
}

#[tracing::instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> ApiResult<Json<Value>> {
    let user_id = state.auth.login(input).await?;
    Ok(Json(json!({
        "message": "Login successful.",
        "userId": user_id,
    })))
}
