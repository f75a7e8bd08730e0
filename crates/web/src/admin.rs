use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, on, post},
    Json, Router,
};
use log::info;
use parking::database::Database;
use serde::{Deserialize, Serialize};

use crate::{
    auth::AdminIdentity,
    common::{route_not_found, JsonResult, RouteErrorResponse, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes<D: Database + 'static>(state: WebState<D>) -> Router {
    Router::new()
        .route("/login", post(login::<D>))
        .route("/verify", get(verify))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub username: String,
    pub message: String,
    pub expires_at: i64,
}

async fn login<D: Database + 'static>(
    State(WebState { tokens, .. }): State<WebState<D>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> JsonResult<LoginResponse> {
    let Json(request) = body?;
    let issued = tokens
        .login(request.username.trim(), &request.password)
        .map_err(RouteErrorResponse::from)?;
    info!("admin `{}` logged in", issued.claims.sub);
    Ok(Json(LoginResponse {
        success: true,
        token: issued.token,
        username: issued.claims.sub,
        message: "Login successful".to_owned(),
        expires_at: issued.claims.exp,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub username: String,
    pub role: String,
    pub expires_at: i64,
}

async fn verify(identity: AdminIdentity) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        username: identity.username,
        role: identity.claims.role,
        expires_at: identity.claims.exp,
    })
}
