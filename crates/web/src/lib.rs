pub use crate::common::RouteResult;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::FromRef,
    response::IntoResponse,
    routing::{get, on},
    Json, Router,
};
use log::info;
use parking::{client::Client, database::Database};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::TokenService,
    common::{route_not_found, METHOD_FILTER_ALL},
};

pub mod admin;
pub mod api;
pub mod auth;
pub mod common;
pub mod config;
pub mod ws;

pub struct WebState<D>
where
    D: Database + 'static,
{
    pub client: Client<D>,
    pub tokens: Arc<TokenService>,
}

impl<D: Database + 'static> Clone for WebState<D> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<D: Database + 'static> FromRef<WebState<D>> for Arc<TokenService> {
    fn from_ref(state: &WebState<D>) -> Self {
        Arc::clone(&state.tokens)
    }
}

pub fn router<D: Database + 'static>(state: WebState<D>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws/parking", get(ws::parking_socket::<D>))
        .nest_service("/api", api::routes(state.clone()))
        .nest_service("/admin", admin::routes(state.clone()))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn start_web_server<D: Database + 'static>(
    state: WebState<D>,
    bind_address: SocketAddr,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_address).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutting down");
            }
        })
        .await?;

    Ok(())
}

async fn index() -> impl IntoResponse {
    Json(json!({
        "service": "parking",
        "endpoints": {
            "snapshot": "GET /api/v1/parcari/all",
            "zone_by_name": "GET /api/v1/parcari/by-name/:name",
            "stats": "GET /api/v1/parcari/stats",
            "schema": "GET /api/v1/parcari/schema",
            "create_zone": "POST /api/v1/parcari (admin)",
            "update_zone": "PUT /api/v1/parcari/:id (admin)",
            "detection": "POST /api/v1/detections (admin)",
            "login": "POST /admin/login",
            "verify": "GET /admin/verify",
            "live": "GET /ws/parking (websocket)",
        }
    }))
}
