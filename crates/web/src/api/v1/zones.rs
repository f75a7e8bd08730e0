use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, State},
    http::{Method, StatusCode},
    routing::{get, on, post},
    Json, Router,
};
use log::info;
use model::{
    stats::SnapshotStats,
    zone::{NewZone, ZoneId, ZoneRecord, ZoneUpdate},
    Snapshot,
};
use parking::database::Database;

use crate::{
    auth::AdminIdentity,
    common::{
        route_not_found, schema, JsonResult, RouteErrorResponse, RouteResult, METHOD_FILTER_ALL,
    },
    WebState,
};

pub(crate) fn routes<D: Database + 'static>(state: WebState<D>) -> Router {
    Router::new()
        .route("/schema", get(schema::<ZoneRecord>))
        .route("/stats/schema", get(schema::<SnapshotStats>))
        .route("/all", get(get_all::<D>))
        .route("/stats", get(get_stats::<D>))
        .route("/by-name/:name", get(get_by_name::<D>))
        .route("/:id", get(get_zone::<D>).put(update_zone::<D>))
        .route("/", post(create_zone::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// The full snapshot, ordered by `parking_number`. Viewers poll this when
/// the socket is unavailable.
async fn get_all<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, .. }): State<WebState<D>>,
) -> JsonResult<Snapshot> {
    client.get_snapshot().await.map(Json).map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    })
}

async fn get_stats<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, .. }): State<WebState<D>>,
) -> JsonResult<SnapshotStats> {
    client.get_stats().await.map(Json).map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    })
}

async fn get_by_name<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    Path(name): Path<String>,
    State(WebState { client, .. }): State<WebState<D>>,
) -> JsonResult<ZoneRecord> {
    client.get_zone_by_name(&name).await.map(Json).map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    })
}

async fn get_zone<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<i32>,
    State(WebState { client, .. }): State<WebState<D>>,
) -> JsonResult<ZoneRecord> {
    client.get_zone(ZoneId(id)).await.map(Json).map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    })
}

async fn create_zone<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, .. }): State<WebState<D>>,
    admin: AdminIdentity,
    body: Result<Json<NewZone>, JsonRejection>,
) -> RouteResult<(StatusCode, Json<ZoneRecord>)> {
    let Json(new_zone) = body.map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
    })?;
    let record = client.create_zone(new_zone).await.map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
    })?;
    info!(
        "{} created zone {} `{}`",
        admin.username, record.id, record.zone.parking_name
    );
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_zone<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<i32>,
    State(WebState { client, .. }): State<WebState<D>>,
    admin: AdminIdentity,
    body: Result<Json<ZoneUpdate>, JsonRejection>,
) -> JsonResult<ZoneRecord> {
    let Json(update) = body.map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::PUT)
            .with_uri(original_uri.path())
    })?;
    let record = client.update_zone(ZoneId(id), update).await.map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::PUT)
            .with_uri(original_uri.path())
    })?;
    info!("{} updated zone {}", admin.username, record.id);
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
        Router,
    };
    use model::zone::ZoneType;
    use parking::memory::MemoryDatabase;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::tests::{admin_token, memory_state, router};

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn curb_line(points: usize) -> Value {
        let coordinates = (0..points)
            .map(|i| json!({ "latitude": 45.75 + i as f64 * 0.001, "longitude": 21.22 }))
            .collect::<Vec<_>>();
        json!({
            "parking_name": "Strada_Alba_Iulia",
            "total_spots": 10,
            "empty_spots": 3,
            "price_per_hour": 2.5,
            "schedule": "08:00-20:00",
            "has_surveillance": false,
            "has_disabled_access": true,
            "has_ev_charging": false,
            "type": 1,
            "coordinates": coordinates,
        })
    }

    async fn app() -> (Router, MemoryDatabase, String) {
        let (state, database) = memory_state().await;
        let token = admin_token(&state);
        (router(state), database, token)
    }

    #[tokio::test]
    async fn created_zone_is_served_in_snapshot() {
        let (app, _, token) = app().await;

        let (status, created) = call(
            &app,
            json_request(Method::POST, "/api/v1/parcari", Some(&token), curb_line(2)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, snapshot) = call(&app, get("/api/v1/parcari/all")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot, json!([created.clone()]));

        let mut expected = curb_line(2);
        for (field, value) in expected.as_object_mut().unwrap().iter_mut() {
            if field == "coordinates" {
                for (i, point) in value.as_array_mut().unwrap().iter_mut().enumerate() {
                    point["point_order"] = json!(i + 1);
                }
            }
            assert_eq!(&created[field], value, "field `{}` differs", field);
        }
        assert_eq!(created["occupied_spots"], json!(7));
        assert_eq!(created["type"], json!(ZoneType::CurbLine as u8));
    }

    #[tokio::test]
    async fn curb_line_needs_two_points() {
        let (app, _, token) = app().await;
        let (status, body) = call(
            &app,
            json_request(Method::POST, "/api/v1/parcari", Some(&token), curb_line(1)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("at least 2 points"));

        let (_, snapshot) = call(&app, get("/api/v1/parcari/all")).await;
        assert_eq!(snapshot, json!([]));
    }

    #[tokio::test]
    async fn mutations_require_admin_token() {
        let (app, _, _) = app().await;
        let (status, _) = call(
            &app,
            json_request(Method::POST, "/api/v1/parcari", None, curb_line(2)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(
            &app,
            json_request(Method::PUT, "/api/v1/parcari/1", Some("forged"), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, snapshot) = call(&app, get("/api/v1/parcari/all")).await;
        assert_eq!(snapshot, json!([]));
    }

    #[tokio::test]
    async fn update_lookup_and_stats() {
        let (app, _, token) = app().await;
        let (_, created) = call(
            &app,
            json_request(Method::POST, "/api/v1/parcari", Some(&token), curb_line(2)),
        )
        .await;
        let id = created["id"].as_i64().unwrap();

        let (status, updated) = call(
            &app,
            json_request(
                Method::PUT,
                &format!("/api/v1/parcari/{}", id),
                Some(&token),
                json!({ "empty_spots": 0, "price_per_hour": null }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["occupied_spots"], json!(10));
        assert_eq!(updated["price_per_hour"], Value::Null);

        let (status, found) = call(&app, get("/api/v1/parcari/by-name/strada_alba_iulia")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found, updated);

        let (status, _) = call(&app, get("/api/v1/parcari/by-name/nowhere")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, stats) = call(&app, get("/api/v1/parcari/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            stats,
            json!({ "total_zones": 1, "total_empty": 0, "total_occupied": 10, "total_spots": 10 })
        );

        let (status, _) = call(
            &app,
            json_request(
                Method::PUT,
                "/api/v1/parcari/999",
                Some(&token),
                json!({ "empty_spots": 1 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let (app, _, token) = app().await;
        let request = || json_request(Method::POST, "/api/v1/parcari", Some(&token), curb_line(2));
        assert_eq!(call(&app, request()).await.0, StatusCode::CREATED);
        assert_eq!(call(&app, request()).await.0, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn store_outage_is_a_server_error() {
        let (app, database, _) = app().await;
        database.set_unreachable(true);
        // the initial snapshot is cached, so the fetch still succeeds
        let (status, snapshot) = call(&app, get("/api/v1/parcari/all")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot, json!([]));

        let (status, body) = call(&app, get("/api/v1/parcari/by-name/any")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn schema_and_unknown_routes() {
        let (app, _, _) = app().await;
        let (status, schema) = call(&app, get("/api/v1/parcari/schema")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(schema["properties"]["parking_name"].is_object());

        let (status, body) = call(&app, get("/api/v1/nothing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], json!("Not Found"));
    }
}
