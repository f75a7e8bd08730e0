use axum::{
    extract::{rejection::JsonRejection, OriginalUri, State},
    http::Method,
    routing::{get, on, post},
    Json, Router,
};
use log::debug;
use model::zone::{DetectionReport, ZoneRecord};
use parking::database::Database;

use crate::{
    auth::AdminIdentity,
    common::{
        route_not_found, schema_no_example, JsonResult, RouteErrorResponse, METHOD_FILTER_ALL,
    },
    WebState,
};

pub(crate) fn routes<D: Database + 'static>(state: WebState<D>) -> Router {
    Router::new()
        .route("/schema", get(schema_no_example::<DetectionReport>))
        .route("/", post(report::<D>))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// A detector's free-spot count for one zone, addressed by display number.
async fn report<D: Database + 'static>(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { client, .. }): State<WebState<D>>,
    detector: AdminIdentity,
    body: Result<Json<DetectionReport>, JsonRejection>,
) -> JsonResult<ZoneRecord> {
    let Json(report) = body.map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
    })?;
    debug!(
        "{} reports {} free spots for zone #{}",
        detector.username, report.free_spots, report.parking_number
    );
    client.report_detection(report).await.map(Json).map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use model::zone::NewZone;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::tests::{admin_token, memory_state, router};

    fn report(token: Option<&str>, parking_number: i32, free_spots: u32) -> Request<Body> {
        let mut builder = Request::post("/api/v1/detections")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder
            .body(Body::from(
                json!({ "parking_number": parking_number, "free_spots": free_spots })
                    .to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn report_sets_free_and_occupied() {
        let (state, _) = memory_state().await;
        let token = admin_token(&state);
        let new_zone: NewZone = serde_json::from_value(json!({
            "parking_name": "Complex_Studentesc",
            "parking_number": 4,
            "total_spots": 30,
            "coordinates": [
                { "latitude": 45.747, "longitude": 21.238 },
                { "latitude": 45.748, "longitude": 21.239 },
                { "latitude": 45.746, "longitude": 21.240 },
            ],
        }))
        .unwrap();
        state.client.create_zone(new_zone).await.unwrap();
        let app = router(state);

        let response = app.clone().oneshot(report(Some(&token), 4, 12)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value =
            serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap())
                .unwrap();
        assert_eq!(body["empty_spots"], json!(12));
        assert_eq!(body["occupied_spots"], json!(18));

        let response = app.clone().oneshot(report(Some(&token), 4, 31)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.clone().oneshot(report(Some(&token), 5, 1)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(report(None, 4, 1)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
