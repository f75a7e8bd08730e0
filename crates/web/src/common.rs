use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Query, Request},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::MethodFilter,
    Json,
};
use log::error;
use model::ExampleData;
use parking::RequestError;
use schemars::{schema_for, schema_for_value, JsonSchema};
use serde::{Deserialize, Serialize};

pub type RouteResult<O> = Result<O, RouteErrorResponse>;
pub type JsonResult<O> = RouteResult<Json<O>>;

/// A `MethodFilter` that matches all http methods.
pub(crate) const METHOD_FILTER_ALL: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::PUT)
    .or(MethodFilter::DELETE);

// - Services returning commonly used responses -

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaParams {
    #[serde(default = "Default::default")]
    example_data: bool,
}

pub(crate) async fn schema<T: ExampleData + JsonSchema + Serialize>(
    Query(params): Query<SchemaParams>,
) -> impl IntoResponse {
    if params.example_data {
        Json(schema_for_value!(T::example_data()))
    } else {
        Json(schema_for!(T))
    }
}

pub(crate) async fn schema_no_example<T: JsonSchema + Serialize>(
    Query(_params): Query<SchemaParams>,
) -> impl IntoResponse {
    Json(schema_for!(T))
}

pub(crate) async fn route_not_found(
    OriginalUri(original_uri): OriginalUri,
    req: Request,
) -> impl IntoResponse {
    RouteErrorResponse::not_found(req.method(), original_uri.path())
}

// - Commonly used responeses -

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteErrorResponse {
    #[serde(skip)]
    pub status_code: StatusCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_information: Option<String>,
}

impl RouteErrorResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            http_method: None,
            requested_uri: None,
            message: None,
            detailed_information: None,
        }
    }

    pub fn not_found(method: &Method, uri: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .with_method(method)
            .with_uri(uri)
            .with_default_message()
    }

    pub fn with_method(mut self, method: &Method) -> Self {
        self.http_method = Some(method.to_string());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.requested_uri = Some(uri.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_default_message(self) -> Self {
        let message = self
            .status_code
            .canonical_reason()
            .unwrap_or("something went wrong");
        self.with_message(message)
    }

    pub fn with_detailed_information(mut self, message: impl Into<String>) -> Self {
        self.detailed_information = Some(message.into());
        self
    }
}

impl From<RequestError> for RouteErrorResponse {
    fn from(value: RequestError) -> Self {
        match value {
            RequestError::NotFound => Self::new(StatusCode::NOT_FOUND)
                .with_message("The requested item does not exist."),
            RequestError::Conflict(why) => Self::new(StatusCode::CONFLICT)
                .with_message("The item conflicts with an existing one.")
                .with_detailed_information(why),
            RequestError::Invalid(why) => Self::new(StatusCode::BAD_REQUEST)
                .with_message(why.to_string()),
            other => {
                error!("request failed: {}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_default_message()
                    .with_detailed_information(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for RouteErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status())
            .with_message("The request body could not be read.")
            .with_detailed_information(rejection.body_text())
    }
}

impl IntoResponse for RouteErrorResponse {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use model::zone::ValidationError;

    use super::*;

    #[test]
    fn request_errors_map_to_status_codes() {
        let status = |error: RequestError| RouteErrorResponse::from(error).status_code;
        assert_eq!(status(RequestError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status(RequestError::Conflict("taken".to_owned())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(RequestError::Invalid(ValidationError::EmptyName)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(RequestError::BroadcasterGone),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_body_skips_empty_fields() {
        let body = serde_json::to_value(
            RouteErrorResponse::not_found(&Method::GET, "/nowhere"),
        )
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "httpMethod": "GET",
                "requestedUri": "/nowhere",
                "message": "Not Found",
            })
        );
    }
}
