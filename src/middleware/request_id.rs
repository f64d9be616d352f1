use std::{fmt, str::FromStr};

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Correlation header accepted from clients and set on every response
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation id kept in the request extensions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// The client's id when it is a valid UUID, a fresh v4 otherwise
    pub fn for_request(request: &Request) -> Self {
        request
            .headers()
            .get(&X_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(|| Self(Uuid::new_v4()))
    }

    fn header_value(self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.to_string()).ok()
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value).map(Self)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = RequestId::for_request(&request);
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if let Some(value) = id.header_value() {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    response
}

/// `TraceLayer` span; runs after `request_id_middleware` has tagged the request
pub fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    let id = request.extensions().get::<RequestId>().copied();

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %id.map_or_else(|| "-".to_string(), |id| id.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_header(value: &str) -> Request {
        axum::http::Request::builder()
            .header(&X_REQUEST_ID, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_incoming_request_id_is_reused() {
        let id = Uuid::new_v4();
        let request = request_with_header(&id.to_string());
        assert_eq!(RequestId::for_request(&request), RequestId(id));
    }

    #[test]
    fn test_malformed_request_id_is_replaced() {
        let generated = RequestId::for_request(&request_with_header("not-a-uuid"));
        assert_ne!(generated.to_string(), "not-a-uuid");
        assert_eq!(generated.0.get_version_num(), 4);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let id = RequestId(Uuid::new_v4());
        assert_eq!(id.to_string().parse::<RequestId>().unwrap(), id);
        assert!(id.header_value().is_some());
    }
}
