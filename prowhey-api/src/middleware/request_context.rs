//! Device and request identification (spec.md §6): every request carries
//! `X-Device-ID` (or `X-Client-ID` as fallback; generated and echoed back
//! when both are absent) and gets an `X-Request-ID` assigned. Both are
//! attached as request extensions for downstream handlers and middleware
//! (notably rate limiting), and wrap the request in a tracing span.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const DEVICE_ID_HEADER: &str = "x-device-id";
pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct DeviceId(pub String);

#[derive(Debug, Clone)]
pub struct RequestId(pub String);

pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let device_id = request
        .headers()
        .get(DEVICE_ID_HEADER)
        .or_else(|| request.headers().get(CLIENT_ID_HEADER))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    request.extensions_mut().insert(DeviceId(device_id.clone()));
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
        device_id = %device_id,
    );
    let mut response = next.run(request).instrument(span).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&device_id) {
        headers.insert(HeaderName::from_static(DEVICE_ID_HEADER), value);
    }
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}
