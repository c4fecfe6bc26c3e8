//! Conversions between hyper/http types and Quill's in-memory response.

use anyhow::Context;
use bytes::Bytes;
use http::header::{LOCATION, SET_COOKIE};
use http::{Response, StatusCode, Uri};
use http_body_util::Full;
use quill_response::{Completion, MemoryTransport};

/// Convert a status code from u16.
pub fn status_from_u16(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Extract the path and query from a URI.
pub fn uri_path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// Turn a settled page into an HTTP response.
///
/// Headers and cookies set by the page are kept in both cases. A redirect
/// carries `Location` and an empty body regardless of what the page wrote.
pub fn into_http_response(
    transport: MemoryTransport,
    completion: Completion,
    redirect_status: u16,
) -> anyhow::Result<Response<Full<Bytes>>> {
    let (headers, cookies, body) = transport.into_parts();

    let (status, body) = match &completion {
        Completion::Finished => (StatusCode::OK, body),
        Completion::Redirected(_) => (status_from_u16(redirect_status), Bytes::new()),
    };

    let mut builder = Response::builder().status(status);
    for header in headers.iter() {
        builder = builder.header(header.name.as_str(), header.value.as_str());
    }
    for cookie in &cookies {
        builder = builder.header(SET_COOKIE, cookie.to_header_value());
    }
    if let Completion::Redirected(target) = &completion {
        builder = builder.header(LOCATION, target.as_str());
    }

    builder
        .body(Full::new(body))
        .context("page produced an invalid HTTP response")
}

/// Plain-text 500 response for failed pages.
pub fn internal_error() -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from_static(b"Internal Server Error")));
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp
}
