//! Counts HTTP responses per matched route and status code.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use seedwire_telemetry::Metrics;

/// Middleware recording `http_requests_total` once the response is built.
///
/// Unmatched requests are labelled with their raw path.
pub(crate) async fn count_requests(
    State(telemetry): State<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let route = request.extensions().get::<MatchedPath>().map_or_else(
        || request.uri().path().to_owned(),
        |matched| matched.as_str().to_owned(),
    );
    let response = next.run(request).await;
    telemetry.inc_http_request(&route, response.status().as_u16());
    response
}
