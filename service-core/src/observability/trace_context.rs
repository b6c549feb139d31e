//! W3C Trace Context for the HTTP edges of a service.
//!
//! Outbound calls (datastore, object storage) carry the current span's
//! `traceparent` so upstream logs line up with ours; inbound `traceparent`
//! headers are only trusted when they are well formed.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::RequestBuilder;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Trace headers for the current span. Empty when no span context is active,
/// e.g. when OTLP export is disabled.
pub fn current_trace_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let context = Span::current().context();
    let span = context.span();
    let span_context = span.span_context();

    if !span_context.is_valid() {
        return headers;
    }

    let traceparent = format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    );
    if let Ok(value) = HeaderValue::from_str(&traceparent) {
        headers.insert(TRACEPARENT_HEADER, value);
    }

    let tracestate = span_context.trace_state().header();
    if !tracestate.is_empty()
        && let Ok(value) = HeaderValue::from_str(&tracestate)
    {
        headers.insert(TRACESTATE_HEADER, value);
    }

    headers
}

/// Attaches the current trace context to an outbound request.
pub trait PropagateTraceContext {
    fn with_trace_context(self) -> Self;
}

impl PropagateTraceContext for RequestBuilder {
    fn with_trace_context(self) -> Self {
        self.headers(current_trace_headers())
    }
}

/// Inbound `traceparent`, if it is a version-00 header with non-zero ids.
pub fn extract_traceparent(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(TRACEPARENT_HEADER)?.to_str().ok()?;
    is_valid_traceparent(value).then(|| value.to_ascii_lowercase())
}

pub fn extract_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn is_valid_traceparent(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    let &[version, trace_id, parent_id, flags] = parts.as_slice() else {
        return false;
    };

    let hex = |s: &str, len: usize| s.len() == len && s.chars().all(|c| c.is_ascii_hexdigit());
    let non_zero = |s: &str| s.chars().any(|c| c != '0');

    version == "00"
        && hex(trace_id, 32)
        && non_zero(trace_id)
        && hex(parent_id, 16)
        && non_zero(parent_id)
        && hex(flags, 2)
}
