pub mod logging;
pub mod trace_context;

pub use logging::init_tracing;
pub use trace_context::{
    PropagateTraceContext, REQUEST_ID_HEADER, TRACEPARENT_HEADER, TRACESTATE_HEADER,
    current_trace_headers, extract_request_id, extract_traceparent,
};
