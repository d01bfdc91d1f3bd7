/*!
 * Monitoring
 * Structured tracing setup and wait spans
 */

mod tracer;

pub use tracer::{
    generate_trace_id, init_test_tracing, init_tracing, WaitSpan, ENV_TRACE_JSON,
    SLOW_WAIT_THRESHOLD,
};
