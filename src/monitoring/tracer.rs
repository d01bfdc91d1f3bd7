/*!
 * Structured Tracing
 *
 * Subscriber setup and a span type for lock waits. Each wait gets a trace id
 * so a waiter's registration, release or interruption can be correlated in
 * the logs.
 */

use crate::markers::MarkerId;
use std::sync::Once;
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Environment variable switching the subscriber to JSON output
pub const ENV_TRACE_JSON: &str = "LOCK_ORDER_TRACE_JSON";

/// Waits longer than this are logged at `warn`
pub const SLOW_WAIT_THRESHOLD: Duration = Duration::from_secs(1);

/// Initialize the global tracing subscriber
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - LOCK_ORDER_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .compact(),
            )
            .init();
        info!("Structured tracing initialized");
    }
}

/// Subscriber for tests: captured output, safe to call repeatedly
pub fn init_test_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Generate a unique trace ID for wait correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one thread's wait for its marker to become minimal
pub struct WaitSpan {
    span: tracing::Span,
    start: Instant,
    trace_id: String,
    outcome: &'static str,
}

impl WaitSpan {
    pub fn new(marker: &MarkerId) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "lock_wait",
            trace_id = %trace_id,
            marker = %marker,
            sequence = marker.sequence(),
            outcome = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );

        span.in_scope(|| debug!(marker = %marker, "wait started"));

        Self {
            span,
            start: Instant::now(),
            trace_id,
            outcome: "abandoned",
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Record how the wait ended: "released", "timeout", "cancelled", ...
    pub fn record_outcome(&mut self, outcome: &'static str) {
        self.outcome = outcome;
        self.span.record("outcome", outcome);
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for WaitSpan {
    fn drop(&mut self) {
        let waited = self.start.elapsed();
        self.span.record("duration_ms", waited.as_millis() as u64);
        let _entered = self.span.enter();

        if waited > SLOW_WAIT_THRESHOLD {
            warn!(
                trace_id = %self.trace_id,
                outcome = self.outcome,
                duration_ms = waited.as_millis() as u64,
                slow = true,
                "slow lock wait"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                outcome = self.outcome,
                duration_us = waited.as_micros() as u64,
                "wait finished"
            );
        }
    }
}
