//! Metrics/tracing hooks.
//!
//! Events go to `tracing` under the `qflow` target; wire a subscriber (or an
//! OpenTelemetry layer) up in the binary.

pub fn emit_span(event: &str, key_values: &[(&str, String)]) {
    let span = tracing::span!(tracing::Level::TRACE, "qflow", event);
    let _entered = span.enter();
    for (k, v) in key_values {
        tracing::debug!(target: "qflow", %event, %k, %v, "metric");
    }
}
