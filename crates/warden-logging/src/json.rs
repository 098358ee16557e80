//! Structured JSON decision logger
//!
//! Emits one JSON object per event, newline-delimited, with an RFC 3339
//! timestamp and an `event` discriminator. Suited to log shippers that
//! want machine-readable decision trails.
//!
//! ```json
//! {"ts":"2026-07-18T09:14:02.113Z","event":"enforce","matcher":"...","request":["alice","data1","read"],"decision":true,"explains":[["alice","data1","read"]]}
//! ```
//!
//! Same contract semantics as the plain logger: starts disabled, no-op
//! while disabled, serialization and write failures absorbed.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use tracing::warn;

use warden_core::domain::events::{EnforceEvent, ModelEvent, PolicyEvent};
use warden_core::ports::decision_logger::IDecisionLogger;

/// Newline-delimited JSON decision logger, stderr by default
pub struct JsonLogger {
    enabled: AtomicBool,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl JsonLogger {
    /// Creates a disabled logger writing to stderr
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Creates a disabled logger writing to the given sink
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            sink: Mutex::new(writer),
        }
    }

    fn write_record(&self, record: serde_json::Value) {
        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Decision log serialization failed");
                return;
            }
        };
        let mut sink = match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(sink, "{}", line) {
            warn!(error = %e, "Decision log write failed");
        }
    }
}

impl Default for JsonLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl IDecisionLogger for JsonLogger {
    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn log_model(&self, event: &ModelEvent) {
        if !self.is_enabled() {
            return;
        }
        self.write_record(serde_json::json!({
            "ts": Utc::now().to_rfc3339(),
            "event": "model",
            "model": event,
        }));
    }

    fn log_enforce(&self, event: &EnforceEvent) {
        if !self.is_enabled() {
            return;
        }
        self.write_record(serde_json::json!({
            "ts": Utc::now().to_rfc3339(),
            "event": "enforce",
            "matcher": event.matcher(),
            "request": event.request(),
            "decision": event.decision(),
            "explains": event.explains(),
        }));
    }

    fn log_policy(&self, event: &PolicyEvent) {
        if !self.is_enabled() {
            return;
        }
        self.write_record(serde_json::json!({
            "ts": Utc::now().to_rfc3339(),
            "event": "policy",
            "policy": event,
        }));
    }

    fn log_role(&self, roles: &[String]) {
        if !self.is_enabled() {
            return;
        }
        self.write_record(serde_json::json!({
            "ts": Utc::now().to_rfc3339(),
            "event": "role",
            "roles": roles,
        }));
    }
}
