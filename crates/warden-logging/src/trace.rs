//! Tracing bridge decision logger
//!
//! Forwards decision events onto the `tracing` ecosystem under the
//! `warden::decision` target, so deployments that already ship tracing
//! output get decision trails in the same pipeline with no extra sink.
//!
//! Emission is subject to the usual `tracing` subscriber filtering on top
//! of this logger's own enabled flag.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use warden_core::domain::events::{EnforceEvent, ModelEvent, PolicyEvent};
use warden_core::ports::decision_logger::IDecisionLogger;

const TARGET: &str = "warden::decision";

/// Decision logger that emits `tracing` events
#[derive(Debug, Default)]
pub struct TracingLogger {
    enabled: AtomicBool,
}

impl TracingLogger {
    /// Creates a disabled tracing bridge
    pub fn new() -> Self {
        Self::default()
    }
}

impl IDecisionLogger for TracingLogger {
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
        let sections: Vec<&str> = event.sections().map(|(name, _)| name).collect();
        info!(
            target: TARGET,
            sections = ?sections,
            "Model loaded"
        );
    }

    fn log_enforce(&self, event: &EnforceEvent) {
        if !self.is_enabled() {
            return;
        }
        info!(
            target: TARGET,
            request = %event.request().join(", "),
            decision = event.decision(),
            matcher = %event.matcher(),
            explains = event.explains().len(),
            "Enforcement decision"
        );
    }

    fn log_policy(&self, event: &PolicyEvent) {
        if !self.is_enabled() {
            return;
        }
        let rows: usize = event.sections().map(|(_, rules)| rules.len()).sum();
        info!(
            target: TARGET,
            rows,
            "Policy loaded"
        );
    }

    fn log_role(&self, roles: &[String]) {
        if !self.is_enabled() {
            return;
        }
        info!(
            target: TARGET,
            roles = %roles.join(", "),
            "Role links"
        );
    }
}
