//! Plain-text decision logger
//!
//! Formats each event as human-readable lines and writes them to a
//! configurable sink, stderr by default. This is the logger an enforcer
//! installs when none was supplied, so it starts disabled and costs one
//! atomic read per decision until someone turns it on.
//!
//! ## Design Notes
//!
//! - The enabled check runs before any formatting, so a disabled logger
//!   never allocates.
//! - The sink lives behind a `std::sync::Mutex`; a poisoned lock is
//!   recovered with `into_inner` since a half-written log line is still a
//!   usable sink.
//! - Write failures are swallowed with a `tracing::warn!`; diagnostics
//!   never turn into enforcement failures.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::warn;

use warden_core::domain::events::{EnforceEvent, ModelEvent, PolicyEvent};
use warden_core::ports::decision_logger::IDecisionLogger;

/// Text-line decision logger, stderr by default
pub struct DefaultLogger {
    enabled: AtomicBool,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl DefaultLogger {
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

    fn write_entry(&self, text: &str) {
        let mut sink = match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(sink, "{}", text) {
            warn!(error = %e, "Decision log write failed");
        }
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl IDecisionLogger for DefaultLogger {
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
        let mut text = String::from("Model:");
        for (name, entries) in event.sections() {
            text.push_str("\n[");
            text.push_str(name);
            text.push(']');
            for (key, value) in entries {
                text.push('\n');
                text.push_str(key);
                text.push_str(" = ");
                text.push_str(value);
            }
        }
        self.write_entry(&text);
    }

    fn log_enforce(&self, event: &EnforceEvent) {
        if !self.is_enabled() {
            return;
        }
        let mut text = format!(
            "Request: {} ---> {}",
            event.request().join(", "),
            event.decision()
        );
        if !event.explains().is_empty() {
            let rows: Vec<String> = event
                .explains()
                .iter()
                .map(|rule| format!("[{}]", rule))
                .collect();
            text.push_str("\nExplain: ");
            text.push_str(&rows.join(" "));
        }
        self.write_entry(&text);
    }

    fn log_policy(&self, event: &PolicyEvent) {
        if !self.is_enabled() {
            return;
        }
        let mut text = String::from("Policy:");
        for (ptype, rules) in event.sections() {
            for rule in rules {
                text.push('\n');
                text.push_str(ptype);
                text.push_str(", ");
                text.push_str(&rule.to_string());
            }
        }
        self.write_entry(&text);
    }

    fn log_role(&self, roles: &[String]) {
        if !self.is_enabled() {
            return;
        }
        self.write_entry(&format!("Roles: {}", roles.join(", ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use indexmap::IndexMap;
    use warden_core::domain::policy::PolicyRule;

    /// Shared buffer so tests can read back what the logger wrote
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Sink that always fails, for the absorb-failures contract
    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("sink is broken"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("sink is broken"))
        }
    }

    fn enforce_event() -> EnforceEvent {
        EnforceEvent::new(
            "r.sub == p.sub",
            vec!["alice".to_string(), "data1".to_string(), "read".to_string()],
            true,
            vec![PolicyRule::new(["alice", "data1", "read"])],
        )
    }

    #[test]
    fn test_starts_disabled() {
        let logger = DefaultLogger::new();
        assert!(!logger.is_enabled());
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let buf = SharedBuf::default();
        let logger = DefaultLogger::with_writer(Box::new(buf.clone()));

        logger.log_enforce(&enforce_event());
        logger.log_role(&["admin".to_string()]);

        assert!(buf.contents().is_empty());
    }

    #[test]
    fn test_set_enabled_is_idempotent() {
        let logger = DefaultLogger::new();
        logger.set_enabled(true);
        logger.set_enabled(true);
        assert!(logger.is_enabled());
        logger.set_enabled(false);
        logger.set_enabled(false);
        assert!(!logger.is_enabled());
    }

    #[test]
    fn test_enforce_line_format() {
        let buf = SharedBuf::default();
        let logger = DefaultLogger::with_writer(Box::new(buf.clone()));
        logger.set_enabled(true);

        logger.log_enforce(&enforce_event());

        let out = buf.contents();
        assert!(out.contains("Request: alice, data1, read ---> true"));
        assert!(out.contains("Explain: [alice, data1, read]"));
    }

    #[test]
    fn test_model_lines_preserve_section_order() {
        let buf = SharedBuf::default();
        let logger = DefaultLogger::with_writer(Box::new(buf.clone()));
        logger.set_enabled(true);

        let mut sections = IndexMap::new();
        let mut request = IndexMap::new();
        request.insert("r".to_string(), "sub, obj, act".to_string());
        sections.insert("request_definition".to_string(), request);
        let mut matchers = IndexMap::new();
        matchers.insert("m".to_string(), "r.sub == p.sub".to_string());
        sections.insert("matchers".to_string(), matchers);

        logger.log_model(&ModelEvent::new(sections));

        let out = buf.contents();
        let request_at = out.find("[request_definition]").unwrap();
        let matchers_at = out.find("[matchers]").unwrap();
        assert!(request_at < matchers_at);
        assert!(out.contains("r = sub, obj, act"));
    }

    #[test]
    fn test_policy_lines() {
        let buf = SharedBuf::default();
        let logger = DefaultLogger::with_writer(Box::new(buf.clone()));
        logger.set_enabled(true);

        let mut sections = IndexMap::new();
        sections.insert(
            "p".to_string(),
            vec![
                PolicyRule::new(["alice", "data1", "read"]),
                PolicyRule::new(["bob", "data2", "write"]),
            ],
        );
        logger.log_policy(&PolicyEvent::new(sections));

        let out = buf.contents();
        assert!(out.contains("p, alice, data1, read"));
        assert!(out.contains("p, bob, data2, write"));
    }

    #[test]
    fn test_sink_failure_is_absorbed() {
        let logger = DefaultLogger::with_writer(Box::new(FailingWriter));
        logger.set_enabled(true);

        // Must not panic, and the logger stays usable
        logger.log_enforce(&enforce_event());
        logger.log_role(&["admin".to_string()]);
        assert!(logger.is_enabled());
    }
}
