//! Begin/complete logging around one CLI command
//!
//! - `{name}_BEGIN` when the scope opens
//! - `{name}_COMPLETE` or `{name}_FAILED` when it is closed, with the
//!   elapsed time in `duration_ms`
//! - `{name}_INCOMPLETE` when it is dropped while still open

use std::time::Instant;

use super::logger::Logger;

/// A timed scope that logs how a command ended
///
/// # Usage
///
/// ```ignore
/// let scope = ObservationScope::new("FORM_VALIDATE").with_field("input", "stdin");
/// // ... do work ...
/// scope.complete(&[("errors", "2")]); // logs FORM_VALIDATE_COMPLETE
/// ```
pub struct ObservationScope {
    name: &'static str,
    timer: Timer,
    fields: Vec<(&'static str, String)>,
    closed: bool,
}

impl ObservationScope {
    /// Opens a scope; logs `{name}_BEGIN`
    pub fn new(name: &'static str) -> Self {
        Logger::info(&format!("{}_BEGIN", name), &[]);
        Self {
            name,
            timer: Timer::new(),
            fields: Vec::new(),
            closed: false,
        }
    }

    /// Adds a field repeated on the closing event
    pub fn with_field(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    /// Closes the scope successfully; logs `{name}_COMPLETE` at INFO
    pub fn complete(mut self, extra: &[(&str, &str)]) {
        self.closed = true;
        let duration = self.timer.elapsed_ms();
        let mut fields = self.field_refs(&duration);
        fields.extend_from_slice(extra);
        Logger::info(&format!("{}_COMPLETE", self.name), &fields);
    }

    /// Closes the scope as failed; logs `{name}_FAILED` at ERROR
    pub fn fail(mut self, reason: &str) {
        self.closed = true;
        let duration = self.timer.elapsed_ms();
        let mut fields = self.field_refs(&duration);
        fields.push(("reason", reason));
        Logger::error(&format!("{}_FAILED", self.name), &fields);
    }

    fn field_refs<'f>(&'f self, duration: &'f str) -> Vec<(&'f str, &'f str)> {
        let mut fields: Vec<(&str, &str)> = self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        fields.push(("duration_ms", duration));
        fields
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.closed {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

/// Elapsed wall-clock time
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    /// Elapsed milliseconds as a string
    pub fn elapsed_ms(&self) -> String {
        self.start.elapsed().as_millis().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::logger::capture_log;
    use crate::observability::Severity;

    #[test]
    fn test_scope_closes() {
        let scope = ObservationScope::new("FORM_TEST").with_field("input", "stdin");
        assert!(!scope.closed);
        scope.complete(&[("errors", "0")]);

        ObservationScope::new("FORM_TEST").fail("bad schema");
        drop(ObservationScope::new("FORM_TEST"));
    }

    #[test]
    fn test_failed_line_shape() {
        let line = capture_log(Severity::Error, "FORM_TEST_FAILED", &[("duration_ms", "1"), ("reason", "x")]);
        assert!(line.starts_with(r#"{"event":"FORM_TEST_FAILED","severity":"ERROR""#));
    }

    #[test]
    fn test_timer() {
        let timer = Timer::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let ms: u64 = timer.elapsed_ms().parse().unwrap();
        assert!(ms >= 10);
    }
}
