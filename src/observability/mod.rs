//! Observability for formschema
//!
//! Structured JSON logging of resolution, default computation and
//! validation events.
//!
//! # Usage
//!
//! ```ignore
//! use formschema::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::NoMatchingOption, &[("options", "2")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::{ObservationScope, Timer};

/// Log an event; warning events are logged at WARN, the rest at INFO
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log an event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_warning() {
        Severity::Warn
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

/// Log an event at TRACE level regardless of its kind
pub fn trace_event(event: Event, fields: &[(&str, &str)]) {
    Logger::trace(event.as_str(), fields);
}
