//! Observability for cairndb
//!
//! Lifecycle events are typed (`Event`) and emitted through `tracing` under
//! the `cairndb::events` target. The library never installs a subscriber;
//! binaries decide where records go.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No background threads
//!
//! # Usage
//!
//! ```ignore
//! use cairndb::observability::{log_event, log_event_with_fields, Event};
//!
//! log_event(Event::BootStart);
//! log_event_with_fields(Event::CheckpointComplete, &[("documents", "42")]);
//! ```

mod events;

pub use events::{Event, EventLevel};

use tracing::{debug, error, info, warn};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
///
/// Fields are rendered as `key=value` pairs in the `fields` attribute.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let rendered = render_fields(fields);
    let name = event.as_str();
    match event.level() {
        EventLevel::Debug => debug!(target: "cairndb::events", event = name, fields = %rendered),
        EventLevel::Info => info!(target: "cairndb::events", event = name, fields = %rendered),
        EventLevel::Warn => warn!(target: "cairndb::events", event = name, fields = %rendered),
        EventLevel::Error => {
            error!(target: "cairndb::events", event = name, fatal = event.is_fatal(), fields = %rendered)
        }
    }
}

fn render_fields(fields: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(key);
        out.push('=');
        if value.is_empty() || value.contains(char::is_whitespace) {
            out.push_str(&format!("{:?}", value));
        } else {
            out.push_str(value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fields() {
        assert_eq!(render_fields(&[]), "");
        assert_eq!(
            render_fields(&[("documents", "42"), ("path", "/tmp/data dir")]),
            "documents=42 path=\"/tmp/data dir\""
        );
        assert_eq!(render_fields(&[("reason", "")]), "reason=\"\"");
    }

    #[test]
    fn test_log_event_without_subscriber() {
        log_event(Event::BootStart);
        log_event(Event::RecoveryFailed);
        log_event_with_fields(Event::ConfigLoaded, &[("data_dir", "/tmp/test")]);
    }
}
