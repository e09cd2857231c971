//! Monotonic timestamp source for `_createdAt` / `_updatedAt`

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp the way it is stored in documents.
///
/// Fixed microsecond precision keeps lexicographic and chronological order
/// identical.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp. Returns `None` for anything that is not RFC 3339.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Wall clock that never goes backwards.
///
/// Each stamp is at least as late as every stamp issued or observed before.
#[derive(Debug, Default, Clone)]
pub struct MonotonicClock {
    last: Option<DateTime<Utc>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next timestamp
    pub fn now(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last = Some(stamp);
        stamp
    }

    /// Advances the clock past a timestamp seen during replay.
    pub fn observe(&mut self, ts: DateTime<Utc>) {
        if self.last.map_or(true, |last| ts > last) {
            self.last = Some(ts);
        }
    }

    /// Last issued or observed timestamp
    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.last
    }
}
