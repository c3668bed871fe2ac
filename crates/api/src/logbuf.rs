//! Console log ring buffer.
//!
//! The frontend shows a live console fed by `/api/logs`. Backend log lines
//! get there via [`ConsoleLayer`], a `tracing-subscriber` layer that copies
//! event messages into a shared [`ConsoleBuffer`]; the frontend can also
//! append its own entries through `POST /api/log`. The buffer is a bounded
//! ring, so it never grows past its configured capacity.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// One console log line.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// When the entry was recorded (UTC).
    pub timestamp: DateTime<Utc>,
    /// Where the entry came from (`"backend"` or `"frontend"`).
    pub source: String,
    /// The log message.
    pub message: String,
}

/// Bounded ring buffer of [`LogEntry`] items.
pub struct ConsoleBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl ConsoleBuffer {
    /// Create a buffer that retains at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Append an entry, evicting the oldest one at capacity.
    /// Returns the recorded entry.
    pub fn push(&self, source: impl Into<String>, message: impl Into<String>) -> LogEntry {
        let entry = LogEntry {
            timestamp: Utc::now(),
            source: source.into(),
            message: message.into(),
        };

        let mut entries = self.entries.lock().expect("console buffer lock poisoned");
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry.clone());
        entry
    }

    /// The most recent `limit` entries in chronological order.
    /// A limit of zero returns everything retained.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock().expect("console buffer lock poisoned");
        let skip = if limit == 0 || limit >= entries.len() {
            0
        } else {
            entries.len() - limit
        };
        entries.iter().skip(skip).cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tracing layer
// ---------------------------------------------------------------------------

/// A `tracing-subscriber` layer that mirrors INFO-and-above event messages
/// into a [`ConsoleBuffer`].
pub struct ConsoleLayer {
    buffer: Arc<ConsoleBuffer>,
}

impl ConsoleLayer {
    pub fn new(buffer: Arc<ConsoleBuffer>) -> Self {
        Self { buffer }
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // DEBUG and TRACE stay out of the operator console.
        if *event.metadata().level() > Level::INFO {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if let Some(message) = visitor.message {
            self.buffer.push("backend", message);
        }
    }
}

/// Extracts the `message` field from a tracing event.
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }
}
