use super::schema::LicenseChanged;
use parking_lot::Mutex;

/// Receives domain events. Delivery (and its failures) is the sink's
/// business; callers fire and forget.
pub trait EventSink: Send + Sync {
    fn trigger(&self, event: &LicenseChanged);
}

/// Writes every event to the log.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn trigger(&self, event: &LicenseChanged) {
        tracing::info!(
            event = %event.event_name,
            context = event.context_id,
            file = event.object_id,
            license = %event.other.license,
            "event triggered"
        );
    }
}

/// Keeps events in memory, for callers that inspect them afterwards.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<LicenseChanged>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LicenseChanged> {
        self.events.lock().clone()
    }
}

impl EventSink for RecordingEventSink {
    fn trigger(&self, event: &LicenseChanged) {
        self.events.lock().push(event.clone());
    }
}
