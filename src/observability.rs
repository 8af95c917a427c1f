use biometrics::{Collector, Counter, Moments, Sensor};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("retrochat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("retrochat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("retrochat.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("retrochat.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("retrochat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("retrochat.stream.bytes");

pub(crate) static SESSIONS_INITIALIZED: Counter =
    Counter::new("retrochat.session.initialized");
pub(crate) static MESSAGES_APPENDED: Counter = Counter::new("retrochat.session.messages_appended");
pub(crate) static MESSAGES_EVICTED: Counter = Counter::new("retrochat.session.messages_evicted");
pub(crate) static VALIDATION_ERRORS: Counter =
    Counter::new("retrochat.session.validation_errors");
pub(crate) static MODEL_REFRESHES: Counter = Counter::new("retrochat.session.model_refreshes");

pub(crate) static TURNS_STARTED: Counter = Counter::new("retrochat.turn.started");
pub(crate) static TURNS_COMPLETED: Counter = Counter::new("retrochat.turn.completed");
pub(crate) static TURNS_FAILED: Counter = Counter::new("retrochat.turn.failed");
pub(crate) static TURN_DURATION: Moments = Moments::new("retrochat.turn.duration_seconds");

pub(crate) static AGENT_STEPS: Counter = Counter::new("retrochat.agent.steps");
pub(crate) static AGENT_RESEARCH_EVENTS: Counter = Counter::new("retrochat.agent.research_events");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&SESSIONS_INITIALIZED);
    collector.register_counter(&MESSAGES_APPENDED);
    collector.register_counter(&MESSAGES_EVICTED);
    collector.register_counter(&VALIDATION_ERRORS);
    collector.register_counter(&MODEL_REFRESHES);

    collector.register_counter(&TURNS_STARTED);
    collector.register_counter(&TURNS_COMPLETED);
    collector.register_counter(&TURNS_FAILED);
    collector.register_moments(&TURN_DURATION);

    collector.register_counter(&AGENT_STEPS);
    collector.register_counter(&AGENT_RESEARCH_EVENTS);
}

/// Point-in-time readings of the turn and session counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Turns started since process start.
    pub turns_started: u64,
    /// Turns that stored an assistant reply.
    pub turns_completed: u64,
    /// Turns that ended without a reply.
    pub turns_failed: u64,
    /// Messages appended across all sessions.
    pub messages_appended: u64,
    /// Messages evicted by the capacity bound.
    pub messages_evicted: u64,
    /// HTTP requests sent to the provider.
    pub client_requests: u64,
}

/// Reads the current counter values.
pub fn snapshot() -> CounterSnapshot {
    CounterSnapshot {
        turns_started: TURNS_STARTED.read(),
        turns_completed: TURNS_COMPLETED.read(),
        turns_failed: TURNS_FAILED.read(),
        messages_appended: MESSAGES_APPENDED.read(),
        messages_evicted: MESSAGES_EVICTED.read(),
        client_requests: CLIENT_REQUESTS.read(),
    }
}
