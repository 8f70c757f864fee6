use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::errors::RegistrationError;

/// Default capacity of the event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Result of a single request against the push server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(RegistrationError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_result(self) -> Result<String, RegistrationError> {
        match self {
            Outcome::Success(body) => Ok(body),
            Outcome::Failure(err) => Err(err),
        }
    }
}

/// Caller supplied completion handler.
///
/// `Ok(body)` carries the server response, `Err(e)` the failure.
pub type OutcomeCallback = Box<dyn FnOnce(Result<String, RegistrationError>) + Send + 'static>;

/// Event emitted when no callback was supplied for a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    Success(String),
    Error(RegistrationError),
}

impl PushEvent {
    /// Event name, `"success"` or `"error"`
    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::Success(_) => "success",
            PushEvent::Error(_) => "error",
        }
    }
}

impl From<Outcome> for PushEvent {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success(body) => PushEvent::Success(body),
            Outcome::Failure(err) => PushEvent::Error(err),
        }
    }
}

/// Broadcast channel that observers subscribe to for outcome events
#[derive(Debug, Clone)]
pub struct EventChannel {
    sender: broadcast::Sender<PushEvent>,
}

impl EventChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Emit an event to every current subscriber
    ///
    /// # Returns
    /// Number of subscribers that received the event
    pub fn emit(&self, event: PushEvent) -> usize {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(event = name, receivers, "Push registry event emitted");
                receivers
            }
            Err(_) => {
                warn!(event = name, "Push registry event dropped: no subscribers");
                0
            }
        }
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Deliver an outcome through the callback when present, otherwise as an event.
///
/// Exactly one of the two channels fires.
pub fn report_outcome(outcome: Outcome, callback: Option<OutcomeCallback>, events: &EventChannel) {
    match callback {
        Some(callback) => callback(outcome.into_result()),
        None => {
            events.emit(outcome.into());
        }
    }
}
