// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lifecycle events and the bus that delivers them.
//!
//! Listeners run synchronously on the orchestrator's thread after the
//! operation that raised the event has finished mutating state. A listener
//! that returns an error or panics is logged and skipped; the remaining
//! listeners still run.

use crate::error::panic_message;
use crate::playback::{PlaybackId, PlaybackInfo, StopReason};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use uuid::Uuid;

/// Kinds of lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Playback accepted with a delay, or action scheduled
    Scheduled,
    /// Playback began producing frames
    Started,
    /// Playback paused
    Paused,
    /// Playback resumed
    Resumed,
    /// Playback ended
    Stopped,
    /// Runtime failure
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scheduled => "scheduled",
            Self::Started => "started",
            Self::Paused => "paused",
            Self::Resumed => "resumed",
            Self::Stopped => "stopped",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// A lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackEvent {
    /// Event kind
    pub kind: EventKind,
    /// Playback concerned
    pub playback_id: PlaybackId,
    /// Playback state when the event was raised
    pub info: PlaybackInfo,
    /// Why the playback ended, for `Stopped`
    pub reason: Option<StopReason>,
    /// Error description, for `Error`
    pub message: Option<String>,
    /// Orchestrator time, in seconds
    pub timestamp: f64,
}

impl PlaybackEvent {
    /// Event without a reason or message
    pub fn new(kind: EventKind, info: PlaybackInfo, timestamp: f64) -> Self {
        Self {
            kind,
            playback_id: info.id,
            info,
            reason: None,
            message: None,
            timestamp,
        }
    }

    /// Attach a stop reason
    pub fn with_reason(mut self, reason: StopReason) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Attach an error message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Error a listener may return
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Result a listener returns
pub type ListenerResult = std::result::Result<(), ListenerError>;

type Listener = Box<dyn FnMut(&PlaybackEvent) -> ListenerResult + Send>;

/// Handle for removing a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    /// Create a new unique subscription ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

struct Subscription {
    id: SubscriptionId,
    /// `None` receives every kind
    kind: Option<EventKind>,
    listener: Listener,
}

struct ChannelSink {
    kind: Option<EventKind>,
    sender: Sender<PlaybackEvent>,
}

/// Queues events and delivers them to listeners and channels
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    channels: Vec<ChannelSink>,
    pending: VecDeque<PlaybackEvent>,
    listener_failures: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .field("channels", &self.channels.len())
            .field("pending", &self.pending.len())
            .field("listener_failures", &self.listener_failures)
            .finish()
    }
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one kind, or every kind with `None`
    pub fn subscribe<F>(&mut self, kind: Option<EventKind>, listener: F) -> SubscriptionId
    where
        F: FnMut(&PlaybackEvent) -> ListenerResult + Send + 'static,
    {
        let id = SubscriptionId::new();
        self.subscriptions.push(Subscription {
            id,
            kind,
            listener: Box::new(listener),
        });
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Open a channel for one kind, or every kind with `None`
    ///
    /// The channel is closed on the bus side once the receiver is dropped.
    pub fn channel(&mut self, kind: Option<EventKind>) -> Receiver<PlaybackEvent> {
        let (sender, receiver) = mpsc::channel();
        self.channels.push(ChannelSink { kind, sender });
        receiver
    }

    /// Queue an event for the next flush
    pub fn emit(&mut self, event: PlaybackEvent) {
        self.pending.push_back(event);
    }

    /// Number of queued events
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Listener calls that failed or panicked
    pub fn listener_failures(&self) -> u64 {
        self.listener_failures
    }

    /// Deliver every queued event, in order
    pub fn flush(&mut self) {
        while let Some(event) = self.pending.pop_front() {
            self.dispatch(&event);
        }
    }

    fn dispatch(&mut self, event: &PlaybackEvent) {
        for sub in &mut self.subscriptions {
            if sub.kind.is_some_and(|k| k != event.kind) {
                continue;
            }

            let result = catch_unwind(AssertUnwindSafe(|| (sub.listener)(event)));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    self.listener_failures += 1;
                    tracing::warn!("Listener for {} event failed: {}", event.kind, err);
                }
                Err(panic) => {
                    self.listener_failures += 1;
                    tracing::warn!("Listener for {} event panicked: {}", event.kind, panic_message(&*panic));
                }
            }
        }

        self.channels.retain(|sink| {
            if sink.kind.is_some_and(|k| k != event.kind) {
                return true;
            }
            sink.sender.send(event.clone()).is_ok()
        });
    }
}
