// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback engine for Trajecta.
//!
//! This crate runs animations from [`trajecta_motion`] on tracks:
//! - Per-playback timing with loop, ping-pong, pause and seek
//! - Multi-track coordination (shared, relative and formation modes)
//! - An orchestrator that admits requests, resolves track conflicts,
//!   fires scheduled actions and evaluates every playback on a fixed tick
//! - Lifecycle events delivered to listeners and channels
//!
//! ## Architecture
//!
//! The [`Orchestrator`] is a single-writer state machine. Callers drive it
//! by calling [`Orchestrator::tick`] at the configured rate; each tick
//! publishes an immutable [`TickSnapshot`] that other threads read through
//! a [`SnapshotHandle`]. Time comes from a [`Clock`], so tests can step it
//! by hand with [`ManualClock`].

pub mod animation;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod playback;
pub mod request;
pub mod schedule;
pub mod snapshot;
pub mod timing;
pub mod track;

pub use animation::{AnimationDefinition, AnimationId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ConflictStrategy, EngineConfig, TiePolicy};
pub use coordinator::{BarycentricVariant, CoordinationConfig, CoordinationMode, Coordinator};
pub use error::{ConfigurationError, ErrorCategory, PlaybackError, Result};
pub use events::{EventBus, EventKind, ListenerError, ListenerResult, PlaybackEvent, SubscriptionId};
pub use orchestrator::{EngineStatus, Orchestrator, OrchestratorState};
pub use playback::{Playback, PlaybackId, PlaybackInfo, PlaybackState, StopReason};
pub use request::{PlaybackOverrides, PlaybackRequest, Priority};
pub use schedule::{CancellationToken, ScheduleId, ScheduledAction, ScheduledTask};
pub use snapshot::{SnapshotHandle, SnapshotPublisher, TickSnapshot, TrackFrame};
pub use timing::{Direction, LoopMode, PlaybackClock, TimingPhase, TimingState};
pub use track::{Track, TrackId, TrackRegistry};
