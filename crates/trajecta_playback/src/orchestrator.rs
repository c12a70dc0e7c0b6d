// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback orchestration: admission, conflicts, scheduling and the tick loop.
//!
//! The orchestrator is the only writer of playback state. Every public
//! operation runs to completion on the caller's thread, then delivers the
//! events it raised. Readers on other threads observe output through the
//! [`SnapshotHandle`], which is swapped whole once per tick.

use crate::animation::{AnimationDefinition, AnimationId};
use crate::clock::{Clock, SystemClock};
use crate::config::{ConflictStrategy, EngineConfig, TiePolicy};
use crate::coordinator::Coordinator;
use crate::error::{panic_message, ConfigurationError, PlaybackError, Result};
use crate::events::{EventBus, EventKind, ListenerResult, PlaybackEvent, SubscriptionId};
use crate::playback::{Playback, PlaybackId, PlaybackInfo, PlaybackState, StopReason};
use crate::request::{PlaybackRequest, Priority};
use crate::schedule::{ScheduleId, ScheduledAction, ScheduledTask};
use crate::snapshot::{SnapshotHandle, SnapshotPublisher, TickSnapshot, TrackFrame};
use crate::timing::{Direction, TimingPhase};
use crate::track::{Track, TrackId, TrackRegistry};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use trajecta_motion::{MotionModel, Position};

/// Engine-wide counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Playbacks currently playing or paused
    pub active_playbacks: usize,
    /// Highest number of simultaneously active playbacks
    pub peak_concurrency: usize,
    /// Playbacks that reached the playing state
    pub total_started: u64,
    /// Playbacks stopped on request, preempted or cancelled
    pub total_stopped: u64,
    /// Playbacks that finished their cycle
    pub total_completed: u64,
    /// Runtime failures, including deferred starts that could not run
    pub total_errors: u64,
    /// Requests that found their tracks held by another playback
    pub total_conflicts: u64,
    /// Requests refused synchronously
    pub total_rejected: u64,
    /// Scheduled actions and delayed starts still pending
    pub scheduled_pending: usize,
    /// Ticks run
    pub tick_count: u64,
    /// Listener calls that failed or panicked
    pub listener_failures: u64,
}

/// Mutable bookkeeping owned by the orchestrator
#[derive(Debug, Default)]
pub struct OrchestratorState {
    /// Live playbacks in creation order
    pub playbacks: IndexMap<PlaybackId, Playback>,
    /// Which playback drives each track
    pub ownership: IndexMap<TrackId, PlaybackId>,
    /// Pending deferred actions
    pub scheduled: IndexMap<ScheduleId, ScheduledAction>,
}

impl OrchestratorState {
    /// Number of playbacks holding tracks
    pub fn active_count(&self) -> usize {
        self.playbacks.values().filter(|p| p.state.holds_tracks()).count()
    }

    /// Give `tracks` to `playback` unless a newer playback already owns them
    ///
    /// Playbacks are ranked by creation order, so a delayed start never
    /// takes a track from a playback created after it.
    fn claim(&mut self, playback: PlaybackId, tracks: &[TrackId]) {
        let rank = self.playbacks.get_index_of(&playback);
        for track in tracks {
            let newer_owner = self
                .ownership
                .get(track)
                .and_then(|owner| self.playbacks.get_index_of(owner))
                .is_some_and(|owner_rank| Some(owner_rank) > rank);
            if !newer_owner {
                self.ownership.insert(track.clone(), playback);
            }
        }
    }

    /// Drop `playback`'s ownership and hand each track to the most recently
    /// created remaining claimant. Returns the tracks left without an owner.
    fn release(&mut self, playback: PlaybackId) -> Vec<TrackId> {
        let owned: Vec<TrackId> = self
            .ownership
            .iter()
            .filter(|(_, owner)| **owner == playback)
            .map(|(track, _)| track.clone())
            .collect();

        let mut freed = Vec::new();
        for track in owned {
            let fallback = self
                .playbacks
                .values()
                .filter(|p| p.id != playback && p.state.holds_tracks() && p.uses_track(&track))
                .map(|p| p.id)
                .last();

            match fallback {
                Some(owner) => {
                    self.ownership.insert(track, owner);
                }
                None => {
                    self.ownership.shift_remove(&track);
                    freed.push(track);
                }
            }
        }
        freed
    }

    /// Track-holding playbacks that overlap `tracks`, with the overlap
    fn holders(&self, exclude: PlaybackId, tracks: &[TrackId]) -> Vec<(PlaybackId, Priority, Vec<TrackId>)> {
        self.playbacks
            .values()
            .filter(|p| p.id != exclude && p.state.holds_tracks())
            .filter_map(|p| {
                let overlap: Vec<TrackId> = tracks.iter().filter(|t| p.uses_track(t)).cloned().collect();
                (!overlap.is_empty()).then_some((p.id, p.request.priority, overlap))
            })
            .collect()
    }

    /// Cancel the delayed start of `playback`, if any
    fn cancel_start(&mut self, playback: PlaybackId) {
        self.scheduled.retain(|_, action| {
            let is_start = matches!(action.task, ScheduledTask::Start { playback_id } if playback_id == playback);
            if is_start {
                action.token().cancel();
            }
            !is_start
        });
    }
}

/// Drives every playback from a single logical thread
pub struct Orchestrator<C: Clock = SystemClock> {
    config: EngineConfig,
    clock: C,
    animations: IndexMap<AnimationId, Arc<AnimationDefinition>>,
    tracks: TrackRegistry,
    state: OrchestratorState,
    events: EventBus,
    publisher: SnapshotPublisher,
    status: EngineStatus,
    pending_returns: Vec<TrackFrame>,
    frame_buffer: Vec<TrackFrame>,
}

impl Orchestrator<SystemClock> {
    /// Create an orchestrator on the wall clock
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> Orchestrator<C> {
    /// Create an orchestrator on a custom clock
    pub fn with_clock(config: EngineConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            animations: IndexMap::new(),
            tracks: TrackRegistry::new(),
            state: OrchestratorState::default(),
            events: EventBus::new(),
            publisher: SnapshotPublisher::new(),
            status: EngineStatus::default(),
            pending_returns: Vec::new(),
            frame_buffer: Vec::new(),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Time source
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current time on the orchestrator clock
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Add or replace an animation. Running playbacks keep the version they started with.
    pub fn register_animation(&mut self, animation: AnimationDefinition) {
        tracing::debug!("Registered animation {} ({})", animation.id, animation.model);
        self.animations.insert(animation.id.clone(), Arc::new(animation));
    }

    /// Look up an animation
    pub fn animation(&self, id: &AnimationId) -> Option<&AnimationDefinition> {
        self.animations.get(id).map(Arc::as_ref)
    }

    /// Add or replace a track
    pub fn register_track(&mut self, track: Track) {
        tracing::debug!("Registered track {}", track.id);
        self.tracks.insert(track);
    }

    /// Known tracks with their latest positions
    pub fn tracks(&self) -> &TrackRegistry {
        &self.tracks
    }

    /// Register an event listener for one kind, or every kind with `None`
    pub fn subscribe<F>(&mut self, kind: Option<EventKind>, listener: F) -> SubscriptionId
    where
        F: FnMut(&PlaybackEvent) -> ListenerResult + Send + 'static,
    {
        self.events.subscribe(kind, listener)
    }

    /// Remove an event listener
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Receive events of one kind, or every kind with `None`, over a channel
    pub fn event_channel(&mut self, kind: Option<EventKind>) -> Receiver<PlaybackEvent> {
        self.events.channel(kind)
    }

    /// Handle for reading tick snapshots from other threads
    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.publisher.handle()
    }

    /// Start an animation on some tracks
    ///
    /// Configuration and conflict errors are returned here and nothing
    /// changes. A request with a delay is accepted as `Scheduled`; its
    /// conflicts are resolved when it starts and reported through an
    /// error event if it cannot.
    pub fn play(&mut self, request: PlaybackRequest) -> Result<PlaybackId> {
        let now = self.clock.now();
        let result = self.accept(PlaybackId::new(), request, now);
        if result.is_err() {
            self.status.total_rejected += 1;
        }
        self.finish_operation();
        result
    }

    /// Stop a playback. Returns `false` if it is not live.
    pub fn stop(&mut self, id: PlaybackId) -> bool {
        let now = self.clock.now();
        let stopped = self.end(id, StopReason::Requested, now);
        self.finish_operation();
        stopped
    }

    /// Stop every live playback, returning how many were stopped
    pub fn stop_all(&mut self) -> usize {
        let now = self.clock.now();
        let ids: Vec<PlaybackId> = self.state.playbacks.keys().copied().collect();
        let count = ids
            .into_iter()
            .filter(|id| self.end(*id, StopReason::StopAll, now))
            .count();
        if count > 0 {
            tracing::info!("Stopped all playbacks ({count})");
        }
        self.finish_operation();
        count
    }

    /// Freeze a playing playback. It keeps its tracks.
    pub fn pause(&mut self, id: PlaybackId) -> bool {
        let now = self.clock.now();
        let Some(playback) = self.state.playbacks.get_mut(&id) else {
            return false;
        };
        if playback.state != PlaybackState::Playing || !playback.clock_mut().pause(now) {
            return false;
        }
        playback.state = PlaybackState::Paused;
        let info = playback.info(now);
        tracing::info!("Paused playback {id} at {:.3}s", info.elapsed);
        self.events.emit(PlaybackEvent::new(EventKind::Paused, info, now));
        self.finish_operation();
        true
    }

    /// Continue a paused playback from where it stopped
    pub fn resume(&mut self, id: PlaybackId) -> bool {
        let now = self.clock.now();
        let Some(playback) = self.state.playbacks.get_mut(&id) else {
            return false;
        };
        if playback.state != PlaybackState::Paused || !playback.clock_mut().resume(now) {
            return false;
        }
        playback.state = PlaybackState::Playing;
        let info = playback.info(now);
        tracing::info!("Resumed playback {id} at {:.3}s", info.elapsed);
        self.events.emit(PlaybackEvent::new(EventKind::Resumed, info, now));
        self.finish_operation();
        true
    }

    /// Jump a playing or paused playback to `elapsed` seconds since its start
    pub fn seek(&mut self, id: PlaybackId, elapsed: f64) -> bool {
        let now = self.clock.now();
        match self.state.playbacks.get_mut(&id) {
            Some(playback) if playback.state.holds_tracks() => {
                playback.clock_mut().seek(now, elapsed);
                tracing::debug!("Seeked playback {id} to {elapsed:.3}s");
                true
            }
            _ => false,
        }
    }

    /// Run a request at an absolute orchestrator time
    ///
    /// The request is validated now; conflicts are resolved when it fires.
    /// A time in the past fires on the next tick.
    pub fn schedule(&mut self, request: PlaybackRequest, execute_at: f64) -> Result<ScheduleId> {
        let now = self.clock.now();
        let result = self.prepare(&request).and_then(|_| self.check_capacity());
        if let Err(err) = result {
            tracing::warn!("Rejected scheduled request for {}: {}", request.animation_id, err);
            self.status.total_rejected += 1;
            return Err(err);
        }

        let playback_id = PlaybackId::new();
        let info = self.pending_info(playback_id, &request, execute_at);
        let action = ScheduledAction::new(ScheduledTask::Play { playback_id, request }, execute_at);
        let schedule_id = action.id;
        self.state.scheduled.insert(schedule_id, action);
        tracing::debug!("Scheduled {} at {execute_at:.3}s as {schedule_id}", info.animation_id);

        self.events.emit(PlaybackEvent::new(EventKind::Scheduled, info, now));
        self.finish_operation();
        Ok(schedule_id)
    }

    /// Cancel a pending scheduled action. Cancelling a delayed start also
    /// discards its playback.
    pub fn cancel_schedule(&mut self, id: ScheduleId) -> bool {
        let now = self.clock.now();
        let Some(action) = self.state.scheduled.shift_remove(&id) else {
            return false;
        };
        action.token().cancel();
        tracing::debug!("Cancelled scheduled action {id}");
        if let ScheduledTask::Start { playback_id } = action.task {
            self.end(playback_id, StopReason::Cancelled, now);
        }
        self.finish_operation();
        true
    }

    /// Look up a live playback
    pub fn get_playback(&self, id: PlaybackId) -> Option<PlaybackInfo> {
        let now = self.clock.now();
        self.state.playbacks.get(&id).map(|p| p.info(now))
    }

    /// Playing and paused playbacks, in creation order
    pub fn get_active_playbacks(&self) -> Vec<PlaybackInfo> {
        let now = self.clock.now();
        self.state
            .playbacks
            .values()
            .filter(|p| p.state.holds_tracks())
            .map(|p| p.info(now))
            .collect()
    }

    /// Engine counters
    pub fn get_status(&self) -> EngineStatus {
        self.status.clone()
    }

    /// Playback currently driving a track
    pub fn owner_of(&self, track: &TrackId) -> Option<PlaybackId> {
        self.state.ownership.get(track).copied()
    }

    /// Read-only view of the internal bookkeeping
    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    /// Advance one tick and publish its snapshot
    ///
    /// Due scheduled actions fire first. Then every playing playback is
    /// evaluated in creation order; a playback whose evaluation panics or
    /// yields a non-finite position is stopped and reported without
    /// affecting the others.
    pub fn tick(&mut self) -> Arc<TickSnapshot> {
        let now = self.clock.now();
        self.status.tick_count += 1;
        self.fire_due(now);

        let mut frames: IndexMap<TrackId, TrackFrame> = IndexMap::new();
        for frame in self.pending_returns.drain(..) {
            if !self.state.ownership.contains_key(&frame.track_id) {
                frames.insert(frame.track_id.clone(), frame);
            }
        }

        let mut failed: Vec<(PlaybackId, String)> = Vec::new();
        let mut completed: Vec<PlaybackId> = Vec::new();
        for playback in self.state.playbacks.values() {
            if playback.state != PlaybackState::Playing {
                continue;
            }

            self.frame_buffer.clear();
            let buffer = &mut self.frame_buffer;
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| playback.evaluate(now, buffer))) {
                failed.push((playback.id, format!("evaluation panicked: {}", panic_message(&*panic))));
                continue;
            }
            if let Some(bad) = self.frame_buffer.iter().find(|f| !f.position.is_finite()) {
                failed.push((playback.id, format!("non-finite position for track {}", bad.track_id)));
                continue;
            }

            for frame in self.frame_buffer.drain(..) {
                if self.state.ownership.get(&frame.track_id) == Some(&playback.id) {
                    frames.insert(frame.track_id.clone(), frame);
                }
            }
            if playback.is_complete(now) {
                completed.push(playback.id);
            }
        }

        for (id, message) in failed {
            self.fail(id, message, now);
        }
        for id in completed {
            self.end(id, StopReason::Completed, now);
        }

        for frame in frames.values() {
            self.tracks.set_position(&frame.track_id, frame.position);
            tracing::trace!(
                "Frame {} <- {}: ({:.3}, {:.3}, {:.3})",
                frame.track_id,
                frame.playback_id,
                frame.position.x,
                frame.position.y,
                frame.position.z
            );
        }

        let snapshot = TickSnapshot {
            tick: self.status.tick_count,
            timestamp: now,
            frames: frames.into_values().collect(),
            owners: self.state.ownership.clone(),
            playbacks: self.state.playbacks.values().map(|p| p.info(now)).collect(),
        };
        self.finish_operation();
        self.publisher.publish(snapshot)
    }

    fn finish_operation(&mut self) {
        self.status.active_playbacks = self.state.active_count();
        self.status.peak_concurrency = self.status.peak_concurrency.max(self.status.active_playbacks);
        self.status.scheduled_pending = self.state.scheduled.len();
        self.events.flush();
        self.status.listener_failures = self.events.listener_failures();
    }

    /// Validate a request without changing anything
    fn prepare(&self, request: &PlaybackRequest) -> Result<(Arc<AnimationDefinition>, MotionModel, Vec<TrackId>)> {
        let tracks = request.unique_tracks();
        if tracks.is_empty() {
            return Err(ConfigurationError::NoTracks.into());
        }
        let animation = self
            .animations
            .get(&request.animation_id)
            .cloned()
            .ok_or_else(|| ConfigurationError::AnimationNotFound(request.animation_id.clone()))?;
        let model = animation.compile()?;
        Ok((animation, model, tracks))
    }

    fn check_capacity(&self) -> Result<()> {
        let limit = self.config.max_scheduled_actions;
        if self.state.scheduled.len() >= limit {
            return Err(ConfigurationError::ScheduleFull { limit }.into());
        }
        Ok(())
    }

    fn coordinator_for(&self, model: MotionModel, request: &PlaybackRequest, tracks: &[TrackId]) -> Coordinator {
        let anchored: Vec<(TrackId, Option<Position>)> =
            tracks.iter().map(|t| (t.clone(), self.tracks.anchor(t))).collect();
        Coordinator::new(model, &request.coordination, &anchored)
    }

    /// Admit a request under `id`, starting it now or registering its delayed start
    fn accept(&mut self, id: PlaybackId, request: PlaybackRequest, now: f64) -> Result<PlaybackId> {
        let (animation, model, tracks) = match self.prepare(&request) {
            Ok(prepared) => prepared,
            Err(err) => {
                tracing::warn!("Rejected playback of {}: {}", request.animation_id, err);
                return Err(err);
            }
        };

        let delay = request.effective_delay();
        if delay > 0.0 {
            if let Err(err) = self.check_capacity() {
                tracing::warn!("Rejected delayed playback of {}: {}", request.animation_id, err);
                return Err(err);
            }
            let coordinator = self.coordinator_for(model, &request, &tracks);
            let mut playback = Playback::new(id, request, tracks, animation, coordinator);
            let start_at = now + delay;
            playback.start_at = Some(start_at);
            let info = playback.info(now);
            self.state.playbacks.insert(id, playback);

            let action = ScheduledAction::new(ScheduledTask::Start { playback_id: id }, start_at);
            self.state.scheduled.insert(action.id, action);
            tracing::debug!("Playback {id} of {} starts in {delay:.3}s", info.animation_id);
            self.events.emit(PlaybackEvent::new(EventKind::Scheduled, info, now));
            return Ok(id);
        }

        let tracks = self.resolve_conflicts(id, &request, tracks, now)?;
        let coordinator = self.coordinator_for(model, &request, &tracks);
        let playback = Playback::new(id, request, tracks, animation, coordinator);
        self.state.playbacks.insert(id, playback);
        self.start(id, now);
        Ok(id)
    }

    /// Apply the conflict strategy, returning the tracks the request may claim
    fn resolve_conflicts(
        &mut self,
        id: PlaybackId,
        request: &PlaybackRequest,
        tracks: Vec<TrackId>,
        now: f64,
    ) -> Result<Vec<TrackId>> {
        let holders = self.state.holders(id, &tracks);
        if holders.is_empty() {
            return Ok(tracks);
        }

        self.status.total_conflicts += 1;
        tracing::debug!(
            "Playback {id} conflicts with {} playback(s) under {:?}",
            holders.len(),
            self.config.conflict_strategy
        );

        match self.config.conflict_strategy {
            ConflictStrategy::AllowConcurrent => Ok(tracks),
            ConflictStrategy::StopExisting => {
                for (holder, _, _) in holders {
                    self.end(holder, StopReason::Preempted(id), now);
                }
                Ok(tracks)
            }
            ConflictStrategy::RejectNew => {
                let err = conflict_error(holders);
                tracing::warn!("Rejected playback {id}: {err}");
                Err(err)
            }
            ConflictStrategy::PriorityBased => {
                let (beaten, blockers): (Vec<_>, Vec<_>) =
                    holders.into_iter().partition(|(_, priority, _)| request.priority > *priority);

                let tracks = if blockers.is_empty() {
                    tracks
                } else {
                    let blocked: Vec<&TrackId> = blockers.iter().flat_map(|(_, _, overlap)| overlap).collect();
                    let free: Vec<TrackId> = tracks.iter().filter(|t| !blocked.contains(t)).cloned().collect();
                    if self.config.tie_policy == TiePolicy::Reject || free.is_empty() {
                        let err = conflict_error(blockers);
                        tracing::warn!("Rejected playback {id} at {:?} priority: {err}", request.priority);
                        return Err(err);
                    }
                    tracing::debug!("Playback {id} trimmed to {} free track(s)", free.len());
                    free
                };

                for (holder, priority, _) in beaten {
                    tracing::debug!("Playback {id} ({:?}) preempts {holder} ({priority:?})", request.priority);
                    self.end(holder, StopReason::Preempted(id), now);
                }
                Ok(tracks)
            }
        }
    }

    /// Move a registered playback into `Playing` and claim its tracks
    fn start(&mut self, id: PlaybackId, now: f64) {
        let Some(playback) = self.state.playbacks.get_mut(&id) else {
            return;
        };
        playback.state = PlaybackState::Starting;
        playback.clock_mut().start(now);
        playback.start_at = None;
        playback.state = PlaybackState::Playing;

        let tracks = playback.track_ids.clone();
        let info = playback.info(now);
        self.state.claim(id, &tracks);
        self.status.total_started += 1;

        tracing::info!(
            "Started playback {id}: {} on {} track(s)",
            info.animation_id,
            tracks.len()
        );
        self.events.emit(PlaybackEvent::new(EventKind::Started, info, now));
    }

    /// Start a delayed playback, resolving conflicts as of now
    fn start_delayed(&mut self, id: PlaybackId, now: f64) {
        let Some(playback) = self.state.playbacks.get(&id) else {
            return;
        };
        if playback.state != PlaybackState::Scheduled {
            return;
        }
        let request = playback.request.clone();
        let tracks = playback.track_ids.clone();
        let model = playback.coordinator().model().clone();

        match self.resolve_conflicts(id, &request, tracks.clone(), now) {
            Ok(claimed) => {
                if claimed != tracks {
                    let coordinator = self.coordinator_for(model, &request, &claimed);
                    if let Some(playback) = self.state.playbacks.get_mut(&id) {
                        playback.retarget(claimed, coordinator);
                    }
                }
                self.start(id, now);
            }
            Err(err) => self.fail(id, err.to_string(), now),
        }
    }

    /// Report a runtime failure and force-stop the playback
    fn fail(&mut self, id: PlaybackId, message: String, now: f64) {
        self.status.total_errors += 1;
        tracing::error!("{}", PlaybackError::Runtime { playback: id, message: message.clone() });
        if let Some(playback) = self.state.playbacks.get(&id) {
            let event = PlaybackEvent::new(EventKind::Error, playback.info(now), now).with_message(message);
            self.events.emit(event);
        }
        self.end(id, StopReason::Failed, now);
    }

    /// Remove a playback, release its tracks and emit `Stopped`
    fn end(&mut self, id: PlaybackId, reason: StopReason, now: f64) -> bool {
        let Some(mut playback) = self.state.playbacks.shift_remove(&id) else {
            return false;
        };
        playback.state = PlaybackState::Stopping;
        self.state.cancel_start(id);

        let freed = self.state.release(id);
        if self.config.return_to_anchor_on_stop {
            let coordinate_system = playback.animation().coordinate_system;
            self.pending_returns.extend(freed.into_iter().map(|track_id| TrackFrame {
                position: self.tracks.rest_position(&track_id),
                track_id,
                playback_id: id,
                coordinate_system,
                timestamp: now,
            }));
        }

        playback.state = match reason {
            StopReason::Completed => PlaybackState::Completed,
            StopReason::Failed => PlaybackState::Failed,
            _ => PlaybackState::Stopped,
        };
        match reason {
            StopReason::Completed => self.status.total_completed += 1,
            StopReason::Failed => {}
            _ => self.status.total_stopped += 1,
        }

        let info = playback.info(now);
        tracing::info!("Playback {id} ended ({reason:?}) after {} loop(s)", info.loop_count);
        self.events
            .emit(PlaybackEvent::new(EventKind::Stopped, info, now).with_reason(reason));
        true
    }

    /// Run due scheduled actions in time order
    fn fire_due(&mut self, now: f64) {
        let mut due: Vec<(f64, usize, ScheduleId)> = self
            .state
            .scheduled
            .iter()
            .enumerate()
            .filter(|(_, (_, action))| action.is_due(now))
            .map(|(index, (id, action))| (action.execute_at, index, *id))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (_, _, schedule_id) in due {
            let Some(task) = self.state.scheduled.get_mut(&schedule_id).and_then(ScheduledAction::take) else {
                continue;
            };
            self.state.scheduled.shift_remove(&schedule_id);

            match task {
                ScheduledTask::Start { playback_id } => self.start_delayed(playback_id, now),
                ScheduledTask::Play { playback_id, request } => {
                    let info = self.pending_info(playback_id, &request, now);
                    if let Err(err) = self.accept(playback_id, request, now) {
                        self.status.total_errors += 1;
                        tracing::error!("Scheduled playback {playback_id} could not start: {err}");
                        let event = PlaybackEvent::new(EventKind::Error, info, now).with_message(err.to_string());
                        self.events.emit(event);
                    }
                }
            }
        }
    }

    /// Info for a playback that does not exist yet
    fn pending_info(&self, id: PlaybackId, request: &PlaybackRequest, start_at: f64) -> PlaybackInfo {
        let animation = self.animations.get(&request.animation_id);
        PlaybackInfo {
            id,
            animation_id: request.animation_id.clone(),
            track_ids: request.unique_tracks(),
            priority: request.priority,
            state: PlaybackState::Scheduled,
            loop_mode: request
                .overrides
                .loop_mode
                .or(animation.map(|a| a.loop_mode))
                .unwrap_or_default(),
            duration: animation.map_or(0.0, |a| a.clamped_duration()),
            elapsed: 0.0,
            progress: 0.0,
            loop_count: 0,
            direction: Direction::Forward,
            phase: TimingPhase::Idle,
            started_at: None,
            start_at: Some(start_at),
        }
    }
}

fn conflict_error(holders: Vec<(PlaybackId, Priority, Vec<TrackId>)>) -> PlaybackError {
    let mut ids = Vec::with_capacity(holders.len());
    let mut tracks = Vec::new();
    for (holder, _, overlap) in holders {
        ids.push(holder);
        for track in overlap {
            if !tracks.contains(&track) {
                tracks.push(track);
            }
        }
    }
    PlaybackError::Conflict { holders: ids, tracks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::coordinator::{CoordinationConfig, CoordinationMode};
    use crate::error::ErrorCategory;
    use crate::timing::LoopMode;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use trajecta_motion::ParamValue;

    fn line(id: &str, duration: f64) -> AnimationDefinition {
        AnimationDefinition::new(id, "linear", duration)
            .with_param("start", ParamValue::Vector(Position::ORIGIN))
            .with_param("end", ParamValue::Vector(Position::new(10.0, 10.0, 10.0)))
    }

    fn setup(config: EngineConfig) -> (Orchestrator<ManualClock>, ManualClock) {
        let clock = ManualClock::new(0.0);
        let mut engine = Orchestrator::with_clock(config, clock.clone());
        engine.register_animation(line("line", 10.0));
        engine.register_animation(line("loop", 10.0).with_loop_mode(LoopMode::Loop));
        engine.register_track(Track::new("t1").with_anchor(Position::new(1.0, 0.0, 0.0)));
        engine.register_track(Track::new("t2").with_anchor(Position::new(0.0, 1.0, 0.0)));
        engine.register_track(Track::new("t3"));
        (engine, clock)
    }

    fn strategy(conflict_strategy: ConflictStrategy) -> EngineConfig {
        EngineConfig {
            conflict_strategy,
            ..EngineConfig::default()
        }
    }

    fn record(engine: &mut Orchestrator<ManualClock>) -> Arc<Mutex<Vec<PlaybackEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        engine.subscribe(None, move |e| {
            sink.lock().push(e.clone());
            Ok(())
        });
        events
    }

    fn position(snapshot: &TickSnapshot, track: &str) -> Option<Position> {
        snapshot.frame(&TrackId::new(track)).map(|f| f.position)
    }

    #[test]
    fn test_play_produces_frames() {
        let (mut engine, clock) = setup(EngineConfig::default());
        let id = engine.play(PlaybackRequest::new("line", ["t1"])).unwrap();
        assert_eq!(engine.owner_of(&TrackId::new("t1")), Some(id));

        clock.set(5.0);
        let snapshot = engine.tick();
        assert_eq!(position(&snapshot, "t1"), Some(Position::new(5.0, 5.0, 5.0)));
        assert_eq!(snapshot.tick, 1);
        assert_eq!(engine.snapshot_handle().load().tick, 1);
        assert_eq!(engine.tracks().get(&"t1".into()).unwrap().position, Position::new(5.0, 5.0, 5.0));

        let info = engine.get_playback(id).unwrap();
        assert_eq!(info.state, PlaybackState::Playing);
        assert_eq!(info.progress, 0.5);
    }

    #[test]
    fn test_linear_scenario_through_orchestrator() {
        let (mut engine, clock) = setup(EngineConfig::default());
        let events = record(&mut engine);
        let id = engine.play(PlaybackRequest::new("line", ["t3"])).unwrap();

        for (t, expected) in [(0.0, 0.0), (5.0, 5.0), (10.0, 10.0)] {
            clock.set(t);
            let snapshot = engine.tick();
            assert_eq!(position(&snapshot, "t3"), Some(Position::new(expected, expected, expected)));
        }

        // The tick at 10 s emitted the final frame and completed the playback.
        assert!(engine.get_playback(id).is_none());
        let stopped: Vec<_> = events.lock().iter().filter(|e| e.kind == EventKind::Stopped).cloned().collect();
        assert_eq!(stopped.len(), 1);
        assert_eq!(stopped[0].reason, Some(StopReason::Completed));
        assert_eq!(stopped[0].info.state, PlaybackState::Completed);
        assert_eq!(engine.get_status().total_completed, 1);

        // t3 has no anchor, so it returns to the origin.
        clock.set(20.0);
        let snapshot = engine.tick();
        assert_eq!(position(&snapshot, "t3"), Some(Position::ORIGIN));
        assert!(engine.tick().frames.is_empty());
    }

    #[test]
    fn test_configuration_errors_are_synchronous() {
        let (mut engine, _) = setup(EngineConfig::default());
        engine.register_animation(AnimationDefinition::new("bad", "warp-drive", 1.0));

        let cases = [
            PlaybackRequest::new("missing", ["t1"]),
            PlaybackRequest::new("line", Vec::<String>::new()),
            PlaybackRequest::new("bad", ["t1"]),
        ];
        for request in cases {
            let err = engine.play(request).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Configuration);
        }
        assert!(engine.get_active_playbacks().is_empty());
        assert_eq!(engine.get_status().total_rejected, 3);
        assert!(engine.schedule(PlaybackRequest::new("missing", ["t1"]), 1.0).is_err());
    }

    #[test]
    fn test_priority_preemption() {
        let (mut engine, _) = setup(EngineConfig::default());
        let events = record(&mut engine);
        let a = engine.play(PlaybackRequest::new("loop", ["t1"])).unwrap();
        let b = engine
            .play(PlaybackRequest::new("loop", ["t1"]).with_priority(Priority::High))
            .unwrap();

        assert!(engine.get_playback(a).is_none());
        assert_eq!(engine.owner_of(&TrackId::new("t1")), Some(b));
        assert_eq!(engine.get_active_playbacks().len(), 1);

        let preempted: Vec<_> = events
            .lock()
            .iter()
            .filter(|e| e.kind == EventKind::Stopped)
            .map(|e| (e.playback_id, e.reason))
            .collect();
        assert_eq!(preempted, vec![(a, Some(StopReason::Preempted(b)))]);
    }

    #[test]
    fn test_equal_priority_trims_to_free_tracks() {
        let (mut engine, _) = setup(EngineConfig::default());
        let a = engine.play(PlaybackRequest::new("loop", ["t1"])).unwrap();
        let b = engine.play(PlaybackRequest::new("loop", ["t1", "t2"])).unwrap();

        assert_eq!(engine.owner_of(&TrackId::new("t1")), Some(a));
        assert_eq!(engine.owner_of(&TrackId::new("t2")), Some(b));
        assert_eq!(engine.get_playback(b).unwrap().track_ids, vec![TrackId::new("t2")]);

        let err = engine.play(PlaybackRequest::new("loop", ["t1"])).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(matches!(err, PlaybackError::Conflict { ref holders, .. } if holders == &vec![a]));
        assert_eq!(engine.get_status().total_conflicts, 2);
    }

    #[test]
    fn test_tie_policy_reject() {
        let config = EngineConfig {
            tie_policy: TiePolicy::Reject,
            ..EngineConfig::default()
        };
        let (mut engine, _) = setup(config);
        engine.play(PlaybackRequest::new("loop", ["t1"])).unwrap();
        let err = engine.play(PlaybackRequest::new("loop", ["t1", "t2"])).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert_eq!(engine.owner_of(&TrackId::new("t2")), None);
    }

    #[test]
    fn test_lower_priority_cannot_preempt() {
        let (mut engine, _) = setup(EngineConfig::default());
        let a = engine
            .play(PlaybackRequest::new("loop", ["t1"]).with_priority(Priority::Critical))
            .unwrap();
        assert!(engine.play(PlaybackRequest::new("loop", ["t1"]).with_priority(Priority::High)).is_err());
        assert_eq!(engine.owner_of(&TrackId::new("t1")), Some(a));
    }

    #[test]
    fn test_stop_existing_and_reject_new() {
        let (mut engine, _) = setup(strategy(ConflictStrategy::StopExisting));
        let a = engine
            .play(PlaybackRequest::new("loop", ["t1"]).with_priority(Priority::Critical))
            .unwrap();
        let b = engine.play(PlaybackRequest::new("loop", ["t1"]).with_priority(Priority::Low)).unwrap();
        assert!(engine.get_playback(a).is_none());
        assert_eq!(engine.owner_of(&TrackId::new("t1")), Some(b));

        let (mut engine, _) = setup(strategy(ConflictStrategy::RejectNew));
        let a = engine.play(PlaybackRequest::new("loop", ["t1", "t2"])).unwrap();
        let err = engine
            .play(PlaybackRequest::new("loop", ["t2", "t3"]).with_priority(Priority::Critical))
            .unwrap_err();
        match err {
            PlaybackError::Conflict { holders, tracks } => {
                assert_eq!(holders, vec![a]);
                assert_eq!(tracks, vec![TrackId::new("t2")]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.owner_of(&TrackId::new("t3")), None);
    }

    #[test]
    fn test_allow_concurrent_newest_drives_shared_track() {
        let (mut engine, clock) = setup(strategy(ConflictStrategy::AllowConcurrent));
        engine.register_animation(
            AnimationDefinition::new("hold", "linear", 10.0)
                .with_loop_mode(LoopMode::Loop)
                .with_param("start", ParamValue::Vector(Position::new(-3.0, 0.0, 0.0)))
                .with_param("end", ParamValue::Vector(Position::new(-3.0, 0.0, 0.0))),
        );
        let a = engine.play(PlaybackRequest::new("loop", ["t1", "t2"])).unwrap();
        let b = engine.play(PlaybackRequest::new("hold", ["t1"])).unwrap();
        assert_eq!(engine.owner_of(&TrackId::new("t1")), Some(b));
        assert_eq!(engine.owner_of(&TrackId::new("t2")), Some(a));

        clock.set(2.0);
        let snapshot = engine.tick();
        assert_eq!(snapshot.frames.len(), 2);
        assert_eq!(position(&snapshot, "t1"), Some(Position::new(-3.0, 0.0, 0.0)));
        assert_eq!(position(&snapshot, "t2"), Some(Position::new(2.0, 2.0, 2.0)));

        // Ownership falls back to the remaining claimant.
        assert!(engine.stop(b));
        assert_eq!(engine.owner_of(&TrackId::new("t1")), Some(a));
        let snapshot = engine.tick();
        assert_eq!(position(&snapshot, "t1"), Some(Position::new(2.0, 2.0, 2.0)));
    }

    #[test]
    fn test_allow_concurrent_delayed_start_does_not_displace_newer_playback() {
        let (mut engine, clock) = setup(strategy(ConflictStrategy::AllowConcurrent));
        engine.register_animation(
            AnimationDefinition::new("hold", "linear", 10.0)
                .with_loop_mode(LoopMode::Loop)
                .with_param("start", ParamValue::Vector(Position::new(-3.0, 0.0, 0.0)))
                .with_param("end", ParamValue::Vector(Position::new(-3.0, 0.0, 0.0))),
        );
        let older = engine.play(PlaybackRequest::new("loop", ["t1"]).with_delay(1.0)).unwrap();
        let newer = engine.play(PlaybackRequest::new("hold", ["t1"])).unwrap();
        assert_eq!(engine.owner_of(&TrackId::new("t1")), Some(newer));

        clock.set(2.0);
        let snapshot = engine.tick();
        assert_eq!(engine.get_playback(older).unwrap().state, PlaybackState::Playing);
        assert_eq!(engine.owner_of(&TrackId::new("t1")), Some(newer));
        let frame = snapshot.frame(&TrackId::new("t1")).unwrap();
        assert_eq!(frame.playback_id, newer);
        assert_eq!(frame.position, Position::new(-3.0, 0.0, 0.0));

        // The older playback takes over once the newer one stops.
        assert!(engine.stop(newer));
        assert_eq!(engine.owner_of(&TrackId::new("t1")), Some(older));
        clock.set(3.0);
        let frame = engine.tick().frame(&TrackId::new("t1")).cloned().unwrap();
        assert_eq!(frame.playback_id, older);
        // Its clock started on the tick that fired it, at 2 s
        assert_eq!(frame.position, Position::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_pause_resume_holds_position() {
        let (mut engine, clock) = setup(EngineConfig::default());
        let events = record(&mut engine);
        let id = engine.play(PlaybackRequest::new("line", ["t3"])).unwrap();

        clock.set(3.0);
        engine.tick();
        assert!(engine.pause(id));
        assert!(!engine.pause(id));
        assert!(!engine.resume(PlaybackId::new()));

        clock.set(8.0);
        let snapshot = engine.tick();
        assert!(snapshot.frames.is_empty());
        assert_eq!(engine.owner_of(&TrackId::new("t3")), Some(id));
        let info = engine.get_playback(id).unwrap();
        assert_eq!(info.state, PlaybackState::Paused);
        assert_eq!(info.phase, TimingPhase::Paused);

        assert!(engine.resume(id));
        assert_eq!(engine.get_playback(id).unwrap().phase, TimingPhase::Running);
        let snapshot = engine.tick();
        assert_eq!(position(&snapshot, "t3"), Some(Position::new(3.0, 3.0, 3.0)));

        let kinds: Vec<_> = events.lock().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Started, EventKind::Paused, EventKind::Resumed]);
    }

    #[test]
    fn test_seek() {
        let (mut engine, clock) = setup(EngineConfig::default());
        let id = engine.play(PlaybackRequest::new("line", ["t3"])).unwrap();
        clock.set(1.0);
        assert!(engine.seek(id, 7.0));
        assert_eq!(position(&engine.tick(), "t3"), Some(Position::new(7.0, 7.0, 7.0)));
        assert!(!engine.seek(PlaybackId::new(), 1.0));
    }

    #[test]
    fn test_stop_is_idempotent_and_returns_to_anchor() {
        let (mut engine, clock) = setup(EngineConfig::default());
        let events = record(&mut engine);
        let id = engine.play(PlaybackRequest::new("loop", ["t1"])).unwrap();
        clock.set(4.0);
        engine.tick();

        assert!(engine.stop(id));
        assert!(!engine.stop(id));
        assert_eq!(engine.owner_of(&TrackId::new("t1")), None);

        let snapshot = engine.tick();
        assert_eq!(position(&snapshot, "t1"), Some(Position::new(1.0, 0.0, 0.0)));
        let stops = events.lock().iter().filter(|e| e.kind == EventKind::Stopped).count();
        assert_eq!(stops, 1);
    }

    #[test]
    fn test_return_to_anchor_can_be_disabled() {
        let config = EngineConfig {
            return_to_anchor_on_stop: false,
            ..EngineConfig::default()
        };
        let (mut engine, _) = setup(config);
        let id = engine.play(PlaybackRequest::new("loop", ["t1"])).unwrap();
        engine.stop(id);
        assert!(engine.tick().frames.is_empty());
    }

    #[test]
    fn test_stop_all() {
        let (mut engine, _) = setup(EngineConfig::default());
        engine.play(PlaybackRequest::new("loop", ["t1"])).unwrap();
        engine.play(PlaybackRequest::new("loop", ["t2"])).unwrap();
        engine.play(PlaybackRequest::new("loop", ["t3"]).with_delay(5.0)).unwrap();

        assert_eq!(engine.stop_all(), 3);
        let status = engine.get_status();
        assert_eq!(status.active_playbacks, 0);
        assert_eq!(status.peak_concurrency, 2);
        assert_eq!(status.scheduled_pending, 0);
    }

    #[test]
    fn test_delayed_play() {
        let (mut engine, clock) = setup(EngineConfig::default());
        let events = record(&mut engine);
        let id = engine.play(PlaybackRequest::new("line", ["t3"]).with_delay(2.0)).unwrap();

        let info = engine.get_playback(id).unwrap();
        assert_eq!(info.state, PlaybackState::Scheduled);
        assert_eq!(info.start_at, Some(2.0));
        assert_eq!(engine.owner_of(&TrackId::new("t3")), None);

        clock.set(1.0);
        assert!(engine.tick().frames.is_empty());

        clock.set(2.0);
        let snapshot = engine.tick();
        assert_eq!(position(&snapshot, "t3"), Some(Position::ORIGIN));
        assert_eq!(engine.owner_of(&TrackId::new("t3")), Some(id));

        clock.set(3.0);
        assert_eq!(position(&engine.tick(), "t3"), Some(Position::new(1.0, 1.0, 1.0)));

        let kinds: Vec<_> = events.lock().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Scheduled, EventKind::Started]);
    }

    #[test]
    fn test_delayed_start_conflict_is_reported() {
        let (mut engine, clock) = setup(strategy(ConflictStrategy::RejectNew));
        let errors = engine.event_channel(Some(EventKind::Error));
        let delayed = engine.play(PlaybackRequest::new("loop", ["t1"]).with_delay(1.0)).unwrap();
        let holder = engine.play(PlaybackRequest::new("loop", ["t1"])).unwrap();

        clock.set(1.0);
        engine.tick();
        assert!(engine.get_playback(delayed).is_none());
        assert_eq!(engine.owner_of(&TrackId::new("t1")), Some(holder));

        let reported: Vec<_> = errors.try_iter().collect();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].playback_id, delayed);
        assert_eq!(engine.get_status().total_errors, 1);
    }

    #[test]
    fn test_schedule_fires_once() {
        let (mut engine, clock) = setup(EngineConfig::default());
        let started = engine.event_channel(Some(EventKind::Started));
        engine.schedule(PlaybackRequest::new("loop", ["t2"]), 5.0).unwrap();
        assert_eq!(engine.get_status().scheduled_pending, 1);

        clock.set(4.9);
        engine.tick();
        assert!(started.try_recv().is_err());

        clock.set(5.0);
        engine.tick();
        assert!(started.try_recv().is_ok());
        assert_eq!(engine.get_status().scheduled_pending, 0);

        clock.set(10.0);
        engine.tick();
        assert!(started.try_recv().is_err());
        assert_eq!(engine.get_active_playbacks().len(), 1);
    }

    #[test]
    fn test_cancelled_schedule_never_fires() {
        let (mut engine, clock) = setup(EngineConfig::default());
        let id = engine.schedule(PlaybackRequest::new("loop", ["t2"]), 5.0).unwrap();
        assert!(engine.cancel_schedule(id));
        assert!(!engine.cancel_schedule(id));

        clock.set(6.0);
        engine.tick();
        assert!(engine.get_active_playbacks().is_empty());
        assert_eq!(engine.get_status().total_started, 0);
    }

    #[test]
    fn test_schedule_limit() {
        let config = EngineConfig {
            max_scheduled_actions: 1,
            ..EngineConfig::default()
        };
        let (mut engine, _) = setup(config);
        engine.schedule(PlaybackRequest::new("loop", ["t1"]), 1.0).unwrap();
        let err = engine.schedule(PlaybackRequest::new("loop", ["t2"]), 1.0).unwrap_err();
        assert!(matches!(
            err,
            PlaybackError::Configuration(ConfigurationError::ScheduleFull { limit: 1 })
        ));
    }

    #[test]
    fn test_runtime_failure_is_isolated() {
        let (mut engine, clock) = setup(EngineConfig::default());
        engine.register_animation(
            AnimationDefinition::new("overflow", "linear", 10.0)
                .with_param("start", ParamValue::Vector(Position::new(1.0e308, 0.0, 0.0)))
                .with_param("end", ParamValue::Vector(Position::new(-1.0e308, 0.0, 0.0))),
        );
        let events = record(&mut engine);
        let good = engine.play(PlaybackRequest::new("line", ["t1"])).unwrap();
        let bad = engine.play(PlaybackRequest::new("overflow", ["t2"])).unwrap();

        clock.set(1.0);
        let snapshot = engine.tick();
        assert_eq!(position(&snapshot, "t1"), Some(Position::new(1.0, 1.0, 1.0)));
        assert!(position(&snapshot, "t2").is_none());
        assert!(engine.get_playback(good).is_some());
        assert!(engine.get_playback(bad).is_none());
        assert_eq!(engine.get_status().total_errors, 1);

        let events = events.lock();
        let error = events.iter().find(|e| e.kind == EventKind::Error).unwrap();
        assert_eq!(error.playback_id, bad);
        assert!(error.message.as_deref().unwrap().contains("non-finite"));
        let stop = events.iter().find(|e| e.kind == EventKind::Stopped).unwrap();
        assert_eq!(stop.reason, Some(StopReason::Failed));
    }

    #[test]
    fn test_faulty_listener_does_not_block_engine() {
        let (mut engine, _) = setup(EngineConfig::default());
        engine.subscribe(Some(EventKind::Started), |_| panic!("listener bug"));
        let started = engine.event_channel(Some(EventKind::Started));
        engine.play(PlaybackRequest::new("loop", ["t1"])).unwrap();
        assert!(started.try_recv().is_ok());
        assert_eq!(engine.get_status().listener_failures, 1);
    }

    #[test]
    fn test_relative_mode_through_orchestrator() {
        let (mut engine, clock) = setup(EngineConfig::default());
        let request = PlaybackRequest::new("line", ["t1", "t2"])
            .with_coordination(CoordinationConfig::new(CoordinationMode::Relative));
        engine.play(request).unwrap();

        for t in [0.0, 2.5, 7.0] {
            clock.set(t);
            let snapshot = engine.tick();
            let a = position(&snapshot, "t1").unwrap();
            let b = position(&snapshot, "t2").unwrap();
            assert!((a - b).distance(Position::new(1.0, -1.0, 0.0)) < 1e-12);
        }
    }

    #[test]
    fn test_replacing_animation_keeps_running_copy() {
        let (mut engine, clock) = setup(EngineConfig::default());
        engine.play(PlaybackRequest::new("line", ["t3"])).unwrap();
        engine.register_animation(
            AnimationDefinition::new("line", "linear", 10.0)
                .with_param("end", ParamValue::Vector(Position::new(-10.0, 0.0, 0.0))),
        );
        clock.set(5.0);
        assert_eq!(position(&engine.tick(), "t3"), Some(Position::new(5.0, 5.0, 5.0)));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Play(usize, Priority, u8, bool),
        Stop(usize),
        Pause(usize),
        Resume(usize),
        Tick(f64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let priority = prop_oneof![
            Just(Priority::Low),
            Just(Priority::Normal),
            Just(Priority::High),
            Just(Priority::Critical),
        ];
        prop_oneof![
            (0usize..2, priority, 1u8..8, any::<bool>()).prop_map(|(a, p, mask, delayed)| Op::Play(a, p, mask, delayed)),
            (0usize..8).prop_map(Op::Stop),
            (0usize..8).prop_map(Op::Pause),
            (0usize..8).prop_map(Op::Resume),
            (0.0f64..3.0).prop_map(Op::Tick),
        ]
    }

    proptest! {
        #[test]
        fn prop_ownership_stays_consistent(
            ops in prop::collection::vec(op_strategy(), 1..40),
            strategy_index in 0usize..4,
        ) {
            let strategies = [
                ConflictStrategy::StopExisting,
                ConflictStrategy::PriorityBased,
                ConflictStrategy::RejectNew,
                ConflictStrategy::AllowConcurrent,
            ];
            let (mut engine, clock) = setup(strategy(strategies[strategy_index]));
            let mut ids: Vec<PlaybackId> = Vec::new();

            for op in ops {
                match op {
                    Op::Play(animation, priority, mask, delayed) => {
                        let tracks: Vec<&str> = ["t1", "t2", "t3"]
                            .into_iter()
                            .enumerate()
                            .filter(|(i, _)| mask & (1 << i) != 0)
                            .map(|(_, t)| t)
                            .collect();
                        let name = if animation == 0 { "line" } else { "loop" };
                        let mut request = PlaybackRequest::new(name, tracks).with_priority(priority);
                        if delayed {
                            request = request.with_delay(1.0);
                        }
                        if let Ok(id) = engine.play(request) {
                            ids.push(id);
                        }
                    }
                    Op::Stop(i) => {
                        if let Some(id) = ids.get(i) {
                            engine.stop(*id);
                        }
                    }
                    Op::Pause(i) => {
                        if let Some(id) = ids.get(i) {
                            engine.pause(*id);
                        }
                    }
                    Op::Resume(i) => {
                        if let Some(id) = ids.get(i) {
                            engine.resume(*id);
                        }
                    }
                    Op::Tick(dt) => {
                        clock.advance(dt);
                        let snapshot = engine.tick();
                        let mut seen: Vec<&TrackId> = Vec::new();
                        for frame in &snapshot.frames {
                            prop_assert!(!seen.contains(&&frame.track_id));
                            seen.push(&frame.track_id);
                            // Frames from playbacks that ended this tick are their last.
                            if engine.state().playbacks.contains_key(&frame.playback_id) {
                                prop_assert_eq!(snapshot.owners.get(&frame.track_id), Some(&frame.playback_id));
                            }
                        }
                    }
                }

                let state = engine.state();
                for (track, owner) in &state.ownership {
                    let playback = state.playbacks.get(owner);
                    prop_assert!(playback.is_some_and(|p| p.state.holds_tracks() && p.uses_track(track)));
                    let newest = state
                        .playbacks
                        .values()
                        .filter(|p| p.state.holds_tracks() && p.uses_track(track))
                        .map(|p| p.id)
                        .last();
                    prop_assert_eq!(newest, Some(*owner));
                }
                if strategies[strategy_index] != ConflictStrategy::AllowConcurrent {
                    let active: Vec<_> = state.playbacks.values().filter(|p| p.state.holds_tracks()).collect();
                    for (i, a) in active.iter().enumerate() {
                        for b in &active[i + 1..] {
                            prop_assert!(a.track_ids.iter().all(|t| !b.uses_track(t)));
                        }
                    }
                }
            }
        }
    }
}
