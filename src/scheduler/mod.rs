//! Per-group playback scheduling.
//!
//! A [`PlaybackScheduler`] is passive: an external driver calls
//! [`update_device`](PlaybackScheduler::update_device) on a fixed cadence, and
//! each call asks the blender for frames and pushes them as chunks through the
//! player. Every light group gets its own scheduler; they share only the
//! transport behind the player.

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::host::{GroupId, LightError, PlayMode, StreamingTransport};
use crate::player::StreamingLightPlayer;
use crate::sequence::{chunks, ChunkCounter, Frame, DEFAULT_CHUNK_BUDGET};

mod blender;
pub mod filter;

pub use self::blender::{Blender, SequenceBlender};
pub use self::filter::{BaseErrorFilter, ErrorFilter, SuppressCodes};

/// Lifecycle of a group's playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing sent yet.
    Idle,
    Running,
    /// The device rejected us with an expected race; next update restarts.
    Suspended,
    ShutDown,
}

/// What a single `update_device` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Sent { chunks: usize, frames: usize },
    /// The blender had nothing new.
    UpToDate,
    /// The transport raised an expected race; it was dropped.
    Suppressed,
    /// The blender reached the end of a non-looping animation.
    Finished,
}

/// Keeps one light group in sync with its blender.
pub struct PlaybackScheduler<T: ?Sized, B> {
    player: StreamingLightPlayer<T>,
    group: GroupId,
    blender: B,
    filter: Box<dyn ErrorFilter + Send + Sync>,
    state: SchedulerState,
    chunk_budget: usize,
    chunk_ids: ChunkCounter,
    /// Set after a device (re)acquisition so the next update starts over.
    restart_pending: bool,
}

impl<T, B> PlaybackScheduler<T, B>
where
    T: StreamingTransport + ?Sized,
    B: Blender,
{
    pub fn new(player: StreamingLightPlayer<T>, group: GroupId, blender: B) -> Self {
        PlaybackScheduler {
            player,
            group,
            blender,
            filter: Box::new(BaseErrorFilter),
            state: SchedulerState::Idle,
            chunk_budget: DEFAULT_CHUNK_BUDGET,
            chunk_ids: ChunkCounter::default(),
            restart_pending: false,
        }
    }

    /// Suppress more errors on top of the ownership/tilt races.
    pub fn with_filter<F: ErrorFilter + Send + Sync + 'static>(mut self, filter: F) -> Self {
        self.filter = Box::new(filter);
        self
    }

    pub fn with_chunk_budget(mut self, budget: usize) -> Self {
        self.chunk_budget = budget.max(1);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn blender(&self) -> &B {
        &self.blender
    }

    pub fn blender_mut(&mut self) -> &mut B {
        &mut self.blender
    }

    pub fn player(&self) -> &StreamingLightPlayer<T> {
        &self.player
    }

    /// Whether `err` should reach the caller rather than be dropped.
    pub fn should_report_error(&self, err: &LightError) -> bool {
        filter::should_report_error(self.filter.as_ref(), err)
    }

    /// Push the frames needed to keep the device in sync.
    ///
    /// `restart` re-sends from the beginning of the animation buffer, as after
    /// a reconnect. The first update, any update while suspended and the
    /// update after a reported error restart too.
    pub fn update_device(&mut self, restart: bool) -> Result<UpdateOutcome> {
        let restart = match self.state {
            SchedulerState::ShutDown => return Err(Error::SchedulerShutDown),
            SchedulerState::Idle | SchedulerState::Suspended => true,
            SchedulerState::Running => restart || self.restart_pending,
        };

        if !restart && self.blender.is_finished() {
            return Ok(UpdateOutcome::Finished);
        }

        let frames = self.blender.blend(restart);
        if frames.is_empty() {
            self.enter(SchedulerState::Running);
            return Ok(if self.blender.is_finished() {
                UpdateOutcome::Finished
            } else {
                UpdateOutcome::UpToDate
            });
        }
        if restart {
            self.chunk_ids.reset();
        }

        match self.transmit(&frames, restart) {
            Ok(sent) => {
                self.restart_pending = false;
                self.enter(SchedulerState::Running);
                Ok(UpdateOutcome::Sent {
                    chunks: sent,
                    frames: frames.len(),
                })
            }
            Err(Error::Light(err)) if !self.should_report_error(&err) => {
                trace!(group = %self.group, code = %err.code, "dropping expected device race");
                self.enter(SchedulerState::Suspended);
                Ok(UpdateOutcome::Suppressed)
            }
            Err(err) => {
                // Part of the window may be lost; resync from the start next time.
                self.restart_pending = true;
                Err(err)
            }
        }
    }

    /// Stop pushing until the next update, which restarts playback.
    pub fn suspend(&mut self) {
        if self.state == SchedulerState::Running {
            self.enter(SchedulerState::Suspended);
        }
    }

    /// Call once after the device has been (re)acquired.
    ///
    /// Runs the transport's recovery for `feature_id` when available and makes
    /// the next update restart from the beginning.
    pub fn device_acquired(&mut self, feature_id: u32) -> Result<bool> {
        if self.state == SchedulerState::ShutDown {
            return Err(Error::SchedulerShutDown);
        }
        self.restart_pending = true;
        self.player.recover_device(feature_id)
    }

    /// Stop for good. Later updates fail.
    pub fn shutdown(&mut self) {
        self.enter(SchedulerState::ShutDown);
    }

    fn transmit(&mut self, frames: &[Frame], restart: bool) -> Result<usize> {
        let version = self.player.negotiated_version()?;
        let runs = chunks(frames, version, self.chunk_budget);
        for (index, run) in runs.iter().enumerate() {
            let mode = if restart && index == 0 {
                PlayMode::Immediate
            } else {
                PlayMode::Queued
            };
            let chunk_id = self.chunk_ids.next_id();
            self.player.play_chunk(self.group, run, mode, chunk_id)?;
        }
        Ok(runs.len())
    }

    fn enter(&mut self, state: SchedulerState) {
        if self.state != state {
            debug!(group = %self.group, from = ?self.state, to = ?state, "scheduler state change");
            self.state = state;
        }
    }
}
