use model::{Buffer, Channel, ChannelSet, ChannelSlot, NUM_CHANNELS};
use tiles::ProgressHook;

use crate::HistoryConfig;
use crate::budget::{BudgetLease, UndoBudget};
use crate::commit::{ChannelAction, CommitFlags, CommitPlan, CommitRequest};
use crate::compress::ensure_compressed;
use crate::error::HistoryError;
use crate::frame::Frame;
use crate::image::LiveImage;
use crate::ring::HistoryRing;
use crate::swap::{Direction, swap_with};

/// Undo/redo history of one image under a share of the global budget.
#[derive(Debug)]
pub struct History {
    ring: HistoryRing,
    lease: BudgetLease,
    pen_down: bool,
}

impl History {
    pub fn new(config: HistoryConfig, lease: BudgetLease) -> Self {
        let config = config.clamped();
        Self {
            ring: HistoryRing::new(config.depth),
            lease,
            pen_down: false,
        }
    }

    /// Ring capacity, including the reserved slot.
    pub fn depth(&self) -> usize {
        self.ring.capacity()
    }

    pub fn undo_steps(&self) -> usize {
        self.ring.undoable()
    }

    pub fn redo_steps(&self) -> usize {
        self.ring.redoable()
    }

    pub fn limit(&self) -> usize {
        self.lease.limit()
    }

    pub fn budget(&self) -> &UndoBudget {
        self.lease.budget()
    }

    pub fn is_pen_down(&self) -> bool {
        self.pen_down
    }

    /// Ends pen-down coalescing; the next commit records a new step.
    pub fn lift_pen(&mut self) {
        self.pen_down = false;
    }

    pub fn undo_frame(&self, depth: usize) -> Option<&Frame> {
        self.ring.undo_frame(depth)
    }

    pub fn redo_frame(&self, depth: usize) -> Option<&Frame> {
        self.ring.redo_frame(depth)
    }

    /// Accounted bytes held by every frame in the ring.
    pub fn byte_cost(&mut self) -> usize {
        self.ring.frames_mut().map(Frame::byte_cost).sum()
    }

    /// Records the pre-edit state of the channels `request` names. Call it
    /// before touching any pixel; on error the edit must not be applied.
    pub fn commit(
        &mut self,
        image: &mut LiveImage,
        request: &CommitRequest,
        progress: &mut dyn ProgressHook,
    ) -> Result<(), HistoryError> {
        let pen_down = request.flags.contains(CommitFlags::PEN_DOWN);
        if pen_down && self.pen_down {
            log::trace!("pen still down, commit folded into the previous step");
            return Ok(());
        }
        self.pen_down = false;

        let plan = CommitPlan::new(image, request);
        let limit = self.limit();
        let deleting = request.flags.contains(CommitFlags::DELETE);
        log::trace!(
            "commit needs {} bytes, undo limit is {limit}",
            plan.estimate
        );
        if plan.estimate > limit && !deleting {
            log::debug!(
                "commit refused: {} bytes exceed the {limit}-byte undo budget",
                plan.estimate
            );
            return Err(HistoryError::InsufficientBudget {
                requested: plan.estimate,
                limit,
            });
        }

        let discarded = self.ring.discard_redo();
        if discarded > 0 {
            log::debug!("new edit discarded {discarded} redo steps");
        }
        if let Some(frame) = self.ring.newest_undo_mut() {
            ensure_compressed(frame, image, progress);
        }
        if !self.reserve(plan.estimate) {
            log::debug!("delete commit proceeds over the undo budget");
        }

        let mut fresh: [Option<Buffer>; NUM_CHANNELS] = Default::default();
        for channel in Channel::ALL {
            if let ChannelAction::Replace { len, .. } | ChannelAction::Create { len } =
                plan.action(channel)
            {
                fresh[channel.index()] = Some(self.allocate(len)?);
            }
        }

        let old_geometry = image.geometry();
        let mut channels = ChannelSet::default();
        for channel in Channel::ALL {
            let live = image.channels_mut();
            let mut buffer = fresh[channel.index()].take().unwrap_or_default();
            let slot = match plan.action(channel) {
                ChannelAction::Keep if live.is_present(channel) => ChannelSlot::Unchanged,
                ChannelAction::Keep => ChannelSlot::Absent,
                ChannelAction::Delete => live.take(channel).into(),
                ChannelAction::Replace { len, copy } => {
                    match live.get(channel) {
                        Some(old) if copy && old.len() == len => buffer.extend_from_slice(old),
                        _ => buffer.resize(len, channel.fill_value()),
                    }
                    live.replace(channel, Some(buffer)).into()
                }
                ChannelAction::Create { len } => {
                    buffer.resize(len, channel.fill_value());
                    live.replace(channel, Some(buffer));
                    ChannelSlot::Absent
                }
            };
            channels.replace(channel, slot);
        }

        let frame = Frame::new(old_geometry, channels, Some(image.palette().clone()));
        if self.ring.push(frame).is_some() {
            log::debug!("history full, oldest undo step dropped");
        }
        image.set_geometry(plan.geometry);
        image.fix_current_channel();
        self.pen_down = pen_down;
        Ok(())
    }

    /// Steps back one state. `Ok(false)` when there is nothing to undo.
    pub fn undo(
        &mut self,
        image: &mut LiveImage,
        progress: &mut dyn ProgressHook,
    ) -> Result<bool, HistoryError> {
        self.pen_down = false;
        let Some(frame) = self.ring.newest_undo_mut() else {
            return Ok(false);
        };
        ensure_compressed(frame, image, progress);
        swap_with(frame, image, Direction::Undo)?;
        self.ring.step_back();
        Ok(true)
    }

    /// Steps forward one state. `Ok(false)` when there is nothing to redo.
    pub fn redo(
        &mut self,
        image: &mut LiveImage,
        progress: &mut dyn ProgressHook,
    ) -> Result<bool, HistoryError> {
        self.pen_down = false;
        if let Some(frame) = self.ring.newest_undo_mut() {
            ensure_compressed(frame, image, progress);
        }
        let Some(frame) = self.ring.next_redo_mut() else {
            return Ok(false);
        };
        swap_with(frame, image, Direction::Redo)?;
        self.ring.step_forward();
        Ok(true)
    }

    /// Contents of `channel` before the latest commit, when the newest undo
    /// frame still holds a full private copy; the live buffer otherwise.
    pub fn previous_channel<'a>(
        &'a self,
        channel: Channel,
        image: &'a LiveImage,
    ) -> Option<&'a [u8]> {
        match self.ring.undo_frame(0) {
            Some(frame) if frame.geometry() == image.geometry() => {
                match frame.channels().get(channel) {
                    ChannelSlot::Owned(buffer) => Some(buffer),
                    _ => image.channel(channel),
                }
            }
            _ => image.channel(channel),
        }
    }

    /// Changes the number of ring slots. Redo steps are dropped and only the
    /// newest undo steps that fit are kept.
    pub fn resize_capacity(&mut self, depth: usize) {
        let depth = HistoryConfig { depth }.clamped().depth;
        self.ring.resize(depth);
        self.pen_down = false;
        log::debug!(
            "undo depth set to {depth}, {} steps kept",
            self.ring.undoable()
        );
    }

    /// Frees every frame.
    pub fn clear(&mut self) {
        self.ring.clear();
        self.pen_down = false;
    }

    /// Evicts the oldest undo steps until `bytes` more fit under the limit.
    fn reserve(&mut self, bytes: usize) -> bool {
        let limit = self.limit();
        let mut cost = self.byte_cost();
        while cost + bytes > limit {
            let Some(mut frame) = self.ring.lose_oldest() else {
                return false;
            };
            cost = cost.saturating_sub(frame.byte_cost());
            log::debug!("undo budget: oldest step dropped, {cost} bytes remain");
        }
        true
    }

    fn allocate(&mut self, len: usize) -> Result<Buffer, HistoryError> {
        let mut buffer = Buffer::new();
        while buffer.try_reserve_exact(len).is_err() {
            if self.ring.lose_oldest().is_none() {
                log::debug!("allocating {len} bytes failed with no history left");
                return Err(HistoryError::AllocationFailed { bytes: len });
            }
            log::debug!("allocating {len} bytes failed, oldest undo step dropped");
        }
        Ok(buffer)
    }
}
