use crate::core::motion::channel::{BatchId, ChannelId, MotionChannel};
use crate::core::motion::easing::Transition;
use crate::domain::models::GeometrySample;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::watch;

/// Read-only snapshot of every channel, as handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceFrame {
    pub handle_x: f32,
    pub handle_y: f32,
    pub background_y: f32,
    pub handle_width: f32,
    pub handle_height: f32,
    pub overlay_opacity: f32,
    pub indicator_width: f32,
    pub indicator_opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleOutcome {
    Completed,
    /// A later write took over at least one channel of the batch.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelMove {
    pub channel: ChannelId,
    pub target: f32,
    pub transition: Transition,
}

/// Channels that start together and finish as one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSet {
    name: &'static str,
    moves: Vec<ChannelMove>,
}

impl MotionSet {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            moves: Vec::new(),
        }
    }

    pub fn with(mut self, channel: ChannelId, target: f32, transition: Transition) -> Self {
        self.moves.push(ChannelMove {
            channel,
            target,
            transition,
        });
        self
    }

    pub fn with_geometry(self, sample: GeometrySample, transition: Transition) -> Self {
        self.with(ChannelId::HandleX, sample.handle_x, transition)
            .with(ChannelId::HandleY, sample.handle_y, transition)
            .with(ChannelId::BackgroundY, sample.background_y, transition)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn moves(&self) -> &[ChannelMove] {
        &self.moves
    }
}

/// Resolves once its batch has completed or been superseded.
#[derive(Debug, Clone)]
pub struct SettleHandle {
    id: BatchId,
    outcome: watch::Receiver<Option<SettleOutcome>>,
}

impl SettleHandle {
    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn outcome(&self) -> Option<SettleOutcome> {
        *self.outcome.borrow()
    }

    pub async fn finished(mut self) -> SettleOutcome {
        loop {
            if let Some(outcome) = *self.outcome.borrow_and_update() {
                return outcome;
            }
            // Surface dropped while the batch was running.
            if self.outcome.changed().await.is_err() {
                return SettleOutcome::Superseded;
            }
        }
    }
}

#[derive(Debug)]
struct PendingBatch {
    name: &'static str,
    remaining: usize,
    done: watch::Sender<Option<SettleOutcome>>,
}

/// Owns the live channel registers. Writes are last-writer-wins per
/// channel; nothing is queued.
#[derive(Debug)]
pub struct MotionSurface {
    channels: [MotionChannel; ChannelId::COUNT],
    batches: HashMap<BatchId, PendingBatch>,
    next_batch: BatchId,
    frames: watch::Sender<SurfaceFrame>,
}

impl MotionSurface {
    pub fn new(initial: SurfaceFrame) -> Self {
        let channels = ChannelId::ALL.map(|id| MotionChannel::new(frame_value(&initial, id)));
        let (frames, _) = watch::channel(initial);
        Self {
            channels,
            batches: HashMap::new(),
            next_batch: 1,
            frames,
        }
    }

    pub fn value(&self, channel: ChannelId) -> f32 {
        self.channels[channel.index()].value()
    }

    pub fn frame(&self) -> SurfaceFrame {
        let mut frame = SurfaceFrame::default();
        for id in ChannelId::ALL {
            *frame_value_mut(&mut frame, id) = self.value(id);
        }
        frame
    }

    pub fn subscribe(&self) -> watch::Receiver<SurfaceFrame> {
        self.frames.subscribe()
    }

    pub fn is_settled(&self) -> bool {
        self.channels.iter().all(|channel| !channel.is_animating())
    }

    /// Unanimated write of the drag geometry, called on every move event.
    pub fn follow_frame(&mut self, sample: GeometrySample) {
        self.write(ChannelId::HandleX, sample.handle_x);
        self.write(ChannelId::HandleY, sample.handle_y);
        self.write(ChannelId::BackgroundY, sample.background_y);
        self.publish();
    }

    /// Unanimated write of a single channel.
    pub fn snap(&mut self, channel: ChannelId, value: f32) {
        self.write(channel, value);
        self.publish();
    }

    pub fn settle_to(&mut self, set: MotionSet) -> SettleHandle {
        let id = self.next_batch;
        self.next_batch += 1;
        let (done, outcome) = watch::channel(None);
        let handle = SettleHandle { id, outcome };

        if set.moves.is_empty() {
            done.send_replace(Some(SettleOutcome::Completed));
            return handle;
        }

        self.batches.insert(
            id,
            PendingBatch {
                name: set.name,
                remaining: set.moves.len(),
                done,
            },
        );
        for step in &set.moves {
            let interrupted =
                self.channels[step.channel.index()].animate(step.target, step.transition, id);
            match interrupted {
                Some(previous) if previous == id => self.channel_finished(id),
                Some(previous) => self.supersede(previous),
                None => {}
            }
        }
        tracing::debug!(batch = id, name = set.name, channels = set.moves.len(), "settle started");
        handle
    }

    /// Advances every running animation by `dt`. Returns true while any
    /// channel is still animating.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let mut finished = Vec::new();
        for channel in self.channels.iter_mut() {
            if let Some(batch) = channel.advance(dt) {
                finished.push(batch);
            }
        }
        for batch in finished {
            self.channel_finished(batch);
        }
        self.publish();
        !self.is_settled()
    }

    fn write(&mut self, channel: ChannelId, value: f32) {
        if let Some(previous) = self.channels[channel.index()].set(value) {
            self.supersede(previous);
        }
    }

    fn channel_finished(&mut self, batch: BatchId) {
        let Some(pending) = self.batches.get_mut(&batch) else {
            return;
        };
        pending.remaining = pending.remaining.saturating_sub(1);
        if pending.remaining == 0 {
            if let Some(pending) = self.batches.remove(&batch) {
                tracing::debug!(batch, name = pending.name, "settle completed");
                pending.done.send_replace(Some(SettleOutcome::Completed));
            }
        }
    }

    fn supersede(&mut self, batch: BatchId) {
        if let Some(pending) = self.batches.remove(&batch) {
            tracing::debug!(batch, name = pending.name, "settle superseded");
            pending.done.send_replace(Some(SettleOutcome::Superseded));
        }
    }

    fn publish(&self) {
        self.frames.send_replace(self.frame());
    }
}

fn frame_value(frame: &SurfaceFrame, channel: ChannelId) -> f32 {
    match channel {
        ChannelId::HandleX => frame.handle_x,
        ChannelId::HandleY => frame.handle_y,
        ChannelId::BackgroundY => frame.background_y,
        ChannelId::HandleWidth => frame.handle_width,
        ChannelId::HandleHeight => frame.handle_height,
        ChannelId::OverlayOpacity => frame.overlay_opacity,
        ChannelId::IndicatorWidth => frame.indicator_width,
        ChannelId::IndicatorOpacity => frame.indicator_opacity,
    }
}

fn frame_value_mut(frame: &mut SurfaceFrame, channel: ChannelId) -> &mut f32 {
    match channel {
        ChannelId::HandleX => &mut frame.handle_x,
        ChannelId::HandleY => &mut frame.handle_y,
        ChannelId::BackgroundY => &mut frame.background_y,
        ChannelId::HandleWidth => &mut frame.handle_width,
        ChannelId::HandleHeight => &mut frame.handle_height,
        ChannelId::OverlayOpacity => &mut frame.overlay_opacity,
        ChannelId::IndicatorWidth => &mut frame.indicator_width,
        ChannelId::IndicatorOpacity => &mut frame.indicator_opacity,
    }
}
