use crate::core::motion::channel::ChannelId;
use crate::core::motion::easing::{SpringSpec, TimingSpec, Transition};
use crate::core::motion::geometry::Layout;
use crate::core::motion::surface::{MotionSet, MotionSurface, SettleHandle, SurfaceFrame};
use crate::core::sync::service::LightSynchronizer;
use crate::domain::models::{
    AppConfig, AppError, DragOffset, GestureDecision, GestureSample, MotionProfile, StatusLabels,
};
use crate::domain::state_machine::{GestureMachine, GesturePhase, ReleaseRules};
use crate::infra::bridge::client::LightClient;
use crate::state::{SyncRun, ToggleState};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct ReleaseOutcome {
    pub decision: GestureDecision,
    pub settle: SettleHandle,
    /// Background light sync, present for on/off decisions only.
    pub sync: Option<JoinHandle<SyncRun>>,
}

/// Drives the toggle from raw touch phases: geometry per move, a settle
/// animation and a light sync per committed release.
pub struct ToggleController<C: LightClient> {
    layout: Layout,
    rules: ReleaseRules,
    motion: MotionProfile,
    labels: StatusLabels,
    machine: GestureMachine,
    state: ToggleState,
    surface: MotionSurface,
    sync: Arc<LightSynchronizer<C>>,
}

impl<C: LightClient> ToggleController<C> {
    pub fn new(config: &AppConfig, sync: Arc<LightSynchronizer<C>>) -> Self {
        let layout = Layout::from_config(&config.layout);
        let rules = ReleaseRules {
            half_height: layout.half_height,
            flick_up_velocity: config.gesture.flick_up_velocity,
            flick_side_velocity: config.gesture.flick_side_velocity,
            on_rest: layout.resting_offset(true, config.gesture.resting_offset),
            off_rest: layout.resting_offset(false, config.gesture.resting_offset),
        };
        let state = ToggleState::default();
        let start = layout.resting_sample(state.offset);
        let surface = MotionSurface::new(SurfaceFrame {
            handle_x: start.handle_x,
            handle_y: start.handle_y,
            background_y: start.background_y,
            handle_width: layout.default_handle_width,
            handle_height: 0.0,
            overlay_opacity: config.motion.off_overlay_opacity,
            indicator_width: config.motion.indicator_width,
            indicator_opacity: 1.0,
        });
        Self {
            layout,
            rules,
            motion: config.motion.clone(),
            labels: config.labels.clone(),
            machine: GestureMachine,
            state,
            surface,
            sync,
        }
    }

    pub fn state(&self) -> ToggleState {
        self.state
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn surface(&self) -> &MotionSurface {
        &self.surface
    }

    pub fn synchronizer(&self) -> &Arc<LightSynchronizer<C>> {
        &self.sync
    }

    /// Called by the animation driver once per frame.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.surface.advance(dt)
    }

    pub fn label(&self) -> String {
        match self.state.phase {
            GesturePhase::Dragging => self.labels.grabbed.clone(),
            GesturePhase::Idle => self.sync.status().label(&self.labels),
        }
    }

    /// Grows the handle in from zero height.
    pub fn reveal(&mut self) -> SettleHandle {
        let spring = self.spring(self.motion.reveal_friction);
        self.surface.settle_to(MotionSet::new("reveal").with(
            ChannelId::HandleHeight,
            self.layout.handle_height,
            spring,
        ))
    }

    pub fn grant(&mut self) -> Result<SettleHandle, AppError> {
        self.state = self.machine.grant(self.state)?;
        tracing::debug!(offset = ?self.state.offset, "toggle grabbed");
        let width = self.spring(self.motion.width_friction);
        let fade = self.fade();
        Ok(self.surface.settle_to(
            MotionSet::new("grab")
                .with(ChannelId::HandleWidth, self.layout.grabbed_handle_width, width)
                .with(
                    ChannelId::OverlayOpacity,
                    self.motion.grabbed_overlay_opacity,
                    fade,
                ),
        ))
    }

    pub fn drag(&mut self, sample: &GestureSample) -> Result<(), AppError> {
        let base = self.machine.drag(&self.state)?;
        let geometry = self
            .layout
            .compute_positions(sample.dx, sample.dy, base.x, base.y);
        self.surface.follow_frame(geometry);
        Ok(())
    }

    pub fn release(&mut self, sample: &GestureSample) -> Result<ReleaseOutcome, AppError> {
        tracing::debug!(?sample, "toggle released");
        let (next, decision) = self.machine.release(self.state, sample, &self.rules)?;
        let runtime = match decision.target() {
            Some(_) => Some(tokio::runtime::Handle::try_current().map_err(|_| {
                AppError::new(
                    "RUNTIME_UNAVAILABLE",
                    "light sync needs a running tokio runtime",
                    Some("drive the controller from inside the async runtime".to_string()),
                )
            })?),
            None => None,
        };
        self.state = next;
        let settle = self.settle_group(next.offset, next.is_on);

        let sync = match (decision.target(), runtime) {
            (Some(on), Some(runtime)) => {
                tracing::info!(?decision, "toggle committed");
                let ticket = self.sync.begin(on);
                let sync = Arc::clone(&self.sync);
                Some(runtime.spawn(async move { sync.run(ticket).await }))
            }
            _ => {
                tracing::debug!("toggle released without a decision");
                None
            }
        };
        Ok(ReleaseOutcome {
            decision,
            settle,
            sync,
        })
    }

    /// Startup read of the bridge. A successful read jumps straight to the
    /// matching resting layout without animating. Nothing is read or
    /// published while a drag is in progress.
    pub async fn reconcile(&mut self) -> Option<bool> {
        if self.state.phase != GesturePhase::Idle {
            tracing::info!("startup reconciliation skipped, toggle is being dragged");
            return None;
        }
        let on = self.sync.reconcile().await?;
        self.state = self.machine.snap(on, &self.rules);
        let rest = self.layout.resting_sample(self.state.offset);
        let opacity = self.overlay_opacity(on);
        self.surface.follow_frame(rest);
        self.surface
            .snap(ChannelId::HandleWidth, self.layout.default_handle_width);
        self.surface.snap(ChannelId::OverlayOpacity, opacity);
        self.surface.snap(ChannelId::IndicatorWidth, 0.0);
        self.surface.snap(ChannelId::IndicatorOpacity, 0.0);
        Some(on)
    }

    fn settle_group(&mut self, offset: DragOffset, on: bool) -> SettleHandle {
        let rest = self.layout.resting_sample(offset);
        let position = self.spring(self.motion.settle_friction);
        let width = self.spring(self.motion.width_friction);
        let fade = self.fade();
        let opacity = self.overlay_opacity(on);
        self.surface.settle_to(
            MotionSet::new("settle")
                .with_geometry(rest, position)
                .with(ChannelId::HandleWidth, self.layout.default_handle_width, width)
                .with(ChannelId::OverlayOpacity, opacity, fade)
                .with(ChannelId::IndicatorWidth, 0.0, fade)
                .with(ChannelId::IndicatorOpacity, 0.0, fade),
        )
    }

    fn overlay_opacity(&self, on: bool) -> f32 {
        if on {
            self.motion.on_overlay_opacity
        } else {
            self.motion.off_overlay_opacity
        }
    }

    fn spring(&self, friction: f32) -> Transition {
        Transition::Spring(SpringSpec::from_tension_friction(
            self.motion.spring_tension,
            friction,
        ))
    }

    fn fade(&self) -> Transition {
        Transition::Timing(TimingSpec::ease(self.motion.fade_duration_ms))
    }
}
