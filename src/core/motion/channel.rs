use crate::core::motion::easing::{SpringSpec, TimingSpec, Transition};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelId {
    HandleX,
    HandleY,
    BackgroundY,
    HandleWidth,
    HandleHeight,
    OverlayOpacity,
    IndicatorWidth,
    IndicatorOpacity,
}

impl ChannelId {
    pub const COUNT: usize = 8;

    pub const ALL: [ChannelId; Self::COUNT] = [
        ChannelId::HandleX,
        ChannelId::HandleY,
        ChannelId::BackgroundY,
        ChannelId::HandleWidth,
        ChannelId::HandleHeight,
        ChannelId::OverlayOpacity,
        ChannelId::IndicatorWidth,
        ChannelId::IndicatorOpacity,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

pub type BatchId = u64;

#[derive(Debug, Clone, Copy)]
enum Motion {
    Spring(SpringSpec),
    Timing {
        spec: TimingSpec,
        from: f64,
        elapsed_ms: f64,
    },
}

#[derive(Debug, Clone, Copy)]
struct Active {
    batch: BatchId,
    target: f64,
    motion: Motion,
}

/// A single animatable register. Physics runs in f64 so a spring can
/// actually reach its rest thresholds at pixel magnitudes.
#[derive(Debug, Clone)]
pub struct MotionChannel {
    value: f64,
    velocity: f64,
    active: Option<Active>,
}

const SPRING_STEP_SECS: f64 = 0.001;

impl MotionChannel {
    pub fn new(value: f32) -> Self {
        Self {
            value: f64::from(value),
            velocity: 0.0,
            active: None,
        }
    }

    pub fn value(&self) -> f32 {
        self.value as f32
    }

    pub fn batch(&self) -> Option<BatchId> {
        self.active.map(|active| active.batch)
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Immediate write. Returns the batch whose animation was interrupted.
    pub fn set(&mut self, value: f32) -> Option<BatchId> {
        let interrupted = self.batch();
        self.value = f64::from(value);
        self.velocity = 0.0;
        self.active = None;
        interrupted
    }

    /// Starts animating toward `target`. A spring keeps the current
    /// velocity so an interrupted motion hands over smoothly.
    pub fn animate(
        &mut self,
        target: f32,
        transition: Transition,
        batch: BatchId,
    ) -> Option<BatchId> {
        let interrupted = self.batch();
        let motion = match transition {
            Transition::Spring(spec) => Motion::Spring(spec),
            Transition::Timing(spec) => {
                self.velocity = 0.0;
                Motion::Timing {
                    spec,
                    from: self.value,
                    elapsed_ms: 0.0,
                }
            }
        };
        self.active = Some(Active {
            batch,
            target: f64::from(target),
            motion,
        });
        interrupted
    }

    /// Steps the running animation. Returns the batch id when the animation
    /// finished during this step.
    pub fn advance(&mut self, dt: Duration) -> Option<BatchId> {
        let mut active = self.active?;
        let finished = match &mut active.motion {
            Motion::Spring(spec) => self.step_spring(spec, active.target, dt.as_secs_f64()),
            Motion::Timing {
                spec,
                from,
                elapsed_ms,
            } => {
                *elapsed_ms += dt.as_secs_f64() * 1000.0;
                let duration = spec.duration_ms as f64;
                let linear = if duration <= 0.0 {
                    1.0
                } else {
                    (*elapsed_ms / duration).min(1.0)
                };
                let progress = f64::from(spec.easing.transform(linear as f32));
                self.value = *from + (active.target - *from) * progress;
                if linear >= 1.0 {
                    self.value = active.target;
                    true
                } else {
                    false
                }
            }
        };
        if finished {
            self.active = None;
            Some(active.batch)
        } else {
            self.active = Some(active);
            None
        }
    }

    fn step_spring(&mut self, spec: &SpringSpec, target: f64, secs: f64) -> bool {
        let stiffness = f64::from(spec.stiffness);
        let damping = f64::from(spec.damping);
        let mut remaining = secs;
        while remaining > 0.0 {
            let step = remaining.min(SPRING_STEP_SECS);
            let displacement = self.value - target;
            let acceleration = -stiffness * displacement - damping * self.velocity;
            self.velocity += acceleration * step;
            self.value += self.velocity * step;
            remaining -= step;
        }
        let at_rest = self.velocity.abs() < f64::from(spec.rest_speed)
            && (self.value - target).abs() < f64::from(spec.rest_displacement);
        if at_rest {
            self.value = target;
            self.velocity = 0.0;
        }
        at_rest
    }
}

#[cfg(test)]
mod tests {
    use super::MotionChannel;
    use crate::core::motion::easing::{SpringSpec, TimingSpec, Transition};
    use std::time::Duration;

    const FRAME: Duration = Duration::from_millis(16);

    fn run_until_idle(channel: &mut MotionChannel) -> u32 {
        let mut frames = 0;
        while channel.is_animating() && frames < 10_000 {
            channel.advance(FRAME);
            frames += 1;
        }
        frames
    }

    #[test]
    fn spring_settles_exactly_on_target() {
        let mut channel = MotionChannel::new(0.0);
        let spring = SpringSpec::from_tension_friction(40.0, 6.0);
        channel.animate(-250.0, Transition::Spring(spring), 1);
        let frames = run_until_idle(&mut channel);
        assert!(frames < 10_000);
        assert_eq!(channel.value(), -250.0);
    }

    #[test]
    fn underdamped_spring_overshoots() {
        let mut channel = MotionChannel::new(0.0);
        channel.animate(
            100.0,
            Transition::Spring(SpringSpec::from_tension_friction(40.0, 6.0)),
            1,
        );
        let mut peak = 0.0_f32;
        while channel.is_animating() {
            channel.advance(FRAME);
            peak = peak.max(channel.value());
        }
        assert!(peak > 100.0);
    }

    #[test]
    fn timing_reaches_target_after_duration() {
        let mut channel = MotionChannel::new(1.0);
        channel.animate(0.0, Transition::Timing(TimingSpec::ease(5)), 7);
        assert_eq!(channel.advance(Duration::from_millis(2)), None);
        assert!(channel.value() < 1.0);
        assert_eq!(channel.advance(Duration::from_millis(4)), Some(7));
        assert_eq!(channel.value(), 0.0);
    }

    #[test]
    fn immediate_write_interrupts_animation() {
        let mut channel = MotionChannel::new(0.0);
        channel.animate(10.0, Transition::Timing(TimingSpec::ease(100)), 3);
        channel.advance(FRAME);
        assert_eq!(channel.set(42.0), Some(3));
        assert!(!channel.is_animating());
        assert_eq!(channel.advance(FRAME), None);
        assert_eq!(channel.value(), 42.0);
    }

    #[test]
    fn retarget_reports_previous_batch() {
        let mut channel = MotionChannel::new(0.0);
        let spring = Transition::Spring(SpringSpec::from_tension_friction(40.0, 6.0));
        assert_eq!(channel.animate(10.0, spring, 1), None);
        assert_eq!(channel.animate(20.0, spring, 2), Some(1));
        run_until_idle(&mut channel);
        assert_eq!(channel.value(), 20.0);
    }

    #[test]
    fn frictionless_profile_still_comes_to_rest() {
        let mut channel = MotionChannel::new(0.0);
        let spring = SpringSpec::from_tension_friction(40.0, 0.0);
        channel.animate(250.0, Transition::Spring(spring), 1);
        let frames = run_until_idle(&mut channel);
        assert!(frames < 10_000);
        assert_eq!(channel.value(), 250.0);
    }
}
