#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// cubic-bezier(0.42, 0, 1, 1)
    Ease,
    /// cubic-bezier(0.42, 0, 0.58, 1)
    EaseInOut,
}

impl Easing {
    pub fn transform(&self, fraction: f32) -> f32 {
        match self {
            Easing::Linear => fraction.clamp(0.0, 1.0),
            Easing::Ease => cubic_bezier(0.42, 0.0, 1.0, 1.0, fraction),
            Easing::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, fraction),
        }
    }
}

fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, fraction: f32) -> f32 {
    if fraction <= 0.0 {
        return 0.0;
    }
    if fraction >= 1.0 {
        return 1.0;
    }

    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;

    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample = |a: f32, b: f32, c: f32, t: f32| ((a * t + b) * t + c) * t;
    let slope = |a: f32, b: f32, c: f32, t: f32| (3.0 * a * t + 2.0 * b) * t + c;

    let mut t = fraction;
    for _ in 0..8 {
        let x = sample(ax, bx, cx, t) - fraction;
        if x.abs() < 1e-6 {
            return sample(ay, by, cy, t);
        }
        let dx = slope(ax, bx, cx, t);
        if dx.abs() < 1e-6 {
            break;
        }
        t = (t - x / dx).clamp(0.0, 1.0);
    }

    // Newton did not converge; bisect.
    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    t = fraction;
    for _ in 0..24 {
        let delta = sample(ax, bx, cx, t) - fraction;
        if delta.abs() < 1e-6 {
            break;
        }
        if delta > 0.0 {
            hi = t;
        } else {
            lo = t;
        }
        t = 0.5 * (lo + hi);
    }
    sample(ay, by, cy, t)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSpec {
    pub duration_ms: u64,
    pub easing: Easing,
}

impl TimingSpec {
    pub fn ease(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            easing: Easing::Ease,
        }
    }
}

/// Lowest damping a converted spring gets; anything less never comes to rest.
const MIN_DAMPING: f32 = 1.0;

/// Damped harmonic oscillator with unit mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringSpec {
    pub stiffness: f32,
    pub damping: f32,
    pub rest_speed: f32,
    pub rest_displacement: f32,
}

impl SpringSpec {
    /// Converts the tension/friction pair used by touch UI toolkits into
    /// stiffness and damping.
    pub fn from_tension_friction(tension: f32, friction: f32) -> Self {
        let stiffness = ((tension - 30.0) * 3.62 + 194.0).max(1.0);
        let damping = ((friction - 8.0) * 3.0 + 25.0).max(MIN_DAMPING);
        Self {
            stiffness,
            damping,
            rest_speed: 0.001,
            rest_displacement: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Spring(SpringSpec),
    Timing(TimingSpec),
}

#[cfg(test)]
mod tests {
    use super::{Easing, SpringSpec, MIN_DAMPING};

    #[test]
    fn ease_curve_hits_endpoints_and_is_monotonic() {
        let easing = Easing::Ease;
        assert_eq!(easing.transform(0.0), 0.0);
        assert_eq!(easing.transform(1.0), 1.0);
        let mut previous = 0.0;
        for step in 1..=20 {
            let value = easing.transform(step as f32 / 20.0);
            assert!(value >= previous - 1e-5);
            previous = value;
        }
        // Ease-in: slow start.
        assert!(easing.transform(0.25) < 0.25);
    }

    #[test]
    fn friction_maps_to_damping() {
        let spring = SpringSpec::from_tension_friction(40.0, 6.0);
        assert!((spring.stiffness - 230.2).abs() < 1e-3);
        assert!((spring.damping - 19.0).abs() < 1e-3);
        let loose = SpringSpec::from_tension_friction(40.0, 5.0);
        assert!(loose.damping < spring.damping);
    }

    #[test]
    fn very_low_friction_still_damps() {
        for friction in [0.0, -5.0, 7.0 - 25.0 / 3.0] {
            let spring = SpringSpec::from_tension_friction(40.0, friction);
            assert!(spring.damping >= MIN_DAMPING);
        }
    }
}
