//! Fade curve implementations for gain envelopes
//!
//! Pure functions mapping `(step, total_steps, target, curve)` to a gain
//! value. No state, no I/O: the playback engine drives these step by step
//! and applies the results to its players.
//!
//! Two curves are provided:
//! - **Linear**: `v(t) = t`, used for start fade-in, stop fade-out and
//!   volume ramps
//! - **SmoothStep**: Hermite `v(t) = 3t² − 2t³`, used for loop crossfades.
//!   Zero slope at both ends avoids clicks, and the complementary pair
//!   `volume·(1−S)` / `volume·S` always sums to `volume`.
//!
//! Progress for step `i` of `n` is `i / (n − 1)`, so the final step lands
//! exactly on the target rather than approaching it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fade curve types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Linear: v(t) = t
    #[default]
    Linear,

    /// Hermite smoothstep S-curve: v(t) = 3t² − 2t³
    SmoothStep,
}

impl FadeCurve {
    /// Shape a normalized position (0.0 to 1.0) into a multiplier (0.0 to 1.0)
    ///
    /// Out-of-range positions are clamped.
    pub fn shape(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::SmoothStep => t * t * (3.0 - 2.0 * t),
        }
    }

    /// Parse curve from a config string
    ///
    /// Accepts `linear`, `smoothstep`, `smooth_step`, `s_curve`, `scurve`
    /// and `s-curve` (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(FadeCurve::Linear),
            "smoothstep" | "smooth_step" | "s_curve" | "scurve" | "s-curve" => {
                Some(FadeCurve::SmoothStep)
            }
            _ => None,
        }
    }

    /// Canonical config string
    pub fn as_str(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::SmoothStep => "smooth_step",
        }
    }

    /// Human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "Linear",
            FadeCurve::SmoothStep => "S-Curve",
        }
    }

    /// All available fade curve variants
    pub fn all_variants() -> &'static [FadeCurve] {
        &[FadeCurve::Linear, FadeCurve::SmoothStep]
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Duration, step count and curve for one kind of fade
///
/// The step interval is `duration / steps`; a fade sleeps one interval
/// after each applied step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FadeProfile {
    pub duration: Duration,
    pub steps: u32,
    pub curve: FadeCurve,
}

impl FadeProfile {
    /// Start fade-in: 1.0 s, 25 steps, linear
    pub const START_FADE_IN: FadeProfile =
        FadeProfile::new(Duration::from_millis(1000), 25, FadeCurve::Linear);

    /// Stop fade-out: 0.5 s, 15 steps, linear
    pub const STOP_FADE_OUT: FadeProfile =
        FadeProfile::new(Duration::from_millis(500), 15, FadeCurve::Linear);

    /// Loop crossfade (per side): 3.0 s, 75 steps, smoothstep
    pub const CROSSFADE: FadeProfile =
        FadeProfile::new(Duration::from_millis(3000), 75, FadeCurve::SmoothStep);

    /// Volume change ramp: 0.3 s, 10 steps, linear
    pub const VOLUME_RAMP: FadeProfile =
        FadeProfile::new(Duration::from_millis(300), 10, FadeCurve::Linear);

    /// Create a profile; a zero step count is raised to one
    pub const fn new(duration: Duration, steps: u32, curve: FadeCurve) -> Self {
        let steps = if steps == 0 { 1 } else { steps };
        Self { duration, steps, curve }
    }

    /// Time between consecutive steps
    pub fn step_interval(&self) -> Duration {
        self.duration / self.steps
    }

    /// Gain at `step` for a ramp from `from` to `to` along this profile's curve
    pub fn gain_at(&self, step: u32, from: f32, to: f32) -> f32 {
        ramp_gain(step, self.steps, from, to, self.curve)
    }

    /// Crossfade gain pair at `step` along this profile's curve
    pub fn crossfade_at(&self, step: u32, volume: f32) -> CrossfadeGains {
        crossfade_gains(step, self.steps, volume, self.curve)
    }
}

/// Normalized progress of `step` within `total_steps`: `i / (n − 1)`
///
/// A single-step fade is complete at its only step.
pub fn step_progress(step: u32, total_steps: u32) -> f32 {
    if total_steps <= 1 {
        return 1.0;
    }
    let last = total_steps - 1;
    step.min(last) as f32 / last as f32
}

/// Gain at `step` of a ramp from `from` to `to`
///
/// The final step returns `to` exactly.
pub fn ramp_gain(step: u32, total_steps: u32, from: f32, to: f32, curve: FadeCurve) -> f32 {
    if step + 1 >= total_steps {
        return to;
    }
    let shaped = curve.shape(step_progress(step, total_steps));
    from + (to - from) * shaped
}

/// Paired gains for one crossfade step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossfadeGains {
    /// Gain of the player fading out (currently active slot)
    pub outgoing: f32,
    /// Gain of the player fading in (currently inactive slot)
    pub incoming: f32,
}

/// Complementary gains at `step` of a crossfade at `volume`
///
/// `outgoing = volume·(1−S(t))`, `incoming = volume·S(t)` where `S` is
/// `curve`. The final step is exactly `(0, volume)`.
pub fn crossfade_gains(
    step: u32,
    total_steps: u32,
    volume: f32,
    curve: FadeCurve,
) -> CrossfadeGains {
    if step + 1 >= total_steps {
        return CrossfadeGains {
            outgoing: 0.0,
            incoming: volume,
        };
    }
    let s = curve.shape(step_progress(step, total_steps));
    CrossfadeGains {
        outgoing: volume * (1.0 - s),
        incoming: volume * s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_bounds() {
        for curve in FadeCurve::all_variants() {
            assert_eq!(curve.shape(0.0), 0.0, "{:?} at 0.0", curve);
            assert_eq!(curve.shape(1.0), 1.0, "{:?} at 1.0", curve);
            assert_eq!(curve.shape(-1.0), 0.0, "{:?} clamps below", curve);
            assert_eq!(curve.shape(2.0), 1.0, "{:?} clamps above", curve);
        }
    }

    #[test]
    fn test_smoothstep_midpoint_and_symmetry() {
        let curve = FadeCurve::SmoothStep;
        assert!((curve.shape(0.5) - 0.5).abs() < 1e-6);

        for i in 0..=20 {
            let t = i as f32 / 20.0;
            let sum = curve.shape(t) + curve.shape(1.0 - t);
            assert!((sum - 1.0).abs() < 1e-5, "S(t) + S(1-t) should be 1 at t={}", t);
        }
    }

    #[test]
    fn test_smoothstep_is_monotonic() {
        let mut previous = 0.0;
        for i in 0..=100 {
            let value = FadeCurve::SmoothStep.shape(i as f32 / 100.0);
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn test_step_progress() {
        assert_eq!(step_progress(0, 25), 0.0);
        assert_eq!(step_progress(24, 25), 1.0);
        assert_eq!(step_progress(12, 25), 0.5);
        assert_eq!(step_progress(99, 25), 1.0);
        assert_eq!(step_progress(0, 1), 1.0);
        assert_eq!(step_progress(0, 0), 1.0);
    }

    #[test]
    fn test_fade_in_lands_exactly_on_target() {
        let target = 0.73;
        assert_eq!(ramp_gain(0, 25, 0.0, target, FadeCurve::Linear), 0.0);
        assert_eq!(ramp_gain(24, 25, 0.0, target, FadeCurve::Linear), target);
    }

    #[test]
    fn test_fade_out_lands_exactly_on_zero() {
        assert_eq!(ramp_gain(0, 15, 0.6, 0.0, FadeCurve::Linear), 0.6);
        assert_eq!(ramp_gain(14, 15, 0.6, 0.0, FadeCurve::Linear), 0.0);
    }

    #[test]
    fn test_ramp_between_levels() {
        let profile = FadeProfile::VOLUME_RAMP;
        assert_eq!(profile.gain_at(0, 0.8, 0.3), 0.8);
        assert_eq!(profile.gain_at(profile.steps - 1, 0.8, 0.3), 0.3);

        let mid = profile.gain_at(4, 0.8, 0.3);
        assert!(mid < 0.8 && mid > 0.3);
    }

    #[test]
    fn test_crossfade_gains_sum_to_volume() {
        for volume in [0.0_f32, 0.25, 0.5, 0.75, 1.0] {
            for step in 0..75 {
                let gains = crossfade_gains(step, 75, volume, FadeCurve::SmoothStep);
                assert!(
                    (gains.outgoing + gains.incoming - volume).abs() < 1e-5,
                    "step {} at volume {}: {} + {}",
                    step,
                    volume,
                    gains.outgoing,
                    gains.incoming
                );
            }
        }
    }

    #[test]
    fn test_crossfade_endpoints() {
        let first = FadeProfile::CROSSFADE.crossfade_at(0, 0.8);
        assert_eq!(first.outgoing, 0.8);
        assert_eq!(first.incoming, 0.0);

        let last = FadeProfile::CROSSFADE.crossfade_at(74, 0.8);
        assert_eq!(last.outgoing, 0.0);
        assert_eq!(last.incoming, 0.8);
    }

    #[test]
    fn test_profile_intervals() {
        assert_eq!(FadeProfile::START_FADE_IN.step_interval(), Duration::from_millis(40));
        assert_eq!(FadeProfile::CROSSFADE.step_interval(), Duration::from_millis(40));
        assert_eq!(FadeProfile::STOP_FADE_OUT.steps, 15);
        assert_eq!(FadeProfile::new(Duration::from_millis(100), 0, FadeCurve::Linear).steps, 1);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(FadeCurve::from_str("linear"), Some(FadeCurve::Linear));
        assert_eq!(FadeCurve::from_str("S-Curve"), Some(FadeCurve::SmoothStep));
        assert_eq!(FadeCurve::from_str("smoothstep"), Some(FadeCurve::SmoothStep));
        assert_eq!(FadeCurve::from_str("cosine"), None);
        for curve in FadeCurve::all_variants() {
            assert_eq!(FadeCurve::from_str(curve.as_str()), Some(*curve));
        }
    }

    #[test]
    fn test_linear_crossfade_also_sums_to_volume() {
        for step in 0..10 {
            let gains = crossfade_gains(step, 10, 0.5, FadeCurve::Linear);
            assert!((gains.outgoing + gains.incoming - 0.5).abs() < 1e-6);
        }
        assert_eq!(crossfade_gains(5, 11, 1.0, FadeCurve::Linear).incoming, 0.5);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", FadeCurve::Linear), "Linear");
        assert_eq!(format!("{}", FadeCurve::SmoothStep), "S-Curve");
    }
}
