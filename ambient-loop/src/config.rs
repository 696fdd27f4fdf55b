//! Runtime timing for the loop engine
//!
//! Converts the millisecond values of the bootstrap `[timing]` section
//! into durations and fade profiles.

use ambient_common::config::TimingConfig;
use ambient_common::time::millis_to_duration;
use ambient_common::FadeProfile;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct LoopTiming {
    /// Crossfade begins once remaining time drops to this
    pub preload_lead_time: Duration,
    /// Assumed track length when the player cannot report one
    pub fallback_duration: Duration,
    pub poll_interval: Duration,
    /// Delay between restarting the incoming player and the first crossfade step
    pub stabilization_delay: Duration,
    pub fade_in: FadeProfile,
    pub fade_out: FadeProfile,
    pub crossfade: FadeProfile,
    pub volume_ramp: FadeProfile,
    pub max_consecutive_failures: u32,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

impl From<&TimingConfig> for LoopTiming {
    fn from(config: &TimingConfig) -> Self {
        Self {
            preload_lead_time: millis_to_duration(config.preload_lead_time_ms),
            fallback_duration: millis_to_duration(config.fallback_duration_ms),
            poll_interval: millis_to_duration(config.poll_interval_ms),
            stabilization_delay: millis_to_duration(config.stabilization_delay_ms),
            fade_in: FadeProfile::new(
                millis_to_duration(config.fade_in_ms),
                config.fade_in_steps,
                config.fade_curve,
            ),
            fade_out: FadeProfile::new(
                millis_to_duration(config.fade_out_ms),
                config.fade_out_steps,
                config.fade_curve,
            ),
            crossfade: FadeProfile::new(
                millis_to_duration(config.crossfade_ms),
                config.crossfade_steps,
                config.crossfade_curve,
            ),
            volume_ramp: FadeProfile::new(
                millis_to_duration(config.volume_ramp_ms),
                config.volume_ramp_steps,
                config.fade_curve,
            ),
            max_consecutive_failures: config.max_consecutive_failures.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambient_common::FadeCurve;

    #[test]
    fn test_default_profiles_match_builtin_constants() {
        let timing = LoopTiming::default();
        assert_eq!(timing.fade_in, FadeProfile::START_FADE_IN);
        assert_eq!(timing.fade_out, FadeProfile::STOP_FADE_OUT);
        assert_eq!(timing.crossfade, FadeProfile::CROSSFADE);
        assert_eq!(timing.volume_ramp, FadeProfile::VOLUME_RAMP);
        assert_eq!(timing.preload_lead_time, Duration::from_millis(3500));
    }

    #[test]
    fn test_configured_curves_reach_profiles() {
        let config = TimingConfig {
            fade_curve: FadeCurve::SmoothStep,
            crossfade_curve: FadeCurve::Linear,
            ..TimingConfig::default()
        };
        let timing = LoopTiming::from(&config);
        assert_eq!(timing.fade_in.curve, FadeCurve::SmoothStep);
        assert_eq!(timing.volume_ramp.curve, FadeCurve::SmoothStep);
        assert_eq!(timing.crossfade.curve, FadeCurve::Linear);
        assert_eq!(timing.crossfade.steps, 75);
    }
}
