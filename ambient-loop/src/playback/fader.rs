//! Fade driver
//!
//! Steps gain envelopes from `ambient_common::fade_curves` onto player
//! slots in real time. Each step computes the gain(s), applies them, then
//! suspends for the profile's step interval. Gain updates for a player are
//! strictly sequential, so they can never be reordered.
//!
//! Every loop checks its cancellation token before each step and while
//! sleeping. A cancelled fade returns `FadeOutcome::Aborted` and leaves the
//! last applied gains recorded in the slots; the canceller settles them.

use super::slots::{PlayerSlots, SlotIndex};
use crate::player::PlayerResult;
use crate::state::SharedState;
use ambient_common::FadeProfile;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How a fade loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeOutcome {
    /// All steps applied, final gain exact
    Completed,
    /// Cancelled before the final step
    Aborted,
}

/// Sleep for `duration` unless `token` is cancelled first
///
/// Returns false when cancelled.
pub(crate) async fn sleep_or_cancel(duration: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Ramp one slot's gain from `from` to `to` along `profile`
pub async fn ramp_slot(
    slots: &PlayerSlots,
    slot: SlotIndex,
    from: f32,
    to: f32,
    profile: &FadeProfile,
    token: &CancellationToken,
) -> PlayerResult<FadeOutcome> {
    let interval = profile.step_interval();
    debug!(
        "Ramp {} {:.3} -> {:.3} over {:?} ({} steps)",
        slot, from, to, profile.duration, profile.steps
    );

    for step in 0..profile.steps {
        if token.is_cancelled() {
            return Ok(FadeOutcome::Aborted);
        }
        slots.set_gain(slot, profile.gain_at(step, from, to)).await?;

        let last = step + 1 == profile.steps;
        if !sleep_or_cancel(interval, token).await && !last {
            return Ok(FadeOutcome::Aborted);
        }
    }
    Ok(FadeOutcome::Completed)
}

/// Ramp both slots to silence from their current gains as paired steps
pub async fn fade_out_both(
    slots: &PlayerSlots,
    profile: &FadeProfile,
    token: &CancellationToken,
) -> PlayerResult<FadeOutcome> {
    let start = [slots.gain(SlotIndex::Zero), slots.gain(SlotIndex::One)];
    let interval = profile.step_interval();

    for step in 0..profile.steps {
        if token.is_cancelled() {
            return Ok(FadeOutcome::Aborted);
        }
        slots
            .set_gain_pair(
                (SlotIndex::Zero, profile.gain_at(step, start[0], 0.0)),
                (SlotIndex::One, profile.gain_at(step, start[1], 0.0)),
            )
            .await?;

        let last = step + 1 == profile.steps;
        if !sleep_or_cancel(interval, token).await && !last {
            return Ok(FadeOutcome::Aborted);
        }
    }
    Ok(FadeOutcome::Completed)
}

/// Complementary crossfade from `outgoing` to `incoming` along the profile's curve
///
/// The target volume is re-read every step so a volume change made while
/// the crossfade runs is followed by both sides.
pub async fn crossfade(
    slots: &PlayerSlots,
    outgoing: SlotIndex,
    incoming: SlotIndex,
    profile: &FadeProfile,
    state: &SharedState,
    token: &CancellationToken,
) -> PlayerResult<FadeOutcome> {
    let interval = profile.step_interval();
    debug!(
        "Crossfade {} -> {} over {:?} ({} steps)",
        outgoing, incoming, profile.duration, profile.steps
    );

    for step in 0..profile.steps {
        if token.is_cancelled() {
            return Ok(FadeOutcome::Aborted);
        }
        let volume = state.volume().await;
        let gains = profile.crossfade_at(step, volume);
        slots
            .set_gain_pair((outgoing, gains.outgoing), (incoming, gains.incoming))
            .await?;

        let last = step + 1 == profile.steps;
        if !sleep_or_cancel(interval, token).await && !last {
            return Ok(FadeOutcome::Aborted);
        }
    }
    Ok(FadeOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::VirtualPlayer;
    use ambient_common::FadeCurve;
    use std::sync::Arc;

    fn slots() -> (PlayerSlots, Arc<VirtualPlayer>, Arc<VirtualPlayer>) {
        let a = Arc::new(VirtualPlayer::new("a", None));
        let b = Arc::new(VirtualPlayer::new("b", None));
        (PlayerSlots::new(a.clone(), b.clone()), a, b)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ramp_reaches_target_exactly() {
        let (slots, a, _) = slots();
        let token = CancellationToken::new();
        let started = tokio::time::Instant::now();

        let profile = FadeProfile::START_FADE_IN;
        let outcome = ramp_slot(&slots, SlotIndex::Zero, 0.0, 0.6, &profile, &token)
            .await
            .unwrap();

        assert_eq!(outcome, FadeOutcome::Completed);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1) && elapsed < Duration::from_millis(1050));
        let history = a.gain_history().await;
        assert_eq!(history.len(), 25);
        assert_eq!(history[0], 0.0);
        assert_eq!(*history.last().unwrap(), 0.6);
        assert!(history.windows(2).all(|w| w[0] <= w[1]), "fade-in must be monotonic");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_ramp_aborts() {
        let (slots, a, _) = slots();
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            canceller.cancel();
        });

        let profile = FadeProfile::new(Duration::from_secs(1), 25, FadeCurve::Linear);
        let outcome = ramp_slot(&slots, SlotIndex::Zero, 0.0, 1.0, &profile, &token)
            .await
            .unwrap();

        assert_eq!(outcome, FadeOutcome::Aborted);
        let applied = a.gain_history().await.len();
        assert!(applied > 0 && applied < 25, "applied {} steps", applied);
    }

    #[tokio::test(start_paused = true)]
    async fn test_crossfade_pairs_sum_to_volume() {
        let (slots, a, b) = slots();
        let state = SharedState::new(0.8);
        let token = CancellationToken::new();

        let outcome = crossfade(
            &slots,
            SlotIndex::Zero,
            SlotIndex::One,
            &FadeProfile::CROSSFADE,
            &state,
            &token,
        )
        .await
        .unwrap();
        assert_eq!(outcome, FadeOutcome::Completed);

        let out = a.gain_history().await;
        let inc = b.gain_history().await;
        assert_eq!(out.len(), 75);
        assert_eq!(inc.len(), 75);
        for (o, i) in out.iter().zip(inc.iter()) {
            assert!((o + i - 0.8).abs() < 1e-5);
        }
        assert_eq!(slots.gain(SlotIndex::Zero), 0.0);
        assert_eq!(slots.gain(SlotIndex::One), 0.8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fade_out_both_from_current_gains() {
        let (slots, a, b) = slots();
        slots
            .set_gain_pair((SlotIndex::Zero, 0.4), (SlotIndex::One, 0.2))
            .await
            .unwrap();
        a.clear_calls().await;
        b.clear_calls().await;

        let outcome = fade_out_both(&slots, &FadeProfile::STOP_FADE_OUT, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, FadeOutcome::Completed);

        let a_history = a.gain_history().await;
        let b_history = b.gain_history().await;
        assert_eq!(a_history[0], 0.4);
        assert_eq!(b_history[0], 0.2);
        assert_eq!(*a_history.last().unwrap(), 0.0);
        assert_eq!(*b_history.last().unwrap(), 0.0);
    }
}
