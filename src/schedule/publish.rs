use crate::config::PublicationSettings;
use crate::queue::ClipTiming;
use crate::utils::format_duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Publication interval policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPolicy {
    pub base_seconds: i64,
    pub randomize: bool,
    pub range_seconds: i64,
}

impl From<&PublicationSettings> for IntervalPolicy {
    fn from(settings: &PublicationSettings) -> Self {
        Self {
            base_seconds: settings.publish_interval.seconds,
            randomize: settings.randomize_interval,
            range_seconds: settings.randomization_range_seconds,
        }
    }
}

/// Sample uniformly in `[base - range, base + range]`, clamped to `>= 0`
pub fn randomise_interval<R: Rng>(base_seconds: i64, range_seconds: i64, rng: &mut R) -> u64 {
    let range = i64::try_from(range_seconds.unsigned_abs()).unwrap_or(i64::MAX);
    let low = base_seconds.saturating_sub(range);
    let high = base_seconds.saturating_add(range);
    let sampled = rng.random_range(low..=high);
    sampled.max(0) as u64
}

/// Computes per-clip publication delays
pub struct PublishScheduler<R: Rng = StdRng> {
    rng: R,
}

impl PublishScheduler<StdRng> {
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> PublishScheduler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn delay_for_clip(&mut self, policy: IntervalPolicy) -> u64 {
        if policy.randomize {
            randomise_interval(policy.base_seconds, policy.range_seconds, &mut self.rng)
        } else {
            policy.base_seconds.max(0) as u64
        }
    }
}

/// Total time until every clip in `plan` is published, if anything is planned.
///
/// Clips without an assigned delay count as `max(0, base_seconds)`.
pub fn estimate_completion(plan: &[ClipTiming], base_seconds: i64) -> Option<String> {
    if plan.is_empty() {
        return None;
    }
    let placeholder = base_seconds.max(0) as u64;
    let total: u64 = plan
        .iter()
        .map(|clip| match clip.publish_after_seconds {
            Some(delay) if delay > 0 => delay,
            _ => placeholder,
        })
        .sum();
    Some(format_duration(total))
}
