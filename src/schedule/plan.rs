//! Clip segmentation.

use crate::config::RenderingSettings;
use crate::queue::ClipTiming;

/// Plans longer than this are refused
pub const MAX_CLIPS: f64 = 100_000.0;

/// Segmentation parameters, in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanPolicy {
    pub clip_duration: i64,
    pub overlap: i64,
    pub final_min: i64,
    pub final_max: i64,
}

impl From<&RenderingSettings> for PlanPolicy {
    fn from(settings: &RenderingSettings) -> Self {
        Self {
            clip_duration: settings.clip_duration,
            overlap: settings.clip_overlap,
            final_min: settings.final_clip_min,
            final_max: settings.final_clip_max,
        }
    }
}

/// Split `duration` seconds into ordered `(start, end)` ranges.
///
/// Only the last clip is adjusted afterwards, and only its start moves. A lone
/// clip is never stretched towards `final_min` but is still trimmed to
/// `final_max`.
///
/// Non-finite durations and durations needing more than [`MAX_CLIPS`] clips
/// give an empty plan.
pub fn generate_clip_plan(duration: f64, policy: PlanPolicy) -> Vec<(f64, f64)> {
    if !duration.is_finite() || duration <= 0.0 {
        return Vec::new();
    }

    let clip_duration = policy.clip_duration.max(1) as f64;
    // An overlap of a full clip or more would never advance
    let overlap = policy.overlap.clamp(0, policy.clip_duration.max(1) - 1) as f64;
    let step = clip_duration - overlap;
    if (duration / step).ceil() > MAX_CLIPS {
        return Vec::new();
    }

    let mut clips = Vec::new();
    let mut start: f64 = 0.0;
    loop {
        let end = (start + clip_duration).min(duration);
        clips.push((start, end));
        let next = start + step;
        if end >= duration || next >= duration || next <= start {
            break;
        }
        start = next;
    }

    let count = clips.len();
    if let Some((final_start, final_end)) = clips.last_mut() {
        let final_length = *final_end - *final_start;
        let final_min = policy.final_min as f64;
        let final_max = policy.final_max.max(1) as f64;
        if final_length < final_min && count > 1 {
            *final_start = (*final_start - (final_min - final_length)).max(0.0);
        } else if final_length > final_max {
            *final_start = *final_end - final_max;
        }
    }

    clips
}

/// Plan clips and wrap them as indexed timings
pub fn plan_clips(duration: f64, policy: PlanPolicy) -> Vec<ClipTiming> {
    generate_clip_plan(duration, policy)
        .into_iter()
        .enumerate()
        .map(|(index, (start, end))| ClipTiming::new(index, start, end))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(clip_duration: i64, overlap: i64, final_min: i64, final_max: i64) -> PlanPolicy {
        PlanPolicy {
            clip_duration,
            overlap,
            final_min,
            final_max,
        }
    }

    #[test]
    fn test_empty_for_non_positive_duration() {
        assert!(generate_clip_plan(0.0, policy(120, 0, 60, 240)).is_empty());
        assert!(generate_clip_plan(-5.0, policy(120, 0, 60, 240)).is_empty());
        assert!(generate_clip_plan(f64::NAN, policy(120, 0, 60, 240)).is_empty());
    }

    #[test]
    fn test_empty_for_infinite_duration() {
        assert!(generate_clip_plan(f64::INFINITY, policy(1_000_000_000, 0, 60, 240)).is_empty());
        assert!(generate_clip_plan(f64::INFINITY, policy(120, 0, 60, 240)).is_empty());
    }

    #[test]
    fn test_empty_when_too_many_clips() {
        assert!(generate_clip_plan(2f64.powi(60), policy(1, 0, 1, 1)).is_empty());
        assert!(generate_clip_plan(100_001.0, policy(1, 0, 1, 1)).is_empty());
        assert_eq!(generate_clip_plan(100_000.0, policy(1, 0, 1, 1)).len(), 100_000);
    }

    #[test]
    fn test_short_video_is_single_clip() {
        let clips = generate_clip_plan(90.0, policy(120, 0, 60, 240));
        assert_eq!(clips, vec![(0.0, 90.0)]);
    }

    #[test]
    fn test_lone_clip_skips_final_min() {
        let clips = generate_clip_plan(30.0, policy(120, 0, 120, 240));
        assert_eq!(clips, vec![(0.0, 30.0)]);
    }

    #[test]
    fn test_lone_clip_still_trimmed_to_final_max() {
        let clips = generate_clip_plan(200.0, policy(300, 0, 60, 150));
        assert_eq!(clips, vec![(50.0, 200.0)]);
    }

    #[test]
    fn test_overlapping_clips() {
        let clips = generate_clip_plan(300.0, policy(120, 10, 60, 240));
        assert_eq!(clips, vec![(0.0, 120.0), (110.0, 230.0), (220.0, 300.0)]);
    }

    #[test]
    fn test_short_tail_is_pulled_back() {
        let clips = generate_clip_plan(260.0, policy(120, 0, 120, 240));
        assert_eq!(clips, vec![(0.0, 120.0), (120.0, 240.0), (140.0, 260.0)]);
    }

    #[test]
    fn test_pull_back_clamps_at_zero() {
        let clips = generate_clip_plan(130.0, policy(120, 0, 200, 240));
        assert_eq!(clips, vec![(0.0, 120.0), (0.0, 130.0)]);
    }

    #[test]
    fn test_stops_when_clip_reaches_end() {
        let clips = generate_clip_plan(230.0, policy(120, 10, 60, 240));
        assert_eq!(clips, vec![(0.0, 120.0), (110.0, 230.0)]);
    }

    #[test]
    fn test_degenerate_policy_is_floored() {
        let clips = generate_clip_plan(3.0, policy(0, -4, 0, 240));
        assert_eq!(clips, vec![(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);

        // Overlap >= clip length still makes progress
        let clips = generate_clip_plan(25.0, policy(10, 10, 0, 240));
        assert_eq!(clips.len(), 16);
        assert_eq!(clips.last(), Some(&(15.0, 25.0)));
    }

    #[test]
    fn test_coverage_and_dense_indices() {
        for duration in [1.0, 59.5, 119.0, 121.0, 600.0, 3601.25] {
            let clips = plan_clips(duration, policy(120, 15, 60, 240));
            assert!(!clips.is_empty());
            assert_eq!(clips[0].start, 0.0);
            assert_eq!(clips.last().unwrap().end, duration);
            for (i, clip) in clips.iter().enumerate() {
                assert_eq!(clip.index, i);
                assert!(clip.start >= 0.0 && clip.start < clip.end && clip.end <= duration);
            }
            for pair in clips.windows(2) {
                assert!(pair[1].start <= pair[0].end, "gap in {:?}", pair);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let p = policy(45, 5, 30, 90);
        assert_eq!(generate_clip_plan(1234.5, p), generate_clip_plan(1234.5, p));
    }
}
