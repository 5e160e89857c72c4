//! Converts a sparse action list into a dense, normalized per-bucket speed signal.
//!
//! The output is what gets uploaded as the 1-D speed texture: bucket `i` covers
//! `[i * step, (i + 1) * step)` where `step = total_duration / resolution`.

use crate::funscript::Action;

/// Number of buckets in the speed texture.
pub const SPEED_TEXTURE_RESOLUTION: usize = 2048;

/// Speed (position units per second) that maps to the top of the color ramp.
pub const DEFAULT_MAX_SPEED_PER_SECOND: f32 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedResampler {
    pub resolution: usize,
    pub max_speed_per_second: f32,
}

impl Default for SpeedResampler {
    fn default() -> Self {
        Self {
            resolution: SPEED_TEXTURE_RESOLUTION,
            max_speed_per_second: DEFAULT_MAX_SPEED_PER_SECOND,
        }
    }
}

impl SpeedResampler {
    pub fn new(resolution: usize, max_speed_per_second: f32) -> Self {
        Self {
            resolution,
            max_speed_per_second,
        }
    }

    /// Returns `resolution` values in `[0, 1]`.
    ///
    /// Degenerate input (non-positive or non-finite duration or max speed, fewer
    /// than two actions) produces an all-zero array rather than an error.
    /// Strokes with a non-positive duration are skipped. Every bucket a stroke
    /// touches receives the stroke's full average speed; bucket indices outside
    /// `[0, resolution)` are dropped.
    pub fn resample(&self, total_duration: f32, actions: &[Action]) -> Vec<f32> {
        let r = self.resolution;
        let mut speeds = vec![0.0f32; r];
        if r == 0
            || !(total_duration > 0.0 && total_duration.is_finite())
            || !(self.max_speed_per_second > 0.0 && self.max_speed_per_second.is_finite())
            || actions.len() < 2
        {
            return speeds;
        }

        let mut counts = vec![0u32; r];
        let time_step = total_duration / r as f32;
        let bucket = |at_s: f32| (at_s / time_step).floor() as i64;
        let in_range = |idx: i64| idx >= 0 && (idx as usize) < r;

        for pair in actions.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let stroke_duration = next.at_s - prev.at_s;
            if !(stroke_duration > 0.0) {
                continue;
            }
            let speed = (prev.pos - next.pos).abs() / stroke_duration;
            if !speed.is_finite() {
                continue;
            }

            let prev_idx = bucket(prev.at_s);
            let next_idx = bucket(next.at_s);
            if prev_idx == next_idx {
                if in_range(prev_idx) {
                    speeds[prev_idx as usize] += speed;
                    counts[prev_idx as usize] += 1;
                }
            } else {
                let lo = prev_idx.max(0);
                let hi = next_idx.min(r as i64);
                for idx in lo..hi {
                    speeds[idx as usize] += speed;
                    counts[idx as usize] += 1;
                }
            }
        }

        for (speed, &count) in speeds.iter_mut().zip(counts.iter()) {
            if count > 0 {
                *speed /= count as f32;
            }
            *speed = (*speed / self.max_speed_per_second).clamp(0.0, 1.0);
        }

        log::debug!(
            "resampled {} actions over {:.2}s into {} buckets",
            actions.len(),
            total_duration,
            r
        );
        speeds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acts(points: &[(f32, f32)]) -> Vec<Action> {
        points.iter().map(|&(t, p)| Action::new(t, p)).collect()
    }

    #[test]
    fn empty_and_single_action_are_all_zero() {
        let r = SpeedResampler::new(16, 20.0);
        for input in [acts(&[]), acts(&[(1.0, 50.0)])] {
            let out = r.resample(10.0, &input);
            assert_eq!(out.len(), 16);
            assert!(out.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn up_and_down_scenario_saturates_every_bucket() {
        let r = SpeedResampler::new(4, 20.0);
        let out = r.resample(10.0, &acts(&[(0.0, 0.0), (5.0, 100.0), (10.0, 0.0)]));
        assert_eq!(out, vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn stroke_within_one_bucket_only_touches_that_bucket() {
        // step = 1s, stroke 2.25s -> 2.75s, 10 units in 0.5s = 20/s
        let r = SpeedResampler::new(8, 40.0);
        let out = r.resample(8.0, &acts(&[(2.25, 0.0), (2.75, 10.0)]));
        for (i, v) in out.iter().enumerate() {
            if i == 2 {
                assert!((v - 0.5).abs() < 1e-6);
            } else {
                assert_eq!(*v, 0.0);
            }
        }
    }

    #[test]
    fn stroke_covering_exactly_one_bucket_writes_only_that_bucket() {
        // 2s -> 3s lands on two bucket indices but only spans bucket 2
        let r = SpeedResampler::new(8, 40.0);
        let out = r.resample(8.0, &acts(&[(2.0, 0.0), (3.0, 20.0)]));
        for (i, v) in out.iter().enumerate() {
            if i == 2 {
                assert!((v - 0.5).abs() < 1e-6);
            } else {
                assert_eq!(*v, 0.0);
            }
        }
    }

    #[test]
    fn spanning_stroke_gets_full_speed_in_each_bucket() {
        // 0.5s -> 2.5s covers buckets 0 and 1, not the end bucket 2
        let r = SpeedResampler::new(4, 100.0);
        let out = r.resample(4.0, &acts(&[(0.5, 0.0), (2.5, 100.0)]));
        assert_eq!(out, vec![0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn overlapping_contributions_are_averaged() {
        // two strokes inside bucket 0: 40/s and 20/s -> mean 30/s
        let r = SpeedResampler::new(2, 60.0);
        let out = r.resample(2.0, &acts(&[(0.0, 0.0), (0.25, 10.0), (0.75, 0.0)]));
        assert!((out[0] - 0.5).abs() < 1e-6);
        assert_eq!(out[1], 0.0);
    }

    #[test]
    fn values_are_clamped_to_unit_range() {
        let r = SpeedResampler::new(4, 1.0);
        let out = r.resample(4.0, &acts(&[(0.0, 0.0), (0.1, 100.0), (3.9, 0.0)]));
        assert!(out.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_eq!(out[0], 1.0);
    }

    #[test]
    fn zero_duration_stroke_is_skipped() {
        let r = SpeedResampler::new(4, 10.0);
        let out = r.resample(4.0, &acts(&[(1.5, 0.0), (1.5, 100.0)]));
        assert!(out.iter().all(|&v| v == 0.0 && v.is_finite()));

        // a backwards stroke is skipped as well, the forward one still counts
        let out = r.resample(4.0, &acts(&[(2.0, 0.0), (1.0, 50.0), (1.5, 55.0)]));
        assert_eq!(out[1], 1.0);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn actions_beyond_duration_are_ignored() {
        let r = SpeedResampler::new(4, 10.0);
        let out = r.resample(4.0, &acts(&[(5.0, 0.0), (6.0, 100.0)]));
        assert!(out.iter().all(|&v| v == 0.0));

        // a stroke crossing the end only writes the in-range buckets
        let out = r.resample(4.0, &acts(&[(2.0, 0.0), (6.0, 40.0)]));
        assert_eq!(out, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn degenerate_configuration_yields_zeros() {
        let input = acts(&[(0.0, 0.0), (1.0, 100.0)]);
        assert!(SpeedResampler::new(4, 10.0).resample(0.0, &input).iter().all(|&v| v == 0.0));
        assert!(SpeedResampler::new(4, 10.0).resample(-3.0, &input).iter().all(|&v| v == 0.0));
        assert!(SpeedResampler::new(4, 0.0).resample(1.0, &input).iter().all(|&v| v == 0.0));
        assert!(SpeedResampler::new(4, -1.0).resample(1.0, &input).iter().all(|&v| v == 0.0));
        assert!(SpeedResampler::new(0, 10.0).resample(1.0, &input).is_empty());
    }

    #[test]
    fn deterministic() {
        let input = acts(&[(0.0, 10.0), (0.3, 90.0), (1.7, 20.0), (2.2, 80.0), (9.0, 0.0)]);
        let r = SpeedResampler::default();
        let a = r.resample(10.0, &input);
        let b = r.resample(10.0, &input);
        assert_eq!(a.len(), SPEED_TEXTURE_RESOLUTION);
        assert!(a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits()));
    }
}
