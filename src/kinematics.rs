use serde::Serialize;

use crate::track::TrackSample;

/// Width of the centered moving-average window applied to the velocity and
/// acceleration signals. Sequences shorter than this pass through unchanged.
pub const SMOOTHING_WINDOW: usize = 5;

/// Derived kinematics for one trajectory, recomputed from scratch per
/// analysis call. The sequence fields are parallel: one entry per recorded
/// sample, with velocity[0] and acceleration[0] defined as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KinematicsReport {
    pub timestamps: Vec<f64>,
    pub x_coords: Vec<i32>,
    pub y_coords: Vec<i32>,
    /// Smoothed velocity, pixels per second.
    pub velocities: Vec<f64>,
    /// Smoothed acceleration, pixels per second squared.
    pub accelerations: Vec<f64>,
    pub total_time: f64,
    pub total_distance: f64,
    pub max_velocity: f64,
    pub max_acceleration: f64,
    pub avg_velocity: f64,
}

/// Batch trajectory analyzer: numerical differentiation under irregular
/// sampling plus moving-average smoothing and summary statistics.
///
/// Analysis is a pure function of its input; the engine only retains the last
/// produced report for convenience re-reads.
#[derive(Debug, Default)]
pub struct KinematicsEngine {
    last_report: Option<KinematicsReport>,
}

impl KinematicsEngine {
    pub fn new() -> Self {
        KinematicsEngine::default()
    }

    /// Analyze a full trajectory. An empty input yields a report with empty
    /// sequences and zeroed scalars; analysis never fails.
    pub fn analyze(&mut self, trajectory: &[TrackSample]) -> KinematicsReport {
        let report = Self::compute(trajectory);
        self.last_report = Some(report.clone());
        report
    }

    /// Report from the most recent `analyze` call, if any.
    pub fn last_report(&self) -> Option<&KinematicsReport> {
        self.last_report.as_ref()
    }

    fn compute(trajectory: &[TrackSample]) -> KinematicsReport {
        if trajectory.is_empty() {
            return KinematicsReport::default();
        }

        let timestamps: Vec<f64> = trajectory.iter().map(|s| s.timestamp).collect();
        let velocities = raw_velocities(trajectory);
        let accelerations = raw_accelerations(trajectory, &velocities);

        let smooth_velocities = moving_average(&velocities, SMOOTHING_WINDOW);
        let smooth_accelerations = moving_average(&accelerations, SMOOTHING_WINDOW);

        let total_time = match trajectory.len() {
            0 | 1 => 0.0,
            n => timestamps[n - 1] - timestamps[0],
        };
        // True maxima, not max(0, ..): a purely decelerating trajectory has an
        // all-negative smoothed acceleration and must report the negative peak
        let max_velocity = smooth_velocities.iter().copied().reduce(f64::max).unwrap_or(0.0);
        let max_acceleration = smooth_accelerations
            .iter()
            .copied()
            .reduce(f64::max)
            .unwrap_or(0.0);
        let avg_velocity =
            smooth_velocities.iter().sum::<f64>() / smooth_velocities.len() as f64;

        KinematicsReport {
            timestamps,
            x_coords: trajectory.iter().map(|s| s.x).collect(),
            y_coords: trajectory.iter().map(|s| s.y).collect(),
            velocities: smooth_velocities,
            accelerations: smooth_accelerations,
            total_time,
            total_distance: total_distance(trajectory),
            max_velocity,
            max_acceleration,
            avg_velocity,
        }
    }
}

/// Finite-difference speed per sample. Entry 0 is zero by definition; a zero
/// or negative timestamp delta (degenerate sample) also yields zero rather
/// than a division artifact.
fn raw_velocities(trajectory: &[TrackSample]) -> Vec<f64> {
    let mut velocities = Vec::with_capacity(trajectory.len());
    if trajectory.is_empty() {
        return velocities;
    }
    velocities.push(0.0);
    for pair in trajectory.windows(2) {
        let dt = pair[1].timestamp - pair[0].timestamp;
        if dt <= 0.0 {
            velocities.push(0.0);
        } else {
            velocities.push(pair[0].distance_to(&pair[1]) / dt);
        }
    }
    velocities
}

/// Same finite-difference scheme applied to the velocity sequence against the
/// same timestamp deltas, with the same degenerate-dt guard.
fn raw_accelerations(trajectory: &[TrackSample], velocities: &[f64]) -> Vec<f64> {
    let mut accelerations = Vec::with_capacity(velocities.len());
    if velocities.is_empty() {
        return accelerations;
    }
    accelerations.push(0.0);
    for i in 1..velocities.len() {
        let dt = trajectory[i].timestamp - trajectory[i - 1].timestamp;
        if dt <= 0.0 {
            accelerations.push(0.0);
        } else {
            accelerations.push((velocities[i] - velocities[i - 1]) / dt);
        }
    }
    accelerations
}

/// Centered moving average with "same"-length convolution semantics: the
/// output has the input's length and every tap carries a constant 1/window
/// weight, so edge samples attenuate where the window overhangs the sequence.
/// Inputs shorter than the window are returned unchanged.
pub fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || data.len() < window {
        return data.to_vec();
    }
    let half = (window / 2) as isize;
    let len = data.len() as isize;
    (0..len)
        .map(|i| {
            let lo = (i - half).max(0);
            let hi = (i + half + 1).min(len);
            let sum: f64 = data[lo as usize..hi as usize].iter().sum();
            sum / window as f64
        })
        .collect()
}

/// Path length: sum of euclidean step distances over consecutive samples.
/// Defined independently of timestamp quality.
pub fn total_distance(trajectory: &[TrackSample]) -> f64 {
    trajectory
        .windows(2)
        .map(|pair| pair[0].distance_to(&pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(timestamp: f64, x: i32, y: i32) -> TrackSample {
        TrackSample { timestamp, x, y, area: 100.0 }
    }

    #[test]
    fn test_empty_trajectory_yields_zeroed_report() {
        let mut engine = KinematicsEngine::new();
        let report = engine.analyze(&[]);

        assert!(report.velocities.is_empty());
        assert!(report.accelerations.is_empty());
        assert_eq!(report.total_time, 0.0);
        assert_eq!(report.total_distance, 0.0);
        assert_eq!(report.max_velocity, 0.0);
        assert_eq!(report.max_acceleration, 0.0);
        assert_eq!(report.avg_velocity, 0.0);
    }

    #[test]
    fn test_signal_lengths_match_trajectory() {
        let mut engine = KinematicsEngine::new();
        for n in [1usize, 2, 3, 7, 20] {
            let trajectory: Vec<_> =
                (0..n).map(|i| sample(i as f64 * 0.1, i as i32, 0)).collect();
            let report = engine.analyze(&trajectory);
            assert_eq!(report.velocities.len(), n);
            assert_eq!(report.accelerations.len(), n);
            assert_eq!(report.velocities[0], 0.0);
            assert_eq!(report.accelerations[0], 0.0);
        }
    }

    #[test]
    fn test_pythagorean_scenario() {
        // (0,0,0) -> (1,3,4) -> (2,3,4): one 3-4-5 step, then stationary
        let trajectory = vec![sample(0.0, 0, 0), sample(1.0, 3, 4), sample(2.0, 3, 4)];
        let mut engine = KinematicsEngine::new();
        let report = engine.analyze(&trajectory);

        // 3 samples < window 5, so smoothing is a no-op
        assert_relative_eq!(report.velocities[0], 0.0);
        assert_relative_eq!(report.velocities[1], 5.0);
        assert_relative_eq!(report.velocities[2], 0.0);
        assert_relative_eq!(report.total_distance, 5.0);
        assert_relative_eq!(report.total_time, 2.0);
        assert_relative_eq!(report.max_velocity, 5.0);
        assert_relative_eq!(report.avg_velocity, 5.0 / 3.0);
    }

    #[test]
    fn test_degenerate_dt_yields_zero_signals() {
        let trajectory = vec![
            sample(0.0, 0, 0),
            sample(1.0, 10, 0),
            sample(1.0, 20, 0), // dt == 0
            sample(0.5, 30, 0), // dt < 0
        ];
        let report = KinematicsEngine::new().analyze(&trajectory);

        assert_relative_eq!(report.velocities[1], 10.0);
        assert_eq!(report.velocities[2], 0.0);
        assert_eq!(report.velocities[3], 0.0);
        assert_eq!(report.accelerations[2], 0.0);
        assert_eq!(report.accelerations[3], 0.0);

        // Distance still integrates the full path
        assert_relative_eq!(report.total_distance, 30.0);
    }

    #[test]
    fn test_total_distance_monotonic_in_appends() {
        let mut trajectory = Vec::new();
        let mut prev = 0.0;
        for i in 0..20 {
            // Include degenerate timestamps on purpose
            let t = if i % 5 == 0 { 0.0 } else { i as f64 * 0.1 };
            trajectory.push(sample(t, (i * 3) % 17, (i * 7) % 13));
            let d = total_distance(&trajectory);
            assert!(d >= prev);
            prev = d;
        }
    }

    #[test]
    fn test_moving_average_known_values() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let smoothed = moving_average(&data, 5);

        assert_eq!(smoothed.len(), data.len());
        // Interior entries are true 5-wide means
        assert_relative_eq!(smoothed[2], 3.0);
        assert_relative_eq!(smoothed[3], 4.0);
        // Edges attenuate: partial sums still divided by the full window
        assert_relative_eq!(smoothed[0], (1.0 + 2.0 + 3.0) / 5.0);
        assert_relative_eq!(smoothed[5], (4.0 + 5.0 + 6.0) / 5.0);
    }

    #[test]
    fn test_moving_average_noop_below_window() {
        let data = vec![3.0, 1.0, 4.0, 1.0];
        assert_eq!(moving_average(&data, 5), data);
        assert_eq!(moving_average(&[], 5), Vec::<f64>::new());
    }

    #[test]
    fn test_constant_velocity_has_zero_acceleration() {
        let trajectory: Vec<_> = (0..10).map(|i| sample(i as f64, i * 2, 0)).collect();
        let report = KinematicsEngine::new().analyze(&trajectory);

        // Raw acceleration is zero after the ramp-in at index 1; smoothing
        // only redistributes the single spike from standing start
        for &a in &report.accelerations[4..] {
            assert_relative_eq!(a, 0.0);
        }
        assert_relative_eq!(report.total_distance, 18.0);
    }

    #[test]
    fn test_decelerating_trajectory_reports_negative_max_acceleration() {
        // One fast step, then the object holds still: every smoothed
        // acceleration entry is negative and the reported maximum must be the
        // least-negative one, not zero
        let trajectory = vec![
            sample(0.0, 0, 0),
            sample(10.0, 100, 0),
            sample(10.1, 100, 0),
            sample(10.2, 100, 0),
            sample(10.3, 100, 0),
        ];
        let report = KinematicsEngine::new().analyze(&trajectory);

        // Raw accelerations [0, 1, -100, 0, 0] smoothed over a 5-wide window;
        // the 0.1 s timestamp deltas are not exactly representable
        assert!(report.accelerations.iter().all(|&a| a < 0.0));
        assert_relative_eq!(report.max_acceleration, -19.8, epsilon = 1e-9);
        assert_relative_eq!(report.accelerations[4], -20.0, epsilon = 1e-9);
        // Velocity stays non-negative, so its maximum is unaffected
        assert!(report.max_velocity > 0.0);
    }

    #[test]
    fn test_last_report_retained() {
        let mut engine = KinematicsEngine::new();
        assert!(engine.last_report().is_none());

        let trajectory = vec![sample(0.0, 0, 0), sample(1.0, 3, 4)];
        let report = engine.analyze(&trajectory);
        assert_eq!(engine.last_report(), Some(&report));
    }
}
