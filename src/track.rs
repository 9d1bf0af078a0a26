use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Result of one localization attempt on a single frame: the blob centroid in
/// pixel coordinates and the enclosed contour area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobCandidate {
    pub x: i32,
    pub y: i32,
    pub area: f64,
}

/// One recorded observation. Immutable once appended to a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    /// Seconds from the start of the video stream.
    pub timestamp: f64,
    pub x: i32,
    pub y: i32,
    pub area: f64,
}

/// Ordered history of tracked positions; insertion order is temporal order.
pub type Trajectory = Vec<TrackSample>;

impl TrackSample {
    pub fn new(timestamp: f64, candidate: BlobCandidate) -> Self {
        TrackSample {
            timestamp,
            x: candidate.x,
            y: candidate.y,
            area: candidate.area,
        }
    }

    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x as f64, self.y as f64)
    }

    /// Euclidean distance to another sample, in pixels.
    pub fn distance_to(&self, other: &TrackSample) -> f64 {
        (other.position() - self.position()).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_from_candidate() {
        let candidate = BlobCandidate { x: 12, y: 34, area: 560.0 };
        let sample = TrackSample::new(1.5, candidate);

        assert_eq!(sample.timestamp, 1.5);
        assert_eq!(sample.x, 12);
        assert_eq!(sample.y, 34);
        assert_eq!(sample.area, 560.0);
    }

    #[test]
    fn test_step_distance() {
        let a = TrackSample { timestamp: 0.0, x: 0, y: 0, area: 1.0 };
        let b = TrackSample { timestamp: 1.0, x: 3, y: 4, area: 1.0 };

        assert_relative_eq!(a.distance_to(&b), 5.0);
        assert_relative_eq!(b.distance_to(&a), 5.0);
        assert_relative_eq!(a.distance_to(&a), 0.0);
    }
}
