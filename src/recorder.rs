use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::{SettingsError, TrackingConfig, TrackingUpdate};
use crate::track::{BlobCandidate, TrackSample, Trajectory};

#[derive(Debug)]
struct RecorderState {
    active: bool,
    samples: Trajectory,
    last_position: Option<BlobCandidate>,
    config: TrackingConfig,
}

/// Accumulates timestamped positions into an ordered trajectory and owns the
/// tracking settings.
///
/// All mutation goes through this type. The acquisition worker is the only
/// writer during a run; `snapshot` hands analysis/export a consistent
/// point-in-time copy, so readers never observe a torn sample while appends
/// continue on the worker thread.
#[derive(Debug)]
pub struct TrackRecorder {
    inner: Mutex<RecorderState>,
}

impl TrackRecorder {
    pub fn new(config: TrackingConfig) -> Self {
        TrackRecorder {
            inner: Mutex::new(RecorderState {
                active: false,
                samples: Vec::new(),
                last_position: None,
                config,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, RecorderState> {
        // A panicked writer leaves the state consistent enough to keep serving
        // snapshots; recover instead of poisoning every later call.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin a new acquisition: discard prior samples, mark active.
    pub fn start(&self) {
        let mut state = self.state();
        state.active = true;
        state.samples.clear();
        state.last_position = None;
    }

    /// Mark acquisition inactive; accumulated samples are kept.
    pub fn stop(&self) {
        self.state().active = false;
    }

    pub fn is_active(&self) -> bool {
        self.state().active
    }

    /// Append one observation. A `None` candidate or an inactive recorder is a
    /// silent no-op: most frames simply have nothing to record.
    pub fn record(&self, candidate: Option<BlobCandidate>, timestamp: f64) {
        let mut state = self.state();
        if !state.active {
            return;
        }
        if let Some(candidate) = candidate {
            state.samples.push(TrackSample::new(timestamp, candidate));
            state.last_position = Some(candidate);
        }
    }

    /// Consistent point-in-time copy of the trajectory. Later appends are
    /// never visible through a previously taken snapshot.
    pub fn snapshot(&self) -> Trajectory {
        self.state().samples.clone()
    }

    pub fn len(&self) -> usize {
        self.state().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().samples.is_empty()
    }

    /// Most recent candidate recorded, if any.
    pub fn last_position(&self) -> Option<BlobCandidate> {
        self.state().last_position
    }

    /// Discard all accumulated samples and reset to the empty state.
    pub fn clear(&self) {
        let mut state = self.state();
        state.samples.clear();
        state.last_position = None;
    }

    /// Copy of the current settings, handed to the locator once per frame.
    pub fn config(&self) -> TrackingConfig {
        self.state().config
    }

    /// Merge a partial settings update. Only the provided keys change; an
    /// invalid combination is rejected without touching stored settings.
    pub fn update_settings(&self, update: &TrackingUpdate) -> Result<(), SettingsError> {
        let mut state = self.state();
        state.config = state.config.merged(update)?;
        Ok(())
    }
}
