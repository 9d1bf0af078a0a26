pub mod config;
pub mod export;
pub mod kinematics;
pub mod locator;
pub mod pipeline;
pub mod recorder;
pub mod track;
pub mod video;
pub mod visualization;

// Re-export main types
pub use crate::config::{
    AreaBounds, ColorRange, MorphologyConfig, SettingsError, TrackingConfig, TrackingUpdate,
};
pub use crate::export::{ExportError, RawExport};
pub use crate::kinematics::{KinematicsEngine, KinematicsReport};
pub use crate::locator::FrameLocator;
pub use crate::pipeline::{Acquisition, FrameEvent};
pub use crate::recorder::TrackRecorder;
pub use crate::track::{BlobCandidate, TrackSample, Trajectory};
pub use crate::video::{VideoProperties, VideoSource};
