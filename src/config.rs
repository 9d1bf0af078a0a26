use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Rejection reasons for settings that would violate the tracking invariants.
/// Stored settings are never mutated when one of these is returned.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("{channel} range is inverted: low {low} > high {high}")]
    InvertedRange {
        channel: &'static str,
        low: f64,
        high: f64,
    },
    #[error("{name} = {value} outside valid domain [{min}, {max}]")]
    OutOfDomain {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("blur size must be 0 or a positive odd kernel side, got {0}")]
    BadBlurSize(i32),
}

/// Inclusive HSV thresholds in OpenCV's 8-bit convention: hue 0..=180,
/// saturation and value 0..=255. Hue is treated as a plain linear interval;
/// ranges spanning the 0/180 wrap (deep reds) cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub hue_low: i32,
    pub hue_high: i32,
    pub saturation_low: i32,
    pub saturation_high: i32,
    pub value_low: i32,
    pub value_high: i32,
}

/// Accepted blob area window, in (fractional) contour-area pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub min_area: f64,
    pub max_area: f64,
}

/// Mask cleanup parameters: Gaussian kernel side (0 disables the blur) and
/// open/close iteration count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MorphologyConfig {
    pub blur_size: i32,
    pub morph_iters: i32,
}

/// Full set of tracking parameters. Serializes to the flat ten-key map used by
/// the config file and the raw export document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(flatten)]
    pub color: ColorRange,
    #[serde(flatten)]
    pub area: AreaBounds,
    #[serde(flatten)]
    pub morphology: MorphologyConfig,
}

/// Partial settings update: only the provided keys are merged, the rest keep
/// their prior values. Deserializes from a partial JSON map.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct TrackingUpdate {
    pub hue_low: Option<i32>,
    pub hue_high: Option<i32>,
    pub saturation_low: Option<i32>,
    pub saturation_high: Option<i32>,
    pub value_low: Option<i32>,
    pub value_high: Option<i32>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub blur_size: Option<i32>,
    pub morph_iters: Option<i32>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            color: ColorRange {
                hue_low: 0,
                hue_high: 180,
                saturation_low: 100,
                saturation_high: 255,
                value_low: 100,
                value_high: 255,
            },
            area: AreaBounds {
                min_area: 100.0,
                max_area: 50_000.0,
            },
            morphology: MorphologyConfig {
                blur_size: 5,
                morph_iters: 2,
            },
        }
    }
}

fn check_channel(
    channel: &'static str,
    name_low: &'static str,
    name_high: &'static str,
    low: i32,
    high: i32,
    max: i32,
) -> Result<(), SettingsError> {
    for (name, value) in [(name_low, low), (name_high, high)] {
        if value < 0 || value > max {
            return Err(SettingsError::OutOfDomain {
                name,
                value: value as f64,
                min: 0.0,
                max: max as f64,
            });
        }
    }
    if low > high {
        return Err(SettingsError::InvertedRange {
            channel,
            low: low as f64,
            high: high as f64,
        });
    }
    Ok(())
}

impl TrackingConfig {
    /// Load from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: TrackingConfig = serde_json::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every invariant: per-channel domains and ordering, area window
    /// ordering, blur kernel parity, non-negative iteration count.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_channel(
            "hue",
            "hue_low",
            "hue_high",
            self.color.hue_low,
            self.color.hue_high,
            180,
        )?;
        check_channel(
            "saturation",
            "saturation_low",
            "saturation_high",
            self.color.saturation_low,
            self.color.saturation_high,
            255,
        )?;
        check_channel(
            "value",
            "value_low",
            "value_high",
            self.color.value_low,
            self.color.value_high,
            255,
        )?;

        if self.area.min_area < 0.0 {
            return Err(SettingsError::OutOfDomain {
                name: "min_area",
                value: self.area.min_area,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        if self.area.min_area > self.area.max_area {
            return Err(SettingsError::InvertedRange {
                channel: "area",
                low: self.area.min_area,
                high: self.area.max_area,
            });
        }

        let blur = self.morphology.blur_size;
        if blur < 0 || (blur > 0 && blur % 2 == 0) {
            return Err(SettingsError::BadBlurSize(blur));
        }
        if self.morphology.morph_iters < 0 {
            return Err(SettingsError::OutOfDomain {
                name: "morph_iters",
                value: self.morphology.morph_iters as f64,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        Ok(())
    }

    /// Merge a partial update into a copy and validate the result. The
    /// receiver is untouched; an invalid combination is rejected whole.
    pub fn merged(&self, update: &TrackingUpdate) -> Result<TrackingConfig, SettingsError> {
        let mut next = *self;
        if let Some(v) = update.hue_low {
            next.color.hue_low = v;
        }
        if let Some(v) = update.hue_high {
            next.color.hue_high = v;
        }
        if let Some(v) = update.saturation_low {
            next.color.saturation_low = v;
        }
        if let Some(v) = update.saturation_high {
            next.color.saturation_high = v;
        }
        if let Some(v) = update.value_low {
            next.color.value_low = v;
        }
        if let Some(v) = update.value_high {
            next.color.value_high = v;
        }
        if let Some(v) = update.min_area {
            next.area.min_area = v;
        }
        if let Some(v) = update.max_area {
            next.area.max_area = v;
        }
        if let Some(v) = update.blur_size {
            next.morphology.blur_size = v;
        }
        if let Some(v) = update.morph_iters {
            next.morphology.morph_iters = v;
        }
        next.validate()?;
        Ok(next)
    }
}

impl TrackingUpdate {
    pub fn is_empty(&self) -> bool {
        self.hue_low.is_none()
            && self.hue_high.is_none()
            && self.saturation_low.is_none()
            && self.saturation_high.is_none()
            && self.value_low.is_none()
            && self.value_high.is_none()
            && self.min_area.is_none()
            && self.max_area.is_none()
            && self.blur_size.is_none()
            && self.morph_iters.is_none()
    }
}
