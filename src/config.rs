// Session configuration file
// Copyright © 2025 Hs293Go
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES
// OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE
// OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::controller::TrackingSetup;
use crate::speed::{MotorSpeedParams, MotorSpeedParamsBuilder, SpeedParamsError};
use crate::target::{ClassMap, DEFAULT_FOE_ID, DEFAULT_FRIENDLY_ID};

/// A turret axis, used to name the axis a config error is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Pan
    X,
    /// Tilt
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
        })
    }
}

/// Reasons a config cannot be loaded or used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config file {}", path.display())]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON, an unknown field, or a value out of range for its type
    #[error("invalid config JSON")]
    Parse(#[from] serde_json::Error),

    /// Speed law parameters of one axis were rejected
    #[error("invalid {axis} axis speed parameters")]
    InvalidAxis {
        /// Offending axis
        axis: Axis,
        /// What was wrong with its parameters
        #[source]
        source: SpeedParamsError,
    },

    /// `foe_ids` is empty, so nothing could ever be tracked
    #[error("at least one foe marker id is required")]
    NoFoeIds,
}

/// Speed law parameters of one axis as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    /// Smallest non-zero speed
    pub min_speed: u8,
    /// Speed at saturation
    pub max_speed: u8,
    /// Speed per pixel of error
    pub gain: f64,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            min_speed: 100,
            max_speed: 255,
            gain: 1.0,
        }
    }
}

impl AxisConfig {
    fn params(&self, axis: Axis) -> Result<MotorSpeedParams<f64>, ConfigError> {
        MotorSpeedParamsBuilder::default()
            .speed_range(self.min_speed, self.max_speed)
            .gain(self.gain)
            .build()
            .map_err(|source| ConfigError::InvalidAxis { axis, source })
    }
}

/// Aim point shift from the frame center, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AimOffset {
    /// Added to the frame center column
    pub x: i32,
    /// Added to the frame center row
    pub y: i32,
}

/// Everything a session needs besides the devices themselves.
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServoConfig {
    /// Marker IDs treated as foes
    pub foe_ids: Vec<u32>,
    /// Marker IDs treated as friendly; never targeted
    pub friendly_ids: Vec<u32>,
    /// No correction is made while the foe is this close to the aim point on an axis
    pub deadzone_px: u32,
    /// Where the aim point sits relative to the frame center
    pub aim_offset: AimOffset,
    /// Pan speed law
    pub x_axis: AxisConfig,
    /// Tilt speed law
    pub y_axis: AxisConfig,
    /// Serial device the actuator firmware listens on
    pub serial_port: String,
    /// Highest camera index probed when no camera is given
    pub max_camera_index: u32,
    /// Command zero speed and disable the effector when the session ends
    pub safe_stop: bool,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            foe_ids: vec![DEFAULT_FOE_ID],
            friendly_ids: vec![DEFAULT_FRIENDLY_ID],
            deadzone_px: 50,
            aim_offset: AimOffset::default(),
            x_axis: AxisConfig::default(),
            y_axis: AxisConfig::default(),
            serial_port: default_serial_port().to_owned(),
            max_camera_index: 3,
            safe_stop: true,
        }
    }
}

fn default_serial_port() -> &'static str {
    if cfg!(windows) {
        "COM7"
    } else {
        "/dev/ttyACM0"
    }
}

impl ServoConfig {
    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Parses a config from JSON text. Absent fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Renders every field, defaults included, as pretty-printed JSON accepted by
    /// [`ServoConfig::from_json`].
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the config without building anything from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracking_setup().map(|_| ())
    }

    /// Validates the config and resolves it into the controller setup.
    pub fn tracking_setup(&self) -> Result<TrackingSetup<f64>, ConfigError> {
        if self.foe_ids.is_empty() {
            return Err(ConfigError::NoFoeIds);
        }
        Ok(TrackingSetup {
            classes: ClassMap::new(
                self.foe_ids.iter().copied(),
                self.friendly_ids.iter().copied(),
            ),
            deadzone: self.deadzone_px,
            aim_offset: (self.aim_offset.x, self.aim_offset.y),
            x_params: self.x_axis.params(Axis::X)?,
            y_params: self.y_axis.params(Axis::Y)?,
        })
    }
}
