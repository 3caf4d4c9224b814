//! User-facing settings of the viewer, read from JSON.
//!
//! Every field is optional; missing values fall back to the built-in defaults.

use std::{
    error::Error,
    fmt::{self, Display},
    path::PathBuf,
};

use glam::Vec3;
use lib_geometry::OrbitSettings;
use serde::Deserialize;

/// An sRGB colour written as `"#rrggbb"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorError(String);

impl Display for ColorError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "expected a colour like \"#ffa95c\", got {:?}", self.0)
    }
}

impl Error for ColorError {}

impl Color {
    #[must_use]
    pub const fn from_rgb(rgb: u32) -> Self {
        let [_, red, green, blue] = rgb.to_be_bytes();
        Self { red, green, blue }
    }

    /// Converts into linear RGB as used by the shaders.
    #[must_use]
    pub fn to_linear(self) -> Vec3 {
        let channel = |value: u8| {
            let value = f32::from(value) / 255.0;
            if value <= 0.040_45 {
                value / 12.92
            } else {
                ((value + 0.055) / 1.055).powf(2.4)
            }
        };
        Vec3::new(channel(self.red), channel(self.green), channel(self.blue))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        let parsed = text
            .strip_prefix('#')
            .filter(|digits| digits.len() == 6 && digits.chars().all(|digit| digit.is_ascii_hexdigit()))
            .and_then(|digits| u32::from_str_radix(digits, 16).ok());
        match parsed {
            Some(rgb) => Ok(Self::from_rgb(rgb)),
            None => Err(ColorError(text)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub title: String,
    /// directory containing `model0.glb`, `model1.glb`, …
    pub models_folder: PathBuf,
    /// number of models; all of them are preloaded at startup
    pub catalog_size: usize,
    pub background: Color,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub lighting: LightingConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Showroom".to_owned(),
            models_folder: PathBuf::from("./models"),
            catalog_size: 5,
            background: Color::from_rgb(0x20_20_20),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            lighting: LightingConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// # Errors
    ///
    /// Fails on malformed JSON, unknown fields and invalid values.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 1.0, 5.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlsConfig {
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    /// unlimited if absent
    pub max_distance: Option<f32>,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.5,
            max_distance: Some(100.0),
        }
    }
}

impl ControlsConfig {
    #[must_use]
    pub fn to_orbit_settings(&self) -> OrbitSettings {
        let max_distance = self.max_distance.unwrap_or(f32::INFINITY);
        OrbitSettings {
            damping_factor: self.damping_factor.clamp(f32::EPSILON, 1.0),
            rotate_speed: self.rotate_speed,
            zoom_speed: self.zoom_speed,
            distance: self.min_distance..=max_distance.max(self.min_distance),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightConfig {
    pub color: Color,
    pub intensity: f32,
}

/// A light shining from `position` towards the origin.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositionedLightConfig {
    pub color: Color,
    pub intensity: f32,
    pub position: [f32; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpotLightConfig {
    pub color: Color,
    pub intensity: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// `0.0` means unlimited range
    pub distance: f32,
    /// half-angle of the cone
    pub angle_degrees: f32,
    /// fraction of the cone that fades out towards its edge, `0.0..=1.0`
    pub penumbra: f32,
    pub decay: f32,
}

impl Default for SpotLightConfig {
    fn default() -> Self {
        Self {
            color: Color::from_rgb(0xff_a9_5c),
            intensity: 100.0,
            position: [5.0, 10.0, 5.0],
            target: [0.0, 0.0, 0.0],
            distance: 20.0,
            angle_degrees: 45.0,
            penumbra: 0.5,
            decay: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightingConfig {
    pub ambient: LightConfig,
    pub directional: Vec<PositionedLightConfig>,
    /// no spot light if absent
    pub spot: Option<SpotLightConfig>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        let white = |intensity, position| PositionedLightConfig {
            color: Color::from_rgb(0xff_ff_ff),
            intensity,
            position,
        };
        Self {
            ambient: LightConfig {
                color: Color::from_rgb(0x40_40_40),
                intensity: 4.0,
            },
            directional: vec![
                white(3.0, [0.0, 0.0, 8.0]),
                white(3.0, [0.0, 0.0, -8.0]),
                white(4.0, [5.0, 5.0, -5.0]),
                white(4.0, [-5.0, 5.0, -5.0]),
            ],
            spot: Some(SpotLightConfig::default()),
        }
    }
}
