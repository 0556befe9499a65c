use image::Rgba;

use crate::{host::LoadError, session::SessionHandle};

/// Callback receiving the session it was fired from.
pub type SessionCallback = Box<dyn FnMut(&mut dyn SessionHandle)>;
pub type LoadErrorCallback = Box<dyn FnMut(&LoadError)>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Options are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Options must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("Invalid fill color {0:?}, expected a hex color or a basic color name")]
    InvalidColor(String),
    #[error("Reveal ratio must be within [0, 1], got {0}")]
    RatioOutOfRange(f64),
    #[error("Stroke width must be a positive number, got {0}")]
    InvalidStrokeWidth(f32),
}

/// Plain data part of the configuration.
///
/// Every key is optional: missing keys keep their default, unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScratchSettings {
    #[serde(alias = "reveal_ratio")]
    pub reveal_ratio: f64,
    #[serde(alias = "stroke_width")]
    pub stroke_width: f32,
    #[serde(alias = "fill_image")]
    pub fill_image: Option<String>,
    /// `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` or one of a few basic names such as `white` or
    /// `lightgrey`. Functional forms like `rgb(...)` are not understood.
    #[serde(alias = "fill_color")]
    pub fill_color: String,
}

impl Default for ScratchSettings {
    fn default() -> Self {
        Self {
            reveal_ratio: 0.5,
            stroke_width: 20.0,
            fill_image: None,
            fill_color: "#ccc".into(),
        }
    }
}

impl ScratchSettings {
    /// Merges a JSON options object over the defaults.
    ///
    /// `null` means "no options" and yields the defaults.
    pub fn merged(options: serde_json::Value) -> Result<Self, ConfigError> {
        let settings: Self = match options {
            serde_json::Value::Null => Self::default(),
            serde_json::Value::Object(_) => serde_json::from_value(options)?,
            serde_json::Value::Bool(_) => return Err(ConfigError::NotAnObject("a boolean")),
            serde_json::Value::Number(_) => return Err(ConfigError::NotAnObject("a number")),
            serde_json::Value::String(_) => return Err(ConfigError::NotAnObject("a string")),
            serde_json::Value::Array(_) => return Err(ConfigError::NotAnObject("an array")),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::merged(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.reveal_ratio) {
            return Err(ConfigError::RatioOutOfRange(self.reveal_ratio));
        }
        if !(self.stroke_width.is_finite() && self.stroke_width > 0.0) {
            return Err(ConfigError::InvalidStrokeWidth(self.stroke_width));
        }
        self.fill_rgba()?;
        Ok(())
    }

    pub fn fill_rgba(&self) -> Result<Rgba<u8>, ConfigError> {
        parse_color(&self.fill_color)
            .ok_or_else(|| ConfigError::InvalidColor(self.fill_color.clone()))
    }

    /// Empty strings count as "no image", like an unset option.
    pub fn fill_image(&self) -> Option<&str> {
        self.fill_image.as_deref().filter(|s| !s.is_empty())
    }
}

fn parse_color(s: &str) -> Option<Rgba<u8>> {
    let s = s.trim();
    if s.starts_with('#') {
        parse_hex_color(s)
    } else {
        named_color(s)
    }
}

fn named_color(name: &str) -> Option<Rgba<u8>> {
    let rgba = match name.to_ascii_lowercase().as_str() {
        "black" => [0, 0, 0, 255],
        "white" => [255, 255, 255, 255],
        "silver" => [0xc0, 0xc0, 0xc0, 255],
        "gray" | "grey" => [0x80, 0x80, 0x80, 255],
        "lightgray" | "lightgrey" => [0xd3, 0xd3, 0xd3, 255],
        "darkgray" | "darkgrey" => [0xa9, 0xa9, 0xa9, 255],
        "red" => [255, 0, 0, 255],
        "green" => [0, 0x80, 0, 255],
        "blue" => [0, 0, 255, 255],
        "gold" => [255, 0xd7, 0, 255],
        "transparent" => [0, 0, 0, 0],
        _ => return None,
    };
    Some(Rgba(rgba))
}

fn parse_hex_color(s: &str) -> Option<Rgba<u8>> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let [r, g, b, a] = match hex.len() {
        3 => [nibble(0)?, nibble(1)?, nibble(2)?, 255],
        4 => [nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?],
        6 => [byte(0)?, byte(2)?, byte(4)?, 255],
        8 => [byte(0)?, byte(2)?, byte(4)?, byte(6)?],
        _ => return None,
    };
    Some(Rgba([r, g, b, a]))
}

/// Everything a session is built from.
#[derive(Default)]
pub struct Config {
    pub settings: ScratchSettings,
    pub on_reveal_ratio: Option<SessionCallback>,
    pub on_image_filled: Option<SessionCallback>,
    pub on_image_failed: Option<LoadErrorCallback>,
}

impl Config {
    pub fn new(settings: ScratchSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn on_reveal_ratio(
        mut self,
        callback: impl FnMut(&mut dyn SessionHandle) + 'static,
    ) -> Self {
        self.on_reveal_ratio = Some(Box::new(callback));
        self
    }

    pub fn on_image_filled(
        mut self,
        callback: impl FnMut(&mut dyn SessionHandle) + 'static,
    ) -> Self {
        self.on_image_filled = Some(Box::new(callback));
        self
    }

    pub fn on_image_failed(mut self, callback: impl FnMut(&LoadError) + 'static) -> Self {
        self.on_image_failed = Some(Box::new(callback));
        self
    }
}
