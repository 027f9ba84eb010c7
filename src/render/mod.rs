//! Drawing surface abstraction plus the CPU canvas and window backends.

pub mod canvas;
pub mod text;
pub mod window;

use std::fmt;

use anyhow::Result;
use image::{Rgb, RgbImage};
use serde::de::{self, Deserializer, Unexpected};
use serde::Deserialize;

/// Full-screen drawing target used by the display loop.
pub trait RenderSurface {
    /// Remove everything drawn so far.
    fn clear(&mut self);
    /// Blit `image` with its top-left corner at (`x`, `y`).
    fn draw_image(&mut self, image: &RgbImage, x: i64, y: i64);
    fn draw_text(&mut self, label: &TextLabel);
    /// Push the composed frame to the screen.
    fn present(&mut self) -> Result<()>;
}

/// Which point of a text's bounding box sits on the label position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Nw,
    N,
    Ne,
    W,
    Center,
    E,
    Sw,
    S,
    Se,
}

impl Anchor {
    /// Top-left corner of a `width` x `height` box anchored at (`x`, `y`).
    pub fn top_left(self, x: i64, y: i64, width: u32, height: u32) -> (i64, i64) {
        let (w, h) = (i64::from(width), i64::from(height));
        let dx = match self {
            Self::Nw | Self::W | Self::Sw => 0,
            Self::N | Self::Center | Self::S => w / 2,
            Self::Ne | Self::E | Self::Se => w,
        };
        let dy = match self {
            Self::Nw | Self::N | Self::Ne => 0,
            Self::W | Self::Center | Self::E => h / 2,
            Self::Sw | Self::S | Self::Se => h,
        };
        (x - dx, y - dy)
    }
}

/// Counter-clockwise text rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Ccw90,
    Ccw180,
    Ccw270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Ccw90 => 90,
            Self::Ccw180 => 180,
            Self::Ccw270 => 270,
        }
    }

    /// Extent of the text before rotation, given the extent after it.
    pub fn unrotated_size(self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Self::None | Self::Ccw180 => (width, height),
            Self::Ccw90 | Self::Ccw270 => (height, width),
        }
    }

    fn from_degrees(degrees: u64) -> Option<Self> {
        match degrees {
            0 => Some(Self::None),
            90 => Some(Self::Ccw90),
            180 => Some(Self::Ccw180),
            270 => Some(Self::Ccw270),
            _ => None,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

impl<'de> Deserialize<'de> for Rotation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u64::deserialize(deserializer)?;
        Self::from_degrees(raw)
            .ok_or_else(|| de::Error::invalid_value(Unexpected::Unsigned(raw), &"0, 90, 180 or 270"))
    }
}

/// Where a text label is anchored on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LabelPlacement {
    pub x: i64,
    pub y: i64,
    pub anchor: Anchor,
    #[serde(default)]
    pub rotation: Rotation,
}

impl LabelPlacement {
    /// Top-left corner of the rotated text box for text that is `width` x
    /// `height` before rotation.
    ///
    /// The anchor applies to the unrotated text, which is then turned around
    /// (`x`, `y`).
    pub fn text_origin(self, width: u32, height: u32) -> (i64, i64) {
        let (left, top) = self.anchor.top_left(0, 0, width, height);
        let (right, bottom) = (left + i64::from(width), top + i64::from(height));
        // Screen y grows downward, so a counter-clockwise quarter turn maps
        // (u, v) to (v, -u).
        let (dx, dy) = match self.rotation {
            Rotation::None => (left, top),
            Rotation::Ccw90 => (top, -right),
            Rotation::Ccw180 => (-right, -bottom),
            Rotation::Ccw270 => (-bottom, left),
        };
        (self.x + dx, self.y + dy)
    }
}

/// A fully styled text draw request.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub placement: LabelPlacement,
    /// Pixel height of the font.
    pub size: f32,
    pub fill: Rgb<u8>,
    /// Drawn one pixel down and right, beneath the fill.
    pub shadow: Option<Rgb<u8>>,
}
