use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use image::Rgb;
use serde::Deserialize;

use crate::processing::brightness::{PALETTE_THRESHOLD, SIMPLE_THRESHOLD};
use crate::render::{Anchor, LabelPlacement, Rotation};

/// The three metadata labels drawn next to the album art.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Track,
    Artist,
    ReleaseDate,
}

impl LabelKind {
    pub const ALL: [Self; 3] = [Self::Track, Self::Artist, Self::ReleaseDate];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Artist => "artist",
            Self::ReleaseDate => "release-date",
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    /// Long-lived refresh token obtained once through the authorization flow.
    pub refresh_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DisplayOptions {
    /// Side length of the square album art, in pixels.
    pub art_size: u32,
    pub background: [u8; 3],
}

impl DisplayOptions {
    pub fn background(&self) -> Rgb<u8> {
        Rgb(self.background)
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            art_size: 600,
            background: [0, 0, 0],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FontOptions {
    pub family: String,
    pub bold: bool,
    /// Pixel sizes per label.
    pub track: f32,
    pub artist: f32,
    pub release_date: f32,
}

impl FontOptions {
    pub fn size_for(&self, kind: LabelKind) -> f32 {
        match kind {
            LabelKind::Track => self.track,
            LabelKind::Artist => self.artist,
            LabelKind::ReleaseDate => self.release_date,
        }
    }
}

impl Default for FontOptions {
    fn default() -> Self {
        Self {
            family: "DejaVu Sans".to_string(),
            bold: true,
            track: 36.0,
            artist: 26.0,
            release_date: 26.0,
        }
    }
}

/// How label colors are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StylingMode {
    /// White on dark art, black on bright art.
    Simple,
    /// Colors picked from the art's palette, with a contrasting drop shadow.
    #[default]
    Palette,
}

/// Which pixels feed the bright/dark decision for a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SamplingStrategy {
    Pixel,
    Region {
        #[serde(default = "SamplingStrategy::default_radius")]
        radius: u32,
    },
}

impl SamplingStrategy {
    const fn default_radius() -> u32 {
        2
    }
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Region {
            radius: Self::default_radius(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StylingOptions {
    pub mode: StylingMode,
    pub sampling: SamplingStrategy,
    /// Added to a label's anchor to find the sample point.
    pub sample_offset: [i64; 2],
    /// Overrides the mode's mean-channel threshold.
    pub threshold: Option<f32>,
}

impl StylingOptions {
    pub fn threshold(&self) -> f32 {
        self.threshold.unwrap_or(match self.mode {
            StylingMode::Simple => SIMPLE_THRESHOLD,
            StylingMode::Palette => PALETTE_THRESHOLD,
        })
    }
}

impl Default for StylingOptions {
    fn default() -> Self {
        Self {
            mode: StylingMode::default(),
            sampling: SamplingStrategy::default(),
            sample_offset: [-5, -5],
            threshold: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PaletteOptions {
    /// Number of colors extracted from the thumbnail.
    pub count: usize,
    pub track_offset: usize,
    pub artist_offset: usize,
    pub release_date_offset: usize,
}

impl PaletteOptions {
    pub fn offset_for(&self, kind: LabelKind) -> usize {
        match kind {
            LabelKind::Track => self.track_offset,
            LabelKind::Artist => self.artist_offset,
            LabelKind::ReleaseDate => self.release_date_offset,
        }
    }
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            count: 6,
            track_offset: 0,
            artist_offset: 1,
            release_date_offset: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Timings {
    /// Delay between polls while something is playing.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Delay between polls while nothing is playing.
    #[serde(with = "humantime_serde")]
    pub idle_interval: Duration,
    /// Upper bound for any single HTTP request.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            idle_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FadeOptions {
    /// Alpha increment per cross-fade frame.
    pub step: f64,
    #[serde(with = "humantime_serde")]
    pub frame_interval: Duration,
}

impl Default for FadeOptions {
    fn default() -> Self {
        Self {
            step: 0.02,
            frame_interval: Duration::from_millis(16),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LabelOverrides {
    pub track: Option<LabelPlacement>,
    pub artist: Option<LabelPlacement>,
    pub release_date: Option<LabelPlacement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    pub credentials: Credentials,
    pub display: DisplayOptions,
    pub fonts: FontOptions,
    pub styling: StylingOptions,
    pub palette: PaletteOptions,
    pub timings: Timings,
    pub fade: FadeOptions,
    pub labels: LabelOverrides,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_yaml::from_str(&s).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            self.display.art_size > 0,
            "display.art-size must be greater than zero"
        );
        ensure!(
            !self.fonts.family.trim().is_empty(),
            "fonts.family must not be empty"
        );
        for kind in LabelKind::ALL {
            let size = self.fonts.size_for(kind);
            ensure!(
                size.is_finite() && size > 0.0,
                "fonts.{kind} must be a positive size"
            );
        }
        ensure!(
            !self.timings.poll_interval.is_zero(),
            "timings.poll-interval must be greater than zero"
        );
        ensure!(
            !self.timings.idle_interval.is_zero(),
            "timings.idle-interval must be greater than zero"
        );
        ensure!(
            !self.timings.request_timeout.is_zero(),
            "timings.request-timeout must be greater than zero"
        );
        ensure!(
            self.fade.step > 0.0 && self.fade.step <= 0.5,
            "fade.step must be within (0, 0.5]"
        );
        if let Some(threshold) = self.styling.threshold {
            ensure!(
                (0.0..=255.0).contains(&threshold),
                "styling.threshold must be within [0, 255]"
            );
        }
        if self.styling.mode == StylingMode::Palette {
            ensure!(self.palette.count > 0, "palette.count must be greater than zero");
            for kind in LabelKind::ALL {
                ensure!(
                    self.palette.offset_for(kind) < self.palette.count,
                    "palette.{kind}-offset must be smaller than palette.count"
                );
            }
        }
        ensure!(
            !self.credentials.client_id.is_empty(),
            "credentials.client-id must be set"
        );
        ensure!(
            !self.credentials.client_secret.is_empty(),
            "credentials.client-secret must be set"
        );
        ensure!(
            !self.credentials.refresh_token.is_empty(),
            "credentials.refresh-token must be set"
        );
        Ok(self)
    }

    /// Where a label goes: the configured override, or the stock layout around
    /// the square art.
    pub fn placement(&self, kind: LabelKind) -> LabelPlacement {
        let configured = match kind {
            LabelKind::Track => self.labels.track,
            LabelKind::Artist => self.labels.artist,
            LabelKind::ReleaseDate => self.labels.release_date,
        };
        configured.unwrap_or_else(|| default_placement(kind, self.display.art_size))
    }
}

fn default_placement(kind: LabelKind, art_size: u32) -> LabelPlacement {
    let side = i64::from(art_size);
    match kind {
        LabelKind::Track => LabelPlacement {
            x: 40,
            y: side,
            anchor: Anchor::Sw,
            rotation: Rotation::None,
        },
        LabelKind::Artist => LabelPlacement {
            x: side,
            y: side - 150,
            anchor: Anchor::Ne,
            rotation: Rotation::Ccw270,
        },
        LabelKind::ReleaseDate => LabelPlacement {
            x: side,
            y: side - 130,
            anchor: Anchor::Nw,
            rotation: Rotation::Ccw270,
        },
    }
}
