use image::{Rgb, RgbImage};

use crate::config::SamplingStrategy;

/// Mean-channel threshold used with plain white/black text.
pub const SIMPLE_THRESHOLD: f32 = 127.0;
/// Mean-channel threshold used with palette-colored text.
pub const PALETTE_THRESHOLD: f32 = 175.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brightness {
    Bright,
    Dark,
}

impl Brightness {
    pub fn is_bright(self) -> bool {
        matches!(self, Self::Bright)
    }
}

/// Bright when the mean of the three channels exceeds `threshold`.
pub fn classify_color(color: Rgb<u8>, threshold: f32) -> Brightness {
    let [r, g, b] = color.0;
    let mean = (f32::from(r) + f32::from(g) + f32::from(b)) / 3.0;
    if mean > threshold {
        Brightness::Bright
    } else {
        Brightness::Dark
    }
}

/// Classify the art around (`x`, `y`). Points off the image are dark.
pub fn classify_at(
    image: &RgbImage,
    x: i64,
    y: i64,
    sampling: SamplingStrategy,
    threshold: f32,
) -> Brightness {
    match sample(image, x, y, sampling) {
        Some(color) => classify_color(color, threshold),
        None => Brightness::Dark,
    }
}

fn sample(image: &RgbImage, x: i64, y: i64, sampling: SamplingStrategy) -> Option<Rgb<u8>> {
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));
    let inside = |px: i64, py: i64| px >= 0 && py >= 0 && px < width && py < height;
    match sampling {
        SamplingStrategy::Pixel => {
            inside(x, y).then(|| *image.get_pixel(x as u32, y as u32))
        }
        SamplingStrategy::Region { radius } => {
            let radius = i64::from(radius);
            let mut sums = [0u64; 3];
            let mut count = 0u64;
            for py in (y - radius)..=(y + radius) {
                for px in (x - radius)..=(x + radius) {
                    if !inside(px, py) {
                        continue;
                    }
                    let pixel = image.get_pixel(px as u32, py as u32);
                    for (sum, value) in sums.iter_mut().zip(pixel.0) {
                        *sum += u64::from(value);
                    }
                    count += 1;
                }
            }
            (count > 0).then(|| Rgb(sums.map(|sum| (sum / count) as u8)))
        }
    }
}
