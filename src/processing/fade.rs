use std::sync::Arc;

use image::RgbImage;

/// A cross-fade between two equally sized bitmaps, yielded one blended frame
/// at a time.
///
/// With step `s` the fade has `ceil(1/s)` steps. The iterator yields the
/// intermediate frames `alpha = k * s` for `k = 1..steps`; the caller draws
/// the target itself as the final frame.
#[derive(Debug, Clone)]
pub struct CrossFade {
    previous: Arc<RgbImage>,
    target: Arc<RgbImage>,
    step: f64,
    steps: u32,
    emitted: u32,
}

impl CrossFade {
    /// `None` when the bitmaps differ in size or `step` is not positive.
    pub fn new(previous: Arc<RgbImage>, target: Arc<RgbImage>, step: f64) -> Option<Self> {
        if previous.dimensions() != target.dimensions() || !(step > 0.0) {
            return None;
        }
        Some(Self {
            previous,
            target,
            step,
            steps: step_count(step),
            emitted: 0,
        })
    }

    /// Number of blended frames drawn before the target.
    pub fn intermediate_frames(&self) -> u32 {
        self.steps.saturating_sub(1)
    }

    pub fn target(&self) -> &Arc<RgbImage> {
        &self.target
    }

    pub fn is_finished(&self) -> bool {
        self.emitted >= self.intermediate_frames()
    }
}

impl Iterator for CrossFade {
    type Item = RgbImage;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_finished() {
            return None;
        }
        self.emitted += 1;
        let alpha = (f64::from(self.emitted) * self.step).min(1.0) as f32;
        Some(blend(&self.previous, &self.target, alpha))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.intermediate_frames().saturating_sub(self.emitted) as usize;
        (left, Some(left))
    }
}

/// `ceil(1 / step)`, tolerant of steps that are not exact binary fractions.
pub fn step_count(step: f64) -> u32 {
    let raw = 1.0 / step;
    let nearest = raw.round();
    let steps = if (raw - nearest).abs() < 1e-4 {
        nearest
    } else {
        raw.ceil()
    };
    steps.clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Per-channel `a * (1 - alpha) + b * alpha`.
pub fn blend(a: &RgbImage, b: &RgbImage, alpha: f32) -> RgbImage {
    let alpha = alpha.clamp(0.0, 1.0);
    let mut out = a.clone();
    for (dst, src) in out.pixels_mut().zip(b.pixels()) {
        for channel in 0..3 {
            let from = f32::from(dst.0[channel]);
            let to = f32::from(src.0[channel]);
            dst.0[channel] = (from + (to - from) * alpha).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(value: u8) -> Arc<RgbImage> {
        Arc::new(RgbImage::from_pixel(4, 4, Rgb([value, value, value])))
    }

    #[test]
    fn step_counts() {
        assert_eq!(step_count(0.02), 50);
        assert_eq!(step_count(0.01), 100);
        assert_eq!(step_count(0.03), 34);
        assert_eq!(step_count(1.0), 1);
        assert_eq!(step_count(0.02f32 as f64), 50);
    }

    #[test]
    fn fifty_step_fade_yields_forty_nine_frames() {
        let fade = CrossFade::new(solid(0), solid(100), 0.02).unwrap();
        assert_eq!(fade.intermediate_frames(), 49);
        let frames: Vec<RgbImage> = fade.collect();
        assert_eq!(frames.len(), 49);
        assert_eq!(frames[0].get_pixel(0, 0).0[0], 2);
        assert_eq!(frames[24].get_pixel(0, 0).0[0], 50);
        assert_eq!(frames[48].get_pixel(0, 0).0[0], 98);
    }

    #[test]
    fn frames_move_monotonically_toward_target() {
        let fade = CrossFade::new(solid(200), solid(10), 0.1).unwrap();
        let values: Vec<u8> = fade.map(|f| f.get_pixel(1, 1).0[0]).collect();
        assert_eq!(values.len(), 9);
        assert!(values.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn mismatched_sizes_do_not_fade() {
        let small = Arc::new(RgbImage::new(2, 2));
        assert!(CrossFade::new(small, solid(0), 0.02).is_none());
        assert!(CrossFade::new(solid(0), solid(0), 0.0).is_none());
    }

    #[test]
    fn blend_endpoints() {
        let a = RgbImage::from_pixel(1, 1, Rgb([0, 50, 100]));
        let b = RgbImage::from_pixel(1, 1, Rgb([100, 150, 200]));
        assert_eq!(blend(&a, &b, 0.0), a);
        assert_eq!(blend(&a, &b, 1.0), b);
        assert_eq!(*blend(&a, &b, 0.5).get_pixel(0, 0), Rgb([50, 100, 150]));
    }
}
