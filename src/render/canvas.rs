use anyhow::Result;
use image::{GrayImage, Rgb, RgbImage};
use tracing::debug;

use super::text::FontFace;
use super::{LabelPlacement, RenderSurface, TextLabel};

/// Off-screen RGB frame that every draw call composes into.
#[derive(Debug)]
pub struct Canvas {
    frame: RgbImage,
    background: Rgb<u8>,
    font: Option<FontFace>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>, font: Option<FontFace>) -> Self {
        Self {
            frame: RgbImage::from_pixel(width.max(1), height.max(1), background),
            background,
            font,
        }
    }

    pub fn frame(&self) -> &RgbImage {
        &self.frame
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    /// Resize the frame, discarding its contents.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.frame.dimensions() == (width.max(1), height.max(1)) {
            return;
        }
        self.frame = RgbImage::from_pixel(width.max(1), height.max(1), self.background);
    }

    /// Pack the frame as `0xFFRRGGBB` words into `out`, row by row.
    pub fn write_packed(&self, out: &mut [u32]) {
        for (slot, pixel) in out.iter_mut().zip(self.frame.pixels()) {
            let [r, g, b] = pixel.0;
            *slot = 0xFF00_0000 | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
        }
    }

    fn blend_mask(&mut self, mask: &GrayImage, left: i64, top: i64, color: Rgb<u8>) {
        let (width, height) = self.frame.dimensions();
        for (mx, my, coverage) in mask.enumerate_pixels() {
            let alpha = f32::from(coverage.0[0]) / 255.0;
            if alpha <= 0.0 {
                continue;
            }
            let x = left + i64::from(mx);
            let y = top + i64::from(my);
            if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                continue;
            }
            let dst = self.frame.get_pixel_mut(x as u32, y as u32);
            for channel in 0..3 {
                let src = f32::from(color.0[channel]);
                let old = f32::from(dst.0[channel]);
                dst.0[channel] = (src * alpha + old * (1.0 - alpha)).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Where an already rotated text mask lands for `placement`.
fn mask_origin(placement: LabelPlacement, mask: &GrayImage) -> (i64, i64) {
    let (width, height) = placement
        .rotation
        .unrotated_size(mask.width(), mask.height());
    placement.text_origin(width, height)
}

impl RenderSurface for Canvas {
    fn clear(&mut self) {
        let background = self.background;
        for pixel in self.frame.pixels_mut() {
            *pixel = background;
        }
    }

    fn draw_image(&mut self, image: &RgbImage, x: i64, y: i64) {
        let (width, height) = self.frame.dimensions();
        for (sx, sy, pixel) in image.enumerate_pixels() {
            let dx = x + i64::from(sx);
            let dy = y + i64::from(sy);
            if dx < 0 || dy < 0 || dx >= i64::from(width) || dy >= i64::from(height) {
                continue;
            }
            self.frame.put_pixel(dx as u32, dy as u32, *pixel);
        }
    }

    fn draw_text(&mut self, label: &TextLabel) {
        let Some(font) = self.font.as_ref() else {
            debug!(text = %label.text, "no font loaded; skipping label");
            return;
        };
        let placement = label.placement;
        let mask = font.rasterize(&label.text, label.size, placement.rotation);
        let (left, top) = mask_origin(placement, &mask);
        if let Some(shadow) = label.shadow {
            self.blend_mask(&mask, left + 1, top + 1, shadow);
        }
        self.blend_mask(&mask, left, top, label.fill);
    }

    fn present(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Anchor, Rotation};
    use image::Luma;

    #[test]
    fn clear_restores_background() {
        let mut canvas = Canvas::new(4, 4, Rgb([1, 2, 3]), None);
        canvas.draw_image(&RgbImage::from_pixel(2, 2, Rgb([200, 0, 0])), 1, 1);
        assert_eq!(*canvas.frame().get_pixel(1, 1), Rgb([200, 0, 0]));
        canvas.clear();
        assert!(canvas.frame().pixels().all(|p| *p == Rgb([1, 2, 3])));
    }

    #[test]
    fn draw_image_clips_at_edges() {
        let mut canvas = Canvas::new(3, 3, Rgb([0, 0, 0]), None);
        canvas.draw_image(&RgbImage::from_pixel(4, 4, Rgb([9, 9, 9])), -2, 1);
        assert_eq!(*canvas.frame().get_pixel(0, 1), Rgb([9, 9, 9]));
        assert_eq!(*canvas.frame().get_pixel(1, 2), Rgb([9, 9, 9]));
        assert_eq!(*canvas.frame().get_pixel(2, 1), Rgb([0, 0, 0]));
        assert_eq!(*canvas.frame().get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn text_without_font_is_a_no_op() {
        let mut canvas = Canvas::new(8, 8, Rgb([5, 5, 5]), None);
        canvas.draw_text(&TextLabel {
            text: "hello".into(),
            placement: LabelPlacement {
                x: 0,
                y: 0,
                anchor: Anchor::Nw,
                rotation: Rotation::None,
            },
            size: 12.0,
            fill: Rgb([255, 255, 255]),
            shadow: None,
        });
        assert!(canvas.frame().pixels().all(|p| *p == Rgb([5, 5, 5])));
    }

    #[test]
    fn mask_blends_by_coverage() {
        let mut canvas = Canvas::new(2, 1, Rgb([0, 0, 0]), None);
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(0, 0, Luma([255]));
        mask.put_pixel(1, 0, Luma([128]));
        canvas.blend_mask(&mask, 0, 0, Rgb([200, 100, 50]));
        assert_eq!(*canvas.frame().get_pixel(0, 0), Rgb([200, 100, 50]));
        assert_eq!(*canvas.frame().get_pixel(1, 0), Rgb([100, 50, 25]));
    }

    #[test]
    fn rotated_masks_stay_in_the_column_left_of_the_anchor() {
        // What a 200 px wide, 30 px tall line looks like after a 270 degree turn.
        let mask = GrayImage::new(30, 200);
        let artist = LabelPlacement {
            x: 600,
            y: 450,
            anchor: Anchor::Ne,
            rotation: Rotation::Ccw270,
        };
        let release = LabelPlacement {
            y: 470,
            anchor: Anchor::Nw,
            ..artist
        };
        assert_eq!(mask_origin(artist, &mask), (570, 250));
        assert_eq!(mask_origin(release, &mask), (570, 470));
    }

    #[test]
    fn packs_pixels_as_xrgb() {
        let canvas = Canvas::new(1, 1, Rgb([0x12, 0x34, 0x56]), None);
        let mut out = [0u32; 1];
        canvas.write_packed(&mut out);
        assert_eq!(out[0], 0xFF12_3456);
    }

    #[test]
    fn resize_discards_contents() {
        let mut canvas = Canvas::new(2, 2, Rgb([0, 0, 0]), None);
        canvas.draw_image(&RgbImage::from_pixel(2, 2, Rgb([7, 7, 7])), 0, 0);
        canvas.resize(3, 1);
        assert_eq!(canvas.dimensions(), (3, 1));
        assert!(canvas.frame().pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
