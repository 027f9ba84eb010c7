use anyhow::{Context, Result};
use fast_image_resize as fir;
use image::{DynamicImage, RgbImage, RgbaImage};

/// Resize to exactly `target_w` x `target_h` with a CatmullRom convolution.
pub fn resize_rgb(source: &RgbImage, target_w: u32, target_h: u32) -> Result<RgbImage> {
    if target_w == 0 || target_h == 0 {
        anyhow::bail!("resize dimensions must be positive");
    }
    if source.width() == target_w && source.height() == target_h {
        return Ok(source.clone());
    }
    anyhow::ensure!(
        source.width() > 0 && source.height() > 0,
        "cannot resize an empty image"
    );

    // The resizer is built for four-channel pixels only.
    let rgba = DynamicImage::ImageRgb8(source.clone()).to_rgba8();
    let src_view = fir::images::ImageRef::new(
        rgba.width(),
        rgba.height(),
        rgba.as_raw(),
        fir::PixelType::U8x4,
    )
    .context("failed to create source view for resize")?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .context("album art resize failed")?;
    let resized = RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| anyhow::anyhow!("failed to construct resized RGBA image"))?;
    Ok(DynamicImage::ImageRgba8(resized).to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn resizes_to_requested_dimensions() {
        let src = RgbImage::from_pixel(64, 32, Rgb([120, 60, 30]));
        let out = resize_rgb(&src, 16, 16).unwrap();
        assert_eq!(out.dimensions(), (16, 16));
        let px = out.get_pixel(8, 8);
        assert!(px.0[0].abs_diff(120) <= 1);
        assert!(px.0[1].abs_diff(60) <= 1);
    }

    #[test]
    fn same_size_is_a_copy() {
        let src = RgbImage::from_pixel(5, 5, Rgb([1, 2, 3]));
        assert_eq!(resize_rgb(&src, 5, 5).unwrap(), src);
    }

    #[test]
    fn rejects_zero_target() {
        let src = RgbImage::from_pixel(5, 5, Rgb([1, 2, 3]));
        assert!(resize_rgb(&src, 0, 5).is_err());
    }
}
