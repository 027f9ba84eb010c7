use std::time::Duration;

use anyhow::anyhow;
use image::RgbImage;
use tracing::debug;

use crate::error::DisplayError;
use crate::processing::resize::resize_rgb;

/// Retrieves and decodes images by URL.
pub trait ImageFetcher {
    /// Fetch `url`, resizing to `size` when given.
    fn fetch(&mut self, url: &str, size: Option<(u32, u32)>) -> Result<RgbImage, DisplayError>;
}

/// Shared agent setup for every request the display makes.
pub fn http_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&mut self, url: &str, size: Option<(u32, u32)>) -> Result<RgbImage, DisplayError> {
        let failed = |reason: anyhow::Error| DisplayError::FetchFailed {
            url: url.to_string(),
            reason,
        };
        let mut response = self.agent.get(url).call().map_err(|err| failed(err.into()))?;
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|err| failed(err.into()))?;
        debug!(url, bytes = bytes.len(), "image downloaded");
        decode_image(url, &bytes, size)
    }
}

/// Decode `bytes` (format sniffed from content) into RGB, optionally resized.
pub fn decode_image(
    url: &str,
    bytes: &[u8],
    size: Option<(u32, u32)>,
) -> Result<RgbImage, DisplayError> {
    let decode_failed = |reason: anyhow::Error| DisplayError::DecodeFailed {
        url: url.to_string(),
        reason,
    };
    if bytes.is_empty() {
        return Err(decode_failed(anyhow!("empty response body")));
    }
    let image = image::load_from_memory(bytes)
        .map_err(|err| decode_failed(err.into()))?
        .to_rgb8();
    match size {
        Some((width, height)) => resize_rgb(&image, width, height).map_err(decode_failed),
        None => Ok(image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([30, 60, 90]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_without_resize() {
        let img = decode_image("mem://a.png", &png_bytes(7, 3), None).unwrap();
        assert_eq!(img.dimensions(), (7, 3));
        assert_eq!(*img.get_pixel(0, 0), Rgb([30, 60, 90]));
    }

    #[test]
    fn decodes_and_resizes() {
        let img = decode_image("mem://a.png", &png_bytes(20, 20), Some((5, 5))).unwrap();
        assert_eq!(img.dimensions(), (5, 5));
    }

    #[test]
    fn garbage_is_a_decode_failure() {
        let err = decode_image("mem://bad", b"not an image", None).unwrap_err();
        assert!(matches!(err, DisplayError::DecodeFailed { ref url, .. } if url == "mem://bad"));
        assert!(matches!(
            decode_image("mem://empty", &[], None),
            Err(DisplayError::DecodeFailed { .. })
        ));
    }
}
