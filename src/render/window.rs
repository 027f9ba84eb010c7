use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use image::{Rgb, RgbImage};
use softbuffer::{Context as SoftContext, Surface};
use tracing::debug;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::canvas::Canvas;
use super::text::FontFace;
use super::{RenderSurface, TextLabel};

type WindowHandle = Arc<Window>;

/// A [`Canvas`] presented into a window through softbuffer.
pub struct WindowSurface {
    canvas: Canvas,
    surface: Surface<WindowHandle, WindowHandle>,
    _context: SoftContext<WindowHandle>,
}

impl WindowSurface {
    pub fn new(window: WindowHandle, background: Rgb<u8>, font: FontFace) -> Result<Self> {
        let context = SoftContext::new(window.clone())
            .map_err(|err| anyhow!("failed to create softbuffer context: {err}"))?;
        let surface = Surface::new(&context, window.clone())
            .map_err(|err| anyhow!("failed to create softbuffer surface: {err}"))?;
        let size = window.inner_size();
        let mut out = Self {
            canvas: Canvas::new(size.width, size.height, background, Some(font)),
            surface,
            _context: context,
        };
        out.resize(size)?;
        Ok(out)
    }

    /// Track a window resize. The canvas is wiped, so callers must redraw.
    pub fn resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        let (Some(width), Some(height)) = (
            NonZeroU32::new(size.width.max(1)),
            NonZeroU32::new(size.height.max(1)),
        ) else {
            return Ok(());
        };
        self.surface
            .resize(width, height)
            .map_err(|err| anyhow!("failed to resize softbuffer surface: {err}"))?;
        self.canvas.resize(width.get(), height.get());
        debug!(width = width.get(), height = height.get(), "window surface resized");
        Ok(())
    }
}

impl RenderSurface for WindowSurface {
    fn clear(&mut self) {
        self.canvas.clear();
    }

    fn draw_image(&mut self, image: &RgbImage, x: i64, y: i64) {
        self.canvas.draw_image(image, x, y);
    }

    fn draw_text(&mut self, label: &TextLabel) {
        self.canvas.draw_text(label);
    }

    fn present(&mut self) -> Result<()> {
        let mut buffer = self
            .surface
            .buffer_mut()
            .map_err(|err| anyhow!("failed to map softbuffer frame: {err}"))?;
        self.canvas.write_packed(&mut buffer);
        buffer
            .present()
            .map_err(|err| anyhow!("failed to present frame: {err}"))
    }
}
