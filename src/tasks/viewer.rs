use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::config::Configuration;
use crate::fetch::ImageFetcher;
use crate::render::text::FontFace;
use crate::render::window::WindowSurface;
use crate::render::RenderSurface;
use crate::tasks::display::{DisplayLoop, Outcome};
use crate::track::TrackProvider;

#[derive(Debug)]
enum ViewerEvent {
    Cancelled,
}

struct ViewerApp<P, F> {
    cfg: Configuration,
    cancel: CancellationToken,
    font: FontFace,
    display: DisplayLoop<P, F>,
    window: Option<Arc<Window>>,
    surface: Option<WindowSurface>,
    next_poll: Instant,
}

impl<P, F> ViewerApp<P, F>
where
    P: TrackProvider,
    F: ImageFetcher,
{
    fn new(
        cfg: Configuration,
        cancel: CancellationToken,
        font: FontFace,
        display: DisplayLoop<P, F>,
    ) -> Self {
        Self {
            cfg,
            cancel,
            font,
            display,
            window: None,
            surface: None,
            next_poll: Instant::now(),
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Option<Arc<Window>> {
        if let Some(window) = self.window.as_ref() {
            return Some(window.clone());
        }

        let attrs = WindowAttributes::default()
            .with_title("Album Art Display")
            .with_fullscreen(Some(Fullscreen::Borderless(None)));
        match event_loop.create_window(attrs) {
            Ok(window) => {
                window.set_cursor_visible(false);
                let window = Arc::new(window);
                self.window = Some(window.clone());
                Some(window)
            }
            Err(err) => {
                error!(error = %err, "failed to create viewer window");
                None
            }
        }
    }

    fn init_surface(&mut self, window: Arc<Window>) -> Result<()> {
        let surface = WindowSurface::new(window, self.cfg.display.background(), self.font.clone())
            .context("failed to create window surface")?;
        self.surface = Some(surface);
        Ok(())
    }

    fn handle_resize(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if let Err(err) = surface.resize(size) {
            warn!(error = ?err, "failed to resize window surface");
            return;
        }
        // The canvas was wiped; redraw the current track on the next poll.
        self.display.invalidate();
        self.next_poll = Instant::now();
    }

    fn poll_display(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let cycle = self.display.poll(surface);
        match &cycle.outcome {
            Outcome::Failed(err) => debug!(error = %err, "retrying after failed cycle"),
            outcome => debug!(?outcome, wait = ?cycle.wait, "display cycle"),
        }
        self.next_poll = Instant::now() + cycle.wait;
    }
}

impl<P, F> ApplicationHandler<ViewerEvent> for ViewerApp<P, F>
where
    P: TrackProvider,
    F: ImageFetcher,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.cancel.is_cancelled() {
            event_loop.exit();
            return;
        }

        let Some(window) = self.ensure_window(event_loop) else {
            event_loop.exit();
            return;
        };

        if self.surface.is_none() {
            if let Err(err) = self.init_surface(window) {
                error!(error = ?err, "failed to initialize window surface");
                event_loop.exit();
                return;
            }
        }

        self.next_poll = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("viewer window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
            }
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                let size = window.inner_size();
                let _ = inner_size_writer.request_inner_size(size);
                self.handle_resize(size);
            }
            WindowEvent::RedrawRequested => {
                if let Some(surface) = self.surface.as_mut() {
                    if let Err(err) = surface.present() {
                        warn!(error = ?err, "failed to present frame");
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.cancel.is_cancelled() {
            event_loop.exit();
            return;
        }
        if Instant::now() >= self.next_poll {
            self.poll_display();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_poll));
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Cancelled => {
                info!("viewer received cancellation event");
                event_loop.exit();
            }
        }
    }
}

/// Run the display full-screen on the calling thread until the window closes
/// or `cancel` fires. Must be called from within a tokio runtime.
pub fn run_windowed<P, F>(
    cfg: Configuration,
    display: DisplayLoop<P, F>,
    font: FontFace,
    cancel: CancellationToken,
) -> Result<()>
where
    P: TrackProvider,
    F: ImageFetcher,
{
    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("failed to build viewer event loop")?;
    let proxy = event_loop.create_proxy();

    let cancel_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            let _ = proxy.send_event(ViewerEvent::Cancelled);
        })
    };

    let mut app = ViewerApp::new(cfg, cancel, font, display);
    let run_result = event_loop.run_app(&mut app);
    cancel_task.abort();

    run_result.context("viewer event loop failed")
}
