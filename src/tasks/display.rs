use std::sync::Arc;
use std::time::Duration;

use image::{Rgb, RgbImage};
use tracing::{debug, info, warn};

use crate::config::{Configuration, LabelKind, StylingMode};
use crate::error::DisplayError;
use crate::fetch::ImageFetcher;
use crate::processing::fade::CrossFade;
use crate::processing::palette::extract_palette;
use crate::render::RenderSurface;
use crate::styling::style_label;
use crate::track::{Track, TrackProvider};

/// What a single [`DisplayLoop::poll`] did.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing is playing; the surface was blanked.
    Idle,
    /// Same track as last time; nothing drawn.
    Unchanged,
    /// A new track finished drawing.
    Rendered,
    /// A cross-fade frame was drawn; more follow.
    Fading,
    /// The cycle failed and the surface was blanked.
    Failed(DisplayError),
}

/// Result of one loop iteration plus how long to wait before the next.
#[derive(Debug)]
pub struct Cycle {
    pub outcome: Outcome,
    pub wait: Duration,
}

/// What is currently on screen.
#[derive(Debug, Default)]
struct FrameState {
    current_title: Option<String>,
    previous_art: Option<Arc<RgbImage>>,
    palette: Vec<Rgb<u8>>,
}

#[derive(Debug)]
struct Transition {
    fade: CrossFade,
    track: Track,
    art: Arc<RgbImage>,
    palette: Vec<Rgb<u8>>,
}

/// Polls a [`TrackProvider`] and keeps a [`RenderSurface`] showing the
/// current track's art and labels.
pub struct DisplayLoop<P, F> {
    cfg: Configuration,
    provider: P,
    fetcher: F,
    state: FrameState,
    transition: Option<Transition>,
}

impl<P, F> DisplayLoop<P, F>
where
    P: TrackProvider,
    F: ImageFetcher,
{
    pub fn new(cfg: Configuration, provider: P, fetcher: F) -> Self {
        Self {
            cfg,
            provider,
            fetcher,
            state: FrameState::default(),
            transition: None,
        }
    }

    /// Run one iteration. While a cross-fade is running this only steps it.
    pub fn poll(&mut self, surface: &mut impl RenderSurface) -> Cycle {
        if self.transition.is_some() {
            return self.advance(surface);
        }
        let result = self.refresh(surface);
        self.settle(surface, result)
    }

    /// Draw the next cross-fade frame, or the finished screen once the fade
    /// is exhausted.
    pub fn advance(&mut self, surface: &mut impl RenderSurface) -> Cycle {
        let result = self.step_transition(surface);
        self.settle(surface, result)
    }

    /// Forget the on-screen track so the next poll redraws it.
    pub fn invalidate(&mut self) {
        self.state.current_title = None;
        self.transition = None;
    }

    pub fn config(&self) -> &Configuration {
        &self.cfg
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn is_fading(&self) -> bool {
        self.transition.is_some()
    }

    pub fn current_title(&self) -> Option<&str> {
        self.state.current_title.as_deref()
    }

    pub fn previous_art(&self) -> Option<&RgbImage> {
        self.state.previous_art.as_deref()
    }

    pub fn palette(&self) -> &[Rgb<u8>] {
        &self.state.palette
    }

    fn refresh(&mut self, surface: &mut impl RenderSurface) -> Result<Outcome, DisplayError> {
        let Some(track) = self.provider.current_track()? else {
            surface.clear();
            surface.present().map_err(DisplayError::Render)?;
            if let Some(title) = self.state.current_title.take() {
                info!(%title, "playback stopped");
            }
            return Ok(Outcome::Idle);
        };

        if self.state.current_title.as_deref() == Some(track.title.as_str()) {
            return Ok(Outcome::Unchanged);
        }

        info!(title = %track.title, artist = %track.artist, "track changed");
        surface.clear();

        let side = self.cfg.display.art_size;
        let art = Arc::new(self.fetcher.fetch(&track.album_art_url, Some((side, side)))?);
        let palette = match self.cfg.styling.mode {
            StylingMode::Simple => Vec::new(),
            StylingMode::Palette => {
                let url = track.thumbnail_url.as_deref().unwrap_or(&track.album_art_url);
                let thumbnail = self.fetcher.fetch(url, None)?;
                extract_palette(&thumbnail, self.cfg.palette.count)
            }
        };

        let fade = self
            .state
            .previous_art
            .clone()
            .and_then(|previous| CrossFade::new(previous, art.clone(), self.cfg.fade.step))
            .filter(|fade| fade.intermediate_frames() > 0);
        match fade {
            Some(fade) => {
                debug!(frames = fade.intermediate_frames(), "starting cross-fade");
                self.transition = Some(Transition {
                    fade,
                    track,
                    art,
                    palette,
                });
                self.step_transition(surface)
            }
            None => self.finish(surface, track, art, palette),
        }
    }

    fn step_transition(
        &mut self,
        surface: &mut impl RenderSurface,
    ) -> Result<Outcome, DisplayError> {
        let Some(transition) = self.transition.as_mut() else {
            return Ok(Outcome::Unchanged);
        };
        if let Some(frame) = transition.fade.next() {
            surface.draw_image(&frame, 0, 0);
            surface.present().map_err(DisplayError::Render)?;
            return Ok(Outcome::Fading);
        }

        let Some(Transition {
            track, art, palette, ..
        }) = self.transition.take()
        else {
            return Ok(Outcome::Unchanged);
        };
        self.finish(surface, track, art, palette)
    }

    fn finish(
        &mut self,
        surface: &mut impl RenderSurface,
        track: Track,
        art: Arc<RgbImage>,
        palette: Vec<Rgb<u8>>,
    ) -> Result<Outcome, DisplayError> {
        surface.draw_image(&art, 0, 0);
        for kind in LabelKind::ALL {
            let text = match kind {
                LabelKind::Track => &track.title,
                LabelKind::Artist => &track.artist,
                LabelKind::ReleaseDate => &track.release_date,
            };
            surface.draw_text(&style_label(&self.cfg, kind, text, &art, &palette));
        }
        surface.present().map_err(DisplayError::Render)?;

        debug!(title = %track.title, "track rendered");
        self.state = FrameState {
            current_title: Some(track.title),
            previous_art: Some(art),
            palette,
        };
        Ok(Outcome::Rendered)
    }

    fn settle(
        &mut self,
        surface: &mut impl RenderSurface,
        result: Result<Outcome, DisplayError>,
    ) -> Cycle {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "display cycle failed");
                surface.clear();
                if let Err(err) = surface.present() {
                    warn!(error = ?err, "failed to present blank frame");
                }
                self.invalidate();
                Outcome::Failed(err)
            }
        };
        let wait = match outcome {
            Outcome::Idle => self.cfg.timings.idle_interval,
            Outcome::Fading => self.cfg.fade.frame_interval,
            _ => self.cfg.timings.poll_interval,
        };
        Cycle { outcome, wait }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::TextLabel;
    use anyhow::anyhow;

    struct Script(Vec<Option<&'static str>>);

    impl TrackProvider for Script {
        fn current_track(&mut self) -> Result<Option<Track>, DisplayError> {
            if self.0.is_empty() {
                return Err(DisplayError::ProviderUnavailable(anyhow!("script exhausted")));
            }
            Ok(self.0.remove(0).map(|title| Track {
                title: title.to_string(),
                artist: "Artist".to_string(),
                album_art_url: format!("art://{title}"),
                thumbnail_url: None,
                release_date: "2020-01".to_string(),
            }))
        }
    }

    struct Solid;

    impl ImageFetcher for Solid {
        fn fetch(&mut self, _url: &str, size: Option<(u32, u32)>) -> Result<RgbImage, DisplayError> {
            let (w, h) = size.unwrap_or((8, 8));
            Ok(RgbImage::from_pixel(w, h, Rgb([90, 90, 90])))
        }
    }

    #[derive(Default)]
    struct Presents(usize);

    impl RenderSurface for Presents {
        fn clear(&mut self) {}
        fn draw_image(&mut self, _image: &RgbImage, _x: i64, _y: i64) {}
        fn draw_text(&mut self, _label: &TextLabel) {}
        fn present(&mut self) -> anyhow::Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    fn display(titles: Vec<Option<&'static str>>) -> DisplayLoop<Script, Solid> {
        let mut cfg = Configuration::default();
        cfg.display.art_size = 16;
        DisplayLoop::new(cfg, Script(titles), Solid)
    }

    #[test]
    fn waits_follow_the_outcome() {
        let mut display = display(vec![None, Some("A"), Some("A")]);
        let mut surface = Presents::default();

        let idle = display.poll(&mut surface);
        assert!(matches!(idle.outcome, Outcome::Idle));
        assert_eq!(idle.wait, Duration::from_secs(5));

        let rendered = display.poll(&mut surface);
        assert!(matches!(rendered.outcome, Outcome::Rendered));
        assert_eq!(rendered.wait, Duration::from_secs(1));

        assert!(matches!(display.poll(&mut surface).outcome, Outcome::Unchanged));
        assert_eq!(surface.0, 2);
    }

    #[test]
    fn fade_does_not_query_the_provider() {
        // Only two scripted answers: any extra query would fail the cycle.
        let mut display = display(vec![Some("A"), Some("B")]);
        let mut surface = Presents::default();
        display.poll(&mut surface);

        let first = display.poll(&mut surface);
        assert!(matches!(first.outcome, Outcome::Fading));
        assert_eq!(first.wait, Duration::from_millis(16));
        assert!(display.is_fading());

        let mut cycles = 0;
        while display.is_fading() {
            let cycle = display.poll(&mut surface);
            assert!(!matches!(cycle.outcome, Outcome::Failed(_)));
            cycles += 1;
        }
        assert_eq!(cycles, 49);
        assert_eq!(display.current_title(), Some("B"));
    }

    #[test]
    fn invalidate_forces_a_redraw() {
        let mut display = display(vec![Some("A"), Some("A")]);
        let mut surface = Presents::default();
        display.poll(&mut surface);
        display.invalidate();
        assert_eq!(display.current_title(), None);
        // Same size as before, so redrawing the same art cross-fades into itself.
        assert!(matches!(display.poll(&mut surface).outcome, Outcome::Fading));
    }
}
