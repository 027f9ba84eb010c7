//! Picks label colors so text stays readable over the art beneath it.

use image::{Rgb, RgbImage};

use crate::config::{Configuration, LabelKind, StylingMode};
use crate::processing::brightness::{Brightness, classify_at};
use crate::render::TextLabel;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Build the draw request for one label over freshly drawn `art`.
///
/// `palette` must be ordered darkest first.
pub fn style_label(
    config: &Configuration,
    kind: LabelKind,
    text: &str,
    art: &RgbImage,
    palette: &[Rgb<u8>],
) -> TextLabel {
    let placement = config.placement(kind);
    let [dx, dy] = config.styling.sample_offset;
    let brightness = classify_at(
        art,
        placement.x + dx,
        placement.y + dy,
        config.styling.sampling,
        config.styling.threshold(),
    );

    let (fill, shadow) = match config.styling.mode {
        StylingMode::Simple => (contrasting(brightness), None),
        StylingMode::Palette => palette_colors(palette, config.palette.offset_for(kind), brightness),
    };

    TextLabel {
        text: text.to_string(),
        placement,
        size: config.fonts.size_for(kind),
        fill,
        shadow,
    }
}

fn contrasting(brightness: Brightness) -> Rgb<u8> {
    match brightness {
        Brightness::Bright => BLACK,
        Brightness::Dark => WHITE,
    }
}

fn palette_colors(
    palette: &[Rgb<u8>],
    offset: usize,
    brightness: Brightness,
) -> (Rgb<u8>, Option<Rgb<u8>>) {
    let Some(last) = palette.len().checked_sub(1) else {
        return (contrasting(brightness), None);
    };
    match brightness {
        Brightness::Bright => (palette[offset.min(last)], Some(WHITE)),
        Brightness::Dark => (palette[last.saturating_sub(offset)], Some(BLACK)),
    }
}
