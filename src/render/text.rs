use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont, point};
use anyhow::{Result, anyhow};
use fontdb::{Database, Family, Query, Weight};
use image::{GrayImage, Luma, imageops};
use tracing::debug;

use super::Rotation;

/// A font face resolved from the system font database.
#[derive(Clone)]
pub struct FontFace {
    font: FontArc,
}

impl FontFace {
    /// Find `family` among the system fonts, falling back to any sans-serif
    /// face and finally to whatever face is installed.
    pub fn load(family: &str, bold: bool) -> Result<Self> {
        let mut db = Database::new();
        db.load_system_fonts();

        let weight = if bold { Weight::BOLD } else { Weight::NORMAL };
        let preferred_families = [Family::Name(family), Family::SansSerif];

        for family in preferred_families {
            let query = Query {
                families: &[family],
                weight,
                ..Default::default()
            };
            if let Some(font) = db.query(&query).and_then(|id| load_face(&db, id)) {
                return Ok(Self { font });
            }
        }

        for face in db.faces() {
            if let Some(font) = load_face(&db, face.id) {
                debug!(family = ?face.families, "falling back to first installed font");
                return Ok(Self { font });
            }
        }

        Err(anyhow!("no usable system font found (wanted '{family}')"))
    }

    /// Render `text` into a coverage mask, `size` pixels tall, then rotate it.
    pub fn rasterize(&self, text: &str, size: f32, rotation: Rotation) -> GrayImage {
        let scale = PxScale::from(size.max(1.0));
        let scaled = self.font.as_scaled(scale);

        let mut glyphs = Vec::new();
        let mut caret = 0.0f32;
        let mut previous = None;
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(scale, point(caret, scaled.ascent())));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }

        let width = caret.ceil().max(1.0) as u32;
        let height = scaled.height().ceil().max(1.0) as u32;
        let mut mask = GrayImage::new(width, height);
        for glyph in glyphs {
            let Some(outline) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outline.px_bounds();
            outline.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + i64::from(gx);
                let y = bounds.min.y as i64 + i64::from(gy);
                if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                    return;
                }
                let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                let pixel = mask.get_pixel_mut(x as u32, y as u32);
                *pixel = Luma([pixel.0[0].max(value)]);
            });
        }

        // imageops rotates clockwise; label rotation is counter-clockwise.
        match rotation {
            Rotation::None => mask,
            Rotation::Ccw90 => imageops::rotate270(&mask),
            Rotation::Ccw180 => imageops::rotate180(&mask),
            Rotation::Ccw270 => imageops::rotate90(&mask),
        }
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace").finish_non_exhaustive()
    }
}

fn load_face(db: &Database, id: fontdb::ID) -> Option<FontArc> {
    let loaded = db.with_face_data(id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index)
    })?;
    match loaded {
        Ok(font) => Some(FontArc::new(font)),
        Err(err) => {
            debug!(error = %err, "skipping unparsable font face");
            None
        }
    }
}
