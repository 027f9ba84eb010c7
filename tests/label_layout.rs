use album_art_display::config::{Configuration, LabelKind};
use album_art_display::render::LabelPlacement;

/// Half-open box `(x0, x1, y0, y1)` covered by a label's rotated text.
fn text_box(placement: LabelPlacement, len: u32, height: u32) -> (i64, i64, i64, i64) {
    let (x0, y0) = placement.text_origin(len, height);
    let (w, h) = match placement.rotation.degrees() {
        90 | 270 => (height, len),
        _ => (len, height),
    };
    (x0, x0 + i64::from(w), y0, y0 + i64::from(h))
}

fn on_art(x: i64, y: i64, side: i64) -> bool {
    (0..side).contains(&x) && (0..side).contains(&y)
}

#[test]
fn default_side_labels_share_the_art_edge_column() {
    let cfg = Configuration::default();
    let side = i64::from(cfg.display.art_size);
    let (len, height) = (200u32, 30u32);
    let (l, h) = (i64::from(len), i64::from(height));

    let artist = text_box(cfg.placement(LabelKind::Artist), len, height);
    assert_eq!(artist, (side - h, side, side - 150 - l, side - 150));

    let release = text_box(cfg.placement(LabelKind::ReleaseDate), len, height);
    assert_eq!(release, (side - h, side, side - 130, side - 130 + l));

    // Artist ends above where the release date starts.
    assert!(artist.3 <= release.2);
}

#[test]
fn side_label_samples_fall_inside_their_text_on_the_art() {
    let cfg = Configuration::default();
    let side = i64::from(cfg.display.art_size);
    let [dx, dy] = cfg.styling.sample_offset;

    for kind in [LabelKind::Artist, LabelKind::ReleaseDate] {
        let placement = cfg.placement(kind);
        let (x0, x1, _, _) = text_box(placement, 200, 30);
        let (sx, sy) = (placement.x + dx, placement.y + dy);
        assert!(on_art(sx, sy, side), "{kind} sample ({sx}, {sy}) is off the art");
        assert!((x0..x1).contains(&sx), "{kind} sample x {sx} outside [{x0}, {x1})");
        assert!(x1 <= side, "{kind} text spills right of the art");
    }
}

#[test]
fn title_sits_on_the_bottom_edge() {
    let cfg = Configuration::default();
    let side = i64::from(cfg.display.art_size);
    let title = text_box(cfg.placement(LabelKind::Track), 300, 40);
    assert_eq!(title, (40, 340, side - 40, side));
}
