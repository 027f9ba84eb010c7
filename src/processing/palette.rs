//! Dominant-color extraction for label styling.
//!
//! Pixels are bucketed by the top two bits of their luma, hue and lightness
//! (64 buckets). The most populated buckets are averaged into representative
//! colors, which are then ordered darkest first so callers can index into the
//! result positionally.

use image::{Rgb, RgbImage};
use palette::{FromColor, Hsl, Srgb};

const BUCKETS: usize = 64;
const TOP_TWO_BITS: u8 = 0b1100_0000;

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    sums: [u64; 3],
    count: u64,
}

impl Bucket {
    fn add(&mut self, pixel: Rgb<u8>) {
        for (sum, value) in self.sums.iter_mut().zip(pixel.0) {
            *sum += u64::from(value);
        }
        self.count += 1;
    }

    fn mean(&self) -> Rgb<u8> {
        Rgb(self.sums.map(|sum| (sum / self.count.max(1)) as u8))
    }
}

/// Extract up to `count` representative colors, darkest first.
pub fn extract_palette(image: &RgbImage, count: usize) -> Vec<Rgb<u8>> {
    if count == 0 {
        return Vec::new();
    }

    let mut buckets = [Bucket::default(); BUCKETS];
    for pixel in image.pixels() {
        buckets[bucket_index(*pixel)].add(*pixel);
    }

    let mut used: Vec<(usize, &Bucket)> = buckets
        .iter()
        .enumerate()
        .filter(|(_, bucket)| bucket.count > 0)
        .collect();
    // Most populated first; bucket index breaks ties so the result is stable.
    used.sort_by(|(ia, a), (ib, b)| b.count.cmp(&a.count).then(ia.cmp(ib)));

    let mut colors: Vec<Rgb<u8>> = used
        .into_iter()
        .take(count)
        .map(|(_, bucket)| bucket.mean())
        .collect();
    sort_darkest_first(&mut colors);
    colors
}

/// Stable ascending sort by the sum of the RGB channels.
pub fn sort_darkest_first(colors: &mut [Rgb<u8>]) {
    colors.sort_by_key(|color| channel_sum(*color));
}

pub fn channel_sum(color: Rgb<u8>) -> u16 {
    color.0.iter().map(|&v| u16::from(v)).sum()
}

fn bucket_index(pixel: Rgb<u8>) -> usize {
    let [r, g, b] = pixel.0;
    let hsl: Hsl = Hsl::from_color(Srgb::new(r, g, b).into_format::<f32>());
    let hue = (hsl.hue.into_positive_degrees() / 360.0 * 255.0).clamp(0.0, 255.0) as u8;
    let lightness = (hsl.lightness * 255.0).clamp(0.0, 255.0) as u8;
    let luma = (f32::from(r) * 0.2126 + f32::from(g) * 0.7152 + f32::from(b) * 0.0722) as u8;

    let packed = ((luma & TOP_TWO_BITS) >> 2) | ((hue & TOP_TWO_BITS) >> 4) | ((lightness & TOP_TWO_BITS) >> 6);
    usize::from(packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_channel_sum() {
        let mut colors = vec![Rgb([10, 20, 20]), Rgb([100, 100, 100]), Rgb([40, 40, 40])];
        sort_darkest_first(&mut colors);
        let sums: Vec<u16> = colors.iter().map(|c| channel_sum(*c)).collect();
        assert_eq!(sums, vec![50, 120, 300]);
    }

    #[test]
    fn equal_sums_keep_their_order() {
        let mut colors = vec![Rgb([30, 0, 0]), Rgb([0, 30, 0]), Rgb([0, 0, 10])];
        sort_darkest_first(&mut colors);
        assert_eq!(colors, vec![Rgb([0, 0, 10]), Rgb([30, 0, 0]), Rgb([0, 30, 0])]);
    }

    #[test]
    fn extracts_distinct_regions_darkest_first() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([240, 240, 240]));
        for y in 0..5 {
            for x in 0..10 {
                img.put_pixel(x, y, Rgb([10, 10, 10]));
            }
        }
        for x in 0..10 {
            img.put_pixel(x, 9, Rgb([200, 30, 30]));
        }
        let colors = extract_palette(&img, 3);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0], Rgb([10, 10, 10]));
        assert_eq!(colors[2], Rgb([240, 240, 240]));
        assert_eq!(colors[1], Rgb([200, 30, 30]));
    }

    #[test]
    fn count_limits_to_most_populated() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([250, 250, 250]));
        img.put_pixel(0, 0, Rgb([5, 5, 5]));
        let colors = extract_palette(&img, 1);
        assert_eq!(colors, vec![Rgb([250, 250, 250])]);
    }

    #[test]
    fn fewer_colors_than_requested() {
        let img = RgbImage::from_pixel(3, 3, Rgb([90, 90, 90]));
        assert_eq!(extract_palette(&img, 5), vec![Rgb([90, 90, 90])]);
        assert!(extract_palette(&img, 0).is_empty());
    }
}
