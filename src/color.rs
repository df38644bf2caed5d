use palette::{Hsl, IntoColor, LinSrgb, Srgb};
use plotters::style::RGBColor;

use crate::chart::PaletteKind;

// ---------------------------------------------------------------------------
// Color palette generators
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn hue_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_rgb(rgb)
        })
        .collect()
}

/// Viridis control points (sRGB), sampled at 0, .25, .5, .75 and 1.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (0x44, 0x01, 0x54),
    (0x3b, 0x52, 0x8b),
    (0x21, 0x91, 0x8c),
    (0x5e, 0xc9, 0x62),
    (0xfd, 0xe7, 0x25),
];

/// Viridis colour at `t` in `[0, 1]`, interpolated in linear RGB.
pub fn viridis(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) as f32 } else { 0.0 };
    let scaled = t * (VIRIDIS.len() - 1) as f32;
    let lo = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = scaled - lo as f32;

    let a = linear(VIRIDIS[lo]);
    let b = linear(VIRIDIS[lo + 1]);
    let mixed = LinSrgb::new(
        a.red + (b.red - a.red) * frac,
        a.green + (b.green - a.green) * frac,
        a.blue + (b.blue - a.blue) * frac,
    );
    let rgb: Srgb = mixed.into_color();
    to_rgb(rgb)
}

/// `n` colours evenly spaced along viridis.
pub fn viridis_palette(n: usize) -> Vec<RGBColor> {
    match n {
        0 => Vec::new(),
        1 => vec![viridis(0.5)],
        _ => (0..n)
            .map(|i| viridis(i as f64 / (n - 1) as f64))
            .collect(),
    }
}

/// `n` series colours from the configured palette.
pub fn palette(kind: PaletteKind, n: usize) -> Vec<RGBColor> {
    match kind {
        PaletteKind::Viridis => viridis_palette(n),
        PaletteKind::Hue => hue_palette(n),
    }
}

/// CSS `rgb(...)` notation for the HTML chart backend.
pub fn css(color: &RGBColor) -> String {
    format!("rgb({}, {}, {})", color.0, color.1, color.2)
}

fn linear((r, g, b): (u8, u8, u8)) -> LinSrgb {
    Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0).into_color()
}

fn to_rgb(rgb: Srgb) -> RGBColor {
    RGBColor(
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Colour scale: numeric value → colour
// ---------------------------------------------------------------------------

/// Maps values in `[min, max]` onto viridis, for heatmap cells.
#[derive(Debug, Clone, Copy)]
pub struct ColorScale {
    min: f64,
    max: f64,
}

impl ColorScale {
    /// Build a scale spanning the finite values of `values`.
    pub fn spanning<'a>(values: impl IntoIterator<Item = &'a f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            ColorScale { min: 0.0, max: 1.0 }
        } else {
            ColorScale { min, max }
        }
    }

    /// Lowest and highest value the scale spans.
    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Look up the colour for a value.
    pub fn color_for(&self, value: f64) -> RGBColor {
        let range = self.max - self.min;
        if range.abs() < f64::EPSILON {
            return viridis(0.5);
        }
        viridis((value - self.min) / range)
    }

    /// Dark text on the bright end of the scale, light text elsewhere.
    pub fn text_color_for(&self, value: f64) -> RGBColor {
        let RGBColor(r, g, b) = self.color_for(value);
        let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
        if luma > 140.0 {
            RGBColor(0, 0, 0)
        } else {
            RGBColor(255, 255, 255)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viridis_endpoints() {
        assert_eq!(viridis(0.0), RGBColor(0x44, 0x01, 0x54));
        assert_eq!(viridis(1.0), RGBColor(0xfd, 0xe7, 0x25));
        assert_eq!(viridis(0.5), RGBColor(0x21, 0x91, 0x8c));
        assert_eq!(viridis(-3.0), viridis(0.0));
        assert_eq!(viridis(f64::NAN), viridis(0.0));
    }

    #[test]
    fn test_palettes_have_requested_length() {
        for n in [0, 1, 4, 20] {
            assert_eq!(hue_palette(n).len(), n);
            assert_eq!(viridis_palette(n).len(), n);
            assert_eq!(palette(PaletteKind::Viridis, n).len(), n);
        }
        let hues = hue_palette(6);
        for (i, a) in hues.iter().enumerate() {
            for b in &hues[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_color_scale() {
        let scale = ColorScale::spanning(&[30000.0, 60000.0, f64::NAN]);
        assert_eq!(scale.color_for(30000.0), viridis(0.0));
        assert_eq!(scale.color_for(60000.0), viridis(1.0));
        assert_eq!(scale.text_color_for(60000.0), RGBColor(0, 0, 0));
        assert_eq!(scale.text_color_for(30000.0), RGBColor(255, 255, 255));

        assert_eq!(scale.bounds(), (30000.0, 60000.0));
        assert_eq!(ColorScale::spanning(std::iter::empty::<&f64>()).bounds(), (0.0, 1.0));

        let flat = ColorScale::spanning(&[5.0]);
        assert_eq!(flat.color_for(5.0), viridis(0.5));
    }

    #[test]
    fn test_css() {
        assert_eq!(css(&RGBColor(1, 2, 3)), "rgb(1, 2, 3)");
    }
}
