use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::compare::DiffIndicator;

/// Banner, KPI card and bar colour (#FF0D0D).
pub const BRAND_RED: Color32 = Color32::from_rgb(0xFF, 0x0D, 0x0D);
/// Background of the refresh notice strip (#FFCCCB).
pub const NOTICE_PINK: Color32 = Color32::from_rgb(0xFF, 0xCC, 0xCB);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Green for up, red for down, gray for no change.
pub fn indicator_color(indicator: DiffIndicator) -> Color32 {
    match indicator {
        DiffIndicator::Up(_) => Color32::from_rgb(0x00, 0x80, 0x00),
        DiffIndicator::Down(_) => Color32::RED,
        DiffIndicator::Neutral => Color32::GRAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        let colours = generate_palette(10);
        assert_eq!(colours.len(), 10);
        assert_ne!(colours[0], colours[5]);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn indicator_colours_differ_per_branch() {
        assert_ne!(
            indicator_color(DiffIndicator::Up(1.0)),
            indicator_color(DiffIndicator::Down(1.0))
        );
        assert_eq!(indicator_color(DiffIndicator::Neutral), Color32::GRAY);
    }
}
