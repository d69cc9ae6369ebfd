use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// `n` distinct colours on evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let rgb: Srgb = Hsl::new(hue, 0.70, 0.55).into_color();
            Color32::from_rgb(
                (rgb.red * 255.0).round() as u8,
                (rgb.green * 255.0).round() as u8,
                (rgb.blue * 255.0).round() as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-file colours
// ---------------------------------------------------------------------------

/// One colour per distinct filename, shared by the bar charts, the series
/// plot and the file list so the same file looks the same everywhere.
#[derive(Debug, Clone, Default)]
pub struct FileColors {
    mapping: BTreeMap<String, Color32>,
}

impl FileColors {
    pub fn new<'a>(filenames: impl IntoIterator<Item = &'a str>) -> Self {
        let mut names: Vec<&str> = filenames.into_iter().collect();
        names.sort_unstable();
        names.dedup();
        let mapping = names
            .iter()
            .zip(generate_palette(names.len()))
            .map(|(name, color)| (name.to_string(), color))
            .collect();
        FileColors { mapping }
    }

    pub fn color_for(&self, filename: &str) -> Color32 {
        self.mapping.get(filename).copied().unwrap_or(Color32::GRAY)
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(5);
        assert_eq!(p.len(), 5);
        assert_ne!(p[0], p[1]);
    }

    #[test]
    fn duplicate_filenames_share_a_colour() {
        let colors = FileColors::new(["b.pssession", "a.pssession", "b.pssession"]);
        assert_eq!(colors.len(), 2);
        assert_ne!(colors.color_for("a.pssession"), colors.color_for("b.pssession"));
        assert_eq!(colors.color_for("unknown"), Color32::GRAY);
    }
}
