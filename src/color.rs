use std::collections::{BTreeMap, BTreeSet};

use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Label;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct pastel colours using evenly spaced hues,
/// as CSS hex strings.
pub fn generate_palette(n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.85);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: label → CSS colour
// ---------------------------------------------------------------------------

/// Maps the distinct labels of a result table to distinct cell colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<Label, String>,
    default_color: String,
}

impl ColorMap {
    /// Build a colour map from the distinct labels, in sorted order.
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a Label>) -> Self {
        let unique: BTreeSet<&Label> = labels.into_iter().collect();
        let palette = generate_palette(unique.len());
        let mapping = unique
            .into_iter()
            .cloned()
            .zip(palette)
            .collect();

        ColorMap {
            mapping,
            default_color: "#e0e0e0".to_string(),
        }
    }

    /// Look up the colour for a given label.
    pub fn color_for(&self, label: &Label) -> &str {
        self.mapping
            .get(label)
            .map_or(self.default_color.as_str(), String::as_str)
    }

    /// Legend entries (label text → colour).
    pub fn legend_entries(&self) -> Vec<(String, &str)> {
        self.mapping
            .iter()
            .map(|(label, color)| (label.to_string(), color.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_distinct_hex() {
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        assert!(colors.iter().all(|c| c.len() == 7 && c.starts_with('#')));
        let unique: BTreeSet<_> = colors.iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn same_labels_get_same_colors_regardless_of_order() {
        let a = [Label::Integer(1), Label::Integer(0), Label::Integer(1)];
        let b = [Label::Integer(0), Label::Integer(1)];
        let (ma, mb) = (ColorMap::new(&a), ColorMap::new(&b));

        assert_eq!(ma.color_for(&a[0]), mb.color_for(&b[1]));
        assert_ne!(ma.color_for(&b[0]), ma.color_for(&b[1]));
        assert_eq!(ma.legend_entries().len(), 2);
    }

    #[test]
    fn unknown_label_uses_default() {
        let map = ColorMap::new(&[Label::Integer(0)]);
        assert_eq!(map.color_for(&Label::from("other")), "#e0e0e0");
    }
}
