use std::str::FromStr;

use palette::{Hsl, IntoColor, Srgb};

/// Default line colours, assigned round-robin.
pub const DEFAULT_COLORS: [&str; 7] = [
    "#0072BD", "#D95319", "#EDB120", "#7E2F8E", "#77AC30", "#4DBEEE", "#A2142F",
];

// ---------------------------------------------------------------------------
// Palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Srgb<u8>> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Palette: series index → colour
// ---------------------------------------------------------------------------

/// Ordered line colours; series `i` gets colour `i % len`.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Srgb<u8>>,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            colors: DEFAULT_COLORS
                .iter()
                .filter_map(|hex| Srgb::<u8>::from_str(hex).ok())
                .collect(),
        }
    }
}

impl Palette {
    /// Build a palette from `#RRGGBB` strings. Fails on the first bad entry
    /// or on an empty list.
    pub fn from_hex<S: AsRef<str>>(hex: &[S]) -> Result<Self, String> {
        let colors = hex
            .iter()
            .map(|h| parse_hex(h.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if colors.is_empty() {
            return Err("palette needs at least one colour".to_string());
        }
        Ok(Palette { colors })
    }

    /// `n` evenly spaced hues (at least one).
    pub fn generated(n: usize) -> Self {
        Palette {
            colors: generate_palette(n.max(1)),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colour for the series at `index`, cycling after the last entry.
    pub fn color_for(&self, index: usize) -> Srgb<u8> {
        if self.colors.is_empty() {
            return Srgb::new(0x80, 0x80, 0x80);
        }
        self.colors[index % self.colors.len()]
    }
}

/// Parse `#RRGGBB` or `RRGGBB`. Exactly six hex digits are required.
pub fn parse_hex(hex: &str) -> Result<Srgb<u8>, String> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("bad colour '{hex}': expected #RRGGBB"));
    }
    Srgb::<u8>::from_str(digits).map_err(|e| format!("bad colour '{hex}': {e}"))
}

/// `#RRGGBB` form of a colour.
pub fn to_hex(color: Srgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", color.red, color.green, color.blue)
}

/// `0xRRGGBB` form used by spreadsheet writers.
pub fn to_rgb_u32(color: Srgb<u8>) -> u32 {
    (u32::from(color.red) << 16) | (u32::from(color.green) << 8) | u32::from(color.blue)
}
