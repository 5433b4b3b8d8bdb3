//! Process-wide color tables.

use std::collections::HashMap;
use std::sync::LazyLock;

use cenplot_protocol::Color;

/// Fallback for categories without an assigned color.
pub const UNKNOWN_COLOR: Color = Color::GRAY;

const MONOMER_COLORS: [(u32, Color); 28] = [
    (1, Color::from_rgb8(0xA8, 0x27, 0x5C)),
    (2, Color::from_rgb8(0xD6, 0x6C, 0x54)),
    (3, Color::from_rgb8(0xC6, 0x62, 0x5D)),
    (4, Color::from_rgb8(0xF4, 0xDC, 0x78)),
    (5, Color::from_rgb8(0x7E, 0xC0, 0xB3)),
    (6, Color::from_rgb8(0xA8, 0x27, 0x5C)),
    (7, Color::from_rgb8(0x8C, 0xC4, 0x9F)),
    (8, Color::from_rgb8(0x89, 0x3F, 0x89)),
    (9, Color::from_rgb8(0x65, 0x65, 0xAA)),
    (10, Color::from_rgb8(0x9A, 0xC7, 0x8A)),
    (11, Color::from_rgb8(0xA5, 0x3D, 0x63)),
    (12, Color::from_rgb8(0x39, 0x97, 0xC6)),
    (13, Color::from_rgb8(0x29, 0xA3, 0xCE)),
    (14, Color::from_rgb8(0x5E, 0xB2, 0xA7)),
    (15, Color::from_rgb8(0x38, 0xA4, 0x9B)),
    (16, Color::from_rgb8(0x45, 0xB4, 0xCE)),
    (17, Color::from_rgb8(0xA5, 0x3D, 0x63)),
    (18, Color::from_rgb8(0xAA, 0x1B, 0x63)),
    (19, Color::from_rgb8(0x3F, 0x66, 0xA0)),
    (20, Color::from_rgb8(0xBF, 0xDD, 0x97)),
    (21, Color::from_rgb8(0xC0, 0xD8, 0x75)),
    (22, Color::from_rgb8(0xE5, 0xE5, 0x7A)),
    (24, Color::from_rgb8(0xB7, 0x53, 0x61)),
    (26, Color::from_rgb8(0xF9, 0xE1, 0x93)),
    (30, Color::from_rgb8(0xE5, 0xD1, 0xA1)),
    (32, Color::from_rgb8(0xA1, 0xB5, 0xE5)),
    (34, Color::from_rgb8(0x9F, 0x68, 0xA5)),
    (35, Color::from_rgb8(0x81, 0xB2, 0x5B)),
];

static MONOMER_PALETTE: LazyLock<HashMap<u32, Color>> =
    LazyLock::new(|| MONOMER_COLORS.into_iter().collect());

/// Color for a monomer count, if the palette defines one.
pub fn monomer_color(mer: u32) -> Option<Color> {
    MONOMER_PALETTE.get(&mer).copied()
}

const IDENTITY_COLORS: [Color; 12] = [
    Color::from_rgb8(0x4b, 0x39, 0x91),
    Color::from_rgb8(0x29, 0x74, 0xaf),
    Color::from_rgb8(0x4a, 0x9d, 0xa8),
    Color::from_rgb8(0x57, 0xb8, 0x94),
    Color::from_rgb8(0x9d, 0xd8, 0x93),
    Color::from_rgb8(0xe1, 0xf6, 0x86),
    Color::from_rgb8(0xff, 0xff, 0xb2),
    Color::from_rgb8(0xfd, 0xda, 0x79),
    Color::from_rgb8(0xfb, 0x9e, 0x4f),
    Color::from_rgb8(0xee, 0x56, 0x34),
    Color::from_rgb8(0xc9, 0x27, 0x3e),
    Color::from_rgb8(0x8a, 0x00, 0x33),
];

/// Identity at which the fine-grained buckets begin.
pub const IDENTITY_CUTOFF: f64 = 97.5;
/// Width of each fine-grained bucket above the cutoff.
pub const IDENTITY_INCREMENT: f64 = 0.25;

/// A half-open identity range `[start, end)`; the last bucket also holds `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentityBucket {
    pub start: f64,
    pub end: f64,
    pub color: Color,
}

/// The 12 default identity ranges covering `[0, 100]`.
pub static IDENTITY_BUCKETS: LazyLock<Vec<IdentityBucket>> = LazyLock::new(|| {
    let fine = (0..10).map(|i| {
        let start = IDENTITY_CUTOFF + f64::from(i) * IDENTITY_INCREMENT;
        (start, start + IDENTITY_INCREMENT)
    });
    [(0.0, 90.0), (90.0, IDENTITY_CUTOFF)]
        .into_iter()
        .chain(fine)
        .zip(IDENTITY_COLORS)
        .map(|((start, end), color)| IdentityBucket { start, end, color })
        .collect()
});

/// Index of the bucket containing `value`, if it lies within `[0, 100]`.
pub fn identity_bucket(value: f64) -> Option<usize> {
    let last = IDENTITY_BUCKETS.len().checked_sub(1)?;
    IDENTITY_BUCKETS.iter().enumerate().position(|(i, b)| {
        value >= b.start && (value < b.end || (i == last && value <= b.end))
    })
}

/// Color of the bucket containing `value`.
pub fn identity_color(value: f64) -> Option<Color> {
    identity_bucket(value).map(|i| IDENTITY_BUCKETS[i].color)
}

/// First bucket overlapping the half-open range `[lo, hi)`.
pub fn identity_bucket_overlapping(lo: f64, hi: f64) -> Option<usize> {
    IDENTITY_BUCKETS
        .iter()
        .position(|b| lo < b.end && b.start < hi)
}

const CATEGORICAL: [Color; 10] = [
    Color::from_rgb8(0x1f, 0x77, 0xb4),
    Color::from_rgb8(0xff, 0x7f, 0x0e),
    Color::from_rgb8(0x2c, 0xa0, 0x2c),
    Color::from_rgb8(0xd6, 0x27, 0x28),
    Color::from_rgb8(0x94, 0x67, 0xbd),
    Color::from_rgb8(0x8c, 0x56, 0x4b),
    Color::from_rgb8(0xe3, 0x77, 0xc2),
    Color::from_rgb8(0x7f, 0x7f, 0x7f),
    Color::from_rgb8(0xbc, 0xbd, 0x22),
    Color::from_rgb8(0x17, 0xbe, 0xcf),
];

/// Deterministic color for the `index`-th distinct category.
pub fn categorical_color(index: usize) -> Color {
    CATEGORICAL[index % CATEGORICAL.len()]
}

/// Assigns categorical colors to names in first-seen order.
#[derive(Debug, Default)]
pub struct CategoricalPalette {
    assigned: HashMap<String, Color>,
}

impl CategoricalPalette {
    pub fn color_for(&mut self, name: &str) -> Color {
        if let Some(color) = self.assigned.get(name) {
            return *color;
        }
        let color = categorical_color(self.assigned.len());
        self.assigned.insert(name.to_string(), color);
        color
    }
}
