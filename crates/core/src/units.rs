use serde::{Deserialize, Serialize};

/// Genomic length unit used for axis labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Bp,
    Kbp,
    #[default]
    Mbp,
}

impl Unit {
    pub fn divisor(self) -> f64 {
        match self {
            Unit::Bp => 1.0,
            Unit::Kbp => 1_000.0,
            Unit::Mbp => 1_000_000.0,
        }
    }

    /// Convert a base-pair value into this unit, rounded to `round_to` decimals.
    pub fn convert(self, value: f64, round_to: u32) -> f64 {
        let factor = 10f64.powi(round_to as i32);
        (value / self.divisor() * factor).round() / factor
    }

    /// Largest unit in which `span` base pairs is still more than one unit.
    pub fn for_span(span: f64) -> Unit {
        [Unit::Mbp, Unit::Kbp]
            .into_iter()
            .find(|unit| span / unit.divisor() > 1.0)
            .unwrap_or(Unit::Bp)
    }

    pub fn label(self) -> &'static str {
        match self {
            Unit::Bp => "bp",
            Unit::Kbp => "kbp",
            Unit::Mbp => "Mbp",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
