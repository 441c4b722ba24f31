//! Unit system for probe programs
//!
//! Probe sequences are authored in either millimeters or inches; the unit
//! choice selects the G-code units word (`G21`/`G20`) and is carried through
//! parse results so an importing UI can restore it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Measurement units for a probe program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Millimeters (metric)
    Mm,
    /// Inches (imperial)
    Inch,
}

impl Default for Units {
    fn default() -> Self {
        Self::Mm
    }
}

impl Units {
    /// The G-code word that selects this unit system
    pub fn gcode_word(&self) -> &'static str {
        match self {
            Self::Mm => "G21",
            Self::Inch => "G20",
        }
    }

    /// Convert a value from one unit system to another
    ///
    /// Returns the value unchanged when `from == to`.
    pub fn convert(value: f64, from: Units, to: Units) -> f64 {
        match (from, to) {
            (Units::Mm, Units::Inch) => value / 25.4,
            (Units::Inch, Units::Mm) => value * 25.4,
            _ => value,
        }
    }

    /// Short label for display ("mm" or "in")
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mm => "mm",
            Self::Inch => "in",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mm" | "metric" | "millimeters" => Ok(Self::Mm),
            "inch" | "in" | "imperial" | "inches" => Ok(Self::Inch),
            _ => Err(format!("Unknown unit system: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcode_words() {
        assert_eq!(Units::Mm.gcode_word(), "G21");
        assert_eq!(Units::Inch.gcode_word(), "G20");
    }

    #[test]
    fn test_conversion() {
        assert_eq!(Units::convert(25.4, Units::Mm, Units::Inch), 1.0);
        assert_eq!(Units::convert(1.0, Units::Inch, Units::Mm), 25.4);
        assert_eq!(Units::convert(10.0, Units::Mm, Units::Mm), 10.0);
    }

    #[test]
    fn test_parse() {
        assert_eq!("mm".parse::<Units>().unwrap(), Units::Mm);
        assert_eq!("Inch".parse::<Units>().unwrap(), Units::Inch);
        assert!("furlong".parse::<Units>().is_err());
    }
}
