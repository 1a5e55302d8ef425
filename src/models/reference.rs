use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-year sequential quote number, displayed as `2026-0042`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageReference {
    pub year: i32,
    pub sequence: u32,
}

impl PackageReference {
    pub fn new(year: i32, sequence: u32) -> Self {
        Self { year, sequence }
    }

    /// Key of the counter document holding the last sequence of `year`.
    pub fn counter_key(year: i32) -> String {
        format!("package_reference_{}", year)
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04}", self.year, self.sequence)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid package reference: {0}")]
pub struct ParseReferenceError(String);

impl FromStr for PackageReference {
    type Err = ParseReferenceError;

    /// Accepts only the displayed spelling: a four-digit year and a
    /// sequence of at least four digits without extra leading zeros.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseReferenceError(s.to_string());
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

        let raw = s.trim();
        let (year, sequence) = raw.split_once('-').ok_or_else(err)?;
        if year.len() != 4 || sequence.len() < 4 || !all_digits(year) || !all_digits(sequence) {
            return Err(err());
        }
        let year: i32 = year.parse().map_err(|_| err())?;
        let sequence: u32 = sequence.parse().map_err(|_| err())?;
        if sequence == 0 {
            return Err(err());
        }

        let reference = Self { year, sequence };
        if reference.to_string() != raw {
            return Err(err());
        }
        Ok(reference)
    }
}

impl Serialize for PackageReference {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageReference {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_sequence() {
        assert_eq!(PackageReference::new(2026, 7).to_string(), "2026-0007");
        assert_eq!(PackageReference::new(2026, 12345).to_string(), "2026-12345");
    }

    #[test]
    fn test_parse() {
        let reference: PackageReference = "2026-0042".parse().unwrap();
        assert_eq!(reference, PackageReference::new(2026, 42));

        assert!("2026-42".parse::<PackageReference>().is_err());
        assert!("26-0042".parse::<PackageReference>().is_err());
        assert!("2026-0000".parse::<PackageReference>().is_err());
        assert!("quote".parse::<PackageReference>().is_err());
    }

    #[test]
    fn test_parse_accepts_only_the_displayed_spelling() {
        for raw in ["2026-+123", "+026-0123", "2026-00123", "2026-0 12", "2026-١٢٣٤"] {
            assert!(raw.parse::<PackageReference>().is_err(), "{} accepted", raw);
        }
        assert_eq!(
            " 2026-12345 ".parse::<PackageReference>().unwrap(),
            PackageReference::new(2026, 12345)
        );

        let err = "2026-+123".parse::<PackageReference>().unwrap_err();
        assert_eq!(err.to_string(), "invalid package reference: 2026-+123");
    }

    #[test]
    fn test_ordering_is_year_then_sequence() {
        let mut refs = vec![
            PackageReference::new(2026, 2),
            PackageReference::new(2025, 900),
            PackageReference::new(2026, 1),
        ];
        refs.sort();
        assert_eq!(
            refs,
            vec![
                PackageReference::new(2025, 900),
                PackageReference::new(2026, 1),
                PackageReference::new(2026, 2),
            ]
        );
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&PackageReference::new(2026, 3)).unwrap();
        assert_eq!(json, "\"2026-0003\"");
        let back: PackageReference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PackageReference::new(2026, 3));
    }

    #[test]
    fn test_counter_key() {
        assert_eq!(PackageReference::counter_key(2026), "package_reference_2026");
    }
}
