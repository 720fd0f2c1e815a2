//! Settings files.
//!
//! YAML is read through the `YamlRead` trait, which warns about keys that
//! were not recognized (usually typos).  Every section is optional.
//!
//! ```yaml
//! tolerances:
//!   collapse-match-distance: 0.25
//! matching:
//!   shift-steps: 4
//!   add-inversion: true
//! bonding:
//!   bond-radius: 1.8
//!   bond-ranges:
//!     - elements: [C, H]
//!       radius: 1.2
//! ```

use std::io::Read;
use std::fs::File;
use std::path::Path;

use failure::ResultExt;
use serde_derive::{Serialize, Deserialize};
use xtal_structure::{Tolerances, MatchOptions, BondRanges, Element};

use crate::FailResult;

/// Provides an alternative to serde_yaml::from_reader that reports unused keys.
pub trait YamlRead: for<'de> serde::Deserialize<'de> {
    fn from_reader(mut r: impl Read) -> Result<Self, serde_yaml::Error>
    { YamlRead::from_dyn_reader(&mut r) }

    fn from_dyn_reader(r: &mut dyn Read) -> Result<Self, serde_yaml::Error> {
        // serde_ignored needs a Deserializer, and serde_yaml::Value is one.
        Self::from_value(value_from_dyn_reader(r)?)
    }

    fn from_value(value: serde_yaml::Value) -> Result<Self, serde_yaml::Error>;
}

macro_rules! derive_yaml_read {
    ($Type:ty) => {
        impl YamlRead for $Type {
            fn from_value(value: serde_yaml::Value) -> Result<$Type, serde_yaml::Error> {
                serde_ignored::deserialize(
                    value,
                    |path| warn!("Unused config item (possible typo?): {}", path),
                )
            }
        }
    };
}

derive_yaml_read!{Settings}

fn value_from_dyn_reader(r: &mut dyn Read) -> Result<serde_yaml::Value, serde_yaml::Error>
{ serde_yaml::from_reader(r) }

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    #[serde(default)]
    pub tolerances: Tolerances,

    #[serde(default)]
    pub matching: MatchOptions,

    /// Needed only for molecule perception.
    #[serde(default)]
    pub bonding: Option<Bonding>,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Bonding {
    /// Bond length cutoff for element pairs without an entry in `bond-ranges`.
    /// Without it, such pairs are never bonded.
    #[serde(default)]
    pub bond_radius: Option<f64>,

    #[serde(default)]
    pub bond_ranges: Vec<PairRange>,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PairRange {
    /// Order doesn't matter.
    pub elements: [Element; 2],
    pub radius: f64,
}

impl Bonding {
    pub fn bond_ranges(&self) -> BondRanges {
        let mut ranges = BondRanges::new();
        ranges.set_default(self.bond_radius);
        for &PairRange { elements: [a, b], radius } in &self.bond_ranges {
            ranges.set_pair(a, b, radius);
        }
        ranges
    }
}

impl Settings {
    pub fn from_json(text: &str) -> FailResult<Settings>
    { serde_json::from_str(text).map_err(Into::into) }

    pub fn from_yaml(text: &str) -> FailResult<Settings>
    { Settings::from_reader(text.as_bytes()).map_err(Into::into) }

    /// Read a YAML file, or a JSON file if the extension is `.json`.
    pub fn load(path: impl AsRef<Path>) -> FailResult<Settings> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|e| format!("{}: could not open settings: {}", path.display(), e))?;
        let settings = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_reader(file)
                .with_context(|e| format!("{}: {}", path.display(), e))?,
            _ => Settings::from_reader(file)
                .with_context(|e| format!("{}: {}", path.display(), e))?,
        };
        debug!("read settings from {}", path.display());
        Ok(settings)
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use xtal_structure::BondPredicate;
    use xtal_structure::consts::{CARBON, HYDROGEN, OXYGEN};

    #[test]
    fn empty_document() {
        let settings = Settings::from_yaml("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn bonding() {
        let settings = Settings::from_yaml("
bonding:
  bond-radius: 1.6
  bond-ranges:
    - elements: [H, C]
      radius: 1.2
").unwrap();
        let ranges = settings.bonding.unwrap().bond_ranges();
        assert_eq!(ranges.get_range(CARBON, HYDROGEN), Some(1.2));
        assert_eq!(ranges.get_range(CARBON, OXYGEN), Some(1.6));
        assert!(ranges.is_bonded(CARBON, HYDROGEN, 1.1 * 1.1));
        assert!(!ranges.is_bonded(CARBON, HYDROGEN, 1.3 * 1.3));
    }
}
