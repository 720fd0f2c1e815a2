use pretty_assertions::assert_eq;

use xtal::config::Settings;
use xtal::consts::{CARBON, HYDROGEN, NITROGEN, OXYGEN};
use xtal::{MatchOptions, Tolerances};

#[test]
fn yaml_and_json_agree() {
    let yaml = Settings::load("tests/resources/settings.yaml").unwrap();
    let json = Settings::load("tests/resources/settings.json").unwrap();
    assert_eq!(yaml, json);
}

#[test]
fn unspecified_values_keep_defaults() {
    let settings = Settings::load("tests/resources/settings.yaml").unwrap();
    assert_eq!(settings.tolerances, Tolerances {
        collapse_match_distance: 0.25,
        drift_mismatch_distance2: 16.0,
        ..Tolerances::default()
    });
    assert_eq!(settings.matching, MatchOptions {
        shift_steps: 4,
        add_inversion: true,
        correct_floating_axes: false,
    });

    let ranges = settings.bonding.unwrap().bond_ranges();
    assert_eq!(ranges.get_range(HYDROGEN, OXYGEN), Some(1.1));
    assert_eq!(ranges.get_range(HYDROGEN, CARBON), Some(1.2));
    assert_eq!(ranges.get_range(CARBON, NITROGEN), Some(1.8));
}

#[test]
fn unknown_keys_are_not_fatal() {
    let settings = Settings::from_yaml("
matching:
  shift-step: 3
").unwrap();
    assert_eq!(settings.matching, MatchOptions::default());
    assert!(settings.bonding.is_none());
}

#[test]
fn bad_values_are_errors() {
    assert!(Settings::from_yaml("matching: {shift-steps: many}").is_err());
    assert!(Settings::from_json(r#"{"bonding": {"bond-ranges": [{"elements": ["Xx", "H"], "radius": 1}]}}"#).is_err());
}

#[test]
fn load_errors_name_the_file() {
    let err = Settings::load("tests/resources/no-such-settings.yaml").unwrap_err();
    assert!(err.to_string().contains("no-such-settings.yaml"));

    let err = Settings::load("tests/resources/not-settings.json").unwrap_err();
    assert!(err.to_string().contains("not-settings.json"));
}
