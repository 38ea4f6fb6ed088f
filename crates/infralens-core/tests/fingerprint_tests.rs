//! Fingerprint Determinism Tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

use infralens_core::classify::classify;
use infralens_core::config::{Language, NarrativeConfig};
use infralens_core::model::{Action, ChangeSet, ResourceChange, StackChange};
use infralens_core::parse::parse_diff_bytes;
use infralens_core::Fingerprint;

fn change_set(stack_order: &[&str]) -> ChangeSet {
    let mut cs = ChangeSet::new();
    for name in stack_order {
        let mut stack = StackChange::new(*name, []);
        stack
            .add_resource(ResourceChange::new("R", "AWS::S3::Bucket", [Action::Create]).unwrap())
            .unwrap();
        cs.add_stack(stack).unwrap();
    }
    cs
}

#[test]
fn test_identical_input_identical_fingerprint() {
    let bytes = br#"{ "stacks": { "B": { "update": true }, "A": { "resources": { "K": { "type": "AWS::KMS::Key", "replace": true } } } } }"#;
    let config = NarrativeConfig::default();

    let mut first = parse_diff_bytes(bytes).unwrap();
    let mut second = parse_diff_bytes(bytes).unwrap();
    classify(&mut first);
    classify(&mut second);

    assert_eq!(
        Fingerprint::compute(&first, &config).unwrap(),
        Fingerprint::compute(&second, &config).unwrap()
    );
}

#[test]
fn test_stack_order_changes_fingerprint() {
    let config = NarrativeConfig::default();
    assert_ne!(
        Fingerprint::compute(&change_set(&["A", "B"]), &config).unwrap(),
        Fingerprint::compute(&change_set(&["B", "A"]), &config).unwrap()
    );
}

#[test]
fn test_language_changes_fingerprint() {
    let cs = change_set(&["A"]);
    let fingerprints: std::collections::HashSet<Fingerprint> = Language::ALL
        .iter()
        .map(|language| {
            let config = NarrativeConfig {
                language: *language,
                ..NarrativeConfig::default()
            };
            Fingerprint::compute(&cs, &config).unwrap()
        })
        .collect();
    assert_eq!(fingerprints.len(), Language::ALL.len());
}

#[test]
fn test_fingerprint_is_lowercase_hex() {
    let fp = Fingerprint::compute(&change_set(&["A"]), &NarrativeConfig::default()).unwrap();
    assert_eq!(fp.as_str().len(), 64);
    assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(fp.to_string(), fp.as_str());
}
