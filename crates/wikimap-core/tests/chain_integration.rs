//! End-to-end tests for block chains built from JSON, the way an editor sends them

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wikimap_core::{
    apply_transformation_chain, build_preview, BlockConfig, DiagnosticKind, Severity,
    TransformationBlock,
};

fn blocks(value: Value) -> Vec<TransformationBlock> {
    serde_json::from_value(value).expect("block list should parse")
}

fn omeka_item() -> Value {
    json!({
        "o:id": 1204,
        "o:title": "Allegory of Painting",
        "dcterms:creator": [
            {"type": "literal", "property_label": "Creator", "@value": "Johannes Vermeer"}
        ],
        "dcterms:date": [
            {"type": "numeric:timestamp", "@value": "1666"}
        ],
        "dcterms:publisher": {"o:label": "Kunsthistorisches Museum", "@id": "https://example.org/khm"}
    })
}

#[test]
fn test_doctor_title_scenario() {
    let chain = blocks(json!([
        {"id": "b3", "type": "findReplace", "config": {"find": " ", "replace": "_"}, "order": 3},
        {"id": "b1", "type": "prefix", "config": {"text": "Dr. "}, "order": 1},
        {"id": "b2", "type": "suffix", "config": {"text": ", PhD"}, "order": 2}
    ]));

    let trace = apply_transformation_chain("John Smith", &chain, None);
    let steps: Vec<(Option<&str>, &str)> = trace
        .steps
        .iter()
        .map(|s| (s.block_id.as_deref(), s.value.as_str()))
        .collect();

    assert_eq!(
        steps,
        vec![
            (None, "John Smith"),
            (Some("b1"), "Dr. John Smith"),
            (Some("b2"), "Dr. John Smith, PhD"),
            (Some("b3"), "Dr._John_Smith,_PhD"),
        ]
    );
}

#[test]
fn test_partial_configs_get_defaults() {
    let chain = blocks(json!([
        {"type": "regex", "config": {"pattern": "\\s+", "replacement": " "}},
        {"type": "compose"},
        {"type": "findReplace", "config": {"find": "VERMEER"}}
    ]));

    match &chain[0].config {
        BlockConfig::Regex(config) => assert_eq!(config.flags, "g"),
        other => panic!("unexpected config: {:?}", other),
    }

    let trace = apply_transformation_chain("Johannes   Vermeer", &chain, None);
    assert_eq!(trace.final_value(), "Johannes ");
}

#[test]
fn test_compose_against_item() {
    let chain = blocks(json!([
        {"type": "compose", "config": {
            "pattern": "{{value}}, {{field:dcterms:creator.0.@value}} ({{field:dcterms:date}}) {{wikidata:Q167654}}"
        }}
    ]));
    let item = omeka_item();

    let trace = apply_transformation_chain("The Art of Painting", &chain, Some(&item));
    assert_eq!(
        trace.final_value(),
        "The Art of Painting, Johannes Vermeer (1666) Q167654"
    );
}

#[test]
fn test_compose_own_source_wins_over_item() {
    let chain = blocks(json!([
        {"type": "compose", "config": {
            "pattern": "{{field:dcterms:publisher}}",
            "sourceData": {"dcterms:publisher": {"name": "Rijksmuseum"}}
        }}
    ]));
    let item = omeka_item();

    let trace = apply_transformation_chain("", &chain, Some(&item));
    assert_eq!(trace.final_value(), "Rijksmuseum");

    let without_own = blocks(json!([
        {"type": "compose", "config": {"pattern": "{{field:dcterms:publisher}}"}}
    ]));
    let trace = apply_transformation_chain("", &without_own, Some(&item));
    assert_eq!(trace.final_value(), "Kunsthistorisches Museum");
}

#[test]
fn test_broken_blocks_do_not_stop_the_chain() {
    let chain = blocks(json!([
        {"id": "bad-regex", "type": "regex", "config": {"pattern": "[", "flags": "gy"}, "order": 1},
        {"id": "future", "type": "transliterate", "config": {"script": "latin"}, "order": 2},
        {"id": "ok", "type": "suffix", "config": {"text": "."}, "order": 3}
    ]));

    let trace = apply_transformation_chain("abc", &chain, None);
    assert_eq!(trace.final_value(), "abc.");

    let kinds: Vec<(&str, DiagnosticKind, Severity)> = trace
        .diagnostics
        .iter()
        .map(|d| (d.block_id.as_str(), d.kind, d.severity))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("bad-regex", DiagnosticKind::DroppedFlags, Severity::Info),
            ("bad-regex", DiagnosticKind::InvalidPattern, Severity::Warning),
            ("future", DiagnosticKind::UnsupportedBlockType, Severity::Warning),
        ]
    );
}

#[test]
fn test_unsupported_block_survives_serialization() {
    let chain = blocks(json!([
        {"id": "future", "type": "transliterate", "config": {"script": "latin"}}
    ]));
    let written = serde_json::to_value(&chain).unwrap();
    assert_eq!(
        written,
        json!([{"id": "future", "type": "transliterate", "config": {"script": "latin"}}])
    );
}

#[test]
fn test_preview_over_chain() {
    let chain = blocks(json!([
        {"type": "regex", "config": {"pattern": "^(\\w+) (\\w+)$", "replacement": "$2, $1", "flags": "g"}},
        {"type": "findReplace", "config": {"find": "xyz", "replace": "abc"}}
    ]));

    let preview = build_preview("Johannes Vermeer", &chain, None);
    let labels: Vec<&str> = preview.steps.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Original", "Regular Expression", "Find & Replace"]);
    assert_eq!(preview.final_value, "Vermeer, Johannes");
    assert!(preview.steps[1].changed);
    assert!(!preview.steps[2].changed);

    let empty = build_preview("", &chain, None);
    assert!(empty.steps.is_empty());
    assert_eq!(empty.final_value, "");
}
