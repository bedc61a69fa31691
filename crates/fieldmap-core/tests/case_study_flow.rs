//! End-to-end tests over the case-study schema
//!
//! These tests walk the path a mapping takes in practice: classify the pair,
//! validate the saved configuration, map a record, benchmark the transformations
//! involved and export the analysis.

use fieldmap_core::compatibility::{recommended_fields, validate_mappings};
use fieldmap_core::export::{load_export, save_export};
use fieldmap_core::mapping::{missing_required, IssueKind};
use fieldmap_core::optimization::analyze_transformations;
use fieldmap_core::*;
use serde_json::{json, Map, Value};

fn notion_fields() -> FieldSet<SourceField> {
    FieldSet::new(
        "source",
        vec![
            SourceField::new(Field::new("name", "Name", FieldKind::Title)),
            SourceField::new(Field::new("summary", "Summary", FieldKind::RichText)),
            SourceField::new(Field::new("cover", "Cover", FieldKind::Files)),
            SourceField::new(Field::new("tags", "Tags", FieldKind::MultiSelect)),
            SourceField::new(Field::new("launched", "Launched", FieldKind::Date)),
        ],
    )
    .unwrap()
}

fn destinations() -> FieldSet<DestinationField> {
    FieldSet::new("destination", case_study_schema()).unwrap()
}

fn record(entries: Value) -> Map<String, Value> {
    entries.as_object().cloned().unwrap_or_default()
}

#[test]
fn test_rich_text_to_text_scenario() {
    let registry = TransformationRegistry::with_builtins().unwrap();
    let mut cache = TransformationCache::new();

    let result = classify(&registry, FieldKind::Text, FieldKind::RichText);
    assert_eq!(result.status, CompatibilityStatus::RequiresTransformation);
    assert_eq!(result.transformation_id.as_deref(), Some("rich_text_to_text"));

    let value = json!([{ "text": { "content": "Texto con formato" } }]);
    let text = registry.apply(
        &mut cache,
        FieldKind::RichText,
        FieldKind::Text,
        &value,
        &TransformOptions::new(),
    );
    assert_eq!(text, json!("Texto con formato"));
    assert_eq!(cache.len(), 1);

    // Second application is served by the cache
    registry.apply(&mut cache, FieldKind::RichText, FieldKind::Text, &value, &TransformOptions::new());
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn test_validate_and_map_record() {
    let registry = TransformationRegistry::with_builtins().unwrap();
    let mut cache = TransformationCache::new();
    let sources = notion_fields();
    let dests = destinations();

    let mappings = vec![
        FieldMapping::new("project_name", "name"),
        FieldMapping::new("description", "summary"),
        FieldMapping::new("hero_image", "cover"),
        FieldMapping::new("tagline", "tags"),
        FieldMapping::new("services", "launched"),
    ];

    let validations = validate_mappings(&registry, &sources, &dests, &mappings);
    let valid: Vec<bool> = validations.iter().map(MappingValidation::is_valid).collect();
    assert_eq!(valid, vec![true, true, true, true, false]);

    let engine = MappingEngine::new(&registry, &sources, &dests, &mappings);
    let mapped = engine.map_record(
        &mut cache,
        &record(json!({
            "name": "Rebrand 2024",
            "summary": [{ "text": { "content": "Nueva identidad" } }],
            "cover": [{ "name": "hero.png", "url": "https://cdn.example.com/hero.png" }],
            "tags": [{ "name": "Branding" }, { "name": "Web" }],
            "launched": { "start": "2024-03-01" }
        })),
    );

    assert_eq!(mapped.values["project_name"], json!("Rebrand 2024"));
    assert_eq!(mapped.values["description"], json!([{ "text": { "content": "Nueva identidad" } }]));
    assert_eq!(
        mapped.values["hero_image"],
        json!({ "url": "https://cdn.example.com/hero.png", "name": "hero.png" })
    );
    assert_eq!(mapped.values["tagline"], json!("Branding, Web"));
    assert!(!mapped.values.contains_key("services"));
    assert_eq!(mapped.issues.len(), 1);
    assert_eq!(mapped.issues[0].kind, IssueKind::Incompatible);
}

#[test]
fn test_missing_required_destination_fields() {
    let dests = destinations();
    let mappings = vec![FieldMapping::new("project_name", "name")];
    let missing: Vec<&str> = missing_required(&dests, &mappings)
        .iter()
        .map(|d| d.field.id.as_str())
        .collect();
    assert_eq!(missing, vec!["hero_image", "description"]);
}

#[test]
fn test_recommended_fields_for_tagline() {
    let registry = TransformationRegistry::with_builtins().unwrap();
    let sources = notion_fields();
    let dests = destinations();
    let tagline = dests.get("tagline").unwrap();

    let recommended = recommended_fields(&registry, &sources, tagline);
    let direct: Vec<&str> = recommended
        .directly_compatible
        .iter()
        .map(|s| s.field.id.as_str())
        .collect();
    let transformable: Vec<&str> = recommended
        .requires_transformation
        .iter()
        .map(|s| s.field.id.as_str())
        .collect();
    assert_eq!(direct, vec!["name"]);
    assert_eq!(transformable, vec!["summary", "cover", "tags", "launched"]);
    assert!(recommended.incompatible.is_empty());
}

#[test]
fn test_benchmark_analyze_and_export() {
    let registry = TransformationRegistry::with_builtins().unwrap();
    let mut cache = TransformationCache::new();

    let mut results = Vec::new();
    for id in ["rich_text_to_text", "date_to_text", "text_to_number"] {
        results.extend(run_comparative_benchmark(&registry, &mut cache, id, 3, 10).unwrap());
    }
    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|r| r.failure_count == 0));

    let stats = cache.stats();
    let summary = analyze(&results, &stats, &cache.settings());
    assert_eq!(summary.overall_performance.transformations_analyzed, 3);
    assert_eq!(summary.cache_stats.hits + summary.cache_stats.misses, 90);
    let improvements: Vec<f64> = summary.improvements.iter().map(|i| i.improvement).collect();
    assert!(improvements.windows(2).all(|pair| pair[0] >= pair[1]));

    // Every benchmarked transformation keeps its own lookup counters
    let analyses = analyze_transformations(&registry, &results, &stats);
    assert_eq!(analyses.len(), 3);
    for a in &analyses {
        assert_eq!(a.usage_count, 30, "{}", a.transformation_id);
        assert!(a.cache_efficiency > 0.0, "{}", a.transformation_id);
        assert!(a.optimization_potential > 0.0 || a.average_time_ms == 0.0);
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("benchmark.json");
    let content = export_results(&results, Some(&summary), ExportOptions::default()).unwrap();
    save_export(&path, &content).unwrap();

    let loaded = load_export(&path).unwrap();
    assert!(loaded.timestamp.is_some());
    let ids: Vec<&str> = loaded.benchmark_results.iter().map(|r| r.transformation_id.as_str()).collect();
    assert_eq!(ids, results.iter().map(|r| r.transformation_id.as_str()).collect::<Vec<_>>());
    let loaded_summary = loaded.optimization_summary.unwrap();
    assert_eq!(loaded_summary.improvements.len(), 3);
    assert_eq!(loaded_summary.recommendations.len(), summary.recommendations.len());
}
