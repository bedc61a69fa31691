//! Tests for the transformation system
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use super::{built_in, TransformOptions, Transformation, TransformationBuilder, TransformationError, TransformationRegistry};
use crate::cache::TransformationCache;
use crate::types::{Complexity, FieldKind};
use crate::Error;
use serde_json::{json, Value};

fn run(transformation: Transformation, value: Value) -> Value {
    transformation.run(&value, &TransformOptions::new()).unwrap()
}

fn run_with(transformation: Transformation, value: Value, options: TransformOptions) -> Value {
    transformation.run(&value, &options).unwrap()
}

#[test]
fn test_every_builtin_matches_its_example() {
    for transformation in built_in::all() {
        let output = transformation
            .run(&transformation.example.source, &TransformOptions::new())
            .unwrap_or_else(|e| panic!("{} failed on its example: {}", transformation.id, e));
        assert_eq!(output, transformation.example.target, "example of {}", transformation.id);
    }
}

#[test]
fn test_builtin_ids_are_unique() {
    let all = built_in::all();
    let mut ids: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), all.len());
}

#[test]
fn test_rich_text_prefers_plain_text_and_strips_html() {
    let blocks = json!([
        { "plain_text": "Hola", "text": { "content": "ignored" } },
        { "text": { "content": "mundo" } },
        { "type": "mention" }
    ]);
    assert_eq!(run(built_in::rich_text_to_text(), blocks), json!("Hola mundo "));
    assert_eq!(
        run(built_in::rich_text_to_text(), json!("<p>Hola <b>mundo</b></p>")),
        json!("Hola mundo")
    );
    assert_eq!(run(built_in::rich_text_to_text(), Value::Null), json!(""));
}

#[test]
fn test_text_to_rich_text_shape() {
    let output = run(built_in::text_to_rich_text(), json!("Hola"));
    assert_eq!(output[0]["type"], json!("text"));
    assert_eq!(output[0]["text"]["content"], json!("Hola"));
    assert_eq!(output[0]["annotations"]["color"], json!("default"));
}

#[test]
fn test_select_like_values_degrade_gracefully() {
    assert_eq!(run(built_in::select_to_text(), Value::Null), json!(""));
    assert_eq!(run(built_in::select_to_text(), json!("Plain")), json!("Plain"));
    assert_eq!(run(built_in::multi_select_to_text(), json!([])), json!(""));
    assert_eq!(
        run(built_in::multi_select_to_text(), json!(["Uno", { "name": "Dos" }])),
        json!("Uno, Dos")
    );
    assert_eq!(run(built_in::multi_select_to_select(), json!([])), Value::Null);
    assert_eq!(run(built_in::select_to_multi_select(), Value::Null), json!([]));
}

#[test]
fn test_date_to_text_formats() {
    let t = || built_in::date_to_text();
    assert_eq!(
        run_with(
            t(),
            json!({ "start": "2023-05-15" }),
            TransformOptions::new().with("format", "%Y/%m/%d")
        ),
        json!("2023/05/15")
    );
    assert_eq!(
        run(t(), json!({ "start": "2023-05-15", "end": "2023-05-20" })),
        json!("15/05/2023 - 20/05/2023")
    );
    assert_eq!(run(t(), json!("2024-02-29T10:30:00Z")), json!("29/02/2024"));
    assert_eq!(run(t(), json!({ "start": "someday" })), json!("someday"));
    assert_eq!(run(t(), Value::Null), json!(""));
}

#[test]
fn test_date_to_text_rejects_bad_format_option() {
    let t = built_in::date_to_text();
    let err = t
        .run(&json!({ "start": "2023-05-15" }), &TransformOptions::new().with("format", 12))
        .unwrap_err();
    assert!(matches!(err, TransformationError::InvalidOption { ref option, .. } if option == "format"));

    let err = t
        .run(&json!({ "start": "2023-05-15" }), &TransformOptions::new().with("format", "%Q"))
        .unwrap_err();
    assert!(matches!(err, TransformationError::InvalidOption { .. }));
}

#[test]
fn test_number_and_checkbox_text() {
    assert_eq!(run(built_in::number_to_text(), json!(3.5)), json!("3.5"));
    assert_eq!(run(built_in::number_to_text(), json!(10.0)), json!("10"));
    assert_eq!(run(built_in::number_to_text(), Value::Null), json!(""));
    assert_eq!(run(built_in::checkbox_to_text(), json!(false)), json!("No"));
    assert_eq!(run(built_in::checkbox_to_text(), Value::Null), json!("No"));
}

#[test]
fn test_files_edge_cases() {
    let files = json!([
        { "name": "brief.pdf", "url": "https://example.com/brief.pdf" },
        { "name": "photo", "url": "https://example.com/photo.JPG?x=1" }
    ]);
    assert_eq!(run(built_in::files_to_file(), json!([])), Value::Null);
    assert_eq!(run(built_in::files_to_image(), files.clone()), Value::Null);
    assert_eq!(
        run_with(built_in::files_to_image(), files.clone(), TransformOptions::new().with("index", 1)),
        json!({ "url": "https://example.com/photo.JPG?x=1", "name": "photo" })
    );
    // Out-of-range index falls back to the last file
    assert_eq!(
        run_with(built_in::files_to_url(), files.clone(), TransformOptions::new().with("index", 9)),
        json!("https://example.com/photo.JPG?x=1")
    );
    assert_eq!(
        run_with(built_in::files_to_text(), files, TransformOptions::new().with("includeNames", false)),
        json!("https://example.com/brief.pdf, https://example.com/photo.JPG?x=1")
    );
    assert_eq!(run(built_in::files_to_url(), json!("not a list")), Value::Null);
}

#[test]
fn test_text_to_number_modes() {
    let t = || built_in::text_to_number();
    assert_eq!(run(t(), json!("€ 12.5 kg")), json!(12.5));
    assert_eq!(run(t(), json!("1,000")), json!(1000));
    assert_eq!(run(t(), json!("-3e2")), json!(-300));
    assert_eq!(run(t(), json!("abc")), json!(0));
    assert_eq!(run(t(), Value::Null), json!(0));
    assert_eq!(
        run_with(t(), json!("$1,234.56"), TransformOptions::new().with("parseMode", "integer")),
        json!(1234)
    );
    assert_eq!(
        run_with(t(), json!("n/a"), TransformOptions::new().with("fallback", Value::Null)),
        json!(0)
    );
    assert_eq!(
        run_with(t(), json!("n/a"), TransformOptions::new().with("fallback", -1)),
        json!(-1)
    );

    let err = t()
        .run(&json!("1"), &TransformOptions::new().with("parseMode", "hex"))
        .unwrap_err();
    assert!(matches!(err, TransformationError::InvalidOption { ref option, .. } if option == "parseMode"));
}

#[test]
fn test_text_to_date_formats() {
    let t = || built_in::text_to_date();
    assert_eq!(run(t(), json!("2023-05-15")), json!({ "start": "2023-05-15" }));
    assert_eq!(run(t(), json!("15-05-2023")), json!({ "start": "2023-05-15" }));
    assert_eq!(run(t(), json!("2023-05-15T23:10:00+02:00")), json!({ "start": "2023-05-15" }));
    assert_eq!(run(t(), json!("31/02/2023")), Value::Null);
    assert_eq!(run(t(), json!("")), Value::Null);
    assert_eq!(run(t(), json!(42)), Value::Null);
}

#[test]
fn test_text_to_multi_select_separator() {
    let t = || built_in::text_to_multi_select();
    assert_eq!(
        run_with(t(), json!("a; b;;c "), TransformOptions::new().with("separator", ";")),
        json!([{ "name": "a" }, { "name": "b" }, { "name": "c" }])
    );
    assert_eq!(run(t(), json!("")), json!([]));
    assert_eq!(run(t(), Value::Null), json!([]));
}

#[test]
fn test_checkbox_conversions() {
    for yes in ["true", "YES", " si ", "1", "Verdadero", "cierto"] {
        assert_eq!(run(built_in::text_to_checkbox(), json!(yes)), json!(true), "{}", yes);
    }
    for no in ["false", "no", "", "2"] {
        assert_eq!(run(built_in::text_to_checkbox(), json!(no)), json!(false), "{}", no);
    }
    assert_eq!(run(built_in::number_to_checkbox(), json!(0)), json!(false));
    assert_eq!(run(built_in::number_to_checkbox(), json!(-0.5)), json!(true));
    assert_eq!(run(built_in::number_to_checkbox(), json!("0")), json!(false));
    assert_eq!(run(built_in::number_to_checkbox(), Value::Null), json!(false));
}

#[test]
fn test_text_to_url_options() {
    let t = || built_in::text_to_url();
    assert_eq!(run(t(), json!("http://example.com/a")), json!("http://example.com/a"));
    assert_eq!(run(t(), json!("bad url with spaces")), Value::Null);
    assert_eq!(
        run_with(t(), json!("bad url"), TransformOptions::new().with("returnOriginal", true)),
        json!("bad url")
    );
    assert_eq!(
        run_with(t(), json!("example.com"), TransformOptions::new().with("addHttps", false)),
        Value::Null
    );
    assert_eq!(run(t(), Value::Null), Value::Null);
}

#[test]
fn test_formula_to_text_variants() {
    let t = || built_in::formula_to_text();
    assert_eq!(run(t(), json!({ "type": "string", "string": "hola" })), json!("hola"));
    assert_eq!(run(t(), json!({ "type": "boolean", "boolean": false })), json!("No"));
    assert_eq!(
        run(t(), json!({ "type": "date", "date": { "start": "2024-01-02" } })),
        json!("02/01/2024")
    );
    assert_eq!(run(t(), json!(7)), json!("7"));
}

#[test]
fn test_registry_rejects_overlaps() {
    let mut registry = TransformationRegistry::with_builtins().unwrap();
    let count = registry.len();

    let duplicate_id = built_in::select_to_text();
    assert!(matches!(registry.register(duplicate_id), Err(Error::Registration { .. })));

    let same_pair = TransformationBuilder::new("date_to_text_v2", FieldKind::Date, FieldKind::Text)
        .name("Date to text v2")
        .transform(|v, _| Ok(v.clone()))
        .example(json!(null), json!(null))
        .build()
        .unwrap();
    assert!(registry.register(same_pair).is_err());

    let direct = TransformationBuilder::new("title_passthrough", FieldKind::Title, FieldKind::Text)
        .name("Title passthrough")
        .transform(|v, _| Ok(v.clone()))
        .example(json!("a"), json!("a"))
        .build()
        .unwrap();
    let err = registry.register(direct).unwrap_err();
    assert!(err.to_string().contains("directly compatible"));

    assert_eq!(registry.len(), count);
}

#[test]
fn test_builder_requires_name_transform_and_example() {
    let missing_name = TransformationBuilder::new("x", FieldKind::Text, FieldKind::Number)
        .transform(|v, _| Ok(v.clone()))
        .example(json!(1), json!(1))
        .build();
    assert!(missing_name.is_err());

    let missing_transform = TransformationBuilder::new("x", FieldKind::Text, FieldKind::Number)
        .name("X")
        .example(json!(1), json!(1))
        .build();
    assert!(missing_transform.is_err());

    let built = TransformationBuilder::new("relation_count", FieldKind::Relation, FieldKind::Number)
        .name("Relation count")
        .complexity(Complexity::Medium)
        .not_benchmarkable()
        .transform(|v, _| Ok(json!(v.as_array().map_or(0, Vec::len))))
        .example(json!([{ "id": "a" }, { "id": "b" }]), json!(2))
        .build()
        .unwrap();
    assert!(!built.benchmarkable);
    assert_eq!(built.estimated_complexity, Complexity::Medium);
    assert_eq!(run(built.clone(), built.example.source.clone()), json!(2));
}

#[test]
fn test_apply_equal_kinds_skips_cache() {
    let registry = TransformationRegistry::with_builtins().unwrap();
    let mut cache = TransformationCache::new();
    let value = json!([{ "name": "a.png", "url": "https://example.com/a.png" }]);

    let output = registry.apply(&mut cache, FieldKind::Files, FieldKind::Files, &value, &TransformOptions::new());
    assert_eq!(output, value);
    assert_eq!(cache.stats().lookups(), 0);
}

#[test]
fn test_apply_missing_transformation_returns_input() {
    let registry = TransformationRegistry::with_builtins().unwrap();
    let mut cache = TransformationCache::new();
    let value = json!(true);
    let output = registry.apply(&mut cache, FieldKind::Checkbox, FieldKind::Image, &value, &TransformOptions::new());
    assert_eq!(output, value);
    assert!(cache.is_empty());
}

#[test]
fn test_apply_uses_cache() {
    let registry = TransformationRegistry::with_builtins().unwrap();
    let mut cache = TransformationCache::new();
    let value = json!({ "name": "Diseño" });
    let options = TransformOptions::new();

    for _ in 0..3 {
        let output = registry.apply(&mut cache, FieldKind::Select, FieldKind::Text, &value, &options);
        assert_eq!(output, json!("Diseño"));
    }
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (2, 1, 1));
}

#[test]
fn test_apply_isolates_failures() {
    let mut registry = TransformationRegistry::new();
    registry
        .register(
            TransformationBuilder::new("always_fails", FieldKind::Rollup, FieldKind::Number)
                .name("Always fails")
                .transform(|_, _| {
                    Err(TransformationError::Rejected {
                        message: "nope".to_string(),
                    })
                })
                .example(json!(1), json!(1))
                .build()
                .unwrap(),
        )
        .unwrap();
    let mut cache = TransformationCache::new();
    let value = json!({ "rollup": 1 });

    let output = registry.apply(&mut cache, FieldKind::Rollup, FieldKind::Number, &value, &TransformOptions::new());
    assert_eq!(output, value);
    assert!(cache.is_empty());

    let err = registry
        .try_apply_by_id(&mut cache, "always_fails", &value, &TransformOptions::new())
        .unwrap_err();
    assert!(matches!(err, Error::Transformation { ref id, .. } if id == "always_fails"));
    assert!(matches!(
        registry.try_apply_by_id(&mut cache, "missing", &value, &TransformOptions::new()),
        Err(Error::TransformationNotFound { .. })
    ));
}

#[test]
fn test_apply_by_id_unknown_returns_input() {
    let registry = TransformationRegistry::with_builtins().unwrap();
    let mut cache = TransformationCache::new();
    let value = json!("x");
    assert_eq!(
        registry.apply_by_id(&mut cache, "nope", &value, &TransformOptions::new()),
        value
    );
}

#[test]
fn test_preview_truncates_long_values() {
    let long = json!("é".repeat(300));
    let preview = super::registry::preview(&long);
    assert!(preview.ends_with("..."));
    assert_eq!(preview.chars().count(), 103);
}
