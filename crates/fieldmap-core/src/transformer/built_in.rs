//! Built-in transformations between field kinds
//!
//! Each public function returns a ready-to-register [`Transformation`]. Values
//! follow the Notion property shapes: rich text is an array of blocks with
//! `plain_text` or `text.content`, selects are `{ "name": .. }` objects, dates are
//! `{ "start": "YYYY-MM-DD" }` and files are `{ "name", "url" }` objects.
//!
//! Every function here is total over its source kind: unexpected shapes
//! produce an empty or default value instead of an error.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use super::types::{TransformExample, TransformOptions, TransformResult, Transformation, TransformFn, TransformationError};
use crate::types::{Complexity, FieldKind, PerformanceImpact};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::{json, Map, Number, Value};
use std::fmt::Write;
use std::sync::OnceLock;

static HTML_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static NUMERIC_PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_SCHEME_REGEX: OnceLock<Regex> = OnceLock::new();

const IMAGE_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp"];
const TRUE_WORDS: [&str; 7] = ["true", "yes", "sí", "si", "1", "verdadero", "cierto"];
const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Every built-in transformation, in registration order
pub fn all() -> Vec<Transformation> {
    vec![
        rich_text_to_text(),
        text_to_rich_text(),
        multi_select_to_text(),
        select_to_text(),
        date_to_text(),
        number_to_text(),
        checkbox_to_text(),
        files_to_file(),
        files_to_text(),
        files_to_image(),
        text_to_number(),
        text_to_date(),
        text_to_multi_select(),
        text_to_select(),
        rich_text_to_multi_select(),
        number_to_checkbox(),
        text_to_checkbox(),
        text_to_url(),
        url_to_text(),
        files_to_url(),
        select_to_multi_select(),
        multi_select_to_select(),
        status_to_text(),
        email_to_text(),
        phone_number_to_text(),
        formula_to_text(),
    ]
}

#[allow(clippy::too_many_arguments)]
fn define(
    id: &str,
    source_kind: FieldKind,
    target_kind: FieldKind,
    name: &str,
    description: &str,
    performance_impact: PerformanceImpact,
    estimated_complexity: Complexity,
    transform: TransformFn,
    example: (Value, Value),
) -> Transformation {
    Transformation {
        id: id.to_string(),
        source_kind,
        target_kind,
        name: name.to_string(),
        description: description.to_string(),
        performance_impact,
        estimated_complexity,
        benchmarkable: true,
        transform,
        example: TransformExample {
            source: example.0,
            target: example.1,
        },
    }
}

// ---------------------------------------------------------------------------
// Text extraction
// ---------------------------------------------------------------------------

/// Rich text blocks to plain text
pub fn rich_text_to_text() -> Transformation {
    define(
        "rich_text_to_text",
        FieldKind::RichText,
        FieldKind::Text,
        "Rich text to text",
        "Converts formatted text to plain text",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| Ok(Value::String(plain_text(value))),
        (json!([{ "text": { "content": "Texto con formato" } }]), json!("Texto con formato")),
    )
}

/// Plain text to a single rich text block
pub fn text_to_rich_text() -> Transformation {
    define(
        "text_to_rich_text",
        FieldKind::Text,
        FieldKind::RichText,
        "Text to rich text",
        "Wraps plain text in a rich text block with default annotations",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| Ok(rich_text_block(&display_string(value))),
        (json!("Texto simple"), rich_text_block("Texto simple")),
    )
}

/// Multi-select options to comma-separated text
pub fn multi_select_to_text() -> Transformation {
    define(
        "multi_select_to_text",
        FieldKind::MultiSelect,
        FieldKind::Text,
        "Multi-select to text",
        "Joins selected options into comma-separated text",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| {
            let text = match value {
                Value::Array(items) => items.iter().map(option_name).collect::<Vec<_>>().join(", "),
                other => display_string(other),
            };
            Ok(Value::String(text))
        },
        (json!([{ "name": "Diseño" }, { "name": "Web" }]), json!("Diseño, Web")),
    )
}

/// Selected option to its name
pub fn select_to_text() -> Transformation {
    define(
        "select_to_text",
        FieldKind::Select,
        FieldKind::Text,
        "Select to text",
        "Converts a selected option to its name",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| Ok(Value::String(option_name(value))),
        (json!({ "name": "Diseño" }), json!("Diseño")),
    )
}

/// Status option to its name
pub fn status_to_text() -> Transformation {
    define(
        "status_to_text",
        FieldKind::Status,
        FieldKind::Text,
        "Status to text",
        "Converts a status option to its name",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| Ok(Value::String(option_name(value))),
        (json!({ "name": "En progreso" }), json!("En progreso")),
    )
}

/// Date property to formatted text
///
/// Option `format` is a chrono format string (default `%d/%m/%Y`).
pub fn date_to_text() -> Transformation {
    define(
        "date_to_text",
        FieldKind::Date,
        FieldKind::Text,
        "Date to text",
        "Formats a date as text",
        PerformanceImpact::Low,
        Complexity::Low,
        transform_date_to_text,
        (json!({ "start": "2023-05-15" }), json!("15/05/2023")),
    )
}

fn transform_date_to_text(value: &Value, options: &TransformOptions) -> TransformResult<Value> {
    let items = date_format_items(options.str_or("format", DEFAULT_DATE_FORMAT)?)?;
    let render = |raw: &Value| -> Option<String> {
        let date = date_from_value(raw)?;
        let mut out = String::new();
        // Items needing a time or offset fail to render for a bare date
        write!(out, "{}", date.format_with_items(items.iter())).ok()?;
        Some(out)
    };

    let text = match value {
        Value::Null => String::new(),
        Value::Object(map) if map.contains_key("start") => {
            let start = map.get("start").unwrap_or(&Value::Null);
            match (render(start), map.get("end").and_then(render)) {
                (Some(start), Some(end)) => format!("{} - {}", start, end),
                (Some(start), None) => start,
                (None, _) => display_string(start),
            }
        }
        other => render(other).unwrap_or_else(|| display_string(other)),
    };
    Ok(Value::String(text))
}

/// Number to its textual representation
pub fn number_to_text() -> Transformation {
    define(
        "number_to_text",
        FieldKind::Number,
        FieldKind::Text,
        "Number to text",
        "Converts a number to its text representation",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| Ok(Value::String(display_string(value))),
        (json!(42), json!("42")),
    )
}

/// Checkbox to "Sí" / "No"
pub fn checkbox_to_text() -> Transformation {
    define(
        "checkbox_to_text",
        FieldKind::Checkbox,
        FieldKind::Text,
        "Checkbox to text",
        "Converts a boolean to \"Sí\" or \"No\"",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| Ok(Value::String(if truthy(value) { "Sí" } else { "No" }.to_string())),
        (json!(true), json!("Sí")),
    )
}

/// URL to plain text
pub fn url_to_text() -> Transformation {
    define(
        "url_to_text",
        FieldKind::Url,
        FieldKind::Text,
        "URL to text",
        "Converts a URL to plain text",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| Ok(Value::String(display_string(value))),
        (json!("https://example.com"), json!("https://example.com")),
    )
}

/// Email to plain text
pub fn email_to_text() -> Transformation {
    define(
        "email_to_text",
        FieldKind::Email,
        FieldKind::Text,
        "Email to text",
        "Converts an email address to plain text",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| Ok(Value::String(display_string(value))),
        (json!("hola@example.com"), json!("hola@example.com")),
    )
}

/// Phone number to plain text
pub fn phone_number_to_text() -> Transformation {
    define(
        "phone_number_to_text",
        FieldKind::PhoneNumber,
        FieldKind::Text,
        "Phone number to text",
        "Converts a phone number to plain text",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| Ok(Value::String(display_string(value))),
        (json!("+34 600 000 000"), json!("+34 600 000 000")),
    )
}

/// Formula result to text
///
/// Formula values carry their result under the key named by `type`.
pub fn formula_to_text() -> Transformation {
    define(
        "formula_to_text",
        FieldKind::Formula,
        FieldKind::Text,
        "Formula to text",
        "Converts a computed formula result to text",
        PerformanceImpact::Low,
        Complexity::Medium,
        |value, _| {
            let result = value
                .get("type")
                .and_then(Value::as_str)
                .and_then(|kind| value.get(kind))
                .unwrap_or(value);
            let text = match result {
                Value::Object(map) if map.contains_key("start") => {
                    transform_date_to_text(result, &TransformOptions::new())?
                        .as_str()
                        .unwrap_or_default()
                        .to_string()
                }
                Value::Bool(b) => if *b { "Sí" } else { "No" }.to_string(),
                other => display_string(other),
            };
            Ok(Value::String(text))
        },
        (json!({ "type": "number", "number": 42 }), json!("42")),
    )
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// First file of a collection
pub fn files_to_file() -> Transformation {
    define(
        "files_to_file",
        FieldKind::Files,
        FieldKind::Files,
        "Files to single file",
        "Keeps only the first file of a collection",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| {
            Ok(value
                .as_array()
                .and_then(|files| files.first())
                .cloned()
                .unwrap_or(Value::Null))
        },
        (
            json!([
                { "name": "imagen1.jpg", "url": "https://example.com/imagen1.jpg" },
                { "name": "imagen2.jpg", "url": "https://example.com/imagen2.jpg" }
            ]),
            json!({ "name": "imagen1.jpg", "url": "https://example.com/imagen1.jpg" }),
        ),
    )
}

/// Files to comma-separated text
///
/// Option `includeNames` (default true) renders `name (url)` instead of bare URLs.
pub fn files_to_text() -> Transformation {
    define(
        "files_to_text",
        FieldKind::Files,
        FieldKind::Text,
        "Files to text",
        "Lists file URLs as comma-separated text",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, options| {
            let include_names = options.bool_or("includeNames", true)?;
            let Some(files) = value.as_array() else {
                return Ok(Value::String(String::new()));
            };
            let text = files
                .iter()
                .map(|file| {
                    let url = file_str(file, "url");
                    if include_names {
                        format!("{} ({})", file_str(file, "name"), url)
                    } else {
                        url.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            Ok(Value::String(text))
        },
        (
            json!([
                { "name": "documento.pdf", "url": "https://example.com/documento.pdf" },
                { "name": "presentacion.ppt", "url": "https://example.com/presentacion.ppt" }
            ]),
            json!("documento.pdf (https://example.com/documento.pdf), presentacion.ppt (https://example.com/presentacion.ppt)"),
        ),
    )
}

/// File at `index` (default 0) as an image, if it looks like one
pub fn files_to_image() -> Transformation {
    define(
        "files_to_image",
        FieldKind::Files,
        FieldKind::Image,
        "Files to image",
        "Extracts an image from a list of files",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, options| {
            let index = options.index_or("index", 0)?;
            let Some(file) = file_at(value, index) else {
                return Ok(Value::Null);
            };
            let url = file_str(file, "url");
            if url.is_empty() {
                return Ok(Value::Null);
            }
            let name = file_str(file, "name");
            let (lower_name, lower_url) = (name.to_lowercase(), url.to_lowercase());
            let is_image = IMAGE_EXTENSIONS
                .iter()
                .any(|ext| lower_name.ends_with(ext) || lower_url.contains(ext));
            if !is_image {
                return Ok(Value::Null);
            }
            let mut image = Map::new();
            image.insert("url".to_string(), Value::String(url.to_string()));
            if let Some(name) = file.get("name") {
                image.insert("name".to_string(), name.clone());
            }
            Ok(Value::Object(image))
        },
        (
            json!([
                { "name": "imagen.jpg", "url": "https://example.com/imagen.jpg" },
                { "name": "documento.pdf", "url": "https://example.com/documento.pdf" }
            ]),
            json!({ "url": "https://example.com/imagen.jpg", "name": "imagen.jpg" }),
        ),
    )
}

/// URL of the file at `index` (default 0)
pub fn files_to_url() -> Transformation {
    define(
        "files_to_url",
        FieldKind::Files,
        FieldKind::Url,
        "Files to URL",
        "Extracts the URL of a file",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, options| {
            let index = options.index_or("index", 0)?;
            Ok(file_at(value, index)
                .and_then(|file| file.get("url"))
                .filter(|url| url.as_str().is_some_and(|s| !s.is_empty()))
                .cloned()
                .unwrap_or(Value::Null))
        },
        (
            json!([
                { "name": "documento.pdf", "url": "https://example.com/documento.pdf" },
                { "name": "imagen.jpg", "url": "https://example.com/imagen.jpg" }
            ]),
            json!("https://example.com/documento.pdf"),
        ),
    )
}

// ---------------------------------------------------------------------------
// Text parsing
// ---------------------------------------------------------------------------

/// Text to number
///
/// Currency symbols, whitespace and thousands separators are removed before the
/// leading numeric prefix is parsed. Options: `parseMode` (`float` | `integer`)
/// and `fallback` (default 0) for text with no numeric prefix.
pub fn text_to_number() -> Transformation {
    define(
        "text_to_number",
        FieldKind::Text,
        FieldKind::Number,
        "Text to number",
        "Parses a number from text, ignoring currency symbols and separators",
        PerformanceImpact::Low,
        Complexity::Medium,
        |value, options| {
            let integer = match options.str_or("parseMode", "float")? {
                "float" => false,
                "integer" => true,
                _ => {
                    return Err(TransformationError::InvalidOption {
                        option: "parseMode".to_string(),
                        expected: "\"float\" or \"integer\"".to_string(),
                    })
                }
            };
            let fallback = options.value_or("fallback", json!(0));

            let text = match value {
                Value::Null => return Ok(fallback),
                Value::Number(n) => n.to_string(),
                other => display_string(other),
            };
            let cleaned: String = text
                .trim()
                .chars()
                .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ',') && !c.is_whitespace())
                .collect();

            let regex = NUMERIC_PREFIX_REGEX.get_or_init(|| {
                Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid numeric regex")
            });
            let parsed = regex
                .find(&cleaned)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .filter(|n| n.is_finite());

            Ok(match parsed {
                Some(n) if integer => json!(n.trunc() as i64),
                Some(n) => number_value(n),
                None => fallback,
            })
        },
        (json!("$1,234.56"), json!(1234.56)),
    )
}

/// Text to a date property
///
/// Accepts ISO dates, RFC 3339 timestamps, `DD/MM/YYYY` and `DD-MM-YYYY`.
/// Unparseable text yields `null`.
pub fn text_to_date() -> Transformation {
    define(
        "text_to_date",
        FieldKind::Text,
        FieldKind::Date,
        "Text to date",
        "Parses text into a date property",
        PerformanceImpact::Medium,
        Complexity::Medium,
        |value, _| {
            Ok(match value {
                Value::String(s) => parse_date(s)
                    .map(|date| json!({ "start": date.format("%Y-%m-%d").to_string() }))
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            })
        },
        (json!("15/05/2023"), json!({ "start": "2023-05-15" })),
    )
}

/// Separated text to multi-select options (option `separator`, default `,`)
pub fn text_to_multi_select() -> Transformation {
    define(
        "text_to_multi_select",
        FieldKind::Text,
        FieldKind::MultiSelect,
        "Text to multi-select",
        "Splits separated text into multi-select options",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, options| {
            let text = match value {
                Value::Null => String::new(),
                other => display_string(other),
            };
            split_options(&text, options)
        },
        (
            json!("Diseño, Web, UI/UX"),
            json!([{ "name": "Diseño" }, { "name": "Web" }, { "name": "UI/UX" }]),
        ),
    )
}

/// Text to a single select option
pub fn text_to_select() -> Transformation {
    define(
        "text_to_select",
        FieldKind::Text,
        FieldKind::Select,
        "Text to select",
        "Converts text to a selected option",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| {
            let text = match value {
                Value::Null => String::new(),
                other => display_string(other),
            };
            let text = text.trim();
            Ok(if text.is_empty() {
                Value::Null
            } else {
                json!({ "name": text })
            })
        },
        (json!("Diseño"), json!({ "name": "Diseño" })),
    )
}

/// Rich text to multi-select options (option `separator`, default `,`)
pub fn rich_text_to_multi_select() -> Transformation {
    define(
        "rich_text_to_multi_select",
        FieldKind::RichText,
        FieldKind::MultiSelect,
        "Rich text to multi-select",
        "Splits formatted text into multi-select options",
        PerformanceImpact::Medium,
        Complexity::Medium,
        |value, options| split_options(&plain_text(value), options),
        (
            json!([{ "text": { "content": "Diseño, Web, UI/UX" } }]),
            json!([{ "name": "Diseño" }, { "name": "Web" }, { "name": "UI/UX" }]),
        ),
    )
}

/// Text to a boolean
pub fn text_to_checkbox() -> Transformation {
    define(
        "text_to_checkbox",
        FieldKind::Text,
        FieldKind::Checkbox,
        "Text to checkbox",
        "Converts yes/true/1 style text to a boolean",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| {
            let text = match value {
                Value::Null => return Ok(Value::Bool(false)),
                other => display_string(other),
            };
            let text = text.trim().to_lowercase();
            Ok(Value::Bool(TRUE_WORDS.contains(&text.as_str())))
        },
        (json!("Sí"), json!(true)),
    )
}

/// Text to a validated URL
///
/// Options: `addHttps` (default true) prefixes `https://` when no scheme is
/// present; `returnOriginal` (default false) returns the input instead of
/// `null` when the result is not a valid URL.
pub fn text_to_url() -> Transformation {
    define(
        "text_to_url",
        FieldKind::Text,
        FieldKind::Url,
        "Text to URL",
        "Converts text to a URL, validating its format",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, options| {
            let add_https = options.bool_or("addHttps", true)?;
            let return_original = options.bool_or("returnOriginal", false)?;
            let text = match value {
                Value::String(s) if !s.trim().is_empty() => s.trim(),
                _ => return Ok(Value::Null),
            };

            let scheme = URL_SCHEME_REGEX
                .get_or_init(|| Regex::new(r"^[a-zA-Z]+://").expect("valid scheme regex"));
            let candidate = if add_https && !scheme.is_match(text) {
                format!("https://{}", text)
            } else {
                text.to_string()
            };

            Ok(match url::Url::parse(&candidate) {
                Ok(_) => Value::String(candidate),
                Err(_) if return_original => value.clone(),
                Err(_) => Value::Null,
            })
        },
        (json!("example.com"), json!("https://example.com")),
    )
}

// ---------------------------------------------------------------------------
// Scalars and options
// ---------------------------------------------------------------------------

/// Number to boolean (zero is false)
pub fn number_to_checkbox() -> Transformation {
    define(
        "number_to_checkbox",
        FieldKind::Number,
        FieldKind::Checkbox,
        "Number to checkbox",
        "Converts a number to a boolean (0 is false, anything else true)",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| {
            Ok(Value::Bool(match value {
                Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
                Value::String(s) => match s.trim().parse::<f64>() {
                    Ok(n) => n != 0.0,
                    Err(_) => !s.trim().is_empty(),
                },
                other => truthy(other),
            }))
        },
        (json!(1), json!(true)),
    )
}

/// A single option to a one-element multi-select
pub fn select_to_multi_select() -> Transformation {
    define(
        "select_to_multi_select",
        FieldKind::Select,
        FieldKind::MultiSelect,
        "Select to multi-select",
        "Wraps a selected option in a multi-select list",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| {
            let name = option_name(value);
            Ok(if name.trim().is_empty() {
                json!([])
            } else {
                json!([{ "name": name.trim() }])
            })
        },
        (json!({ "name": "Diseño" }), json!([{ "name": "Diseño" }])),
    )
}

/// First option of a multi-select
pub fn multi_select_to_select() -> Transformation {
    define(
        "multi_select_to_select",
        FieldKind::MultiSelect,
        FieldKind::Select,
        "Multi-select to select",
        "Keeps the first selected option",
        PerformanceImpact::Low,
        Complexity::Low,
        |value, _| {
            let first = value
                .as_array()
                .and_then(|items| items.first())
                .map(option_name)
                .filter(|name| !name.trim().is_empty());
            Ok(first.map(|name| json!({ "name": name })).unwrap_or(Value::Null))
        },
        (json!([{ "name": "Diseño" }, { "name": "Web" }]), json!({ "name": "Diseño" })),
    )
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Plain text of a rich text value
///
/// Block arrays are joined with a space; HTML strings are stripped of tags;
/// other objects are rendered as JSON.
pub(crate) fn plain_text(value: &Value) -> String {
    match value {
        Value::Array(blocks) => blocks
            .iter()
            .map(|block| {
                block
                    .get("plain_text")
                    .and_then(Value::as_str)
                    .or_else(|| block.pointer("/text/content").and_then(Value::as_str))
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(" "),
        Value::String(s) if s.contains('<') => {
            let regex = HTML_TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
            regex.replace_all(s, "").into_owned()
        }
        other => display_string(other),
    }
}

fn rich_text_block(content: &str) -> Value {
    json!([{
        "type": "text",
        "text": { "content": content },
        "annotations": {
            "bold": false,
            "italic": false,
            "strikethrough": false,
            "underline": false,
            "code": false,
            "color": "default"
        }
    }])
}

/// Textual rendering of any value; `null` renders as the empty string
pub(crate) fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        other => other.to_string(),
    }
}

/// Render a number without a trailing `.0` for integral floats
fn format_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

/// JSON number for `n`, preferring an integer representation when exact
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        json!(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Name of a select option, or the textual value itself
fn option_name(value: &Value) -> String {
    match value {
        Value::Object(map) => match map.get("name") {
            Some(Value::String(name)) => name.clone(),
            _ => value.to_string(),
        },
        other => display_string(other),
    }
}

fn file_at(value: &Value, index: usize) -> Option<&Value> {
    let files = value.as_array().filter(|files| !files.is_empty())?;
    files.get(index.min(files.len() - 1))
}

fn file_str<'a>(file: &'a Value, key: &str) -> &'a str {
    file.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn split_options(text: &str, options: &TransformOptions) -> TransformResult<Value> {
    let separator = match options.str_or("separator", ",")? {
        "" => ",",
        separator => separator,
    };
    let items = text
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|name| json!({ "name": name }))
        .collect();
    Ok(Value::Array(items))
}

fn date_format_items(format: &str) -> TransformResult<Vec<Item<'_>>> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(TransformationError::InvalidOption {
            option: "format".to_string(),
            expected: "a valid chrono format string".to_string(),
        });
    }
    Ok(items)
}

fn date_from_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        _ => None,
    }
}

/// Parse the date formats accepted from data sources and free text
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.date_naive());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(datetime.date());
    }
    ["%d/%m/%Y", "%d-%m-%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}
