//! Shared utilities for command handlers

use crate::error::{Error, Result};
use anyhow::Context;
use fieldmap_core::mapping::{MappingConfig, MappingStore, SchemaProvider};
use fieldmap_core::{case_study_schema, DestinationField, SourceField, TransformOptions};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static OPTION_PAIR_REGEX: OnceLock<Regex> = OnceLock::new();

/// Read a JSON or YAML file, chosen by extension
pub fn read_structured<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;

    let is_yaml = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false);

    if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: format!("YAML ({})", e),
        })
    } else {
        serde_json::from_str(&content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: format!("JSON ({})", e),
        })
    }
}

/// Interpret a `--value` argument: JSON when it parses, a plain string otherwise
pub fn parse_value_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parse `--options` given as a JSON object or as `key=value` pairs separated by commas
///
/// Values in pair form are themselves parsed with [`parse_value_arg`], so
/// `index=2` yields a number and `format=%d/%m` a string.
pub fn parse_options(raw: &str) -> Result<TransformOptions> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed)?;
        return match value {
            Value::Object(_) => Ok(TransformOptions::from_value(value)),
            _ => Err(Error::invalid_args("--options must be a JSON object")),
        };
    }

    let regex = OPTION_PAIR_REGEX.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=(.*)$").expect("valid option pair regex")
    });
    let mut options = Map::new();
    for pair in trimmed.split(',').filter(|p| !p.trim().is_empty()) {
        let captures = regex
            .captures(pair)
            .ok_or_else(|| Error::invalid_args(format!("invalid option '{}', expected key=value", pair.trim())))?;
        options.insert(captures[1].to_string(), parse_value_arg(captures[2].trim()));
    }
    Ok(TransformOptions::from_value(Value::Object(options)))
}

/// Field definitions read from JSON files
///
/// The destination schema falls back to the built-in case-study schema when
/// no file is given.
pub struct JsonFileSchemaProvider {
    source_schema: PathBuf,
    destination_schema: Option<PathBuf>,
}

impl JsonFileSchemaProvider {
    pub fn new(source_schema: impl Into<PathBuf>, destination_schema: Option<PathBuf>) -> Self {
        Self {
            source_schema: source_schema.into(),
            destination_schema,
        }
    }
}

impl SchemaProvider for JsonFileSchemaProvider {
    fn fetch_source_fields(&self, source_id: &str) -> anyhow::Result<Vec<SourceField>> {
        let fields: Vec<SourceField> = read_structured(&self.source_schema)
            .with_context(|| format!("reading source fields for '{}'", source_id))?;
        tracing::debug!(source_id, count = fields.len(), "Loaded source fields");
        Ok(fields)
    }

    fn fetch_destination_schema(&self) -> anyhow::Result<Vec<DestinationField>> {
        match &self.destination_schema {
            Some(path) => Ok(read_structured(path).context("reading destination schema")?),
            None => Ok(case_study_schema()),
        }
    }
}

/// Mapping configurations stored as `<id>.json` (or `.yaml`) files in one directory
pub struct FileMappingStore {
    dir: PathBuf,
}

impl FileMappingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at a configuration file's directory, plus the id its file name implies
    pub fn for_file(path: &Path) -> Result<(Self, String)> {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::invalid_args(format!("invalid mapping file name: {}", path.display())))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Ok((Self::new(dir), id.to_string()))
    }

    fn candidates(&self, id: &str) -> [PathBuf; 3] {
        ["json", "yaml", "yml"].map(|ext| self.dir.join(format!("{}.{}", id, ext)))
    }
}

impl MappingStore for FileMappingStore {
    fn save(&mut self, config: &MappingConfig) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.json", config.id));
        fs::write(&path, serde_json::to_string_pretty(config)?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    fn load(&self, id: &str) -> anyhow::Result<Option<MappingConfig>> {
        match self.candidates(id).into_iter().find(|p| p.exists()) {
            Some(path) => Ok(Some(read_structured(&path)?)),
            None => Ok(None),
        }
    }
}

/// Load a mapping configuration file through the file store
pub fn load_mapping_config(path: &Path) -> Result<MappingConfig> {
    let (store, id) = FileMappingStore::for_file(path)?;
    store
        .load(&id)
        .map_err(|e| Error::storage(format!("Failed to load mapping config {}", path.display()), e))?
        .ok_or_else(|| Error::FileNotFound {
            path: path.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmap_core::{Field, FieldKind, FieldMapping};
    use serde_json::json;

    #[test]
    fn test_parse_value_arg() {
        assert_eq!(parse_value_arg("42"), json!(42));
        assert_eq!(parse_value_arg("[{\"name\":\"A\"}]"), json!([{ "name": "A" }]));
        assert_eq!(parse_value_arg("hello world"), json!("hello world"));
    }

    #[test]
    fn test_parse_options_forms() {
        let json_form = parse_options(r#"{"separator": ";", "index": 1}"#).unwrap();
        assert_eq!(json_form.get("separator"), Some(&json!(";")));

        let pairs = parse_options("index=2, format=%d/%m/%Y").unwrap();
        assert_eq!(pairs.get("index"), Some(&json!(2)));
        assert_eq!(pairs.get("format"), Some(&json!("%d/%m/%Y")));

        assert!(parse_options("[1,2]").is_err());
        assert!(matches!(parse_options("=oops"), Err(Error::InvalidArgs(_))));
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileMappingStore::new(dir.path().join("mappings"));
        let config = MappingConfig::new("cs-1", "Case studies", "db-1")
            .with_mappings(vec![FieldMapping::new("project_name", "name")]);

        store.save(&config).unwrap();
        assert_eq!(store.load("cs-1").unwrap(), Some(config.clone()));
        assert_eq!(store.load("missing").unwrap(), None);

        let loaded = load_mapping_config(&dir.path().join("mappings").join("cs-1.json")).unwrap();
        assert_eq!(loaded.id, "cs-1");
    }

    #[test]
    fn test_schema_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.json");
        let fields = vec![SourceField::new(Field::new("name", "Name", FieldKind::Title))];
        fs::write(&path, serde_json::to_string(&fields).unwrap()).unwrap();

        let provider = JsonFileSchemaProvider::new(&path, None);
        assert_eq!(provider.fetch_source_fields("db-1").unwrap(), fields);
        assert_eq!(provider.fetch_destination_schema().unwrap().len(), case_study_schema().len());

        let missing = JsonFileSchemaProvider::new(dir.path().join("nope.json"), None);
        let err = missing.fetch_source_fields("db-1").unwrap_err();
        assert!(format!("{:#}", err).contains("reading source fields for 'db-1'"));
    }
}
